use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use sfx_app_lib::config::Settings;
use sfx_app_lib::soundbridge;
use sfx_audio::{AssetLoader, InitPolicy, LoadPolicy, ResumePolicy, SoundEngine, SourceFetcher};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "device")]
type Device = sfx_audio::CpalDevice;
#[cfg(not(feature = "device"))]
type Device = sfx_audio::NullDevice;

#[derive(Parser, Debug)]
#[command(name = "sfx-app")]
#[command(about = "Play UI sound effects requested on standard input", long_about = None)]
struct Args {
    /// Settings file (JSON). Without one the built-in game sounds are used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assets directory or URL for the built-in sounds
    #[arg(short, long, default_value = "public")]
    assets: String,

    /// When to create the audio output
    #[arg(long, value_enum)]
    init: Option<InitArg>,

    /// When to fetch and decode sounds
    #[arg(long, value_enum)]
    load: Option<LoadArg>,

    /// Which interactions try to resume a suspended output
    #[arg(long, value_enum)]
    resume: Option<ResumeArg>,

    /// Allow audio to start without a user gesture
    #[arg(long)]
    autoplay: bool,

    /// Number of pending requests the bridge queue holds
    #[arg(long, default_value = "64")]
    queue: usize,

    /// Seconds to keep running after input ends so sounds can finish
    #[arg(long, default_value = "2.0")]
    linger: f64,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InitArg {
    Eager,
    Deferred,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LoadArg {
    Preload,
    Lazy,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResumeArg {
    Every,
    First,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let settings = load_settings(&args)?;
    let catalog = Arc::new(settings.build_catalog()?);
    let report_preload = settings.reports_preload();
    tracing::info!(
        sounds = catalog.len(),
        init = ?settings.engine.init,
        load = ?settings.engine.load,
        "starting sound engine"
    );

    let mut engine = SoundEngine::new(
        catalog,
        Arc::new(SourceFetcher::new()),
        Device::new(settings.autoplay),
        settings.engine,
    );
    if report_preload {
        spawn_preload_report(engine.loader().clone());
    }

    let (bridge, rx) = soundbridge::channel(args.queue);
    let reader = soundbridge::spawn_line_reader(BufReader::new(tokio::io::stdin()), bridge);

    soundbridge::drain(rx, &mut engine).await;
    reader.await?;

    if args.linger > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(args.linger)).await;
    }
    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::builtin(args.assets.clone()),
    };

    if let Some(init) = args.init {
        settings.engine.init = match init {
            InitArg::Eager => InitPolicy::Eager,
            InitArg::Deferred => InitPolicy::Deferred,
        };
    }
    if let Some(load) = args.load {
        settings.engine.load = match load {
            LoadArg::Preload => LoadPolicy::Preload,
            LoadArg::Lazy => LoadPolicy::Lazy,
        };
    }
    if let Some(resume) = args.resume {
        settings.engine.resume = match resume {
            ResumeArg::Every => ResumePolicy::EveryInteraction,
            ResumeArg::First => ResumePolicy::FirstInteraction,
        };
    }
    settings.autoplay |= args.autoplay;

    Ok(settings)
}

fn spawn_preload_report(loader: AssetLoader) {
    tokio::spawn(async move {
        let progress = loader.all_settled().await;
        if progress.failed > 0 {
            tracing::warn!(
                loaded = progress.loaded,
                failed = progress.failed,
                "sound loading finished with failures"
            );
        } else {
            tracing::info!(loaded = progress.loaded, "sound loading finished");
        }
    });
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .try_init();
}
