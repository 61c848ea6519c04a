//! Example: play one sound file through the engine
//!
//! cargo run -p sfx-audio --example play_sound --features device -- path/to/click.wav

use sfx_audio::{AssetBase, EngineConfig, Interaction, PlayOutcome, SoundCatalog, SoundEngine, SourceFetcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "device")]
type Device = sfx_audio::CpalDevice;
#[cfg(not(feature = "device"))]
type Device = sfx_audio::NullDevice;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: play_sound <audio file>")?;

    let file = Path::new(&path);
    let dir = file.parent().unwrap_or(Path::new("."));
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("invalid file name")?;

    let base = AssetBase::Dir(dir.to_path_buf());
    let catalog = SoundCatalog::from_table(&base, &[("fx", file_name, None)], 0.8)?;
    let mut engine = SoundEngine::new(
        Arc::new(catalog),
        Arc::new(SourceFetcher::new()),
        Device::new(false),
        EngineConfig::default(),
    );

    let progress = engine.loader().all_settled().await;
    if progress.failed > 0 {
        println!("Could not load {}", path);
        return Ok(());
    }

    // Stand-in for the user gesture that unlocks the output
    engine.on_interaction(Interaction::Click);

    match engine.play("fx") {
        PlayOutcome::Started { gain } => println!("Playing {} at gain {}", path, gain),
        other => println!("Not played: {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    Ok(())
}
