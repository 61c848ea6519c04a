//! Playback controller
//!
//! [`SoundEngine`] ties the catalog, the loader and the output lifecycle
//! together. `play` never fails: anything that prevents a sound from playing
//! is logged and the request is dropped.

use crate::catalog::SoundCatalog;
use crate::fetch::AssetFetcher;
use crate::loader::AssetLoader;
use crate::output::{OutputDevice, OutputLifecycle, OutputState, ResumePolicy};
use crate::{AudioError, Voice};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// When the output context is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InitPolicy {
    /// At engine construction; preloading starts immediately
    #[default]
    Eager,
    /// On the first qualifying interaction or play request
    Deferred,
}

/// When assets are fetched and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadPolicy {
    /// Every catalog entry as soon as the output context is created
    #[default]
    Preload,
    /// Each entry on its first play request (that request is still dropped)
    Lazy,
}

/// User input events that can unlock audio output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Click,
    KeyDown,
    TouchEnd,
    PointerUp,
}

impl FromStr for Interaction {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "click" => Ok(Interaction::Click),
            "keydown" | "key" => Ok(Interaction::KeyDown),
            "touchend" | "touch" => Ok(Interaction::TouchEnd),
            "pointerup" | "pointer" => Ok(Interaction::PointerUp),
            other => Err(AudioError::Other(format!("Unknown interaction: {}", other))),
        }
    }
}

/// Engine policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub init: InitPolicy,
    pub load: LoadPolicy,
    pub resume: ResumePolicy,
    /// A play request while suspended also attempts a resume
    pub resume_on_play: bool,
    /// Interactions that count as a user gesture
    pub interactions: Vec<Interaction>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            init: InitPolicy::Eager,
            load: LoadPolicy::Preload,
            resume: ResumePolicy::EveryInteraction,
            resume_on_play: true,
            interactions: vec![Interaction::Click, Interaction::KeyDown, Interaction::TouchEnd],
        }
    }
}

/// What happened to a play request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// A new voice was started at this gain
    Started { gain: f32 },
    /// The output context was created by this request, which is dropped
    Initializing,
    /// The name is not in the catalog
    UnknownSound,
    /// The sound has not finished decoding (or failed to)
    NotLoaded,
    /// The output device refused the voice
    OutputUnavailable,
}

/// Sound effect engine
pub struct SoundEngine<D> {
    config: EngineConfig,
    catalog: Arc<SoundCatalog>,
    loader: AssetLoader,
    output: OutputLifecycle<D>,
    preload_started: bool,
}

impl<D: OutputDevice> SoundEngine<D> {
    /// Create an engine
    ///
    /// Under the eager policy the output context is opened and preloading
    /// starts right away, so this must run inside a tokio runtime.
    pub fn new(
        catalog: Arc<SoundCatalog>,
        fetcher: Arc<dyn AssetFetcher>,
        device: D,
        config: EngineConfig,
    ) -> Self {
        let loader = AssetLoader::new(Arc::clone(&catalog), fetcher);
        let output = OutputLifecycle::new(device, config.resume);

        let mut engine = SoundEngine {
            config,
            catalog,
            loader,
            output,
            preload_started: false,
        };

        if engine.config.init == InitPolicy::Eager {
            engine.initialize();
        }
        engine
    }

    fn initialize(&mut self) -> OutputState {
        let state = self.output.initialize();

        if self.config.load == LoadPolicy::Preload && !self.preload_started {
            self.preload_started = true;
            self.loader.preload_all();
        }
        state
    }

    /// Play a sound once, fire-and-forget
    pub fn play(&mut self, name: &str) -> PlayOutcome {
        if self.output.state() == OutputState::Uninitialized {
            tracing::debug!(sound = name, "creating output context; request dropped");
            self.initialize();
            return PlayOutcome::Initializing;
        }

        if self.config.resume_on_play {
            self.output.resume();
        }

        let Some(found) = self.catalog.lookup(name) else {
            tracing::warn!(sound = name, "unknown sound requested");
            return PlayOutcome::UnknownSound;
        };
        let gain = found.gain;

        let Some(buffer) = self.loader.buffer(name) else {
            if self.config.load == LoadPolicy::Lazy {
                self.loader.load(name);
            }
            tracing::warn!(sound = name, "sound not loaded");
            return PlayOutcome::NotLoaded;
        };

        let voice = Voice::new(buffer).set_gain(gain);
        match self.output.connect(voice) {
            Ok(()) => {
                tracing::debug!(sound = name, gain, "playing sound");
                PlayOutcome::Started { gain }
            }
            Err(e) => {
                tracing::error!(sound = name, error = %e, "failed to start sound");
                PlayOutcome::OutputUnavailable
            }
        }
    }

    /// Handle a user interaction event
    ///
    /// Non-qualifying kinds are ignored. Returns `true` if a resume was
    /// attempted.
    pub fn on_interaction(&mut self, kind: Interaction) -> bool {
        if !self.config.interactions.contains(&kind) {
            return false;
        }

        if self.output.state() == OutputState::Uninitialized {
            self.initialize();
        }
        self.output.on_interaction()
    }

    pub fn state(&self) -> OutputState {
        self.output.state()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<SoundCatalog> {
        &self.catalog
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    pub fn output(&self) -> &OutputLifecycle<D> {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputLifecycle<D> {
        &mut self.output
    }
}
