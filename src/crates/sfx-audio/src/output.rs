//! Output lifecycle
//!
//! The engine owns exactly one output context. It starts `Uninitialized`, is
//! opened into `Suspended` or `Running` (the platform decides), and a
//! suspended context is resumed on user interaction. State never moves
//! backwards; `Running` is final.

use crate::{AudioError, Result, Voice};
use serde::{Deserialize, Serialize};

#[cfg(feature = "device")]
use crate::Mixer;

/// State of the shared output context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Uninitialized,
    Suspended,
    Running,
}

/// Platform output the engine plays through
pub trait OutputDevice {
    /// Construct the output context, returning `Suspended` or `Running`
    fn open(&mut self) -> Result<OutputState>;

    /// Ask a suspended context to start producing sound
    fn resume(&mut self) -> Result<OutputState>;

    /// Start a voice on the output immediately
    fn connect(&mut self, voice: Voice) -> Result<()>;
}

/// Which interactions trigger a resume attempt while suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumePolicy {
    /// Every qualifying interaction while suspended
    #[default]
    EveryInteraction,
    /// Only the first qualifying interaction
    FirstInteraction,
}

/// Owns the output device and drives its state machine
pub struct OutputLifecycle<D> {
    device: D,
    state: OutputState,
    resume_policy: ResumePolicy,
    interactions_seen: usize,
}

impl<D: OutputDevice> OutputLifecycle<D> {
    pub fn new(device: D, resume_policy: ResumePolicy) -> Self {
        OutputLifecycle {
            device,
            state: OutputState::Uninitialized,
            resume_policy,
            interactions_seen: 0,
        }
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Open the output context if it has not been opened yet
    ///
    /// A failed open leaves the state `Uninitialized` so a later call can try
    /// again.
    pub fn initialize(&mut self) -> OutputState {
        if self.state != OutputState::Uninitialized {
            return self.state;
        }

        match self.device.open() {
            Ok(state @ (OutputState::Suspended | OutputState::Running)) => {
                tracing::info!(?state, "output context created");
                self.state = state;
            }
            Ok(OutputState::Uninitialized) => {
                tracing::error!("output device reported itself uninitialized after open");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to open output device");
            }
        }
        self.state
    }

    /// Attempt a resume if the context is suspended
    ///
    /// Returns `true` if an attempt was made. A failed attempt keeps the
    /// context suspended; the next interaction tries again.
    pub fn resume(&mut self) -> bool {
        if self.state != OutputState::Suspended {
            return false;
        }

        match self.device.resume() {
            Ok(OutputState::Running) => {
                tracing::info!("output context resumed");
                self.state = OutputState::Running;
            }
            Ok(state) => {
                tracing::warn!(?state, "output context did not start after resume");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to resume output context");
            }
        }
        true
    }

    /// A qualifying user interaction happened
    ///
    /// Returns `true` if a resume was attempted. Only interactions that arrive
    /// while suspended count towards `FirstInteraction`.
    pub fn on_interaction(&mut self) -> bool {
        if self.state != OutputState::Suspended {
            return false;
        }
        if self.resume_policy == ResumePolicy::FirstInteraction && self.interactions_seen > 0 {
            return false;
        }
        self.interactions_seen += 1;
        self.resume()
    }

    /// Start a voice on the output
    pub fn connect(&mut self, voice: Voice) -> Result<()> {
        if self.state == OutputState::Uninitialized {
            return Err(AudioError::DeviceError("Output context not created".to_string()));
        }
        self.device.connect(voice)
    }
}

/// Output that produces no sound
///
/// Used when no audio backend is compiled in. It honours the lifecycle
/// (opening suspended unless `autoplay` is set) and discards voices.
#[derive(Debug, Default)]
pub struct NullDevice {
    autoplay: bool,
    voices_started: usize,
}

impl NullDevice {
    pub fn new(autoplay: bool) -> Self {
        NullDevice {
            autoplay,
            voices_started: 0,
        }
    }

    pub fn voices_started(&self) -> usize {
        self.voices_started
    }
}

impl OutputDevice for NullDevice {
    fn open(&mut self) -> Result<OutputState> {
        Ok(if self.autoplay {
            OutputState::Running
        } else {
            OutputState::Suspended
        })
    }

    fn resume(&mut self) -> Result<OutputState> {
        Ok(OutputState::Running)
    }

    fn connect(&mut self, voice: Voice) -> Result<()> {
        self.voices_started += 1;
        tracing::debug!(
            sound = %voice.buffer().name,
            gain = voice.gain(),
            "voice started on null output"
        );
        Ok(())
    }
}

/// Output through the default cpal device
///
/// The stream is built on `open` and paused unless `autoplay` is set, which
/// mirrors platforms that refuse to play audio before a user gesture.
#[cfg(feature = "device")]
pub struct CpalDevice {
    autoplay: bool,
    mixer: Mixer,
    stream: Option<cpal::Stream>,
    sample_rate: u32,
}

#[cfg(feature = "device")]
impl CpalDevice {
    pub fn new(autoplay: bool) -> Self {
        CpalDevice {
            autoplay,
            mixer: Mixer::new(),
            stream: None,
            sample_rate: 0,
        }
    }

    /// Get the sample rate of the output device (0 before `open`)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

#[cfg(feature = "device")]
impl OutputDevice for CpalDevice {
    fn open(&mut self) -> Result<OutputState> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceError(format!("Failed to get default config: {}", e)))?;

        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels as usize;

        let mixer = self.mixer.clone();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer.fill_buffer(data, channels, sample_rate);
                },
                |err| {
                    tracing::error!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError(format!("Failed to build stream: {}", e)))?;

        let state = if self.autoplay {
            stream
                .play()
                .map_err(|e| AudioError::DeviceError(format!("Failed to play stream: {}", e)))?;
            OutputState::Running
        } else {
            match stream.pause() {
                Ok(()) => OutputState::Suspended,
                // Backends that cannot pause are already producing sound
                Err(e) => {
                    tracing::warn!(error = %e, "output stream cannot be paused");
                    OutputState::Running
                }
            }
        };

        self.stream = Some(stream);
        self.sample_rate = sample_rate;
        Ok(state)
    }

    fn resume(&mut self) -> Result<OutputState> {
        use cpal::traits::StreamTrait;

        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AudioError::DeviceError("Output stream not built".to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::DeviceError(format!("Failed to play stream: {}", e)))?;
        Ok(OutputState::Running)
    }

    fn connect(&mut self, voice: Voice) -> Result<()> {
        if self.stream.is_none() {
            return Err(AudioError::DeviceError("Output stream not built".to_string()));
        }
        self.mixer.add(voice);
        Ok(())
    }
}
