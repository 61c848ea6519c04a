//! Sound effect playback engine
//!
//! This crate plays short UI sound effects on request:
//! - A static catalog maps sound names to asset locations and gains
//! - Assets are fetched and decoded concurrently, each failure isolated
//! - One shared output context moves Uninitialized -> Suspended -> Running,
//!   resuming on user gestures
//! - Every play request builds its own voice (buffer -> gain -> output)

pub mod catalog;
pub mod controller;
pub mod decode;
pub mod fetch;
pub mod loader;
pub mod mixer;
pub mod output;
pub mod voice;

#[cfg(test)]
mod test_support;

pub use catalog::{
    AssetBase, CatalogEntry, CatalogSpec, SoundCatalog, SoundLookup, SoundName, SoundSpec,
    SourceLocation,
};
pub use controller::{EngineConfig, InitPolicy, Interaction, LoadPolicy, PlayOutcome, SoundEngine};
pub use decode::{decode_audio, SoundBuffer};
pub use fetch::{AssetFetcher, SourceFetcher};
pub use loader::{AssetLoader, AssetStatus, LoadProgress};
pub use mixer::Mixer;
pub use output::{NullDevice, OutputDevice, OutputLifecycle, OutputState, ResumePolicy};
pub use voice::Voice;

#[cfg(feature = "device")]
pub use output::CpalDevice;

/// Sound engine errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    DeviceError(String),

    #[error("Sound not found: {0}")]
    SampleNotFound(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("Failed to fetch asset from URL: {0}")]
    HttpError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
