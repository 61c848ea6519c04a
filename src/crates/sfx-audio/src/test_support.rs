//! Test doubles shared by the unit tests

use crate::catalog::SourceLocation;
use crate::fetch::AssetFetcher;
use crate::loader::{AssetLoader, AssetStatus};
use crate::output::{OutputDevice, OutputState};
use crate::{AudioError, Result, SoundBuffer, Voice};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::fmt::MakeWriter;

/// Encode f32 samples as a 16-bit PCM WAV file in memory
pub fn wav_bytes(channels: u16, sample_rate: u32, samples: &[f32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for sample in samples {
            writer
                .write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// A short mono click
pub fn click_wav() -> Vec<u8> {
    let samples: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
    wav_bytes(1, 44100, &samples)
}

pub fn test_voice() -> Voice {
    Voice::new(Arc::new(SoundBuffer {
        name: "test".to_string(),
        data: vec![0.5; 16],
        sample_rate: 44100,
        channels: 1,
    }))
}

/// How the fake fetcher answers for one location
pub enum FakeAsset {
    Bytes(Vec<u8>),
    Missing,
    /// Bytes returned only after the gate is notified
    Gated(Vec<u8>, Arc<Notify>),
}

/// In-memory fetcher keyed by the display form of the location
#[derive(Default)]
pub struct FakeFetcher {
    assets: HashMap<String, FakeAsset>,
    fetches: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, asset: FakeAsset) -> Self {
        self.assets.insert(location.to_string(), asset);
        self
    }

    pub fn fetch_count(&self, location: &str) -> usize {
        self.fetches.lock().iter().filter(|l| *l == location).count()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>> {
        let key = location.to_string();
        self.fetches.lock().push(key.clone());

        match self.assets.get(&key) {
            Some(FakeAsset::Bytes(bytes)) => Ok(bytes.clone()),
            Some(FakeAsset::Gated(bytes, gate)) => {
                gate.notified().await;
                Ok(bytes.clone())
            }
            Some(FakeAsset::Missing) | None => {
                Err(AudioError::HttpError(format!("404 Not Found: {}", key)))
            }
        }
    }
}

/// Output device that records every call
pub struct RecordingDevice {
    pub open_as: OutputState,
    /// Number of upcoming opens that fail
    pub open_failures: usize,
    /// Number of upcoming resumes that fail
    pub resume_failures: usize,
    pub fail_connect: bool,
    pub opens: usize,
    pub resumes: usize,
    pub voices: Vec<Voice>,
}

impl RecordingDevice {
    pub fn suspended() -> Self {
        Self::opening_as(OutputState::Suspended)
    }

    pub fn running() -> Self {
        Self::opening_as(OutputState::Running)
    }

    fn opening_as(open_as: OutputState) -> Self {
        RecordingDevice {
            open_as,
            open_failures: 0,
            resume_failures: 0,
            fail_connect: false,
            opens: 0,
            resumes: 0,
            voices: Vec::new(),
        }
    }
}

impl OutputDevice for RecordingDevice {
    fn open(&mut self) -> Result<OutputState> {
        self.opens += 1;
        if self.open_failures > 0 {
            self.open_failures -= 1;
            return Err(AudioError::DeviceError("no output device".to_string()));
        }
        Ok(self.open_as)
    }

    fn resume(&mut self) -> Result<OutputState> {
        self.resumes += 1;
        if self.resume_failures > 0 {
            self.resume_failures -= 1;
            return Err(AudioError::DeviceError("resume rejected".to_string()));
        }
        Ok(OutputState::Running)
    }

    fn connect(&mut self, voice: Voice) -> Result<()> {
        if self.fail_connect {
            return Err(AudioError::DeviceError("output closed".to_string()));
        }
        self.voices.push(voice);
        Ok(())
    }
}

/// Poll until `name` reaches a status matching `predicate`
pub async fn wait_for_status(loader: &AssetLoader, name: &str, predicate: fn(&AssetStatus) -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if loader.status(name).as_ref().map(predicate).unwrap_or(false) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {}", name);
}

/// Shared in-memory sink for formatted log lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber that records log output, returning both
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}
