//! Mixer for the shared output stream

use crate::Voice;
use parking_lot::Mutex;
use std::sync::Arc;

/// Sums every active voice into the output buffer
///
/// Cloning a mixer shares the voice list, so the device callback and the
/// controller can hold one each.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    voices: Arc<Mutex<Vec<Voice>>>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voice; it starts on the next buffer fill
    pub fn add(&self, voice: Voice) {
        self.voices.lock().push(voice);
    }

    /// Number of voices still playing
    pub fn active_voices(&self) -> usize {
        self.voices.lock().len()
    }

    /// Fill an interleaved buffer with the output of all active voices
    pub fn fill_buffer(&self, buffer: &mut [f32], channels: usize, sample_rate: u32) {
        buffer.fill(0.0);

        let mut voices = self.voices.lock();
        voices.retain_mut(|voice| {
            voice.fill_buffer(buffer, channels, sample_rate);
            voice.is_active()
        });
        drop(voices);

        for sample in buffer.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}
