//! Voice: one playback instance of a decoded sound
//!
//! A voice is the signal path built for a single play call: it borrows the
//! shared decoded buffer, applies its own gain and keeps its own position.
//! Voices are never reused; a finished voice is dropped by the mixer.

use crate::SoundBuffer;
use std::sync::Arc;

/// A voice for playing back a single sound buffer
#[derive(Debug, Clone)]
pub struct Voice {
    /// The buffer being played
    buffer: Arc<SoundBuffer>,
    /// Current playback position (in frames)
    position: f64,
    /// Gain/volume (0.0 to 1.0)
    gain: f32,
    /// Whether this voice is still active
    active: bool,
}

impl Voice {
    /// Create a new voice for the given buffer, starting at frame 0
    pub fn new(buffer: Arc<SoundBuffer>) -> Self {
        Voice {
            buffer,
            position: 0.0,
            gain: 1.0,
            active: true,
        }
    }

    /// Set the gain
    pub fn set_gain(mut self, gain: f32) -> Self {
        self.gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn buffer(&self) -> &Arc<SoundBuffer> {
        &self.buffer
    }

    /// Check if this voice is still active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get the next stereo sample pair (L, R)
    ///
    /// Returns None if the voice has finished playing
    pub fn next_sample(&mut self, output_sample_rate: u32) -> Option<(f32, f32)> {
        if !self.active {
            return None;
        }

        let frames = self.buffer.frames();

        if self.position >= frames as f64 {
            self.active = false;
            return None;
        }

        let (left, right) = if self.buffer.channels == 1 {
            // Mono: duplicate to both channels
            let sample = self.interpolate_sample_at_position(self.position, 0);
            (sample, sample)
        } else {
            let left = self.interpolate_sample_at_position(self.position, 0);
            let right = self.interpolate_sample_at_position(self.position, 1);
            (left, right)
        };

        // Advance position, compensating for sample rate differences
        let rate_ratio = self.buffer.sample_rate as f64 / output_sample_rate.max(1) as f64;
        self.position += rate_ratio;

        Some((left * self.gain, right * self.gain))
    }

    /// Interpolate sample at the given fractional position using linear interpolation
    ///
    /// # Arguments
    /// * `frame_position` - The fractional frame position
    /// * `channel_offset` - The channel offset (0 for left/mono, 1 for right in stereo)
    fn interpolate_sample_at_position(&self, frame_position: f64, channel_offset: usize) -> f32 {
        let data = &self.buffer.data;
        let channels = self.buffer.channels.max(1) as usize;

        // For stereo: frame 0 has indices [0, 1], frame 1 has indices [2, 3], etc.
        let base_index = (frame_position.floor() as usize) * channels + channel_offset;

        if base_index >= data.len() {
            return 0.0;
        }

        let fraction = (frame_position - frame_position.floor()) as f32;
        let sample_current = data[base_index];

        // Last frame: nothing to interpolate towards
        let next_index = base_index + channels;
        if next_index >= data.len() {
            return sample_current;
        }

        let sample_next = data[next_index];
        sample_current + (sample_next - sample_current) * fraction
    }

    /// Mix this voice into an interleaved output buffer
    ///
    /// Stereo output gets (L, R); a mono device gets the average; channels
    /// beyond the first two are left untouched.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: usize, output_sample_rate: u32) {
        for frame in buffer.chunks_mut(channels.max(1)) {
            let Some((left, right)) = self.next_sample(output_sample_rate) else {
                break;
            };
            match frame {
                [mono] => *mono += (left + right) * 0.5,
                [l, r, ..] => {
                    *l += left;
                    *r += right;
                }
                [] => {}
            }
        }
    }
}
