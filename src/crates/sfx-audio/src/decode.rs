//! Audio decoding
//!
//! Turns the raw bytes of an asset into interleaved f32 PCM using Symphonia.

use crate::{AudioError, Result};
use std::io::Cursor;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded sound, ready to be played any number of times
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    /// Name of the sound this buffer was decoded for
    pub name: String,
    /// Audio data (interleaved f32, normalized to [-1.0, 1.0])
    pub data: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl SoundBuffer {
    /// Get the duration of this buffer in seconds
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.max(1) as usize
    }
}

/// Decode audio bytes into a [`SoundBuffer`]
///
/// `extension` is only a hint for the format probe; the bytes are otherwise
/// treated opaquely and any container/codec Symphonia knows is accepted.
pub fn decode_audio(data: Vec<u8>, name: &str, extension: Option<&str>) -> Result<SoundBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeError("No valid audio track found".to_string()))?;

    let track_id = track.id;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("Failed to create decoder: {}", e)))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;

    let mut audio_data: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(AudioError::DecodeError(format!("Format error: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = SignalSpec::new(decoded.spec().rate, decoded.spec().channels);
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let capacity = decoded.capacity();
                if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < capacity) {
                    sample_buf = Some(SampleBuffer::<f32>::new(capacity as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    audio_data.extend_from_slice(buf.samples());
                }
            }
            // A corrupt packet only loses that packet
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(sound = name, error = %e, "skipping undecodable packet");
            }
            Err(e) => {
                return Err(AudioError::DecodeError(format!("Failed to decode packet: {}", e)));
            }
        }
    }

    if audio_data.is_empty() || channels == 0 {
        return Err(AudioError::DecodeError(format!("{} decoded to no audio", name)));
    }

    Ok(SoundBuffer {
        name: name.to_string(),
        data: audio_data,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::wav_bytes;

    #[test]
    fn test_decode_wav_mono() {
        let bytes = wav_bytes(1, 22050, &[0.0, 0.5, -0.5, 0.25]);
        let buffer = decode_audio(bytes, "click", Some("wav")).unwrap();

        assert_eq!(buffer.name, "click");
        assert_eq!(buffer.channels, 1);
        assert_eq!(buffer.sample_rate, 22050);
        assert_eq!(buffer.frames(), 4);
        assert!((buffer.data[1] - 0.5).abs() < 0.001);
        assert!((buffer.data[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn test_decode_wav_stereo_is_interleaved() {
        // L, R, L, R
        let bytes = wav_bytes(2, 44100, &[0.5, -0.5, 0.25, -0.25]);
        let buffer = decode_audio(bytes, "stereo", None).unwrap();

        assert_eq!(buffer.channels, 2);
        assert_eq!(buffer.frames(), 2);
        assert!((buffer.data[0] - 0.5).abs() < 0.001);
        assert!((buffer.data[1] + 0.5).abs() < 0.001);
        assert!((buffer.data[2] - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_audio(b"definitely not audio".to_vec(), "junk", Some("wav"));
        assert!(matches!(result, Err(AudioError::DecodeError(_))));
    }

    #[test]
    fn test_duration() {
        let buffer = SoundBuffer {
            name: "one-second".to_string(),
            data: vec![0.0; 88200],
            sample_rate: 44100,
            channels: 2,
        };
        assert_eq!(buffer.frames(), 44100);
        assert!((buffer.duration() - 1.0).abs() < f64::EPSILON);
    }
}
