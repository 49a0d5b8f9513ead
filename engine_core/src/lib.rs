//! Core data model for the soundfield mixing engine.
//!
//! This crate holds the types shared between the spatializer, the mixer
//! and the surrounding control API: sample formats, the listener and
//! source state, PCM buffers and their arena, and the global render
//! settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod buffer;
pub mod source;

pub use buffer::{Buffer, BufferArena, BufferHandle};
pub use source::{PlayState, QueueItem, QueueItemState, Source};

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Number of binary fraction bits in the 18.14 fixed-point playback cursor.
pub const FRACTION_BITS: u32 = 14;
/// Mask extracting the fractional part of the cursor.
pub const FRACTION_MASK: u32 = (1 << FRACTION_BITS) - 1;
/// Upper bound on the effective playback rate multiplier. Bounds how far
/// the resampler can read past the end of a buffer in one step.
pub const MAX_PITCH: u32 = 4;
/// Frames per mixing sub-block; the capacity of the accumulation buffers.
pub const MIX_BLOCK_FRAMES: usize = 1024;
/// Accumulator channels carried through mixing (quad is the widest layout).
pub const OUTPUT_CHANNELS: usize = 4;
/// Frames copied from the next queued buffer so interpolation can cross a
/// buffer boundary without reading out of bounds.
pub const LOOKAHEAD_FRAMES: usize = 16;

/// Interleaved PCM layout: bit depth times channel count.
///
/// Used both for source buffer payloads (mono/stereo) and for the final
/// output stream (all six).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
    Quad8,
    Quad16,
}

impl SampleFormat {
    /// Bytes per sample (1 for the 8-bit formats, 2 for the 16-bit ones).
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Mono8 | SampleFormat::Stereo8 | SampleFormat::Quad8 => 1,
            SampleFormat::Mono16 | SampleFormat::Stereo16 | SampleFormat::Quad16 => 2,
        }
    }

    /// Interleaved channels per frame.
    pub fn channels(self) -> usize {
        match self {
            SampleFormat::Mono8 | SampleFormat::Mono16 => 1,
            SampleFormat::Stereo8 | SampleFormat::Stereo16 => 2,
            SampleFormat::Quad8 | SampleFormat::Quad16 => 4,
        }
    }

    /// Bytes per interleaved frame.
    pub fn frame_size(self) -> usize {
        self.bytes_per_sample() * self.channels()
    }
}

/// Distance attenuation model applied to mono sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceModel {
    None,
    InverseDistance,
    InverseDistanceClamped,
    LinearDistance,
    LinearDistanceClamped,
    ExponentDistance,
    ExponentDistanceClamped,
}

/// Global mixing parameters, owned by the context and read-only to the
/// mixing core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Doppler effect strength; zero disables the Doppler shift entirely.
    pub doppler_factor: f32,
    /// Velocity-of-reference scale for the Doppler computation.
    pub doppler_velocity: f32,
    /// Speed of sound in the same units as source/listener velocities.
    pub speed_of_sound: f32,
    /// Active distance attenuation model.
    pub distance_model: DistanceModel,
    /// Output stream sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            doppler_factor: 1.0,
            doppler_velocity: 1.0,
            speed_of_sound: 343.3,
            distance_model: DistanceModel::InverseDistanceClamped,
            sample_rate: 44100,
        }
    }
}

/// Listener state: where the output is heard from.
///
/// Mutated only by the control API; the mixing core reads it.
#[derive(Debug, Clone)]
pub struct Listener {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Facing direction of the listener.
    pub forward: [f32; 3],
    /// Up direction completing the orientation.
    pub up: [f32; 3],
    /// Master gain applied to every source contribution.
    pub gain: f32,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
            forward: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            gain: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_queries() {
        assert_eq!(SampleFormat::Mono8.channels(), 1);
        assert_eq!(SampleFormat::Mono8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::Stereo16.channels(), 2);
        assert_eq!(SampleFormat::Stereo16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::Quad16.frame_size(), 8);
        assert_eq!(SampleFormat::Quad8.frame_size(), 4);
    }

    #[test]
    fn default_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.doppler_factor, 1.0);
        assert_eq!(settings.speed_of_sound, 343.3);
        assert_eq!(
            settings.distance_model,
            DistanceModel::InverseDistanceClamped
        );
        assert_eq!(settings.sample_rate, 44100);
    }

    #[test]
    fn default_listener_faces_negative_z() {
        let listener = Listener::default();
        assert_eq!(listener.forward, [0.0, 0.0, -1.0]);
        assert_eq!(listener.up, [0.0, 1.0, 0.0]);
        assert_eq!(listener.gain, 1.0);
    }

    #[test]
    fn error_display() {
        let err = Error::Audio("bad buffer".to_string());
        assert!(format!("{}", err).contains("Audio error: bad buffer"));

        let anyhow_err = Error::Other(anyhow::anyhow!("something went wrong"));
        assert!(format!("{}", anyhow_err).contains("something went wrong"));
    }
}
