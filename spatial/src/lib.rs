//! Spatial audio processing for soundfield.
//!
//! This crate turns listener and source state into per-output-channel
//! gain sends and a playback-rate multiplier: distance attenuation,
//! directional cones, Doppler shift and equal-power panning.

pub mod math;
mod params;

pub use params::{distance_attenuation, source_params, SourceParams};
