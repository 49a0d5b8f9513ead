//! Per-source spatial parameter computation.

use engine_core::{DistanceModel, Listener, RenderSettings, SampleFormat, Source, OUTPUT_CHANNELS};

use crate::math::{cross, dot, normalize, transform};

/// Gains and playback rate computed for one source against the current
/// listener. `dry` is the direct path, `wet` the effect path, both sized
/// to the widest output layout; channels beyond the active layout stay
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    pub dry: [f32; OUTPUT_CHANNELS],
    pub wet: [f32; OUTPUT_CHANNELS],
    pub pitch: f32,
}

/// Scalar attenuation for a source at `distance` under the given model.
///
/// Clamped variants clamp the distance into `[min_dist, max_dist]` first;
/// a malformed range (`max_dist < min_dist`) bypasses attenuation
/// entirely. The linear models additionally cap the distance at
/// `max_dist` even unclamped.
pub fn distance_attenuation(
    model: DistanceModel,
    distance: f32,
    min_dist: f32,
    max_dist: f32,
    rolloff: f32,
) -> f32 {
    match model {
        DistanceModel::None => 1.0,
        DistanceModel::InverseDistance => inverse(distance, min_dist, rolloff),
        DistanceModel::InverseDistanceClamped => {
            if max_dist < min_dist {
                1.0
            } else {
                inverse(distance.max(min_dist).min(max_dist), min_dist, rolloff)
            }
        }
        DistanceModel::LinearDistance => linear(distance.min(max_dist), min_dist, max_dist, rolloff),
        DistanceModel::LinearDistanceClamped => {
            if max_dist < min_dist {
                1.0
            } else {
                linear(
                    distance.max(min_dist).min(max_dist),
                    min_dist,
                    max_dist,
                    rolloff,
                )
            }
        }
        DistanceModel::ExponentDistance => exponent(distance, min_dist, rolloff),
        DistanceModel::ExponentDistanceClamped => {
            if max_dist < min_dist {
                1.0
            } else {
                exponent(distance.max(min_dist).min(max_dist), min_dist, rolloff)
            }
        }
    }
}

fn inverse(distance: f32, min_dist: f32, rolloff: f32) -> f32 {
    if min_dist > 0.0 {
        let denom = min_dist + rolloff * (distance - min_dist);
        if denom > 0.0 {
            return min_dist / denom;
        }
    }
    1.0
}

fn linear(distance: f32, min_dist: f32, max_dist: f32, rolloff: f32) -> f32 {
    if max_dist != min_dist {
        1.0 - rolloff * (distance - min_dist) / (max_dist - min_dist)
    } else {
        1.0
    }
}

fn exponent(distance: f32, min_dist: f32, rolloff: f32) -> f32 {
    if distance > 0.0 && min_dist > 0.0 {
        (distance / min_dist).powf(-rolloff)
    } else {
        1.0
    }
}

/// Compute the dry/wet channel sends and pitch multiplier for one source.
///
/// Only mono buffers are spatialized; multi-channel buffers play at unity
/// pan with source and listener gain only and the source's raw pitch.
pub fn source_params(
    settings: &RenderSettings,
    listener: &Listener,
    source: &Source,
    mono: bool,
    output: SampleFormat,
) -> SourceParams {
    let mut dry = [0.0f32; OUTPUT_CHANNELS];
    let mut wet = [0.0f32; OUTPUT_CHANNELS];
    let listener_gain = listener.gain;

    if !mono {
        for channel in &mut dry {
            *channel = source.gain * listener_gain;
        }
        return SourceParams {
            dry,
            wet,
            pitch: source.pitch,
        };
    }

    // Translate to listener-relative space.
    let mut position = source.position;
    if !source.head_relative {
        position[0] -= listener.position[0];
        position[1] -= listener.position[1];
        position[2] -= listener.position[2];
    }

    // Distance attenuation.
    let distance = dot(position, position).sqrt();
    let attenuation = distance_attenuation(
        settings.distance_model,
        distance,
        source.ref_distance,
        source.max_distance,
        source.rolloff,
    );

    // Source gain and attenuation, clamped into the source's gain range.
    let dry_mix = (source.gain * attenuation)
        .min(source.max_gain)
        .max(source.min_gain);
    let wet_mix = 0.0f32.min(source.max_gain).max(source.min_gain);

    // Directional sound cone.
    let direction = normalize(source.direction);
    let to_listener = normalize([-position[0], -position[1], -position[2]]);
    let angle = dot(direction, to_listener).acos().to_degrees();
    let cone_gain = if angle >= source.inner_angle && angle <= source.outer_angle {
        1.0 + (source.outer_gain - 1.0) * (angle - source.inner_angle)
            / (source.outer_angle - source.inner_angle)
    } else if angle > source.outer_angle {
        source.outer_gain
    } else {
        1.0
    };

    // Doppler shift from the velocity projections along the line between
    // source and listener, with both projections kept strictly inside the
    // singularity of the rate formula.
    let pitch = if settings.doppler_factor != 0.0 {
        let max_velocity =
            (settings.doppler_velocity * settings.speed_of_sound) / settings.doppler_factor;
        let mut listener_proj = dot(listener.velocity, to_listener);
        let mut source_proj = dot(source.velocity, to_listener);

        if source_proj >= max_velocity {
            source_proj = max_velocity - 1.0;
        } else if source_proj <= -max_velocity {
            source_proj = -max_velocity + 1.0;
        }
        if listener_proj >= max_velocity {
            listener_proj = max_velocity - 1.0;
        } else if listener_proj <= -max_velocity {
            listener_proj = -max_velocity + 1.0;
        }

        let reference = settings.speed_of_sound * settings.doppler_velocity;
        source.pitch * (reference - settings.doppler_factor * listener_proj)
            / (reference - settings.doppler_factor * source_proj)
    } else {
        source.pitch
    };

    // Orthonormal listener-space basis: right, up, back.
    let right = normalize(cross(listener.forward, listener.up));
    let up = normalize(listener.up);
    let at = normalize(listener.forward);
    let basis = [
        [right[0], up[0], -at[0]],
        [right[1], up[1], -at[1]],
        [right[2], up[2], -at[2]],
    ];
    let local = transform(position, basis);

    // Normalized left/right and front/back pannings, centered when the
    // source sits on the listener.
    let (pan_lr, pan_fb) = if distance != 0.0 {
        let unit = normalize(local);
        (0.5 + 0.5 * unit[0], 0.5 + 0.5 * unit[2])
    } else {
        (0.5, 0.5)
    };

    // Equal-power distribution across the output layout.
    let dry_scale = cone_gain * listener_gain * dry_mix;
    let wet_scale = listener_gain * wet_mix;
    match output {
        SampleFormat::Mono8 | SampleFormat::Mono16 => {
            dry[0] = dry_scale;
            dry[1] = dry_scale;
            wet[0] = wet_scale;
            wet[1] = wet_scale;
        }
        SampleFormat::Stereo8 | SampleFormat::Stereo16 => {
            dry[0] = dry_scale * (1.0 - pan_lr).sqrt();
            dry[1] = dry_scale * pan_lr.sqrt();
            wet[0] = wet_scale * (1.0 - pan_lr).sqrt();
            wet[1] = wet_scale * pan_lr.sqrt();
        }
        SampleFormat::Quad8 | SampleFormat::Quad16 => {
            dry[0] = dry_scale * ((1.0 - pan_lr) * (1.0 - pan_fb)).sqrt();
            dry[1] = dry_scale * (pan_lr * (1.0 - pan_fb)).sqrt();
            dry[2] = dry_scale * ((1.0 - pan_lr) * pan_fb).sqrt();
            dry[3] = dry_scale * (pan_lr * pan_fb).sqrt();
            wet[0] = wet_scale * ((1.0 - pan_lr) * (1.0 - pan_fb)).sqrt();
            wet[1] = wet_scale * (pan_lr * (1.0 - pan_fb)).sqrt();
            wet[2] = wet_scale * ((1.0 - pan_lr) * pan_fb).sqrt();
            wet[3] = wet_scale * (pan_lr * pan_fb).sqrt();
        }
    }

    SourceParams { dry, wet, pitch }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_source() -> Source {
        Source {
            head_relative: true,
            ..Source::default()
        }
    }

    #[test]
    fn inverse_clamped_monotonic_within_range() {
        let mut last = f32::MAX;
        for step in 0..=20 {
            let distance = 1.0 + step as f32 * (9.0 / 20.0);
            let atten = distance_attenuation(
                DistanceModel::InverseDistanceClamped,
                distance,
                1.0,
                10.0,
                1.0,
            );
            assert!(atten <= last, "attenuation rose at distance {}", distance);
            last = atten;
        }
    }

    #[test]
    fn inverse_clamped_saturates_outside_range() {
        let inside = distance_attenuation(DistanceModel::InverseDistanceClamped, 10.0, 1.0, 10.0, 1.0);
        let beyond = distance_attenuation(DistanceModel::InverseDistanceClamped, 100.0, 1.0, 10.0, 1.0);
        assert_eq!(inside, beyond);

        let at_min = distance_attenuation(DistanceModel::InverseDistanceClamped, 1.0, 1.0, 10.0, 1.0);
        let closer = distance_attenuation(DistanceModel::InverseDistanceClamped, 0.1, 1.0, 10.0, 1.0);
        assert_eq!(at_min, closer);
        assert_eq!(at_min, 1.0);
    }

    #[test]
    fn malformed_range_bypasses_attenuation() {
        for model in [
            DistanceModel::InverseDistanceClamped,
            DistanceModel::LinearDistanceClamped,
            DistanceModel::ExponentDistanceClamped,
        ] {
            assert_eq!(distance_attenuation(model, 50.0, 10.0, 2.0, 1.0), 1.0);
        }
    }

    #[test]
    fn linear_reaches_silence_at_max_distance() {
        let atten = distance_attenuation(DistanceModel::LinearDistance, 10.0, 0.0, 10.0, 1.0);
        assert!(atten.abs() < 1e-6);
        // Distances past max are capped, not driven negative.
        let past = distance_attenuation(DistanceModel::LinearDistance, 100.0, 0.0, 10.0, 1.0);
        assert!(past.abs() < 1e-6);
    }

    #[test]
    fn exponent_model_power_law() {
        let atten = distance_attenuation(DistanceModel::ExponentDistance, 4.0, 1.0, 10.0, 2.0);
        assert!((atten - 1.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn centered_source_pans_equally() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        let source = centered_source();
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);

        assert!((params.dry[0] - params.dry[1]).abs() < 1e-6);
        assert!((params.dry[0] - 0.5f32.sqrt()).abs() < 1e-6);
        assert_eq!(params.wet, [0.0; 4]);
    }

    #[test]
    fn hard_right_source_silences_left() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        let source = Source {
            head_relative: true,
            position: [2.0, 0.0, 0.0],
            ref_distance: 2.0,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);

        assert!(params.dry[0].abs() < 1e-6);
        assert!((params.dry[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn multichannel_source_bypasses_spatialization() {
        let settings = RenderSettings::default();
        let listener = Listener {
            gain: 0.5,
            ..Listener::default()
        };
        let source = Source {
            position: [100.0, 0.0, 0.0],
            gain: 0.8,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, false, SampleFormat::Stereo16);

        for channel in params.dry {
            assert!((channel - 0.4).abs() < 1e-6);
        }
        assert_eq!(params.wet, [0.0; 4]);
        assert_eq!(params.pitch, source.pitch);
    }

    #[test]
    fn doppler_disabled_passes_pitch_through() {
        let settings = RenderSettings {
            doppler_factor: 0.0,
            ..RenderSettings::default()
        };
        let listener = Listener::default();
        let source = Source {
            head_relative: true,
            position: [0.0, 0.0, -5.0],
            velocity: [0.0, 0.0, 100.0],
            pitch: 1.5,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);
        assert_eq!(params.pitch, 1.5);
    }

    #[test]
    fn approaching_source_raises_pitch() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        // Source ahead of the listener, moving toward it.
        let source = Source {
            head_relative: true,
            position: [0.0, 0.0, -5.0],
            velocity: [0.0, 0.0, 50.0],
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);
        assert!(params.pitch > 1.0);

        // Receding instead.
        let receding = Source {
            velocity: [0.0, 0.0, -50.0],
            ..source
        };
        let params = source_params(&settings, &listener, &receding, true, SampleFormat::Stereo16);
        assert!(params.pitch < 1.0);
    }

    #[test]
    fn doppler_velocity_clamp_avoids_singularity() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        let source = Source {
            head_relative: true,
            position: [0.0, 0.0, -5.0],
            velocity: [0.0, 0.0, 10000.0],
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);
        assert!(params.pitch.is_finite());
        assert!(params.pitch > 0.0);
    }

    #[test]
    fn cone_attenuates_outside_outer_angle() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        // Source ahead, facing away from the listener: angle is 180.
        let mut source = Source {
            head_relative: true,
            position: [0.0, 0.0, -5.0],
            direction: [0.0, 0.0, -1.0],
            inner_angle: 30.0,
            outer_angle: 90.0,
            outer_gain: 0.25,
            ref_distance: 5.0,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Mono16);
        assert!((params.dry[0] - 0.25).abs() < 1e-6);

        // Facing the listener head-on: full cone gain.
        source.direction = [0.0, 0.0, 1.0];
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Mono16);
        assert!((params.dry[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cone_interpolates_between_angles() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        // Angle between facing and to-listener is 90 degrees, the midpoint
        // of [60, 120]: cone gain is halfway between 1 and outer_gain.
        let source = Source {
            head_relative: true,
            position: [0.0, 0.0, -5.0],
            direction: [1.0, 0.0, 0.0],
            inner_angle: 60.0,
            outer_angle: 120.0,
            outer_gain: 0.5,
            ref_distance: 5.0,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Mono16);
        assert!((params.dry[0] - 0.75).abs() < 1e-4);
    }

    #[test]
    fn degenerate_direction_defaults_cone_to_unity() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        let source = Source {
            head_relative: true,
            position: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, 0.0],
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Stereo16);
        assert!(params.dry[0].is_finite());
        assert!((params.dry[0] - 0.5f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn quad_panning_splits_quadrants() {
        let settings = RenderSettings::default();
        let listener = Listener::default();
        // Front-right of the listener (forward is -Z, so negative Z is front).
        let source = Source {
            head_relative: true,
            position: [1.0, 0.0, -1.0],
            ref_distance: 2.0,
            ..Source::default()
        };
        let params = source_params(&settings, &listener, &source, true, SampleFormat::Quad16);

        // Front-right dominates; back-left is weakest.
        assert!(params.dry[1] > params.dry[0]);
        assert!(params.dry[1] > params.dry[3]);
        assert!(params.dry[2] < params.dry[1]);
    }
}
