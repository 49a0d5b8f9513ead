//! Final conversion of the float accumulators into interleaved PCM.

use engine_core::{SampleFormat, OUTPUT_CHANNELS};

/// Double-precision bias (2^52 + 2^51) whose low mantissa bits hold the
/// rounded integer after an add, sidestepping the truncating float-to-int
/// cast.
const ROUND_BIAS: f64 = 6755399441055744.0;

/// Round to the nearest integer.
pub(crate) fn round_to_int(value: f32) -> i32 {
    let biased = value as f64 + ROUND_BIAS;
    biased.to_bits() as u32 as i32
}

/// Round and saturate into the signed 16-bit sample range.
pub(crate) fn saturate_i16(value: f32) -> i16 {
    round_to_int(value).max(-32768).min(32767) as i16
}

fn pack_u8(value: f32) -> u8 {
    // High byte of the 16-bit result, offset into unsigned 8-bit PCM.
    (((saturate_i16(value) >> 8) as i16) + 128) as u8
}

/// Sum dry and wet accumulators per channel and pack `frames` frames of
/// interleaved PCM into `out`. Returns the number of bytes written.
///
/// Mono output folds accumulator channels 0 and 1 together, matching the
/// mono send distribution of the spatializer.
pub(crate) fn write_block(
    dry: &[[f32; OUTPUT_CHANNELS]],
    wet: &[[f32; OUTPUT_CHANNELS]],
    format: SampleFormat,
    out: &mut [u8],
) -> usize {
    let frames = dry.len();
    match format {
        SampleFormat::Mono8 => {
            for i in 0..frames {
                out[i] = pack_u8(dry[i][0] + dry[i][1] + wet[i][0] + wet[i][1]);
            }
        }
        SampleFormat::Mono16 => {
            for i in 0..frames {
                let sample = saturate_i16(dry[i][0] + dry[i][1] + wet[i][0] + wet[i][1]);
                out[i * 2..i * 2 + 2].copy_from_slice(&sample.to_ne_bytes());
            }
        }
        SampleFormat::Stereo8 => {
            for i in 0..frames {
                for ch in 0..2 {
                    out[i * 2 + ch] = pack_u8(dry[i][ch] + wet[i][ch]);
                }
            }
        }
        SampleFormat::Stereo16 => {
            for i in 0..frames {
                for ch in 0..2 {
                    let sample = saturate_i16(dry[i][ch] + wet[i][ch]);
                    let at = (i * 2 + ch) * 2;
                    out[at..at + 2].copy_from_slice(&sample.to_ne_bytes());
                }
            }
        }
        SampleFormat::Quad8 => {
            for i in 0..frames {
                for ch in 0..4 {
                    out[i * 4 + ch] = pack_u8(dry[i][ch] + wet[i][ch]);
                }
            }
        }
        SampleFormat::Quad16 => {
            for i in 0..frames {
                for ch in 0..4 {
                    let sample = saturate_i16(dry[i][ch] + wet[i][ch]);
                    let at = (i * 4 + ch) * 2;
                    out[at..at + 2].copy_from_slice(&sample.to_ne_bytes());
                }
            }
        }
    }
    frames * format.frame_size()
}
