//! Per-source streaming resampler: walks queued buffer data at a
//! fractional rate, interpolates, and accumulates into the dry/wet
//! mixing buffers.

use engine_core::{
    BufferArena, Listener, PlayState, RenderSettings, SampleFormat, Source, FRACTION_BITS,
    FRACTION_MASK, LOOKAHEAD_FRAMES, MAX_PITCH, OUTPUT_CHANNELS,
};

use crate::quantize::round_to_int;
use crate::queue;

/// Mix one source's contribution into the current sub-block.
///
/// Keeps consuming queued buffers while the source stays playing and the
/// sub-block has room, advancing the queue whenever the current buffer is
/// exhausted (or cannot be resolved, which counts as exhausted).
pub(crate) fn mix_source(
    settings: &RenderSettings,
    listener: &Listener,
    buffers: &BufferArena,
    source: &mut Source,
    dry: &mut [[f32; OUTPUT_CHANNELS]],
    wet: &mut [[f32; OUTPUT_CHANNELS]],
    output: SampleFormat,
) {
    let block = dry.len();
    let mut j = 0usize;
    // Bounds the queue walk when every handle in a looping queue is stale.
    let mut fruitless = 0usize;

    while source.state == PlayState::Playing && j < block {
        let mut frames = 0u32;
        let mut cursor = 0u32;
        let mut cursor_frac = 0u32;

        let resolved = source.current_buffer.and_then(|handle| buffers.get(handle));
        if let Some(buffer) = resolved {
            fruitless = 0;
            let channels = buffer.channels();
            frames = buffer.frames() as u32;
            cursor = source.cursor;
            cursor_frac = source.cursor_frac;

            let params =
                spatial::source_params(settings, listener, source, channels == 1, output);
            let pitch = params.pitch * buffer.sample_rate() as f32 / settings.sample_rate as f32;

            // 18.14 fixed-point step, clamped to the highest mixable rate.
            let increment = round_to_int(pitch * (1u32 << FRACTION_BITS) as f32)
                .clamp(1, (MAX_PITCH << FRACTION_BITS) as i32) as u32;

            // Output samples until the cursor runs past the end of the
            // buffer plus its read-ahead headroom, capped by the room left
            // in this sub-block.
            let end = (frames as u64 + MAX_PITCH as u64) << FRACTION_BITS;
            let at = ((cursor as u64) << FRACTION_BITS) + cursor_frac as u64;
            let budget = ((end.saturating_sub(at) / increment as u64) as usize).min(block - j);

            // Lookahead copied from the buffer that follows (the queue head
            // for a looping source at its last item) so interpolation stays
            // continuous across the boundary.
            let mut ahead = [0i16; LOOKAHEAD_FRAMES * 2];
            let follow = source
                .queue
                .get(source.buffers_played as usize + 1)
                .or_else(|| source.looping.then(|| source.queue.first()).flatten());
            if let Some(item) = follow {
                if let Some(next) = buffers.get(item.handle) {
                    let n = (LOOKAHEAD_FRAMES * channels).min(next.data().len());
                    ahead[..n].copy_from_slice(&next.data()[..n]);
                }
            }

            let data = buffer.data();
            let fetch = |frame: usize, ch: usize| -> i32 {
                let idx = frame * channels + ch;
                if idx < data.len() {
                    data[idx] as i32
                } else if idx - data.len() < ahead.len() {
                    ahead[idx - data.len()] as i32
                } else {
                    0
                }
            };
            // First-order interpolation in integer math on the native
            // 16-bit samples; the result stays within i16 range.
            let interp = |a: i32, b: i32, frac: i32| -> f32 {
                ((a * ((1 << FRACTION_BITS) - frac) + b * frac) >> FRACTION_BITS) as f32
            };

            let base = cursor as usize;
            let mut frac_cursor = cursor_frac;
            for _ in 0..budget {
                let k = base + (frac_cursor >> FRACTION_BITS) as usize;
                let frac = (frac_cursor & FRACTION_MASK) as i32;
                if channels == 1 {
                    let value = interp(fetch(k, 0), fetch(k + 1, 0), frac);
                    for ch in 0..OUTPUT_CHANNELS {
                        dry[j][ch] += value * params.dry[ch];
                        wet[j][ch] += value * params.wet[ch];
                    }
                } else {
                    for ch in 0..2 {
                        let value = interp(fetch(k, ch), fetch(k + 1, ch), frac);
                        dry[j][ch] += value * params.dry[ch];
                        wet[j][ch] += value * params.wet[ch];
                    }
                }
                frac_cursor += increment;
                j += 1;
            }

            // Fold whole-sample overflow back into the integer cursor.
            cursor += frac_cursor >> FRACTION_BITS;
            cursor_frac = frac_cursor & FRACTION_MASK;
            source.cursor = cursor;
            source.cursor_frac = cursor_frac;
        } else {
            fruitless += 1;
            if fruitless > source.queue.len() + 1 {
                break;
            }
        }

        if resolved.is_none() || cursor >= frames {
            queue::advance(source, cursor, cursor_frac, frames);
        }
    }
}
