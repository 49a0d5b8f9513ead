//! Buffer-queue advancement when a source exhausts its current buffer.

use engine_core::{PlayState, QueueItemState, Source};
use log::{debug, trace};

/// Advance `source` past its exhausted current buffer.
///
/// `cursor`/`cursor_frac` are the playback cursor as left by the mix loop
/// (zero when no buffer could be resolved) and `exhausted_frames` the
/// frame count of the buffer just consumed; the overflow past the end is
/// carried into the next buffer so no frame is dropped or doubled across
/// the boundary.
pub(crate) fn advance(source: &mut Source, cursor: u32, cursor_frac: u32, exhausted_frames: u32) {
    if source.queue.is_empty() {
        // Nothing to advance into; rest the source.
        source.state = PlayState::Stopped;
        source.active = false;
        return;
    }

    let looping = source.looping;
    let current = source.buffers_played as usize;

    if current < source.queue.len() - 1 {
        // More queued buffers remain: step to the next item.
        if !looping {
            for item in &mut source.queue[..=current] {
                item.state = QueueItemState::Processed;
            }
            source.buffers_processed += 1;
        }
        source.current_buffer = Some(source.queue[current + 1].handle);
        source.cursor = cursor.saturating_sub(exhausted_frames);
        source.cursor_frac = cursor_frac;
        source.buffers_played += 1;
        trace!(
            "source advanced to queue item {} (cursor carry {})",
            source.buffers_played,
            source.cursor
        );
    } else if !looping {
        // Last buffer consumed: this playback cycle is over.
        source.state = PlayState::Stopped;
        source.active = false;
        source.buffers_played = source.queue.len() as u32;
        source.buffers_processed = source.queue.len() as u32;
        for item in &mut source.queue {
            item.state = QueueItemState::Processed;
        }
        debug!("source exhausted its queue and stopped");
    } else {
        // Looping: restart the whole queue from the head.
        source.state = PlayState::Playing;
        source.active = true;
        source.buffers_played = 0;
        source.buffers_processed = 0;
        source.bytes_played = 0;
        for item in &mut source.queue {
            item.state = QueueItemState::Pending;
        }
        source.current_buffer = Some(source.queue[0].handle);
        source.cursor = cursor.saturating_sub(exhausted_frames);
        source.cursor_frac = cursor_frac;
        trace!("looping source restarted (cursor carry {})", source.cursor);
    }
}
