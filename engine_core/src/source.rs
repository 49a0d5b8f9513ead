//! Source state: spatial parameters, playback cursor and buffer queue.

use log::debug;

use crate::BufferHandle;

/// Playback state of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
}

/// Consumption state of one queued buffer reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueItemState {
    /// Not yet fully consumed (or due to be revisited by a looping source).
    Pending,
    /// Fully consumed and reportable as done to the control API.
    Processed,
}

/// One entry in a source's ordered buffer queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueItem {
    pub handle: BufferHandle,
    pub state: QueueItemState,
}

/// An independently positioned, independently timed sound source.
///
/// The control API owns every field except the playback cursor and the
/// queue-progress bookkeeping, which the mixer advances while it holds
/// the context.
#[derive(Debug, Clone)]
pub struct Source {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Facing direction used for cone attenuation.
    pub direction: [f32; 3],
    pub gain: f32,
    pub min_gain: f32,
    pub max_gain: f32,
    /// Distance at which the source is heard at full volume.
    pub ref_distance: f32,
    pub max_distance: f32,
    pub rolloff: f32,
    /// Cone inner angle in degrees; inside it the cone gain is 1.
    pub inner_angle: f32,
    /// Cone outer angle in degrees; beyond it the cone gain is `outer_gain`.
    pub outer_angle: f32,
    pub outer_gain: f32,
    pub pitch: f32,
    /// When set, `position` is already listener-relative.
    pub head_relative: bool,
    pub looping: bool,
    pub state: PlayState,
    /// Cleared when the source stops on queue exhaustion.
    pub active: bool,
    /// Integer sample-frame position within the current buffer.
    pub cursor: u32,
    /// Sub-sample position, `0 <= cursor_frac < 2^FRACTION_BITS`.
    pub cursor_frac: u32,
    /// Buffer currently being read, if any.
    pub current_buffer: Option<BufferHandle>,
    /// Ordered queue of buffers to play; `buffers_played` indexes the
    /// current item.
    pub queue: Vec<QueueItem>,
    pub buffers_played: u32,
    pub buffers_processed: u32,
    /// Byte-position bookkeeping maintained by the control API; the mixer
    /// only resets it on loop restart.
    pub bytes_played: u64,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, 0.0],
            gain: 1.0,
            min_gain: 0.0,
            max_gain: 1.0,
            ref_distance: 1.0,
            max_distance: f32::MAX,
            rolloff: 1.0,
            inner_angle: 360.0,
            outer_angle: 360.0,
            outer_gain: 0.0,
            pitch: 1.0,
            head_relative: false,
            looping: false,
            state: PlayState::Stopped,
            active: false,
            cursor: 0,
            cursor_frac: 0,
            current_buffer: None,
            queue: Vec::new(),
            buffers_played: 0,
            buffers_processed: 0,
            bytes_played: 0,
        }
    }
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer to the playback queue.
    pub fn queue_buffer(&mut self, handle: BufferHandle) {
        self.queue.push(QueueItem {
            handle,
            state: QueueItemState::Pending,
        });
        if self.current_buffer.is_none() {
            self.current_buffer = Some(handle);
        }
    }

    /// Pop the front queue item if it has been fully processed, adjusting
    /// the progress counters so the remaining indices stay valid.
    pub fn unqueue_processed(&mut self) -> Option<BufferHandle> {
        let front = self.queue.first()?;
        if front.state != QueueItemState::Processed {
            return None;
        }
        let item = self.queue.remove(0);
        self.buffers_played = self.buffers_played.saturating_sub(1);
        self.buffers_processed = self.buffers_processed.saturating_sub(1);
        Some(item.handle)
    }

    /// Start playback from the head of the queue.
    pub fn play(&mut self) {
        self.rewind();
        self.state = PlayState::Playing;
        self.active = true;
        debug!("source started, {} buffer(s) queued", self.queue.len());
    }

    /// Pause playback, keeping the cursor in place.
    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
        }
    }

    /// Resume a paused source.
    pub fn resume(&mut self) {
        if self.state == PlayState::Paused {
            self.state = PlayState::Playing;
        }
    }

    /// Stop playback. The cursor is left where it was; `rewind` or `play`
    /// resets it.
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.active = false;
        debug!("source stopped");
    }

    /// Reset the cursor and queue bookkeeping to the head of the queue,
    /// marking every item pending again.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.cursor_frac = 0;
        self.buffers_played = 0;
        self.buffers_processed = 0;
        self.bytes_played = 0;
        for item in &mut self.queue {
            item.state = QueueItemState::Pending;
        }
        self.current_buffer = self.queue.first().map(|item| item.handle);
    }
}
