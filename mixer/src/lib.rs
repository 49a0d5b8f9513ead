//! The sample-mixing core of soundfield.
//!
//! Combines every playing source into one interleaved PCM stream:
//! spatial gains from the `spatial` crate, fractional-rate resampling,
//! buffer-queue advancement and final quantization. The mix entry point
//! is meant to be called synchronously from an output transport's write
//! callback; it never blocks and allocates nothing in steady state.

use std::sync::{Arc, Mutex, MutexGuard};

use engine_core::{
    Buffer, BufferArena, BufferHandle, Listener, RenderSettings, SampleFormat, Source,
    MIX_BLOCK_FRAMES, OUTPUT_CHANNELS,
};
use log::trace;

mod quantize;
mod queue;
mod resample;

/// Dry/wet accumulation buffers, reused across mix calls.
struct Scratch {
    dry: Box<[[f32; OUTPUT_CHANNELS]]>,
    wet: Box<[[f32; OUTPUT_CHANNELS]]>,
}

impl Scratch {
    fn new() -> Self {
        Self {
            dry: vec![[0.0; OUTPUT_CHANNELS]; MIX_BLOCK_FRAMES].into_boxed_slice(),
            wet: vec![[0.0; OUTPUT_CHANNELS]; MIX_BLOCK_FRAMES].into_boxed_slice(),
        }
    }
}

/// One mixing context: global settings, the listener, every source and
/// the buffer arena they reference.
///
/// An explicit instance rather than process-wide state, so several
/// contexts can drive several output devices independently.
pub struct Context {
    pub settings: RenderSettings,
    pub listener: Listener,
    pub sources: Vec<Source>,
    pub buffers: BufferArena,
    scratch: Scratch,
}

impl Context {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            listener: Listener::default(),
            sources: Vec::new(),
            buffers: BufferArena::new(),
            scratch: Scratch::new(),
        }
    }

    /// Store a buffer and return its handle.
    pub fn load_buffer(&mut self, buffer: Buffer) -> BufferHandle {
        self.buffers.insert(buffer)
    }

    /// Add a source, returning its index.
    pub fn add_source(&mut self, source: Source) -> usize {
        self.sources.push(source);
        self.sources.len() - 1
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

/// Fill `out` with interleaved PCM in `format`, advancing every playing
/// source by exactly the number of frames produced.
///
/// A byte count that is not a multiple of the frame size is truncated to
/// the largest whole number of frames; trailing bytes are left untouched.
pub fn mix(ctx: &mut Context, out: &mut [u8], format: SampleFormat) {
    let frame_size = format.frame_size();
    let total = out.len() / frame_size;
    trace!("mixing {} frames of {:?}", total, format);

    let mut done = 0usize;
    while done < total {
        let todo = (total - done).min(MIX_BLOCK_FRAMES);
        let Context {
            settings,
            listener,
            sources,
            buffers,
            scratch,
        } = ctx;

        for frame in &mut scratch.dry[..todo] {
            *frame = [0.0; OUTPUT_CHANNELS];
        }
        for frame in &mut scratch.wet[..todo] {
            *frame = [0.0; OUTPUT_CHANNELS];
        }

        for source in sources.iter_mut() {
            resample::mix_source(
                settings,
                listener,
                buffers,
                source,
                &mut scratch.dry[..todo],
                &mut scratch.wet[..todo],
                format,
            );
        }

        let at = done * frame_size;
        quantize::write_block(&scratch.dry[..todo], &scratch.wet[..todo], format, &mut out[at..]);
        done += todo;
    }
}

/// A context behind the suspend lock shared with the control path.
///
/// One mix call is one critical section; control-path mutation takes the
/// same lock through [`SharedContext::suspend`], so source and buffer
/// state never changes underneath a running mix.
#[derive(Clone)]
pub struct SharedContext {
    inner: Arc<Mutex<Context>>,
}

impl SharedContext {
    pub fn new(context: Context) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    /// Mix directly from an output callback, holding the lock for the
    /// duration of the call.
    pub fn mix(&self, out: &mut [u8], format: SampleFormat) {
        let mut ctx = self.inner.lock().unwrap();
        mix(&mut ctx, out, format);
    }

    /// Suspend mixing for the lifetime of the returned guard; the control
    /// path uses this to mutate context state safely.
    pub fn suspend(&self) -> MutexGuard<'_, Context> {
        self.inner.lock().unwrap()
    }
}
