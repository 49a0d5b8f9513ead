//! PCM buffers and the arena that owns them.
//!
//! Buffers are immutable once filled and may be referenced by several
//! sources at once. The arena hands out generation-checked handles so a
//! stale handle resolves to `None` instead of aliasing a new buffer.

use crate::{Error, SampleFormat};

/// Opaque, generation-checked reference to a buffer in a [`BufferArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

/// Immutable PCM payload plus the metadata needed to mix it.
///
/// Samples are stored as interleaved i16 regardless of the source bit
/// depth; 8-bit payloads are widened at fill time so the mix loop only
/// ever reads 16-bit data.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<i16>,
    format: SampleFormat,
    sample_rate: u32,
}

impl Buffer {
    /// Create a buffer from 16-bit interleaved samples.
    ///
    /// `format` must be `Mono16` or `Stereo16`; quad source data is not
    /// mixable.
    pub fn from_pcm16(data: Vec<i16>, format: SampleFormat, sample_rate: u32) -> Result<Self, Error> {
        match format {
            SampleFormat::Mono16 | SampleFormat::Stereo16 => {}
            _ => {
                return Err(Error::Audio(format!(
                    "unsupported 16-bit source format: {:?}",
                    format
                )))
            }
        }
        if data.len() % format.channels() != 0 {
            return Err(Error::Audio(
                "sample count is not a whole number of frames".to_string(),
            ));
        }
        Ok(Self {
            data,
            format,
            sample_rate,
        })
    }

    /// Create a buffer from unsigned 8-bit interleaved samples, widening
    /// them to i16.
    pub fn from_pcm8(data: &[u8], format: SampleFormat, sample_rate: u32) -> Result<Self, Error> {
        match format {
            SampleFormat::Mono8 | SampleFormat::Stereo8 => {}
            _ => {
                return Err(Error::Audio(format!(
                    "unsupported 8-bit source format: {:?}",
                    format
                )))
            }
        }
        if data.len() % format.channels() != 0 {
            return Err(Error::Audio(
                "sample count is not a whole number of frames".to_string(),
            ));
        }
        let widened = data.iter().map(|&s| ((s as i16) - 128) << 8).collect();
        Ok(Self {
            data: widened,
            format,
            sample_rate,
        })
    }

    /// Interleaved 16-bit sample data.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channels per frame.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Number of whole sample frames in the payload.
    pub fn frames(&self) -> usize {
        self.data.len() / self.format.channels()
    }

    /// Size of the original payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len() * self.format.bytes_per_sample()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    buffer: Option<Buffer>,
}

/// Typed arena owning every buffer in a context.
///
/// Lookup is O(1) by slot index; the generation check turns use-after-free
/// into a `None` the mixer treats as "no buffer bound".
#[derive(Debug, Default)]
pub struct BufferArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a buffer and return a handle to it.
    pub fn insert(&mut self, buffer: Buffer) -> BufferHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.buffer = Some(buffer);
            BufferHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                buffer: Some(buffer),
            });
            BufferHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Resolve a handle, returning `None` when the handle is stale or was
    /// never issued by this arena.
    pub fn get(&self, handle: BufferHandle) -> Option<&Buffer> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.buffer.as_ref()
    }

    /// Remove a buffer, invalidating every copy of its handle.
    pub fn remove(&mut self, handle: BufferHandle) -> Option<Buffer> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let buffer = slot.buffer.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(buffer)
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: Vec<i16>) -> Buffer {
        Buffer::from_pcm16(samples, SampleFormat::Mono16, 44100).unwrap()
    }

    #[test]
    fn pcm8_widening() {
        let buffer = Buffer::from_pcm8(&[0, 128, 255], SampleFormat::Mono8, 8000).unwrap();
        assert_eq!(buffer.data(), &[-32768, 0, 32512]);
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.byte_len(), 3);
    }

    #[test]
    fn stereo_frame_count() {
        let buffer =
            Buffer::from_pcm16(vec![1, 2, 3, 4], SampleFormat::Stereo16, 44100).unwrap();
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.byte_len(), 8);
    }

    #[test]
    fn quad_source_data_rejected() {
        assert!(Buffer::from_pcm16(vec![0; 8], SampleFormat::Quad16, 44100).is_err());
        assert!(Buffer::from_pcm8(&[0; 8], SampleFormat::Quad8, 44100).is_err());
    }

    #[test]
    fn ragged_frame_rejected() {
        assert!(Buffer::from_pcm16(vec![1, 2, 3], SampleFormat::Stereo16, 44100).is_err());
    }

    #[test]
    fn arena_insert_and_get() {
        let mut arena = BufferArena::new();
        let handle = arena.insert(mono(vec![1, 2, 3]));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(handle).unwrap().frames(), 3);
    }

    #[test]
    fn stale_handle_resolves_to_none() {
        let mut arena = BufferArena::new();
        let first = arena.insert(mono(vec![1]));
        arena.remove(first).unwrap();
        assert!(arena.get(first).is_none());

        // The slot is reused but the old handle stays dead.
        let second = arena.insert(mono(vec![2]));
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).unwrap().data(), &[2]);
        assert!(arena.remove(first).is_none());
    }
}
