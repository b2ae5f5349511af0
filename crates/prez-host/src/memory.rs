//! Bounds-checked access to guest linear memory.
//!
//! The guest may grow its memory between any two host calls, so a
//! [`GuestMemory`] is built fresh from the live buffer on every call and never
//! cached.  Every address/length pair the guest supplies is validated against
//! the current size before a single byte is touched.

use std::ops::Range;

use prez_types::layout::WORD_SIZE;

use crate::error::{BridgeError, BridgeResult};

/// A borrowed window over the guest's linear memory for one host call.
pub struct GuestMemory<'a> {
    data: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Current memory size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Validate `base..base + len` against the current size.
    pub fn range(&self, base: u32, len: u32) -> BridgeResult<Range<usize>> {
        let end = base as u64 + len as u64;
        if end > self.data.len() as u64 {
            return Err(BridgeError::OutOfBounds {
                base,
                len,
                memory_size: self.data.len(),
            });
        }
        Ok(base as usize..end as usize)
    }

    pub fn view(&self, base: u32, len: u32) -> BridgeResult<&[u8]> {
        let range = self.range(base, len)?;
        Ok(&self.data[range])
    }

    pub fn view_mut(&mut self, base: u32, len: u32) -> BridgeResult<&mut [u8]> {
        let range = self.range(base, len)?;
        Ok(&mut self.data[range])
    }

    /// A word-granular view; `base` and `len` must both be multiples of four.
    pub fn words(&mut self, base: u32, len: u32) -> BridgeResult<Words<'_>> {
        if base % WORD_SIZE != 0 || len % WORD_SIZE != 0 {
            return Err(BridgeError::Misaligned { base, len });
        }
        let bytes = self.view_mut(base, len)?;
        Ok(Words { bytes })
    }

    pub fn read_u32(&self, addr: u32) -> BridgeResult<u32> {
        let bytes = self.view(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&self, addr: u32) -> BridgeResult<i32> {
        self.read_u32(addr).map(|w| w as i32)
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> BridgeResult<()> {
        self.view_mut(addr, 4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_i32(&mut self, addr: u32, value: i32) -> BridgeResult<()> {
        self.write_u32(addr, value as u32)
    }

    /// Write consecutive little-endian `f32`s starting at `addr`.
    ///
    /// The whole block is checked before anything is written.
    pub fn write_f32s(&mut self, addr: u32, values: &[f32]) -> BridgeResult<()> {
        let len = (values.len() * 4) as u32;
        let out = self.view_mut(addr, len)?;
        for (chunk, v) in out.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }
}

/// A validated, word-aligned region of guest memory.
pub struct Words<'a> {
    bytes: &'a mut [u8],
}

impl Words<'_> {
    /// Number of words in the view.
    pub fn len(&self) -> usize {
        self.bytes.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Word at `index`.  Panics past the end of the view, which the caller
    /// sized.
    pub fn get(&self, index: usize) -> u32 {
        let at = index * 4;
        u32::from_le_bytes([
            self.bytes[at],
            self.bytes[at + 1],
            self.bytes[at + 2],
            self.bytes[at + 3],
        ])
    }

    pub fn set(&mut self, index: usize, value: u32) {
        let at = index * 4;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}
