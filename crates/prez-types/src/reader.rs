//! Consumer half of the Event Buffer protocol.
//!
//! The host is the only writer of `produced`; the guest is the only writer of
//! `consumed`.  A reader drains every slot between the two counters in order
//! and then publishes the new `consumed`, which hands those slots back to the
//! host.  [`EventReader`] implements that half over a plain byte slice so the
//! same logic serves guest-side tooling and host tests.

use crate::error::{LayoutError, LayoutResult};
use crate::event::{Event, Record};
use crate::layout::*;

/// Reads events out of an Event Buffer image.
pub struct EventReader<'a> {
    memory: &'a mut [u8],
    header: usize,
    event_size: u32,
}

impl<'a> EventReader<'a> {
    /// Attach to the buffer whose header starts at `header_addr`.
    pub fn new(memory: &'a mut [u8], header_addr: u32, event_size: u32) -> LayoutResult<Self> {
        if !is_valid_event_size(event_size) {
            return Err(LayoutError::InvalidEventSize(event_size));
        }
        let header = header_addr as usize;
        let needed = header + HEADER_BYTES as usize;
        if needed > memory.len() {
            return Err(LayoutError::BufferTooSmall {
                needed,
                available: memory.len(),
            });
        }
        Ok(Self {
            memory,
            header,
            event_size,
        })
    }

    /// Write a fresh header: both counters zero, the given capacity.
    ///
    /// This is what a guest does before calling `input.setup`.
    pub fn format(
        memory: &'a mut [u8],
        header_addr: u32,
        capacity: u32,
        event_size: u32,
    ) -> LayoutResult<Self> {
        let total = buffer_bytes(capacity, event_size)
            .ok_or(LayoutError::InvalidEventSize(event_size))? as usize;
        let needed = header_addr as usize + total;
        if needed > memory.len() {
            return Err(LayoutError::BufferTooSmall {
                needed,
                available: memory.len(),
            });
        }
        let mut reader = Self::new(memory, header_addr, event_size)?;
        reader.set_word(HEADER_PRODUCED, 0);
        reader.set_word(HEADER_CONSUMED, 0);
        reader.set_word(HEADER_CAPACITY, capacity);
        Ok(reader)
    }

    pub fn produced(&self) -> u32 {
        self.word(HEADER_PRODUCED)
    }

    pub fn consumed(&self) -> u32 {
        self.word(HEADER_CONSUMED)
    }

    pub fn capacity(&self) -> u32 {
        self.word(HEADER_CAPACITY)
    }

    /// Events written by the host and not yet drained.
    pub fn pending(&self) -> LayoutResult<u32> {
        let pending = self.produced().wrapping_sub(self.consumed());
        let capacity = self.capacity();
        if pending > capacity {
            return Err(LayoutError::Corrupt { pending, capacity });
        }
        Ok(pending)
    }

    /// Decode the slot with absolute sequence number `seq` without consuming it.
    pub fn peek(&self, seq: u32) -> LayoutResult<Record> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(LayoutError::Corrupt {
                pending: self.produced().wrapping_sub(self.consumed()),
                capacity,
            });
        }
        let slot = self.slot_offset(seq % capacity)?;
        let words = (self.event_size / WORD_SIZE) as usize;
        let mut row = Vec::with_capacity(words);
        for i in 0..words {
            row.push(read_u32(&*self.memory, slot + i * WORD_SIZE as usize));
        }
        let kind = row[SLOT_KIND as usize];
        let timestamp = row[SLOT_TIMESTAMP as usize];
        let event = Event::decode(kind, &row[SLOT_PREFIX_WORDS as usize..])?;
        Ok(Record { timestamp, event })
    }

    /// Decode every pending event in order and mark them consumed.
    pub fn drain(&mut self) -> LayoutResult<Vec<Record>> {
        let pending = self.pending()?;
        let start = self.consumed();
        let mut out = Vec::with_capacity(pending as usize);
        for i in 0..pending {
            out.push(self.peek(start.wrapping_add(i))?);
        }
        self.set_word(HEADER_CONSUMED, start.wrapping_add(pending));
        Ok(out)
    }

    fn slot_offset(&self, index: u32) -> LayoutResult<usize> {
        let offset = self.header
            + HEADER_BYTES as usize
            + index as usize * self.event_size as usize;
        let needed = offset + self.event_size as usize;
        if needed > self.memory.len() {
            return Err(LayoutError::BufferTooSmall {
                needed,
                available: self.memory.len(),
            });
        }
        Ok(offset)
    }

    fn word(&self, index: u32) -> u32 {
        read_u32(&*self.memory, self.header + (index * WORD_SIZE) as usize)
    }

    fn set_word(&mut self, index: u32, value: u32) {
        let at = self.header + (index * WORD_SIZE) as usize;
        self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

fn read_u32(memory: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&memory[at..at + 4]);
    u32::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(mem: &mut [u8], at: usize, value: u32) {
        mem[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Simulate the host appending one slot the way the bridge does.
    fn host_push(mem: &mut [u8], header: usize, event_size: usize, words: &[u32]) {
        let produced = u32::from_le_bytes(mem[header..header + 4].try_into().unwrap());
        let capacity = u32::from_le_bytes(mem[header + 8..header + 12].try_into().unwrap());
        let slot = header + 12 + (produced % capacity) as usize * event_size;
        for (i, w) in words.iter().enumerate() {
            put(mem, slot + i * 4, *w);
        }
        put(mem, header, produced.wrapping_add(1));
    }

    #[test]
    fn format_writes_header() {
        let mut mem = vec![0xAAu8; 128];
        let reader = EventReader::format(&mut mem, 16, 4, 20).unwrap();
        assert_eq!(reader.produced(), 0);
        assert_eq!(reader.consumed(), 0);
        assert_eq!(reader.capacity(), 4);
        assert_eq!(reader.pending().unwrap(), 0);
    }

    #[test]
    fn format_rejects_short_memory() {
        let mut mem = vec![0u8; 32];
        assert!(matches!(
            EventReader::format(&mut mem, 0, 4, 20),
            Err(LayoutError::BufferTooSmall { needed: 92, .. })
        ));
    }

    #[test]
    fn drain_returns_events_in_order_and_advances_consumed() {
        let mut mem = vec![0u8; 128];
        EventReader::format(&mut mem, 0, 4, 20).unwrap();
        host_push(&mut mem, 0, 20, &[KIND_KEY_DOWN, 10, 65, 0, 0]);
        host_push(&mut mem, 0, 20, &[KIND_KEY_UP, 12, 65, 0, 0]);

        let mut reader = EventReader::new(&mut mem, 0, 20).unwrap();
        let records = reader.drain().unwrap();
        assert_eq!(
            records,
            vec![
                Record {
                    timestamp: 10,
                    event: Event::KeyDown { code: 65 },
                },
                Record {
                    timestamp: 12,
                    event: Event::KeyUp { code: 65 },
                },
            ]
        );
        assert_eq!(reader.consumed(), 2);
        assert_eq!(reader.pending().unwrap(), 0);
        assert!(reader.drain().unwrap().is_empty());
    }

    #[test]
    fn drain_follows_slots_across_wraparound() {
        let mut mem = vec![0u8; 64];
        EventReader::format(&mut mem, 0, 2, 12).unwrap();
        host_push(&mut mem, 0, 12, &[KIND_KEY_DOWN, 1, 1]);
        host_push(&mut mem, 0, 12, &[KIND_KEY_DOWN, 2, 2]);
        EventReader::new(&mut mem, 0, 12).unwrap().drain().unwrap();

        host_push(&mut mem, 0, 12, &[KIND_KEY_DOWN, 3, 3]);
        let mut reader = EventReader::new(&mut mem, 0, 12).unwrap();
        let records = reader.drain().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, Event::KeyDown { code: 3 });
        assert_eq!(reader.produced(), 3);
        assert_eq!(reader.consumed(), 3);
    }

    #[test]
    fn pending_detects_corrupt_counters() {
        let mut mem = vec![0u8; 64];
        EventReader::format(&mut mem, 0, 2, 12).unwrap();
        put(&mut mem, 0, 7);
        let reader = EventReader::new(&mut mem, 0, 12).unwrap();
        assert_eq!(
            reader.pending(),
            Err(LayoutError::Corrupt {
                pending: 7,
                capacity: 2,
            })
        );
    }

    #[test]
    fn rejects_bad_event_size() {
        let mut mem = vec![0u8; 64];
        assert!(matches!(
            EventReader::new(&mut mem, 0, 10),
            Err(LayoutError::InvalidEventSize(10))
        ));
    }
}
