//! Event Ring Writer: the producer half of the Event Buffer protocol.
//!
//! The host appends one fixed-size slot per event and publishes it by
//! advancing `produced`.  It never blocks and never overwrites a slot the
//! guest has not consumed: when `produced - consumed == capacity` the event
//! is dropped and neither the header nor any slot changes.

use prez_types::layout::*;
use prez_types::Event;

use crate::error::{BridgeError, BridgeResult};
use crate::memory::GuestMemory;

/// What happened to a pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Written in full as sequence number `seq`.
    Written { seq: u32 },
    /// Written as `seq`, but the slot was too small for `lost` data words.
    Truncated { seq: u32, lost: usize },
    /// The buffer was full.
    Dropped,
}

/// A registered Event Buffer.
#[derive(Debug)]
pub struct EventRing {
    header_addr: u32,
    event_size: u32,
    last_timestamp: u32,
    written: u64,
    dropped: u64,
}

impl EventRing {
    /// Register the buffer at `header_addr` with slots of `event_size` bytes.
    pub fn new(header_addr: u32, event_size: u32) -> BridgeResult<Self> {
        if !is_valid_event_size(event_size) {
            return Err(BridgeError::InvalidEventSize(event_size));
        }
        if header_addr % WORD_SIZE != 0 {
            return Err(BridgeError::Misaligned {
                base: header_addr,
                len: HEADER_BYTES,
            });
        }
        Ok(Self {
            header_addr,
            event_size,
            last_timestamp: 0,
            written: 0,
            dropped: 0,
        })
    }

    pub fn header_addr(&self) -> u32 {
        self.header_addr
    }

    pub fn event_size(&self) -> u32 {
        self.event_size
    }

    /// Events written since registration.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Events dropped on a full buffer since registration.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Append `event` stamped with `now_ms`.
    ///
    /// Timestamps never go backwards: a clock reading earlier than the last
    /// written one is raised to it.
    pub fn push(
        &mut self,
        memory: &mut GuestMemory<'_>,
        event: &Event,
        now_ms: u32,
    ) -> BridgeResult<PushOutcome> {
        let (produced, consumed, capacity) = {
            let header = memory.words(self.header_addr, HEADER_BYTES)?;
            (
                header.get(HEADER_PRODUCED as usize),
                header.get(HEADER_CONSUMED as usize),
                header.get(HEADER_CAPACITY as usize),
            )
        };

        let pending = produced.wrapping_sub(consumed);
        if pending >= capacity {
            if pending > capacity {
                tracing::warn!(
                    target: "prez::ring",
                    produced,
                    consumed,
                    capacity,
                    "event buffer counters are inconsistent; treating as full"
                );
            }
            self.dropped += 1;
            tracing::trace!(target: "prez::ring", kind = event.kind(), "event buffer full, dropped");
            return Ok(PushOutcome::Dropped);
        }

        let slot_addr = self
            .slot_addr(produced % capacity)
            .ok_or(BridgeError::OutOfBounds {
                base: self.header_addr,
                len: self.event_size,
                memory_size: memory.size(),
            })?;
        let mut slot = memory.words(slot_addr, self.event_size)?;

        let timestamp = now_ms.max(self.last_timestamp);
        let payload = event.payload();
        let data = payload.as_slice();
        let room = slot.len() - SLOT_PREFIX_WORDS as usize;

        slot.set(SLOT_KIND as usize, event.kind());
        slot.set(SLOT_TIMESTAMP as usize, timestamp);
        for i in 0..room {
            slot.set(
                SLOT_PREFIX_WORDS as usize + i,
                data.get(i).copied().unwrap_or(0),
            );
        }

        memory
            .words(self.header_addr, HEADER_BYTES)?
            .set(HEADER_PRODUCED as usize, produced.wrapping_add(1));

        self.last_timestamp = timestamp;
        self.written += 1;

        if data.len() > room {
            let lost = data.len() - room;
            tracing::debug!(
                target: "prez::ring",
                kind = event.kind(),
                lost,
                "event payload truncated to slot size"
            );
            Ok(PushOutcome::Truncated { seq: produced, lost })
        } else {
            Ok(PushOutcome::Written { seq: produced })
        }
    }

    /// Address of slot `index`, or `None` if it lies beyond a 32-bit address
    /// space.
    fn slot_addr(&self, index: u32) -> Option<u32> {
        let addr = self.header_addr as u64
            + HEADER_BYTES as u64
            + index as u64 * self.event_size as u64;
        u32::try_from(addr).ok()
    }
}
