//! Event Buffer memory layout and bridge-wide constants.
//!
//! The Event Buffer lives inside guest linear memory.  Every multi-byte value
//! is a little-endian `u32` word:
//!
//! ```text
//! header_addr + 0  : u32  produced   (host writes, wrapping counter)
//! header_addr + 4  : u32  consumed   (guest writes, wrapping counter)
//! header_addr + 8  : u32  capacity   (guest writes before setup)
//! header_addr + 12 : slot[0]
//! header_addr + 12 + event_size : slot[1]
//! ...
//! ```
//!
//! # Slot layout
//!
//! | Word | Contents                                   |
//! |------|--------------------------------------------|
//! | 0    | event kind (see `KIND_*`)                  |
//! | 1    | timestamp, milliseconds since session start |
//! | 2..  | data words, meaning depends on kind        |

/// Size of one Event Buffer word (bytes).
pub const WORD_SIZE: u32 = 4;

// ── Header word indices ──────────────────────────────────────────────────────

/// Events published by the host since setup.
pub const HEADER_PRODUCED: u32 = 0;
/// Events drained by the guest since setup.
pub const HEADER_CONSUMED: u32 = 1;
/// Number of slots following the header.
pub const HEADER_CAPACITY: u32 = 2;

/// Number of header words.
pub const HEADER_WORDS: u32 = 3;
/// Header size in bytes.
pub const HEADER_BYTES: u32 = HEADER_WORDS * WORD_SIZE;

// ── Slot words ───────────────────────────────────────────────────────────────

/// Offset of the kind word inside a slot.
pub const SLOT_KIND: u32 = 0;
/// Offset of the timestamp word inside a slot.
pub const SLOT_TIMESTAMP: u32 = 1;
/// Words in a slot that precede the data words.
pub const SLOT_PREFIX_WORDS: u32 = 2;
/// Smallest legal `event_size` (kind + timestamp, no data).
pub const MIN_EVENT_SIZE: u32 = SLOT_PREFIX_WORDS * WORD_SIZE;

// ── Event kinds ──────────────────────────────────────────────────────────────

pub const KIND_POINTER_DOWN: u32 = 1;
pub const KIND_POINTER_UP: u32 = 2;
pub const KIND_POINTER_MOVE: u32 = 3;
pub const KIND_KEY_DOWN: u32 = 4;
pub const KIND_KEY_UP: u32 = 5;
pub const KIND_RESIZE: u32 = 6;
pub const KIND_WHEEL: u32 = 7;
pub const KIND_IMAGE_READY: u32 = 8;
pub const KIND_IMAGE_FAILED: u32 = 9;

/// Button word carried by pointer-move events (`-1` as `u32`).
pub const MOVE_BUTTON_SENTINEL: u32 = u32::MAX;

/// Wheel direction word for a negative (upward) delta.
pub const WHEEL_UP: u32 = 3;
/// Wheel direction word for a positive (downward) delta.
pub const WHEEL_DOWN: u32 = 4;

// ── Surface ──────────────────────────────────────────────────────────────────

/// Token returned by `canvas.init` on success (`"PREZ"` read big-endian).
pub const SURFACE_MAGIC: i32 = 0x5052_455A;
/// Returned by `canvas.init` when the named placeholder does not exist.
pub const SURFACE_NOT_FOUND: i32 = -1;

/// Number of `f32` values `measure_text` writes.
pub const TEXT_METRICS_WORDS: u32 = 5;

// ── Assets ───────────────────────────────────────────────────────────────────

/// Word written for width and height of an image whose load failed.
pub const IMAGE_SIZE_FAILED: i32 = -1;
/// Byte offset of the handle word in an image output block.
pub const IMAGE_OUT_HANDLE: u32 = 0;
/// Byte offset of the width word in an image output block.
pub const IMAGE_OUT_WIDTH: u32 = 4;
/// Byte offset of the height word in an image output block.
pub const IMAGE_OUT_HEIGHT: u32 = 8;

/// Byte length of a buffer holding `capacity` slots of `event_size` bytes,
/// header included.  `None` on overflow.
pub fn buffer_bytes(capacity: u32, event_size: u32) -> Option<u32> {
    capacity
        .checked_mul(event_size)
        .and_then(|slots| slots.checked_add(HEADER_BYTES))
}

/// Check that `event_size` can hold a slot: a word multiple, at least
/// [`MIN_EVENT_SIZE`].
pub fn is_valid_event_size(event_size: u32) -> bool {
    event_size >= MIN_EVENT_SIZE && event_size % WORD_SIZE == 0
}

/// Number of data words a slot of `event_size` bytes can carry.
pub fn data_words(event_size: u32) -> u32 {
    (event_size / WORD_SIZE).saturating_sub(SLOT_PREFIX_WORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_bytes_includes_header() {
        assert_eq!(buffer_bytes(0, 20), Some(12));
        assert_eq!(buffer_bytes(4, 20), Some(92));
        assert_eq!(buffer_bytes(u32::MAX, 20), None);
    }

    #[test]
    fn event_size_must_be_word_multiple() {
        assert!(is_valid_event_size(8));
        assert!(is_valid_event_size(20));
        assert!(!is_valid_event_size(4));
        assert!(!is_valid_event_size(18));
        assert!(!is_valid_event_size(0));
    }

    #[test]
    fn data_words_excludes_prefix() {
        assert_eq!(data_words(8), 0);
        assert_eq!(data_words(20), 3);
        assert_eq!(data_words(32), 6);
    }

    #[test]
    fn surface_magic_spells_prez() {
        assert_eq!(&SURFACE_MAGIC.to_be_bytes(), b"PREZ");
    }
}
