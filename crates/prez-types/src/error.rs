//! Errors raised while decoding Event Buffer contents.

use thiserror::Error;

/// Malformed Event Buffer contents, as seen by a reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A slot carries a kind tag outside the known vocabulary.
    #[error("unknown event kind: {0}")]
    UnknownKind(u32),

    /// A data word holds a value its kind does not allow.
    #[error("event kind {kind}: invalid value {value} in data word {index}")]
    InvalidWord { kind: u32, index: usize, value: u32 },

    /// A slot is too small to hold the payload its kind requires.
    #[error("event kind {kind} needs {needed} data words, slot holds {available}")]
    Truncated {
        kind: u32,
        needed: usize,
        available: usize,
    },

    /// `event_size` is not a word multiple or cannot hold kind + timestamp.
    #[error("invalid event size: {0} bytes")]
    InvalidEventSize(u32),

    /// The buffer is smaller than its header claims.
    #[error("event buffer needs {needed} bytes, only {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// More events pending than the buffer can hold.
    #[error("{pending} events pending in a buffer of capacity {capacity}")]
    Corrupt { pending: u32, capacity: u32 },
}

/// Result alias for layout decoding.
pub type LayoutResult<T> = Result<T, LayoutError>;
