//! Bridge and session error types.

use thiserror::Error;
use wasmi::errors::LinkerError;

/// A broken cross-boundary contract detected while serving a guest call.
///
/// Raised inside an import, it becomes a WASM trap that unwinds the whole
/// guest call chain.  It is never recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// `base + len` runs past the end of guest memory.
    #[error("guest range {base}+{len} exceeds memory of {memory_size} bytes")]
    OutOfBounds {
        base: u32,
        len: u32,
        memory_size: usize,
    },

    /// A word view was requested at an address or length that is not a
    /// multiple of four.
    #[error("guest range {base}+{len} is not word aligned")]
    Misaligned { base: u32, len: u32 },

    /// `input.setup` was given an unusable slot size.
    #[error("invalid event size: {0} bytes")]
    InvalidEventSize(u32),

    /// The handle was never issued by `assets.load_image`.
    #[error("unknown image handle: {0}")]
    UnknownImage(i32),

    /// The image payload was read before its load completed.
    #[error("image {0} is still loading")]
    ImagePending(i32),

    /// The image was drawn after its load failed.
    #[error("image {0} failed to load")]
    ImageFailed(i32),

    /// A drawing call arrived before a successful `canvas.init`.
    #[error("no drawing surface is bound")]
    SurfaceUnbound,

    /// The guest does not export the linear memory the bridge reads from.
    #[error("guest does not export memory `{0}`")]
    MissingMemory(String),
}

impl wasmi::core::HostError for BridgeError {}

/// Bridge result type alias.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced to the embedder driving a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Compilation, instantiation or a trap inside a guest call.
    #[error("wasm error: {0}")]
    Wasm(#[from] wasmi::Error),

    /// Registering the bridge imports failed.
    #[error("failed to link imports: {0}")]
    Link(#[from] LinkerError),

    /// A required function export is missing or has the wrong signature.
    #[error("guest export `{0}` is missing or has the wrong type")]
    MissingExport(String),

    /// A boundary violation detected outside a guest call (e.g. while
    /// delivering host input).
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// The boundary violation behind this error, if any.
    ///
    /// Looks through guest traps raised by an import.
    pub fn bridge_error(&self) -> Option<&BridgeError> {
        match self {
            Self::Bridge(err) => Some(err),
            Self::Wasm(err) => err.downcast_ref::<BridgeError>(),
            _ => None,
        }
    }
}

/// Session result type alias.
pub type SessionResult<T> = Result<T, SessionError>;
