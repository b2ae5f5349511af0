//! Guest string decoding.

use crate::error::BridgeResult;
use crate::memory::GuestMemory;

/// Decode `len` bytes at `ptr` as UTF-8.
///
/// Malformed sequences become U+FFFD; only an out-of-range pointer fails.
pub fn decode_utf8(memory: &GuestMemory<'_>, ptr: u32, len: u32) -> BridgeResult<String> {
    let bytes = memory.view(ptr, len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
