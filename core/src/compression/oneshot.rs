//! compression/oneshot.rs
//!
//! Whole-buffer compress/decompress on top of the sessions.
//!
//! Design notes:
//! - Decompression allocates the exact output up front only when the header
//!   declares a size that fits both the eager ceiling and the budget, and the
//!   buffer holds exactly one frame. Anything else streams through the
//!   session's budget-checked path.
//! - Both paths refuse a first frame whose window exceeds `max_window_log`
//!   before decoding, and the whole call shares one `max_output` budget
//!   however many frames the buffer holds.
//! - Compression fails fast when the budget is below the worst-case bound.
use log::trace;
use serde::{Deserialize, Serialize};

use crate::compression::codec::{window_limit, window_too_large};
use crate::compression::compress::CompressionSession;
use crate::compression::decompress::DecompressionSession;
use crate::compression::frame::{ContentSize, FrameInspector};
use crate::compression::types::{CompressionOptions, DecompressionOptions};
use crate::types::{Result, ZframeError};
use crate::utils::size_to_usize;

/// How a buffer will be decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodePlan {
    /// One direct decode into exactly this many bytes.
    Eager(usize),
    /// Incremental decode through the session budget.
    Streaming,
}

/// Decide between the eager and the streaming path for `buf`.
///
/// # Errors
/// - `InvalidFrame` for an empty buffer or a malformed header.
/// - `OutputLimitExceeded` if the declared size already exceeds `max_output`,
///   or the frame window exceeds `max_window_log`.
pub fn plan_decompression(buf: &[u8], options: &DecompressionOptions) -> Result<DecodePlan> {
    let info = FrameInspector::inspect(buf)?;
    if info.window_size.is_some_and(|w| w > window_limit(options.max_window_log)) {
        return Err(window_too_large(options.max_window_log));
    }
    let declared = match info.content_size {
        ContentSize::Known(n) => n,
        ContentSize::Unknown => return Ok(DecodePlan::Streaming),
    };
    if declared > options.max_output as u64 {
        return Err(ZframeError::OutputLimitExceeded { limit: options.max_output });
    }
    let n = size_to_usize(declared)?;
    if n <= options.eager_ceiling && info.frame_len == Some(buf.len()) {
        Ok(DecodePlan::Eager(n))
    } else {
        Ok(DecodePlan::Streaming)
    }
}

/// Decompress a whole buffer (one or more concatenated frames).
///
/// The combined output of all frames is held to `max_output`.
pub fn decompress(buf: &[u8], options: &DecompressionOptions) -> Result<Vec<u8>> {
    let mut session = DecompressionSession::new(options.clone())?;
    decompress_with(&mut session, buf)
}

/// Like [`decompress`], reusing `session` and its options. The session is reset first.
pub fn decompress_with(session: &mut DecompressionSession, buf: &[u8]) -> Result<Vec<u8>> {
    session.reset(None)?;
    let plan = plan_decompression(buf, session.options())?;
    trace!("one-shot decode of {} bytes: {:?}", buf.len(), plan);
    match plan {
        DecodePlan::Eager(n) => session.decode_exact(buf, n),
        DecodePlan::Streaming => session.decode_all(buf),
    }
}

/// Compress a whole buffer into one frame.
pub fn compress(buf: &[u8], options: &CompressionOptions) -> Result<Vec<u8>> {
    let mut session = CompressionSession::new(options.clone())?;
    compress_with(&mut session, buf)
}

/// Like [`compress`], reusing `session` and its options. The session is reset first.
pub fn compress_with(session: &mut CompressionSession, buf: &[u8]) -> Result<Vec<u8>> {
    session.reset(None)?;
    session.encode_all(buf)
}
