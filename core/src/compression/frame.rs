//! compression/frame.rs
//! Header queries on a compressed buffer, without decoding it.
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::constants::MAGIC_FRAME;
use crate::types::{Result, ZframeError};

const SINGLE_SEGMENT_FLAG: u8 = 0x20;

/// Decompressed size declared in a frame header.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSize {
    Known(u64),
    /// The writer did not record a size (typical of streamed frames).
    Unknown,
}

impl ContentSize {
    pub fn known(self) -> Option<u64> {
        match self {
            ContentSize::Known(n) => Some(n),
            ContentSize::Unknown => None,
        }
    }
}

/// What the header of the first frame in a buffer says.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub content_size: ContentSize,
    /// Compressed length of the first frame; `None` if the buffer ends inside it.
    pub frame_len: Option<usize>,
    pub dictionary_id: Option<u32>,
    /// Window the decoder must hold for this frame. Single-segment frames use
    /// their content size.
    pub window_size: Option<u64>,
}

pub struct FrameInspector;

impl FrameInspector {
    /// Inspect the first frame of `buf`.
    ///
    /// # Errors
    /// `InvalidFrame` for an empty buffer or a malformed header.
    pub fn inspect(buf: &[u8]) -> Result<FrameInfo> {
        let content_size = Self::content_size(buf)?;
        let frame_len = zstd_safe::find_frame_compressed_size(buf).ok();
        Ok(FrameInfo {
            content_size,
            frame_len,
            dictionary_id: frame_dictionary_id(buf),
            window_size: Self::window_size(buf, content_size),
        })
    }

    /// Decode the window descriptor of a standard frame header.
    fn window_size(buf: &[u8], content_size: ContentSize) -> Option<u64> {
        if !Self::has_frame_magic(buf) {
            return None;
        }
        let descriptor = *buf.get(4)?;
        if descriptor & SINGLE_SEGMENT_FLAG != 0 {
            return content_size.known();
        }
        let window = *buf.get(5)?;
        let base = 1u64 << (10 + u32::from(window >> 3));
        Some(base + (base / 8) * u64::from(window & 0x07))
    }

    /// True if `buf` opens with a standard (non-skippable) frame magic number.
    pub fn has_frame_magic(buf: &[u8]) -> bool {
        buf.starts_with(&MAGIC_FRAME)
    }

    pub fn content_size(buf: &[u8]) -> Result<ContentSize> {
        if buf.is_empty() {
            return Err(ZframeError::InvalidFrame("empty input".into()));
        }
        match zstd_safe::get_frame_content_size(buf) {
            Ok(Some(n)) => Ok(ContentSize::Known(n)),
            Ok(None) => Ok(ContentSize::Unknown),
            Err(_) => Err(ZframeError::InvalidFrame("unreadable frame header".into())),
        }
    }
}

/// Dictionary ID declared by the frame at the start of `buf`, if any.
pub fn frame_dictionary_id(buf: &[u8]) -> Option<u32> {
    zstd_safe::get_dict_id_from_frame(buf).map(NonZeroU32::get)
}
