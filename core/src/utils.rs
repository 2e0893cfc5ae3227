use std::fmt;
use std::io::{self, Read};

use num_enum::TryFromPrimitive;

use crate::types::{Result, ZframeError};

/// Below this input size ZSTD_COMPRESSBOUND adds a small fixed margin.
const BOUND_SMALL_INPUT: usize = 128 << 10;

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Worst-case compressed size for `src_len` input bytes.
///
/// Same formula as libzstd's `ZSTD_COMPRESSBOUND`, but with checked arithmetic:
/// inputs near `usize::MAX` yield `FrameTooLarge` instead of wrapping.
pub fn compress_bound(src_len: usize) -> Result<usize> {
    let margin = if src_len < BOUND_SMALL_INPUT {
        (BOUND_SMALL_INPUT - src_len) >> 11
    } else {
        0
    };
    let bound = saturating_sum(&[src_len, src_len >> 8, margin]);
    if bound == usize::MAX {
        return Err(ZframeError::FrameTooLarge);
    }
    Ok(bound)
}

/// Sum that clamps at `usize::MAX`.
pub fn saturating_sum(parts: &[usize]) -> usize {
    parts.iter().fold(0usize, |acc, &p| acc.saturating_add(p))
}

/// Convert a frame-declared `u64` size to `usize`, or `FrameTooLarge`.
pub fn size_to_usize(size: u64) -> Result<usize> {
    usize::try_from(size).map_err(|_| ZframeError::FrameTooLarge)
}

/// Read until `buf` is full or the reader reports EOF.
///
/// Returns the number of bytes read; `0` means end of input.
pub fn read_full_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_matches_libzstd_formula() {
        assert_eq!(compress_bound(0).unwrap(), 64);
        assert_eq!(compress_bound(2048).unwrap(), 2048 + 8 + 63);
        assert_eq!(compress_bound(1 << 20).unwrap(), (1 << 20) + (1 << 12));
    }

    #[test]
    fn bound_overflow_is_frame_too_large() {
        assert_eq!(compress_bound(usize::MAX), Err(ZframeError::FrameTooLarge));
        assert_eq!(compress_bound(usize::MAX - 16), Err(ZframeError::FrameTooLarge));
    }

    #[test]
    fn short_reads_are_coalesced() {
        struct Trickle(Vec<u8>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0.remove(0);
                Ok(1)
            }
        }

        let mut src = Trickle(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 4];
        assert_eq!(read_full_or_eof(&mut src, &mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(read_full_or_eof(&mut src, &mut buf).unwrap(), 1);
        assert_eq!(read_full_or_eof(&mut src, &mut buf).unwrap(), 0);
    }
}
