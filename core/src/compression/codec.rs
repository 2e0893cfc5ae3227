//! compression/codec.rs
//! Thin layer over zstd-safe: native error classification and parameter application.
//!
//! libzstd reports failures as `size_t` codes that are the negation of a stable
//! `ZSTD_ErrorCode` value. We recover the enum value with wrapping arithmetic
//! (the same computation as `ZSTD_getErrorCode`) and sort it into the crate's
//! error taxonomy.
use log::trace;
use num_enum::TryFromPrimitive;
use zstd_safe::{CCtx, CParameter, DCtx, DParameter, ErrorCode};

use crate::compression::types::{CompressionOptions, DecompressionOptions, DictIdMode};
use crate::constants::DEFAULT_MAX_WINDOW_LOG;
use crate::types::{Result, ZframeError};
use crate::utils::enum_name_or_hex;

/// Mirror of `ZSTD_ErrorCode` (stable since libzstd 1.3).
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum NativeError {
    Generic = 1,
    PrefixUnknown = 10,
    VersionUnsupported = 12,
    FrameParameterUnsupported = 14,
    FrameParameterWindowTooLarge = 16,
    CorruptionDetected = 20,
    ChecksumWrong = 22,
    LiteralsHeaderWrong = 24,
    DictionaryCorrupted = 30,
    DictionaryWrong = 32,
    DictionaryCreationFailed = 34,
    ParameterUnsupported = 40,
    ParameterCombinationUnsupported = 41,
    ParameterOutOfBound = 42,
    TableLogTooLarge = 44,
    MaxSymbolValueTooLarge = 46,
    MaxSymbolValueTooSmall = 48,
    StabilityConditionNotRespected = 50,
    StageWrong = 60,
    InitMissing = 62,
    MemoryAllocation = 64,
    WorkSpaceTooSmall = 66,
    DstSizeTooSmall = 70,
    SrcSizeWrong = 72,
    DstBufferNull = 74,
    NoForwardProgressDestFull = 80,
    NoForwardProgressInputEmpty = 82,
}

impl NativeError {
    /// Recover the enum value from a raw `size_t` error code.
    pub fn raw_value(code: ErrorCode) -> u32 {
        u32::try_from(0usize.wrapping_sub(code)).unwrap_or(0)
    }

    /// The raw `size_t` code libzstd would return for this error.
    pub fn code(self) -> ErrorCode {
        0usize.wrapping_sub(self as usize)
    }

    pub fn from_code(code: ErrorCode) -> Option<Self> {
        Self::try_from_primitive(Self::raw_value(code)).ok()
    }

    /// Errors that mean the input is not a well-formed frame.
    pub fn is_frame_fault(self) -> bool {
        matches!(
            self,
            NativeError::PrefixUnknown
                | NativeError::VersionUnsupported
                | NativeError::FrameParameterUnsupported
                | NativeError::CorruptionDetected
                | NativeError::ChecksumWrong
                | NativeError::LiteralsHeaderWrong
                | NativeError::SrcSizeWrong
        )
    }
}

/// Plain library error, no reclassification.
pub fn library_error(code: ErrorCode) -> ZframeError {
    ZframeError::Library { code, name: zstd_safe::get_error_name(code) }
}

/// Classify an error raised while compressing.
pub fn compression_error(code: ErrorCode) -> ZframeError {
    library_error(code)
}

/// Classify an error raised while decoding.
///
/// - malformed input -> `InvalidFrame`
/// - window larger than `max_window_log` allows -> `OutputLimitExceeded`
/// - anything else (wrong dictionary, allocation, ...) -> `Library`
pub fn decompression_error(code: ErrorCode, max_window_log: Option<u32>) -> ZframeError {
    let raw = NativeError::raw_value(code);
    trace!("decode error {}: {}", enum_name_or_hex::<NativeError>(raw), zstd_safe::get_error_name(code));
    match NativeError::from_code(code) {
        Some(kind) if kind.is_frame_fault() => ZframeError::InvalidFrame(zstd_safe::get_error_name(code).to_string()),
        Some(NativeError::FrameParameterWindowTooLarge) => window_too_large(max_window_log),
        _ => library_error(code),
    }
}

/// Largest window a decoder accepts for the given `max_window_log`.
pub fn window_limit(max_window_log: Option<u32>) -> u64 {
    1u64 << max_window_log.unwrap_or(DEFAULT_MAX_WINDOW_LOG)
}

/// The error reported for a frame whose window exceeds [`window_limit`].
pub fn window_too_large(max_window_log: Option<u32>) -> ZframeError {
    let limit = usize::try_from(window_limit(max_window_log)).unwrap_or(usize::MAX);
    ZframeError::OutputLimitExceeded { limit }
}

/// Apply compression options to a freshly reset context.
pub fn apply_compression_options(ctx: &mut CCtx<'static>, opts: &CompressionOptions) -> Result<()> {
    ctx.set_parameter(CParameter::CompressionLevel(opts.level))
        .map_err(compression_error)?;
    ctx.set_parameter(CParameter::ChecksumFlag(opts.checksum))
        .map_err(compression_error)?;
    if let Some(w) = opts.window_log {
        ctx.set_parameter(CParameter::WindowLog(w)).map_err(compression_error)?;
    }
    if let Some(n) = opts.workers {
        ctx.set_parameter(CParameter::NbWorkers(n)).map_err(compression_error)?;
    }
    match opts.dict_id {
        DictIdMode::Omit => {
            ctx.set_parameter(CParameter::DictIdFlag(false)).map_err(compression_error)?;
        }
        DictIdMode::Include => {
            ctx.set_parameter(CParameter::DictIdFlag(true)).map_err(compression_error)?;
        }
        DictIdMode::WhenDictionaryPresent => {}
    }
    if let Some(dict) = &opts.dictionary {
        ctx.ref_cdict(dict.cdict()).map_err(compression_error)?;
    }
    Ok(())
}

/// Apply decompression options to a freshly reset context.
pub fn apply_decompression_options(ctx: &mut DCtx<'static>, opts: &DecompressionOptions) -> Result<()> {
    if let Some(w) = opts.max_window_log {
        ctx.set_parameter(DParameter::WindowLogMax(w))
            .map_err(library_error)?;
    }
    if let Some(dict) = &opts.dictionary {
        ctx.ref_ddict(dict.ddict()).map_err(library_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_value_inverts_size_t_encoding() {
        assert_eq!(NativeError::from_code(NativeError::DictionaryWrong.code()), Some(NativeError::DictionaryWrong));
        assert_eq!(NativeError::from_code(NativeError::ChecksumWrong.code()), Some(NativeError::ChecksumWrong));
    }

    #[test]
    fn corruption_is_invalid_frame() {
        let err = decompression_error(NativeError::CorruptionDetected.code(), None);
        assert!(err.is_invalid_frame());
    }

    #[test]
    fn window_too_large_is_a_limit() {
        let err = decompression_error(NativeError::FrameParameterWindowTooLarge.code(), Some(20));
        assert_eq!(err, ZframeError::OutputLimitExceeded { limit: 1 << 20 });
    }

    #[test]
    fn unset_window_log_uses_the_decoder_default() {
        let err = decompression_error(NativeError::FrameParameterWindowTooLarge.code(), None);
        assert_eq!(err, ZframeError::OutputLimitExceeded { limit: 1 << 27 });
        assert_eq!(window_limit(Some(15)), 32 * 1024);
    }

    #[test]
    fn wrong_dictionary_stays_a_library_error() {
        let code = NativeError::DictionaryWrong.code();
        let err = decompression_error(code, None);
        assert!(err.is_library());
        assert_eq!(err, ZframeError::Library { code, name: "" });
    }
}
