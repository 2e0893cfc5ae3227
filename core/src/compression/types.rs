//! compression/types.rs
//! Options, session state and the compressor/decompressor seams.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compression::dictionary::Dictionary;
use crate::constants::{
    DEFAULT_DECOMPRESSION_BUDGET, DEFAULT_LEVEL, EAGER_ALLOCATION_CEILING, MAX_WINDOW_LOG, MIN_WINDOW_LOG,
};
use crate::types::{Result, ZframeError};

/// Whether a compressed frame records the dictionary ID.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictIdMode {
    /// Never write the ID, even with a dictionary.
    Omit,
    /// Request the ID explicitly. libzstd writes it only when a dictionary is
    /// attached, so this encodes the same frames as `WhenDictionaryPresent`.
    Include,
    /// Leave libzstd's default: the ID is written iff a dictionary is attached.
    #[default]
    WhenDictionaryPresent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressionOptions {
    pub level: i32,
    pub checksum: bool,
    /// Worker threads for libzstd's internal job splitting. `None` keeps single-threaded mode.
    pub workers: Option<u32>,
    pub window_log: Option<u32>,
    #[serde(skip)]
    pub dictionary: Option<Arc<Dictionary>>,
    pub dict_id: DictIdMode,
    /// Hard ceiling on compressed bytes per frame. `None` is unbounded.
    pub max_output: Option<usize>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            checksum: false,
            workers: None,
            window_log: None,
            dictionary: None,
            dict_id: DictIdMode::default(),
            max_output: None,
        }
    }
}

impl CompressionOptions {
    pub fn with_level(level: i32) -> Self {
        Self { level, ..Self::default() }
    }

    pub fn with_dictionary(mut self, dict: Arc<Dictionary>) -> Self {
        self.dictionary = Some(dict);
        self
    }

    pub fn with_max_output(mut self, limit: usize) -> Self {
        self.max_output = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (min, max) = (zstd_safe::min_c_level(), zstd_safe::max_c_level());
        if self.level < min || self.level > max {
            return Err(ZframeError::InvalidOptions(format!(
                "compression level {} outside [{min}, {max}]",
                self.level
            )));
        }
        if self.max_output == Some(0) {
            return Err(ZframeError::InvalidOptions("output budget must be positive".into()));
        }
        validate_window_log(self.window_log, "window_log")?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecompressionOptions {
    #[serde(skip)]
    pub dictionary: Option<Arc<Dictionary>>,
    /// Hard ceiling on decompressed bytes per frame.
    pub max_output: usize,
    /// Frames whose window exceeds `1 << max_window_log` are refused.
    pub max_window_log: Option<u32>,
    /// Largest declared content size the one-shot path allocates up front.
    pub eager_ceiling: usize,
}

impl Default for DecompressionOptions {
    fn default() -> Self {
        Self {
            dictionary: None,
            max_output: DEFAULT_DECOMPRESSION_BUDGET,
            max_window_log: None,
            eager_ceiling: EAGER_ALLOCATION_CEILING,
        }
    }
}

impl DecompressionOptions {
    pub fn with_dictionary(mut self, dict: Arc<Dictionary>) -> Self {
        self.dictionary = Some(dict);
        self
    }

    pub fn with_max_output(mut self, limit: usize) -> Self {
        self.max_output = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_output == 0 {
            return Err(ZframeError::InvalidOptions("output budget must be positive".into()));
        }
        validate_window_log(self.max_window_log, "max_window_log")?;
        Ok(())
    }
}

fn validate_window_log(value: Option<u32>, name: &str) -> Result<()> {
    match value {
        Some(w) if !(MIN_WINDOW_LOG..=MAX_WINDOW_LOG).contains(&w) => Err(ZframeError::InvalidOptions(format!(
            "{name} {w} outside [{MIN_WINDOW_LOG}, {MAX_WINDOW_LOG}]"
        ))),
        _ => Ok(()),
    }
}

/// Session lifecycle.
///
/// `Idle -> Open -> Finished -> (reset) -> Idle`. Any error parks the session in
/// `Failed` until `reset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh or just reset; no frame bytes consumed or produced yet.
    Idle,
    /// Mid-frame.
    Open,
    /// Frame closed; production calls are no-ops.
    Finished,
    /// A production call failed; only `reset` is accepted.
    Failed,
}

impl SessionState {
    /// `reset` is only defined between frames.
    pub fn can_reset(self) -> bool {
        !matches!(self, SessionState::Open)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Open => "open",
            SessionState::Finished => "finished",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one decompression call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Bytes appended to the caller's accumulator by this call.
    pub produced: usize,
    /// The last frame touched by this call is complete and all input was consumed.
    pub frame_complete: bool,
    /// Frames closed during this call (more than one for concatenated input).
    pub frames: usize,
}

// Require Send so sessions can move into a pipe's producer task.
pub trait Compressor: Send {
    /// Compress one chunk, appending produced blocks to `out`.
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize>;
    /// Flush pending state and close the frame.
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<usize>;
}

pub trait Decompressor: Send {
    /// Decompress one chunk, appending produced blocks to `out`.
    fn decompress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Progress>;
    /// True once a frame was completed and no further input was fed.
    fn is_finished(&self) -> bool;
    /// Start the next frame with the options already held.
    fn restart(&mut self) -> Result<()>;
    /// Signal that no more input follows. Fails with `InvalidFrame` mid-frame.
    fn end_of_input(&mut self) -> Result<()>;
}

impl<T: Compressor + ?Sized> Compressor for &mut T {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        (**self).compress_chunk(input, out)
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        (**self).finish(out)
    }
}

impl<T: Decompressor + ?Sized> Decompressor for &mut T {
    fn decompress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Progress> {
        (**self).decompress_chunk(input, out)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn restart(&mut self) -> Result<()> {
        (**self).restart()
    }

    fn end_of_input(&mut self) -> Result<()> {
        (**self).end_of_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budgets_are_rejected() {
        assert!(CompressionOptions::default().with_max_output(0).validate().is_err());
        assert!(DecompressionOptions::default().with_max_output(0).validate().is_err());
    }

    #[test]
    fn window_log_bounds() {
        let opts = CompressionOptions { window_log: Some(9), ..Default::default() };
        assert!(opts.validate().is_err());
        let opts = DecompressionOptions { max_window_log: Some(MAX_WINDOW_LOG), ..Default::default() };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn reset_is_refused_only_mid_frame() {
        assert!(SessionState::Idle.can_reset());
        assert!(SessionState::Finished.can_reset());
        assert!(SessionState::Failed.can_reset());
        assert!(!SessionState::Open.can_reset());
    }
}
