//! compression/compress.rs
//!
//! Incremental, budget-checked frame compression.
//!
//! Design notes:
//! - One `CCtx` per session, reused across frames via `reset`.
//! - Every block libzstd emits lands in a reusable scratch buffer first and is
//!   admitted against the budget before it is appended to the caller's output.
//! - Production calls never roll back: on `Err` the caller discards `out`.
use log::{debug, trace};
use zstd_safe::zstd_sys::ZSTD_EndDirective;
use zstd_safe::{CCtx, InBuffer, OutBuffer, ResetDirective};

use crate::compression::budget::Budget;
use crate::compression::codec::{apply_compression_options, compression_error, library_error, NativeError};
use crate::compression::types::{CompressionOptions, Compressor, SessionState};
use crate::types::{Result, ZframeError};
use crate::utils::compress_bound;

/// Streaming compressor for one frame at a time.
///
/// `Send` but not `Sync`: every call takes `&mut self`.
pub struct CompressionSession {
    // Declared before `options`: the context drops before the dictionary it references.
    ctx: CCtx<'static>,
    options: CompressionOptions,
    scratch: Vec<u8>,
    budget: Budget,
    state: SessionState,
}

impl CompressionSession {
    /// Validate `options`, create a context and apply the parameters.
    pub fn new(options: CompressionOptions) -> Result<Self> {
        options.validate()?;
        let mut ctx = CCtx::try_create().ok_or_else(|| library_error(NativeError::MemoryAllocation.code()))?;
        apply_compression_options(&mut ctx, &options)?;
        debug!(
            "compression session: level {}, checksum {}, workers {:?}, dictionary {}",
            options.level,
            options.checksum,
            options.workers,
            options.dictionary.is_some()
        );

        Ok(Self {
            ctx,
            budget: Budget::new(options.max_output),
            options,
            scratch: Vec::with_capacity(CCtx::out_size()),
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Compressed bytes produced for the current frame.
    pub fn produced(&self) -> usize {
        self.budget.produced()
    }

    /// Feed one chunk, appending any completed blocks to `out`.
    ///
    /// Returns the number of bytes appended. A no-op once the frame is finished.
    ///
    /// # Errors
    /// - `OutputLimitExceeded` if a block would overrun `max_output`; the block is dropped.
    /// - `Library` for any native failure.
    /// - `InvalidState` after a previous failure.
    ///
    /// On error, bytes appended earlier in this call stay in `out`; discard it.
    pub fn compress(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        match self.state {
            SessionState::Finished => return Ok(0),
            SessionState::Failed => return Err(ZframeError::InvalidState("compression session failed; reset required")),
            SessionState::Idle | SessionState::Open => {}
        }
        if chunk.is_empty() {
            return Ok(0);
        }
        self.state = SessionState::Open;
        let res = self.drive(chunk, out, ZSTD_EndDirective::ZSTD_e_continue);
        self.settle(res)
    }

    /// Flush everything pending and close the frame.
    ///
    /// Idempotent: a finished session returns `Ok(0)`. Same error and
    /// no-rollback contract as [`compress`](Self::compress).
    pub fn finish(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        match self.state {
            SessionState::Finished => return Ok(0),
            SessionState::Failed => return Err(ZframeError::InvalidState("compression session failed; reset required")),
            SessionState::Idle | SessionState::Open => {}
        }
        let res = self.drive(&[], out, ZSTD_EndDirective::ZSTD_e_end);
        let written = self.settle(res)?;
        self.state = SessionState::Finished;
        trace!("frame closed: {} bytes", self.budget.produced());
        Ok(written)
    }

    /// Return to `Idle`, optionally with new options.
    ///
    /// Output after a reset is identical to a fresh session's with the same options.
    ///
    /// # Errors
    /// - `InvalidState` mid-frame.
    /// - `InvalidOptions` if `options` fail validation; the session is unchanged.
    pub fn reset(&mut self, options: Option<CompressionOptions>) -> Result<()> {
        if !self.state.can_reset() {
            return Err(ZframeError::InvalidState("cannot reset a compression session mid-frame"));
        }
        if let Some(opts) = &options {
            opts.validate()?;
        }
        self.ctx.reset(ResetDirective::SessionAndParameters).map_err(library_error)?;
        if let Some(opts) = options {
            self.options = opts;
        }
        if let Err(e) = apply_compression_options(&mut self.ctx, &self.options) {
            self.state = SessionState::Failed;
            return Err(e);
        }
        self.budget = Budget::new(self.options.max_output);
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Compress `src` as one frame with a single `compress2` call.
    ///
    /// Fails fast when the budget is below the worst-case bound.
    pub(crate) fn encode_all(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        if self.state != SessionState::Idle {
            return Err(ZframeError::InvalidState("one-shot compression needs an idle session"));
        }
        let bound = compress_bound(src.len())?;
        if let Some(limit) = self.budget.limit() {
            if limit < bound {
                self.state = SessionState::Failed;
                return Err(ZframeError::OutputLimitExceeded { limit });
            }
        }

        let mut dst = Vec::with_capacity(bound.min(self.budget.remaining()));
        let res = self
            .ctx
            .compress2(&mut dst, src)
            .map_err(compression_error)
            .and_then(|written| self.budget.admit(written));
        self.settle(res)?;
        dst.shrink_to_fit();
        self.state = SessionState::Finished;
        Ok(dst)
    }

    fn drive(&mut self, input: &[u8], out: &mut Vec<u8>, directive: ZSTD_EndDirective) -> Result<usize> {
        let ending = matches!(directive, ZSTD_EndDirective::ZSTD_e_end);
        let mut src = InBuffer::around(input);
        let mut written = 0usize;

        loop {
            self.scratch.clear();
            let pending = {
                let mut dst = OutBuffer::around(&mut self.scratch);
                self.ctx
                    .compress_stream2(&mut dst, &mut src, directive)
                    .map_err(compression_error)?
            };

            let block = self.scratch.len();
            if block > 0 {
                self.budget.admit(block)?;
                out.extend_from_slice(&self.scratch);
                written += block;
            }

            let done = if ending { pending == 0 } else { src.pos() == input.len() };
            if done {
                return Ok(written);
            }
        }
    }

    fn settle<T>(&mut self, res: Result<T>) -> Result<T> {
        if res.is_err() {
            self.state = SessionState::Failed;
        }
        res
    }
}

impl Compressor for CompressionSession {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.compress(input, out)
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        CompressionSession::finish(self, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn session_is_send() {
        assert_send::<CompressionSession>();
    }

    #[test]
    fn empty_frame_is_still_a_frame() {
        let mut session = CompressionSession::new(CompressionOptions::default()).unwrap();
        let mut out = Vec::new();
        assert_eq!(session.compress(&[], &mut out).unwrap(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        session.finish(&mut out).unwrap();
        assert_eq!(&out[..4], &crate::constants::MAGIC_FRAME);
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn production_after_finish_is_a_noop() {
        let mut session = CompressionSession::new(CompressionOptions::default()).unwrap();
        let mut out = Vec::new();
        session.compress(b"hello", &mut out).unwrap();
        session.finish(&mut out).unwrap();
        let len = out.len();
        assert_eq!(session.compress(b"more", &mut out).unwrap(), 0);
        assert_eq!(out.len(), len);
    }

    #[test]
    fn invalid_level_is_rejected_up_front() {
        let opts = CompressionOptions::with_level(zstd_safe::max_c_level() + 1);
        assert!(matches!(CompressionSession::new(opts), Err(ZframeError::InvalidOptions(_))));
    }

    #[test]
    fn failed_session_needs_reset() {
        let opts = CompressionOptions::default().with_max_output(1);
        let mut session = CompressionSession::new(opts).unwrap();
        let mut out = Vec::new();
        let err = session
            .compress(b"data", &mut out)
            .and_then(|_| session.finish(&mut out))
            .unwrap_err();
        assert!(err.is_limit());
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(session.compress(b"x", &mut out), Err(ZframeError::InvalidState(_))));
        session.reset(Some(CompressionOptions::default())).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }
}
