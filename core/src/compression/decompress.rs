//! compression/decompress.rs
//!
//! Incremental, budget-checked frame decompression.
//!
//! Design notes:
//! - Output is produced through a reusable scratch buffer and admitted against
//!   the per-frame budget block by block, so a hostile frame can never make the
//!   session allocate past `max_output`.
//! - Concatenated frames inside one chunk decode back to back; the budget is
//!   per frame and restarts at each boundary. The one-shot path adds a
//!   call-wide total on top that never restarts.
//! - Production calls never roll back: on `Err` the caller discards `out`.
use log::{debug, trace};
use zstd_safe::{DCtx, InBuffer, OutBuffer, ResetDirective};

use crate::compression::budget::Budget;
use crate::compression::codec::{apply_decompression_options, decompression_error, library_error, NativeError};
use crate::compression::types::{DecompressionOptions, Decompressor, Progress, SessionState};
use crate::types::{Result, ZframeError};

/// Streaming decompressor.
///
/// `Send` but not `Sync`: every call takes `&mut self`.
pub struct DecompressionSession {
    // Declared before `options`: the context drops before the dictionary it references.
    ctx: DCtx<'static>,
    options: DecompressionOptions,
    scratch: Vec<u8>,
    budget: Budget,
    // Set only for the duration of `decode_all`.
    total: Option<Budget>,
    state: SessionState,
}

impl DecompressionSession {
    pub fn new(options: DecompressionOptions) -> Result<Self> {
        options.validate()?;
        let mut ctx = DCtx::try_create().ok_or_else(|| library_error(NativeError::MemoryAllocation.code()))?;
        apply_decompression_options(&mut ctx, &options)?;
        debug!(
            "decompression session: budget {}, max window log {:?}, dictionary {}",
            options.max_output,
            options.max_window_log,
            options.dictionary.is_some()
        );

        Ok(Self {
            ctx,
            budget: Budget::limited(options.max_output),
            total: None,
            options,
            scratch: Vec::with_capacity(DCtx::out_size()),
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &DecompressionOptions {
        &self.options
    }

    /// Decompressed bytes produced for the current frame.
    pub fn produced(&self) -> usize {
        self.budget.produced()
    }

    /// Feed one chunk of compressed input, appending decoded bytes to `out`.
    ///
    /// `Progress::frame_complete` is set when the chunk ends exactly on a frame
    /// boundary. A no-op once the frame is finished; call `reset` to decode
    /// another frame from a fresh chunk.
    ///
    /// # Errors
    /// - `OutputLimitExceeded` if the frame outgrows `max_output` or its window
    ///   exceeds `max_window_log`.
    /// - `InvalidFrame` for malformed input.
    /// - `Library` for other native failures (e.g. wrong dictionary).
    /// - `InvalidState` after a previous failure.
    ///
    /// On error, bytes appended earlier in this call stay in `out`; discard it.
    pub fn decompress(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<Progress> {
        match self.state {
            SessionState::Finished => return Ok(Progress::default()),
            SessionState::Failed => {
                return Err(ZframeError::InvalidState("decompression session failed; reset required"))
            }
            SessionState::Idle | SessionState::Open => {}
        }
        if chunk.is_empty() {
            return Ok(Progress::default());
        }
        self.state = SessionState::Open;
        let res = self.drive(chunk, out);
        let progress = self.settle(res)?;
        if progress.frame_complete {
            self.state = SessionState::Finished;
        }
        Ok(progress)
    }

    /// Declare the end of compressed input.
    ///
    /// # Errors
    /// `InvalidFrame` if no frame was started or the current one is incomplete.
    pub fn end_of_input(&mut self) -> Result<()> {
        match self.state {
            SessionState::Finished => Ok(()),
            SessionState::Idle => {
                self.state = SessionState::Failed;
                Err(ZframeError::InvalidFrame("no frame data".into()))
            }
            SessionState::Open => {
                self.state = SessionState::Failed;
                Err(ZframeError::InvalidFrame("input ended mid-frame".into()))
            }
            SessionState::Failed => Err(ZframeError::InvalidState("decompression session failed; reset required")),
        }
    }

    /// Return to `Idle`, optionally with new options. Rejected mid-frame.
    pub fn reset(&mut self, options: Option<DecompressionOptions>) -> Result<()> {
        if !self.state.can_reset() {
            return Err(ZframeError::InvalidState("cannot reset a decompression session mid-frame"));
        }
        if let Some(opts) = &options {
            opts.validate()?;
        }
        self.ctx.reset(ResetDirective::SessionAndParameters).map_err(library_error)?;
        if let Some(opts) = options {
            self.options = opts;
        }
        if let Err(e) = apply_decompression_options(&mut self.ctx, &self.options) {
            self.state = SessionState::Failed;
            return Err(e);
        }
        self.budget = Budget::limited(self.options.max_output);
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Decode a single frame of known size `n` directly into an exact allocation.
    pub(crate) fn decode_exact(&mut self, src: &[u8], n: usize) -> Result<Vec<u8>> {
        if self.state != SessionState::Idle {
            return Err(ZframeError::InvalidState("one-shot decompression needs an idle session"));
        }
        let max_window_log = self.options.max_window_log;
        let mut dst = Vec::with_capacity(n);
        let res = self
            .ctx
            .decompress(&mut dst, src)
            .map_err(|code| match NativeError::from_code(code) {
                Some(NativeError::DstSizeTooSmall) => {
                    ZframeError::InvalidFrame("frame decodes past its declared content size".into())
                }
                _ => decompression_error(code, max_window_log),
            })
            .and_then(|written| {
                if written == n {
                    Ok(written)
                } else {
                    Err(ZframeError::InvalidFrame(format!("frame declared {n} bytes but decoded {written}")))
                }
            })
            .and_then(|written| self.budget.admit(written));
        self.settle(res)?;
        self.state = SessionState::Finished;
        trace!("eager decode: {} bytes", n);
        Ok(dst)
    }

    /// Decode every frame in `src`, holding the combined output to `max_output`.
    pub(crate) fn decode_all(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        self.total = Some(Budget::limited(self.options.max_output));
        let mut out = Vec::new();
        let res = self.decompress(src, &mut out).and_then(|_| self.end_of_input());
        self.total = None;
        res.map(|()| out)
    }

    fn drive(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Progress> {
        let max_window_log = self.options.max_window_log;
        let mut src = InBuffer::around(input);
        let mut progress = Progress::default();

        loop {
            self.scratch.clear();
            let capacity = self.scratch.capacity();
            let hint = {
                let mut dst = OutBuffer::around(&mut self.scratch);
                self.ctx
                    .decompress_stream(&mut dst, &mut src)
                    .map_err(|code| decompression_error(code, max_window_log))?
            };

            let block = self.scratch.len();
            if block > 0 {
                self.budget.admit(block)?;
                if let Some(total) = self.total.as_mut() {
                    total.admit(block)?;
                }
                out.extend_from_slice(&self.scratch);
                progress.produced += block;
            }

            let consumed = src.pos() == input.len();
            if hint == 0 {
                progress.frames += 1;
                trace!("frame complete: {} bytes", self.budget.produced());
                if consumed {
                    progress.frame_complete = true;
                    return Ok(progress);
                }
                // Next concatenated frame in the same chunk.
                self.budget.restart();
                continue;
            }
            if consumed && block < capacity {
                return Ok(progress);
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

impl Decompressor for DecompressionSession {
    fn decompress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Progress> {
        self.decompress(input, out)
    }

    fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    fn restart(&mut self) -> Result<()> {
        self.reset(None)
    }

    fn end_of_input(&mut self) -> Result<()> {
        DecompressionSession::end_of_input(self)
    }
}
