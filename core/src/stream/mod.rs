//! stream/mod.rs
//!
//! Adapters that drive a session from a byte source to a byte sink.
//!
//! Design notes:
//! - `ChunkStage` is the seam shared by the blocking pump and the async pipe:
//!   feed a chunk, collect produced bytes, then signal end of input.
//! - `Encoding` closes the frame on end of input; `Decoding` restarts its
//!   session whenever a new frame begins after a finished one.

pub mod config;
pub mod io;
pub mod pipe;
pub mod pump;

pub use config::{PipeConfig, StreamConfig};
pub use io::{open_input, open_output, InputSource, OutputSink, SharedBuffer};
pub use pipe::AsyncPipe;
pub use pump::{compress_source, decompress_source, pump, pump_compress, pump_decompress};

use log::trace;

use crate::compression::types::{Compressor, Decompressor};
use crate::telemetry::Stage;
use crate::types::Result;

/// One direction of the codec as seen by a stream adapter.
pub trait ChunkStage: Send {
    /// Timer stage charged for `feed` and `end_of_input`.
    fn stage(&self) -> Stage;
    /// Process one input chunk, appending produced bytes to `out`.
    fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize>;
    /// No more input follows; append any trailing bytes to `out`.
    fn end_of_input(&mut self, out: &mut Vec<u8>) -> Result<usize>;
    /// Frames completed so far.
    fn frames(&self) -> usize;
}

pub struct Encoding<C: Compressor> {
    inner: C,
    finished: bool,
}

impl<C: Compressor> Encoding<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, finished: false }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Compressor> ChunkStage for Encoding<C> {
    fn stage(&self) -> Stage {
        Stage::Compress
    }

    fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        self.inner.compress_chunk(input, out)
    }

    fn end_of_input(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let n = self.inner.finish(out)?;
        self.finished = true;
        Ok(n)
    }

    fn frames(&self) -> usize {
        usize::from(self.finished)
    }
}

pub struct Decoding<D: Decompressor> {
    inner: D,
    frames: usize,
}

impl<D: Decompressor> Decoding<D> {
    pub fn new(inner: D) -> Self {
        Self { inner, frames: 0 }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Decompressor> ChunkStage for Decoding<D> {
    fn stage(&self) -> Stage {
        Stage::Decompress
    }

    fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        if input.is_empty() {
            return Ok(0);
        }
        if self.inner.is_finished() {
            trace!("next concatenated frame after {} frames", self.frames);
            self.inner.restart()?;
        }
        let progress = self.inner.decompress_chunk(input, out)?;
        self.frames += progress.frames;
        Ok(progress.produced)
    }

    fn end_of_input(&mut self, _out: &mut Vec<u8>) -> Result<usize> {
        self.inner.end_of_input()?;
        Ok(0)
    }

    fn frames(&self) -> usize {
        self.frames
    }
}
