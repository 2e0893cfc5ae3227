//! stream/config.rs
//! Tunables for the pump and the pipe, validated before any work starts.
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PIPE_DEPTH, MAX_CHUNK_SIZE, MAX_PIPE_DEPTH, MIN_PIPE_DEPTH};
use crate::types::{Result, ZframeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bytes read from the source per codec call.
    pub chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl StreamConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    pub fn validate(&self) -> Result<()> {
        validate_chunk_size(self.chunk_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeConfig {
    /// Output chunks queued ahead of the consumer before the producer waits.
    pub depth: usize,
    /// Parent token; the pipe runs under a child of it.
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_PIPE_DEPTH, cancel: None }
    }
}

impl PipeConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self { depth, ..Self::default() }
    }

    pub fn with_cancel(mut self, parent: CancellationToken) -> Self {
        self.cancel = Some(parent);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_pipe_depth(self.depth)
    }
}

pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(ZframeError::InvalidOptions(format!(
            "chunk size {chunk_size} outside [1, {MAX_CHUNK_SIZE}]"
        )));
    }
    Ok(())
}

pub fn validate_pipe_depth(depth: usize) -> Result<()> {
    if !(MIN_PIPE_DEPTH..=MAX_PIPE_DEPTH).contains(&depth) {
        return Err(ZframeError::InvalidOptions(format!(
            "pipe depth {depth} outside [{MIN_PIPE_DEPTH}, {MAX_PIPE_DEPTH}]"
        )));
    }
    Ok(())
}
