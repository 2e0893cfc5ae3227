//! compression/budget.rs
//! Per-frame output accounting.

use crate::types::{Result, ZframeError};

/// Bytes produced for the current frame, checked against an optional limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    limit: Option<usize>,
    produced: usize,
}

impl Budget {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, produced: 0 }
    }

    pub fn limited(limit: usize) -> Self {
        Self::new(Some(limit))
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Bytes still allowed for this frame.
    pub fn remaining(&self) -> usize {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.produced),
            None => usize::MAX,
        }
    }

    /// Admit a block of `len` bytes before it reaches the caller.
    ///
    /// On `Err` nothing is counted, and the block must be discarded.
    pub fn admit(&mut self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(ZframeError::OutputLimitExceeded { limit: self.limit.unwrap_or(usize::MAX) });
        }
        self.produced = self.produced.saturating_add(len);
        Ok(())
    }

    /// Zero the counter at a frame boundary.
    pub fn restart(&mut self) {
        self.produced = 0;
    }
}
