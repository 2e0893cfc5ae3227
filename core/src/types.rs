use std::io;

/// Unified error for sessions, the one-shot facade and the stream adapters.
///
/// - The first four variants are the codec taxonomy: library failure, bad frame,
///   budget violation and size overflow.
/// - The rest cover option validation, misuse of the session state machine,
///   I/O on the stream adapters and a failed pipe task.
///
/// Production calls never roll back. Bytes already appended to a caller's
/// accumulator before an error stay there, and the caller must discard the
/// accumulator on any `Err`.
#[derive(Debug, thiserror::Error)]
pub enum ZframeError {
    /// Opaque failure surfaced by libzstd. Compares by `code` only.
    #[error("zstd library error {code}: {name}")]
    Library { code: usize, name: &'static str },

    /// Empty input, corrupt header or data, or a stream that ended mid-frame.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A configured budget (output bytes or window memory) is or would be exceeded.
    #[error("output limit exceeded: limit is {limit} bytes")]
    OutputLimitExceeded { limit: usize },

    /// A required size does not fit in `usize`.
    #[error("frame too large for this platform")]
    FrameTooLarge,

    /// Options rejected before anything was committed.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Call not valid in the session's current state.
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    /// I/O on a stream adapter's source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The pipe's producer task panicked or could not be joined.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl PartialEq for ZframeError {
    fn eq(&self, other: &Self) -> bool {
        use ZframeError::*;
        match (self, other) {
            (Library { code: a, .. }, Library { code: b, .. }) => a == b,
            (InvalidFrame(_), InvalidFrame(_)) => true,
            (OutputLimitExceeded { limit: a }, OutputLimitExceeded { limit: b }) => a == b,
            (FrameTooLarge, FrameTooLarge) => true,
            (InvalidOptions(_), InvalidOptions(_)) => true,
            (InvalidState(a), InvalidState(b)) => a == b,
            (Io(a), Io(b)) => a.kind() == b.kind(),
            (Pipeline(_), Pipeline(_)) => true,
            _ => false,
        }
    }
}

impl ZframeError {
    pub fn is_limit(&self) -> bool {
        matches!(self, ZframeError::OutputLimitExceeded { .. })
    }

    pub fn is_invalid_frame(&self) -> bool {
        matches!(self, ZframeError::InvalidFrame(_))
    }

    pub fn is_library(&self) -> bool {
        matches!(self, ZframeError::Library { .. })
    }
}

pub type Result<T> = std::result::Result<T, ZframeError>;
