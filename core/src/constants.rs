//! constants.rs
//! Named defaults shared by sessions, the one-shot facade and the stream adapters.
//!
//! These are defaults only. Every one of them is carried through an options or
//! config struct so callers can override it per call.

/// Default decompressed-byte budget (16 MiB).
pub const DEFAULT_DECOMPRESSION_BUDGET: usize = 16 * 1024 * 1024;

/// Largest declared content size the one-shot path will allocate up front (64 MiB).
pub const EAGER_ALLOCATION_CEILING: usize = 64 * 1024 * 1024;

/// Default compression level (libzstd's own default).
pub const DEFAULT_LEVEL: i32 = 3;

/// Pump read size.
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024; // 128 KiB, libzstd's recommended input size
/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Output chunks an async pipe may queue ahead of a slow consumer.
pub const DEFAULT_PIPE_DEPTH: usize = 4;
/// Bounds for `PipeConfig::depth`.
pub const MIN_PIPE_DEPTH: usize = 1;
pub const MAX_PIPE_DEPTH: usize = 1024;

/// Window log bounds accepted by libzstd on 64-bit targets.
pub const MIN_WINDOW_LOG: u32 = 10;
pub const MAX_WINDOW_LOG: u32 = 31;
/// Window log libzstd accepts on decode when no `max_window_log` is set.
pub const DEFAULT_MAX_WINDOW_LOG: u32 = 27;

/// Magic number opening every zstd dictionary in the trained format.
pub const MAGIC_DICT: [u8; 4] = [0x37, 0xA4, 0x30, 0xEC];

/// Magic number opening every standard zstd frame.
pub const MAGIC_FRAME: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
