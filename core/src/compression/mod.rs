//! compression/mod.rs
//! Bounded zstd sessions, dictionaries, frame inspection and the one-shot facade.
//!
//! Notes:
//! - Every production call checks its output against a per-frame budget before
//!   handing bytes to the caller.
//! - Dictionaries are compiled once and shared between sessions via `Arc`.
//! - Sessions are reusable across frames through `reset`.

pub mod budget;
pub mod codec;
pub mod compress;
pub mod decompress;
pub mod dictionary;
pub mod frame;
pub mod oneshot;
pub mod types;

pub use budget::Budget;
pub use codec::NativeError;
pub use compress::CompressionSession;
pub use decompress::DecompressionSession;
pub use dictionary::{train, Dictionary};
pub use frame::{frame_dictionary_id, ContentSize, FrameInfo, FrameInspector};
pub use oneshot::{compress, compress_with, decompress, decompress_with, plan_decompression, DecodePlan};
pub use types::*;
