//! zframe-core
//!
//! Bounded streaming sessions over the zstd codec.
//! Hard output and window budgets, shared dictionaries, a blocking pump and
//! an async pipe. No unsafe code; all FFI goes through `zstd-safe`.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod compression;
pub mod telemetry;

// Stream adapters
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{
        compress, compress_with, decompress, decompress_with, frame_dictionary_id, plan_decompression, train,
        CompressionOptions, CompressionSession, Compressor, ContentSize, DecodePlan, DecompressionOptions,
        DecompressionSession, Decompressor, DictIdMode, Dictionary, FrameInfo, FrameInspector, Progress,
        SessionState,
    };
    pub use crate::stream::{
        compress_source, decompress_source, pump_compress, pump_decompress, AsyncPipe, InputSource, OutputSink,
        PipeConfig, StreamConfig,
    };
    pub use crate::telemetry::{Stage, TelemetrySnapshot};
    pub use crate::types::{Result, ZframeError};
}
