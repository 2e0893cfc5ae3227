//! stream/pump.rs
//!
//! Blocking pump: reader -> session -> writer, one fixed-size chunk at a time.
//!
//! Design notes:
//! - Produced bytes are written as soon as each chunk is processed; memory
//!   use is bounded by the chunk size plus one codec block.
//! - A decompression stream may hold several concatenated frames.
//! - Files and contexts are released on every exit path by drop.
use std::io::{Read, Write};

use log::debug;

use crate::compression::compress::CompressionSession;
use crate::compression::decompress::DecompressionSession;
use crate::compression::types::{CompressionOptions, DecompressionOptions};
use crate::stream::config::{validate_chunk_size, StreamConfig};
use crate::stream::io::{open_input, open_output, InputSource, OutputSink};
use crate::stream::{ChunkStage, Decoding, Encoding};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::Result;
use crate::utils::read_full_or_eof;

/// Drive `stage` over `reader` until EOF, writing every produced block to `writer`.
pub fn pump<R, W, S>(mut reader: R, mut writer: W, stage: &mut S, chunk_size: usize) -> Result<TelemetrySnapshot>
where
    R: Read,
    W: Write,
    S: ChunkStage + ?Sized,
{
    validate_chunk_size(chunk_size)?;
    let codec_stage = stage.stage();
    debug!("pump start: {} with {} byte chunks", codec_stage, chunk_size);

    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let mut buf = vec![0u8; chunk_size];
    let mut out = Vec::new();

    loop {
        let n = timer.measure(Stage::Read, || read_full_or_eof(&mut reader, &mut buf))?;
        if n == 0 {
            break;
        }
        counters.add_input(n);

        out.clear();
        timer.measure(codec_stage, || stage.feed(&buf[..n], &mut out))?;
        if !out.is_empty() {
            timer.measure(Stage::Write, || writer.write_all(&out))?;
            counters.add_output(out.len());
        }
    }

    out.clear();
    timer.measure(codec_stage, || stage.end_of_input(&mut out))?;
    timer.measure(Stage::Write, || -> std::io::Result<()> {
        writer.write_all(&out)?;
        writer.flush()
    })?;
    counters.add_output(out.len());
    counters.add_frames(stage.frames());

    timer.finish();
    let snapshot = TelemetrySnapshot::from(&counters, &timer);
    debug!(
        "pump end: {} bytes in, {} bytes out, {} frames",
        snapshot.bytes_in, snapshot.bytes_out, snapshot.frames
    );
    Ok(snapshot)
}

/// Compress everything `reader` yields into one frame on `writer`.
///
/// The session is reset first, so it must not be mid-frame.
pub fn pump_compress<R: Read, W: Write>(
    reader: R,
    writer: W,
    session: &mut CompressionSession,
    chunk_size: usize,
) -> Result<TelemetrySnapshot> {
    session.reset(None)?;
    pump(reader, writer, &mut Encoding::new(session), chunk_size)
}

/// Decompress one or more concatenated frames from `reader` onto `writer`.
///
/// Fails with `InvalidFrame` if the input ends inside a frame.
pub fn pump_decompress<R: Read, W: Write>(
    reader: R,
    writer: W,
    session: &mut DecompressionSession,
    chunk_size: usize,
) -> Result<TelemetrySnapshot> {
    session.reset(None)?;
    pump(reader, writer, &mut Decoding::new(session), chunk_size)
}

pub fn compress_source(
    input: InputSource,
    output: OutputSink,
    options: CompressionOptions,
    config: StreamConfig,
) -> Result<TelemetrySnapshot> {
    config.validate()?;
    let mut session = CompressionSession::new(options)?;
    let reader = open_input(input)?;
    let (writer, captured) = open_output(output)?;

    let mut snapshot = pump_compress(reader, writer, &mut session, config.chunk_size)?;
    if let Some(buf) = captured {
        snapshot.attach_output(buf.take());
    }
    Ok(snapshot)
}

pub fn decompress_source(
    input: InputSource,
    output: OutputSink,
    options: DecompressionOptions,
    config: StreamConfig,
) -> Result<TelemetrySnapshot> {
    config.validate()?;
    let mut session = DecompressionSession::new(options)?;
    let reader = open_input(input)?;
    let (writer, captured) = open_output(output)?;

    let mut snapshot = pump_decompress(reader, writer, &mut session, config.chunk_size)?;
    if let Some(buf) = captured {
        snapshot.attach_output(buf.take());
    }
    Ok(snapshot)
}
