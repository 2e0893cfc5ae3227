//! stream/pipe.rs
//!
//! Async pipe: an input chunk stream in, a bounded stream of output chunks out.
//!
//! Design notes:
//! - One producer task owns the session and the input stream; output order is
//!   input order.
//! - The output channel is bounded by `PipeConfig::depth`, so a slow consumer
//!   stalls the producer instead of growing memory.
//! - The producer checks its cancellation token before every input pull and
//!   while waiting on the channel. Dropping the pipe cancels it; the task then
//!   drops the input stream and the session, releasing the native context.
//! - A cancelled pipe ends its stream without an error item.
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::compression::compress::CompressionSession;
use crate::compression::decompress::DecompressionSession;
use crate::compression::types::{CompressionOptions, DecompressionOptions};
use crate::stream::config::PipeConfig;
use crate::stream::{ChunkStage, Decoding, Encoding};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{Result, ZframeError};

/// A running compression or decompression task exposed as a [`Stream`].
///
/// Dropping the pipe only signals cancellation; the producer winds down on
/// the runtime afterwards. Callers that need the input stream and the native
/// context released before moving on must call [`close`](Self::close) and
/// await it.
pub struct AsyncPipe {
    rx: mpsc::Receiver<Result<Bytes>>,
    token: CancellationToken,
    task: Option<JoinHandle<TelemetrySnapshot>>,
}

impl AsyncPipe {
    /// Compress `input` into a single frame, streamed out chunk by chunk.
    ///
    /// Must be called inside a tokio runtime.
    pub fn compress<S>(input: S, options: CompressionOptions, config: PipeConfig) -> Result<Self>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        config.validate()?;
        let session = CompressionSession::new(options)?;
        Self::spawn(input, Encoding::new(session), config)
    }

    /// Decompress `input` (one or more concatenated frames).
    ///
    /// If the input ends inside a frame, the last item is `Err(InvalidFrame)`.
    pub fn decompress<S>(input: S, options: DecompressionOptions, config: PipeConfig) -> Result<Self>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        config.validate()?;
        let session = DecompressionSession::new(options)?;
        Self::spawn(input, Decoding::new(session), config)
    }

    fn spawn<S, C>(input: S, stage: C, config: PipeConfig) -> Result<Self>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
        C: ChunkStage + 'static,
    {
        let handle = Handle::try_current().map_err(|e| ZframeError::Pipeline(e.to_string()))?;
        let token = match &config.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let (tx, rx) = mpsc::channel(config.depth);
        debug!("pipe start: {} with depth {}", stage.stage(), config.depth);
        let task = handle.spawn(produce(input, stage, tx, token.clone()));

        Ok(Self { rx, token, task: Some(task) })
    }

    /// Stop the producer at its next check. Items already queued stay readable.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the producer, wait for it to exit and return its telemetry.
    ///
    /// A pipe drained to the end reports `cancelled == false`.
    pub async fn close(mut self) -> Result<TelemetrySnapshot> {
        self.token.cancel();
        self.rx.close();
        let task = self
            .task
            .take()
            .ok_or_else(|| ZframeError::Pipeline("producer already joined".into()))?;
        task.await.map_err(|e| ZframeError::Pipeline(e.to_string()))
    }
}

impl Stream for AsyncPipe {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for AsyncPipe {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn produce<S, C>(
    input: S,
    mut stage: C,
    tx: mpsc::Sender<Result<Bytes>>,
    token: CancellationToken,
) -> TelemetrySnapshot
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    C: ChunkStage,
{
    let mut input = Box::pin(input);
    let codec_stage = stage.stage();
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let mut cancelled = false;
    let mut out = Vec::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                cancelled = true;
                break;
            }
            item = input.next() => item,
        };

        out.clear();
        let (res, last) = match next {
            Some(Ok(chunk)) => {
                counters.add_input(chunk.len());
                (timer.measure(codec_stage, || stage.feed(&chunk, &mut out)), false)
            }
            Some(Err(e)) => (Err(ZframeError::Io(e)), true),
            None => (timer.measure(codec_stage, || stage.end_of_input(&mut out)), true),
        };

        let item = match res {
            Ok(_) if out.is_empty() => None,
            Ok(_) => Some(Ok(Bytes::from(std::mem::take(&mut out)))),
            Err(e) => Some(Err(e)),
        };
        let failed = matches!(item, Some(Err(_)));

        if let Some(item) = item {
            let len = item.as_ref().map_or(0, Bytes::len);
            let started = Instant::now();
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    cancelled = true;
                    break;
                }
                sent = tx.send(item) => {
                    if sent.is_err() {
                        trace!("pipe consumer gone");
                        break;
                    }
                }
            }
            timer.add_stage_time(Stage::Write, started.elapsed());
            counters.add_output(len);
        }

        if last || failed {
            break;
        }
    }

    counters.add_frames(stage.frames());
    drop(stage);
    drop(input);
    timer.finish();

    let mut snapshot = TelemetrySnapshot::from(&counters, &timer);
    snapshot.cancelled = cancelled;
    debug!(
        "pipe end: {} bytes in, {} bytes out, cancelled {}",
        snapshot.bytes_in, snapshot.bytes_out, cancelled
    );
    snapshot
}
