mod common;

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use futures::{stream, Stream, StreamExt};
    use tokio_util::io::ReaderStream;
    use tokio_util::sync::CancellationToken;
    use zframe_core::compression::{compress, CompressionOptions, DecompressionOptions};
    use zframe_core::stream::{AsyncPipe, PipeConfig};
    use zframe_core::types::{Result, ZframeError};

    use crate::common::{noise, stream_compress, text};

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Endless noise chunks; counts pulls and flags when the stream is dropped.
    fn endless(pulls: Arc<AtomicUsize>, dropped: Arc<AtomicBool>) -> impl Stream<Item = io::Result<Bytes>> + Send {
        let guard = DropFlag(dropped);
        let mut seed = 1u64;
        stream::repeat_with(move || {
            let _held = &guard;
            pulls.fetch_add(1, Ordering::SeqCst);
            seed += 1;
            Ok(Bytes::from(noise(4096, seed)))
        })
    }

    async fn collect(mut pipe: AsyncPipe) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(item) = pipe.next().await {
            out.extend_from_slice(&item?);
        }
        Ok(out)
    }

    async fn wait_for(flag: &AtomicBool) -> bool {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !flag.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }

    // --- Round trip ---

    #[tokio::test]
    async fn pipe_round_trip_over_reader_stream() {
        let data = text(500_000);
        let input = ReaderStream::with_capacity(Cursor::new(data.clone()), 10_000);
        let pipe = AsyncPipe::compress(input, CompressionOptions::default(), PipeConfig::default()).unwrap();
        let frame = collect(pipe).await.unwrap();
        assert_eq!(zstd::stream::decode_all(frame.as_slice()).unwrap(), data);

        let input = ReaderStream::with_capacity(Cursor::new(frame), 333);
        let pipe = AsyncPipe::decompress(input, DecompressionOptions::default(), PipeConfig::with_depth(1)).unwrap();
        assert_eq!(collect(pipe).await.unwrap(), data);
    }

    #[tokio::test]
    async fn pipe_decodes_concatenated_frames() {
        let mut buf = compress(b"alpha ", &CompressionOptions::default()).unwrap();
        buf.extend(stream_compress(b"beta", CompressionOptions::default(), 1));
        let input = stream::iter(buf.chunks(5).map(|c| Ok(Bytes::copy_from_slice(c))).collect::<Vec<_>>());
        let mut pipe = AsyncPipe::decompress(input, DecompressionOptions::default(), PipeConfig::default()).unwrap();

        let mut out = Vec::new();
        while let Some(item) = pipe.next().await {
            out.extend_from_slice(&item.unwrap());
        }
        assert_eq!(out, b"alpha beta");

        let snap = pipe.close().await.unwrap();
        assert_eq!(snap.frames, 2);
        assert!(!snap.cancelled);
        assert_eq!(snap.bytes_out, 10);
    }

    // --- Truncated frame ---

    #[tokio::test]
    async fn truncated_input_ends_with_invalid_frame() {
        let frame = stream_compress(&noise(20_000, 6), CompressionOptions::default(), 2000);
        let cut = Bytes::from(frame[..frame.len() - 3].to_vec());
        let pipe = AsyncPipe::decompress(
            stream::iter(vec![Ok(cut)]),
            DecompressionOptions::default(),
            PipeConfig::default(),
        )
        .unwrap();
        let items: Vec<_> = pipe.collect().await;
        assert!(matches!(items.last(), Some(Err(ZframeError::InvalidFrame(_)))));
    }

    #[tokio::test]
    async fn input_errors_are_forwarded() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"some data")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source failed")),
        ]);
        let pipe = AsyncPipe::compress(input, CompressionOptions::default(), PipeConfig::default()).unwrap();
        let err = collect(pipe).await.unwrap_err();
        assert!(matches!(err, ZframeError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[tokio::test]
    async fn budget_errors_reach_the_consumer() {
        let frame = stream_compress(&vec![0u8; 1 << 20], CompressionOptions::default(), 1 << 16);
        let pipe = AsyncPipe::decompress(
            stream::iter(vec![Ok(Bytes::from(frame))]),
            DecompressionOptions::default().with_max_output(4096),
            PipeConfig::default(),
        )
        .unwrap();
        assert_eq!(collect(pipe).await.unwrap_err(), ZframeError::OutputLimitExceeded { limit: 4096 });
    }

    // --- Cancellation ---

    #[tokio::test]
    async fn dropping_the_pipe_releases_the_input() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let input = endless(pulls.clone(), dropped.clone());
        let opts = CompressionOptions::with_level(1);
        let mut pipe = AsyncPipe::compress(input, opts, PipeConfig::with_depth(2)).unwrap();

        for _ in 0..3 {
            assert!(pipe.next().await.unwrap().is_ok());
        }
        let at_drop = pulls.load(Ordering::SeqCst);
        drop(pipe);

        assert!(wait_for(&dropped).await, "input stream was not dropped after cancellation");
        assert!(pulls.load(Ordering::SeqCst) <= at_drop + 1);
    }

    #[tokio::test]
    async fn close_reports_cancellation() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let mut pipe =
            AsyncPipe::compress(endless(pulls, dropped.clone()), CompressionOptions::with_level(1), PipeConfig::default())
                .unwrap();
        assert!(pipe.next().await.unwrap().is_ok());

        let snap = pipe.close().await.unwrap();
        assert!(snap.cancelled);
        assert!(snap.bytes_in > 0);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn parent_token_cancels_without_error() {
        let parent = CancellationToken::new();
        let pulls = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let config = PipeConfig::default().with_cancel(parent.clone());
        let mut pipe = AsyncPipe::compress(endless(pulls, dropped.clone()), CompressionOptions::with_level(1), config)
            .unwrap();

        assert!(pipe.next().await.unwrap().is_ok());
        parent.cancel();
        assert!(pipe.is_cancelled());
        while let Some(item) = pipe.next().await {
            assert!(item.is_ok(), "cancellation must not surface as an error");
        }
        assert!(wait_for(&dropped).await);
    }

    #[tokio::test]
    async fn slow_consumer_stalls_the_producer() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let mut pipe = AsyncPipe::compress(
            endless(pulls.clone(), dropped),
            CompressionOptions::with_level(1),
            PipeConfig::with_depth(1),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        let stalled = pulls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(pulls.load(Ordering::SeqCst), stalled);

        assert!(pipe.next().await.unwrap().is_ok());
        pipe.cancel();
    }

    // --- Setup errors ---

    #[test]
    fn pipe_needs_a_runtime() {
        let input = stream::empty::<io::Result<Bytes>>();
        let err = AsyncPipe::compress(input, CompressionOptions::default(), PipeConfig::default()).err().unwrap();
        assert!(matches!(err, ZframeError::Pipeline(_)));
    }

    #[tokio::test]
    async fn invalid_depth_is_rejected() {
        let input = stream::empty::<io::Result<Bytes>>();
        let err = AsyncPipe::compress(input, CompressionOptions::default(), PipeConfig::with_depth(0)).err().unwrap();
        assert!(matches!(err, ZframeError::InvalidOptions(_)));
    }
}
