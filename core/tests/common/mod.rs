#![allow(dead_code)]

use zframe_core::compression::{CompressionOptions, CompressionSession};

/// Incompressible bytes from a xorshift generator.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Highly compressible text.
pub fn text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Small JSON-like records that share most of their structure.
pub fn json_samples(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            format!(
                "{{\"id\":{i},\"user\":\"user-{}\",\"role\":\"{}\",\"active\":{},\"score\":{}}}",
                i % 97,
                ["admin", "editor", "viewer"][i % 3],
                i % 2 == 0,
                (i * 37) % 1000
            )
            .into_bytes()
        })
        .collect()
}

/// Log-line records with a different vocabulary from `json_samples`.
pub fn log_samples(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            format!(
                "2024-03-{:02} 12:{:02}:{:02} [{}] worker-{} handled request /api/v1/items/{} in {}ms",
                i % 28 + 1,
                i % 60,
                (i * 7) % 60,
                ["INFO", "WARN", "DEBUG"][i % 3],
                i % 8,
                i,
                (i * 13) % 500
            )
            .into_bytes()
        })
        .collect()
}

/// Compress `data` through a session in `chunk`-sized pieces.
pub fn stream_compress(data: &[u8], options: CompressionOptions, chunk: usize) -> Vec<u8> {
    let mut session = CompressionSession::new(options).expect("session");
    let mut out = Vec::new();
    for piece in data.chunks(chunk.max(1)) {
        session.compress(piece, &mut out).expect("compress");
    }
    session.finish(&mut out).expect("finish");
    out
}
