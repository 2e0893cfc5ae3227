//! telemetry/counters.rs
//! Mutable counters used while a stream is running.
//!
//! Collects chunk and byte counts on both sides of the codec, plus completed
//! frames. Converted into an immutable `TelemetrySnapshot` when the stream ends.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks_in: u64,
    pub chunks_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub frames: u64,
}

impl TelemetryCounters {
    /// Record one chunk read from the source.
    pub fn add_input(&mut self, len: usize) {
        self.chunks_in += 1;
        self.bytes_in += len as u64;
    }

    /// Record one non-empty block handed to the sink or consumer.
    pub fn add_output(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.chunks_out += 1;
        self.bytes_out += len as u64;
    }

    pub fn add_frames(&mut self, n: usize) {
        self.frames += n as u64;
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks_in += other.chunks_in;
        self.chunks_out += other.chunks_out;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.frames += other.frames;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_blocks_are_not_counted() {
        let mut c = TelemetryCounters::default();
        c.add_input(10);
        c.add_output(0);
        c.add_output(4);
        assert_eq!((c.chunks_in, c.chunks_out, c.bytes_in, c.bytes_out), (1, 1, 10, 4));
    }

    #[test]
    fn add_assign_merges() {
        let mut a = TelemetryCounters { frames: 1, bytes_in: 3, ..Default::default() };
        a += TelemetryCounters { frames: 2, bytes_out: 5, ..Default::default() };
        assert_eq!(a.frames, 3);
        assert_eq!(a.bytes_in, 3);
        assert_eq!(a.bytes_out, 5);
    }
}
