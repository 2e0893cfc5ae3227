//! telemetry/snapshot.rs
//!
//! Immutable summary of one pump or pipe run.
//!
//! Design notes:
//! - `ratio` is output over input bytes: below 1.0 when compressing, above 1.0
//!   when decompressing.
//! - Throughput is measured on input bytes.
//! - A memory sink's captured bytes travel with the snapshot in `output`.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub chunks_in: u64,
    pub chunks_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub frames: u64,
    pub ratio: f64,
    pub throughput_in_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
    /// The run was stopped by cancellation before its input ended.
    pub cancelled: bool,
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let ratio = if counters.bytes_in > 0 {
            counters.bytes_out as f64 / counters.bytes_in as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            chunks_in: counters.chunks_in,
            chunks_out: counters.chunks_out,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            frames: counters.frames,
            ratio,
            throughput_in_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
            cancelled: false,
            output: None,
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    /// Stage totals never exceed wall time and byte counts match chunk counts.
    pub fn sanity_check(&self) -> bool {
        self.total_stage_time() <= self.elapsed
            && (self.chunks_out > 0) == (self.bytes_out > 0)
            && (self.chunks_in > 0 || self.bytes_in == 0)
    }

    pub fn attach_output(&mut self, out: Vec<u8>) {
        self.output = Some(out);
    }

    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.output.take()
    }
}
