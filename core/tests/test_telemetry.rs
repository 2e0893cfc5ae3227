#[cfg(test)]
mod telemetry_snapshot_tests {
    use std::time::Duration;

    use zframe_core::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    fn make_counters() -> TelemetryCounters {
        TelemetryCounters { chunks_in: 4, chunks_out: 2, bytes_in: 400, bytes_out: 100, frames: 1 }
    }

    fn make_timer() -> TelemetryTimer {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(20)); // ensure elapsed > stage times
        timer.add_stage_time(Stage::Read, Duration::from_millis(5));
        timer.add_stage_time(Stage::Compress, Duration::from_millis(8));
        timer.add_stage_time(Stage::Write, Duration::from_millis(2));
        timer.finish();
        timer
    }

    #[test]
    fn snapshot_initializes_output_none() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer());
        assert!(snapshot.output.is_none());
        assert!(!snapshot.cancelled);
    }

    #[test]
    fn attach_output_sets_output_field() {
        let mut snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer());
        snapshot.attach_output(vec![1, 2, 3, 4]);
        assert_eq!(snapshot.output(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(snapshot.take_output(), Some(vec![1, 2, 3, 4]));
        assert!(snapshot.output.is_none());
    }

    #[test]
    fn ratio_and_throughput() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer());
        assert_eq!(snapshot.ratio, 0.25);
        assert!(snapshot.throughput_in_bytes_per_sec > 0.0);
        assert_eq!(snapshot.total_stage_time(), Duration::from_millis(15));
        assert!(snapshot.sanity_check());
    }

    #[test]
    fn decompression_ratio_exceeds_one() {
        let counters = TelemetryCounters { chunks_in: 1, chunks_out: 3, bytes_in: 50, bytes_out: 5000, frames: 1 };
        let snapshot = TelemetrySnapshot::from(&counters, &make_timer());
        assert_eq!(snapshot.ratio, 100.0);
    }

    #[test]
    fn merged_counters_add_up() {
        let mut total = TelemetryCounters::default();
        total += make_counters();
        total.merge(&make_counters());
        assert_eq!(total.bytes_in, 800);
        assert_eq!(total.frames, 2);
    }
}
