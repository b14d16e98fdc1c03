//! Interval records and the append-only metrics sink.

use crate::mode::Mode;
use crate::util::round2;
use crate::window::WindowStats;
use crate::Result;
use serde::Serialize;

/// Everything known about one completed check interval.
///
/// Immutable once created. `mode` is the mode in effect *after* the
/// interval's transition was applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntervalMetrics {
    /// The statistics aggregated over the interval.
    pub stats: WindowStats,
    /// Total distance travelled since the start of the run, in m.
    pub cumulative_distance_m: f64,
    /// The mode in effect from this interval on.
    pub mode: Mode,
    /// The simulation step length, echoed into every record.
    pub step_length_s: f64,
}

impl IntervalMetrics {
    /// Produces the rounded report row for this interval. This is the only
    /// place numeric outputs are rounded.
    pub fn to_record(&self) -> IntervalRecord {
        IntervalRecord {
            time_s: self.stats.timestamp_s,
            avg_vehicles: round2(self.stats.avg_vehicles),
            network_length_km: round2(self.stats.network_length_km),
            density: round2(self.stats.density),
            flow: round2(self.stats.flow),
            interval_distance_m: round2(self.stats.interval_distance_m),
            avg_speed_mps: round2(self.stats.avg_speed_mps),
            avg_speed_kmh: round2(self.stats.avg_speed_kmh),
            cumulative_distance_m: round2(self.cumulative_distance_m),
            mode: self.mode,
            sample_count: self.stats.sample_count,
            step_length_s: self.step_length_s,
        }
    }
}

/// One row of the final report, with every numeric output rounded to two
/// decimals. Field names follow the established report column headers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntervalRecord {
    #[serde(rename = "Time (s)")]
    pub time_s: f64,
    #[serde(rename = "Avg Vehicles")]
    pub avg_vehicles: f64,
    #[serde(rename = "Network Length (km)")]
    pub network_length_km: f64,
    #[serde(rename = "Network Density (veh/lane-km)")]
    pub density: f64,
    #[serde(rename = "Flow (veh/lane/hr)")]
    pub flow: f64,
    #[serde(rename = "Interval Distance (m)")]
    pub interval_distance_m: f64,
    #[serde(rename = "Avg Speed (m/s)")]
    pub avg_speed_mps: f64,
    #[serde(rename = "Avg Speed (km/h)")]
    pub avg_speed_kmh: f64,
    #[serde(rename = "Cumulative Distance (m)")]
    pub cumulative_distance_m: f64,
    #[serde(rename = "Current Mode")]
    pub mode: Mode,
    #[serde(rename = "Sample Count")]
    pub sample_count: u32,
    #[serde(rename = "Step Length (s)")]
    pub step_length_s: f64,
}

/// Destination for the per-interval report, implemented by the external
/// report writer. Naming and timestamping of the persisted artifact are the
/// writer's concern; the controller has no wall clock.
pub trait ReportWriter {
    /// Persists the full batch of interval records.
    fn persist(&mut self, records: &[IntervalRecord]) -> Result<()>;
}

/// Append-only log of interval metrics, flushed to the report writer
/// exactly once at shutdown.
#[derive(Default)]
pub struct MetricsSink {
    intervals: Vec<IntervalMetrics>,
    flushed: bool,
}

impl MetricsSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends one completed interval.
    pub fn append(&mut self, metrics: IntervalMetrics) {
        self.intervals.push(metrics);
    }

    /// The number of recorded intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether no intervals have completed yet.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The recorded intervals, in completion order.
    pub fn intervals(&self) -> &[IntervalMetrics] {
        &self.intervals
    }

    /// Rounds every interval into a report record and hands the batch to
    /// the writer. Only the first call persists anything; later calls are
    /// no-ops, so the report cannot be written twice.
    pub fn flush<W: ReportWriter + ?Sized>(&mut self, writer: &mut W) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        let records: Vec<IntervalRecord> =
            self.intervals.iter().map(IntervalMetrics::to_record).collect();
        writer.persist(&records)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct CollectingWriter {
        batches: Vec<Vec<IntervalRecord>>,
    }

    impl ReportWriter for CollectingWriter {
        fn persist(&mut self, records: &[IntervalRecord]) -> Result<()> {
            self.batches.push(records.to_vec());
            Ok(())
        }
    }

    fn metrics(time_s: f64) -> IntervalMetrics {
        IntervalMetrics {
            stats: WindowStats {
                timestamp_s: time_s,
                avg_vehicles: 100.004,
                network_length_km: 5.0,
                density: 20.0008,
                avg_speed_mps: 13.8891,
                avg_speed_kmh: 50.00076,
                flow: 1000.1686,
                interval_distance_m: 83_333.46,
                sample_count: 60,
            },
            cumulative_distance_m: 83_333.4649,
            mode: Mode::Normal,
            step_length_s: 1.0,
        }
    }

    #[test]
    fn rounding_happens_only_at_the_record_boundary() {
        let m = metrics(60.0);
        // Full precision retained on the metrics themselves.
        assert_eq!(m.stats.density, 20.0008);
        let record = m.to_record();
        assert_eq!(record.density, 20.0);
        assert_eq!(record.avg_vehicles, 100.0);
        assert_eq!(record.avg_speed_mps, 13.89);
        assert_eq!(record.cumulative_distance_m, 83_333.46);
    }

    #[test]
    fn sink_flushes_exactly_once() {
        let mut sink = MetricsSink::new();
        sink.append(metrics(60.0));
        sink.append(metrics(120.0));
        let mut writer = CollectingWriter::default();
        sink.flush(&mut writer).unwrap();
        sink.flush(&mut writer).unwrap();
        assert_eq!(writer.batches.len(), 1);
        assert_eq!(writer.batches[0].len(), 2);
        assert_eq!(writer.batches[0][1].time_s, 120.0);
    }

    #[test]
    fn record_serializes_with_report_headers() {
        let value = serde_json::to_value(metrics(60.0).to_record()).unwrap();
        assert_eq!(value["Network Density (veh/lane-km)"], 20.0);
        assert_eq!(value["Current Mode"], "normal");
        assert_eq!(value["Sample Count"], 60);
    }
}
