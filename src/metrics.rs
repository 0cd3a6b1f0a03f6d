//! Per-failure metrics collection.
//!
//! The core only owns the row shape and the sink interface; turning rows
//! into an actual CSV database is the job of an external driver (out of
//! scope, per the purpose statement this crate follows).

use shp_net::LinkId;

/// How a failure instance was ultimately classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The repair did not complete successfully.
    Failed,
    /// The repair completed within the configured time classification
    /// threshold.
    HealedFast,
    /// The repair completed, but above the configured threshold.
    HealedSlow,
}

impl Classification {
    /// The `{0,1,2}` encoding used by the CSV database column of the same
    /// name.
    pub fn code(self) -> u8 {
        match self {
            Classification::Failed => 0,
            Classification::HealedFast => 1,
            Classification::HealedSlow => 2,
        }
    }

    /// Derive a classification from whether the repair succeeded, the
    /// optimize time, and the configured threshold.
    pub fn classify(successful: bool, optimize_time_ns: i64, time_classification_ns: i64) -> Self {
        if !successful {
            Classification::Failed
        } else if optimize_time_ns > time_classification_ns {
            Classification::HealedSlow
        } else {
            Classification::HealedFast
        }
    }
}

/// One row of the output metrics table, keyed by failure instance.
#[derive(Debug, Clone)]
pub struct MetricsRow {
    /// The failure instance id.
    pub instance: u32,
    /// Utilization of the broken link just before the failure.
    pub broken_link_utilization: f64,
    /// Combined utilization of the new path's links just before the
    /// failure.
    pub path_utilization: f64,
    /// Overall network utilization just before the failure.
    pub total_utilization: f64,
    /// Number of scheduled offsets on the broken link.
    pub broken_link_offsets: usize,
    /// Combined number of scheduled offsets on the new path's links.
    pub path_offsets: usize,
    /// Total number of scheduled offsets in the network.
    pub total_offsets: usize,
    /// Whether the repair completed successfully.
    pub successful: bool,
    /// Time spent patching, in nanoseconds.
    pub patching_time_ns: i64,
    /// Time spent optimizing, in nanoseconds.
    pub optimization_time_ns: i64,
    /// The derived classification.
    pub classification: Classification,
}

/// Where the simulator core reports [`MetricsRow`]s as failures are
/// resolved.
pub trait MetricsSink {
    /// Record one failure's outcome.
    fn record(&mut self, row: MetricsRow);
}

/// An in-memory sink, sufficient for tests and for a caller that wants to
/// post-process rows itself rather than stream them to a file.
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    rows: Vec<MetricsRow>,
}

impl InMemoryMetricsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows recorded so far.
    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record(&mut self, row: MetricsRow) {
        self.rows.push(row);
    }
}

/// A utilization/offset-count snapshot of one link, taken just before a
/// failure is handled.
#[derive(Debug, Clone, Copy)]
pub struct LinkSnapshot {
    /// The link this snapshot is for.
    pub link: LinkId,
    /// Utilization (fraction of hyperperiod bandwidth in use).
    pub utilization: f64,
    /// Number of scheduled offset instances.
    pub offsets: usize,
}
