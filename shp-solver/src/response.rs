//! Patch/optimize response shapes, mirroring the XML the solver produces.

use shp_net::{FrameId, LinkId};

/// The schedule the solver computed for a single link, absent when the
/// request was infeasible (signalled upstream as [`crate::SolverError::NoSchedule`]).
#[derive(Debug, Clone)]
pub struct PatchedSchedule {
    /// The link this schedule is for.
    pub link_id: LinkId,
    /// Per-frame, per-instance `(transmission_time, ending_time)`, in time
    /// slots.
    pub frames: Vec<(FrameId, Vec<(i64, i64)>)>,
}

/// The wall-clock-equivalent simulation time the solver's computation took,
/// read back from the execution-time file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTiming {
    /// Execution time, in nanoseconds.
    pub execution_time_ns: i64,
}
