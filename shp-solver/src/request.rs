//! Patch/optimize request shapes, mirroring the XML the solver consumes.

use shp_net::{FrameId, LinkId};

/// Which solver pass a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverAction {
    /// Compute offsets for the new path's hops only, leaving the rest of the
    /// schedule untouched.
    Patch,
    /// Re-optimize the complete schedule after a patch.
    Optimize,
}

/// General, link-scoped information every request carries (all durations in
/// time-slot units, matching what the solver speaks).
#[derive(Debug, Clone)]
pub struct GeneralInformation {
    /// The link this request concerns.
    pub link_id: LinkId,
    /// The link's speed, in bytes per second.
    pub link_speed: i64,
    /// The protocol reservation period, in time slots.
    pub protocol_period_slots: i64,
    /// The protocol reservation window length, in time slots.
    pub protocol_time_slots: i64,
    /// The hyperperiod, in time slots.
    pub hyper_period_slots: i64,
}

/// A frame entry already scheduled on the target link (its offsets must be
/// respected, not recomputed).
#[derive(Debug, Clone)]
pub struct FixedTrafficFrame {
    /// The frame's identifier.
    pub frame_id: FrameId,
    /// The frame's period, in time slots.
    pub period_slots: i64,
    /// The frame's deadline, in time slots.
    pub deadline_slots: i64,
    /// The frame's size, in bytes.
    pub size_bytes: i64,
    /// The frame's earliest starting time, in time slots.
    pub starting_time_slots: i64,
    /// The frame's end-to-end delay budget, in time slots.
    pub end_to_end_slots: i64,
    /// Per-instance `(transmission_time, ending_time)`, in time slots.
    pub instances: Vec<(i64, i64)>,
}

/// A frame entry to be newly scheduled on the target link.
#[derive(Debug, Clone)]
pub struct NewTrafficFrame {
    /// The frame's identifier.
    pub frame_id: FrameId,
    /// The frame's period, in time slots.
    pub period_slots: i64,
    /// The frame's deadline, in time slots.
    pub deadline_slots: i64,
    /// The frame's size, in bytes.
    pub size_bytes: i64,
    /// The frame's earliest starting time, in time slots.
    pub starting_time_slots: i64,
    /// The frame's end-to-end delay budget, in time slots.
    pub end_to_end_slots: i64,
    /// How many time slots the transmission occupies.
    pub transmission_length_slots: i64,
    /// Per-instance `(min_transmission, max_transmission)`, in time slots.
    pub instances: Vec<(i64, i64)>,
}

/// A complete patch or optimize request for a single link.
#[derive(Debug, Clone)]
pub struct SolverRequest {
    /// Which pass this request is for.
    pub action: SolverAction,
    /// Link-scoped general information.
    pub general: GeneralInformation,
    /// Frames already scheduled on the link.
    pub fixed_traffic: Vec<FixedTrafficFrame>,
    /// Frames to be newly scheduled on the link.
    pub traffic: Vec<NewTrafficFrame>,
}
