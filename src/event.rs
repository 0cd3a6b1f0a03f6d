//! Tagged event variants dispatched by the [`crate::sim::Simulator`] loop.
//!
//! The three event kinds share `(event_id, time)` but have disjoint
//! payloads; they are kept as one enum with a type tag rather than a
//! class hierarchy, and dispatched with a `match` in the simulator's main
//! loop.

use shp_net::{LinkId, NodeId};

/// Frame-event names from the original SHP broadcast protocol, kept so an
/// older-revision [`crate::repair::Algorithm::Shp`] run stays expressible
/// alongside the newer ISHP variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameName {
    /// Broadcast announcing a detected failure (SHP).
    Notification,
    /// Broadcast searching for a replacement path (SHP).
    FindingPath,
    /// Broadcast carrying a found replacement path (SHP).
    NotifyPath,
    /// Broadcast establishing protocol group membership (SHP).
    Membership,
    /// Unicast notification from the activator to the leader (ISHP).
    NotificationHs,
    /// Broadcast distributing a patched schedule (ISHP).
    DistributeSchedulePatch,
    /// Broadcast distributing an optimized schedule (ISHP).
    DistributeScheduleOptimize,
}

impl FrameName {
    /// Whether this variant belongs to the dedup-tracked broadcast classes
    /// (`Notification`/`FindingPath`): a node that already saw one for a
    /// given failure id silently drops duplicates.
    pub fn is_deduplicated(self) -> bool {
        matches!(self, FrameName::Notification | FrameName::FindingPath)
    }
}

/// Local-computation event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionName {
    /// Invoke the patch solver for the new path's links.
    Patch,
    /// Invoke the optimize solver for the whole schedule.
    Optimize,
}

/// Simulator-internal event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalName {
    /// A link has failed.
    LinkFailure,
}

/// A wire transmission that hops along an explicit node path.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    /// The failure instance this frame belongs to.
    pub failure_id: u32,
    /// Which kind of frame this is.
    pub name: FrameName,
    /// Simulated time at which this hop occurs, in nanoseconds.
    pub time_ns: i64,
    /// Size of the frame, in bits.
    pub size_bits: i64,
    /// Remaining node path, including the current node as its head.
    pub path: Vec<NodeId>,
}

/// A local computation at a node (always the failure's leader).
#[derive(Debug, Clone, Copy)]
pub struct ExecutionEvent {
    /// The failure instance this computation belongs to.
    pub failure_id: u32,
    /// Which computation this is.
    pub name: ExecutionName,
    /// Simulated time at which this computation runs, in nanoseconds.
    pub time_ns: i64,
    /// The node this computation runs at (the failure's leader).
    pub node: NodeId,
}

/// An event internal to the simulator, not carried over the wire.
#[derive(Debug, Clone, Copy)]
pub struct InternalEvent {
    /// The failure instance this event creates.
    pub failure_id: u32,
    /// Which kind of internal event this is.
    pub name: InternalName,
    /// Simulated time at which this event occurs, in nanoseconds.
    pub time_ns: i64,
    /// The link that failed.
    pub link: LinkId,
    /// The node this event is handled at (the receiver of the broken link).
    pub node: NodeId,
}

/// A tagged event record: exactly one of the three kinds described in the
/// data model, always owned by exactly one node's queue at a time.
#[derive(Debug, Clone)]
pub enum Event {
    /// A link failure, handled at the receiver of the broken link.
    Internal(InternalEvent),
    /// A frame hop.
    Frame(FrameEvent),
    /// A local computation.
    Execution(ExecutionEvent),
}

impl Event {
    /// The simulated time at which this event occurs.
    pub fn time_ns(&self) -> i64 {
        match self {
            Event::Internal(e) => e.time_ns,
            Event::Frame(e) => e.time_ns,
            Event::Execution(e) => e.time_ns,
        }
    }

    /// The failure instance this event belongs to.
    pub fn failure_id(&self) -> u32 {
        match self {
            Event::Internal(e) => e.failure_id,
            Event::Frame(e) => e.failure_id,
            Event::Execution(e) => e.failure_id,
        }
    }

    /// The node that currently owns this event (the node whose queue it is
    /// enqueued on): for a frame event, the head of its remaining path.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Event::Frame(e) => e.path.first().copied(),
            Event::Execution(e) => Some(e.node),
            Event::Internal(e) => Some(e.node),
        }
    }
}
