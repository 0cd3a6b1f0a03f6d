//! Error types shared across the network model.

use thiserror::Error;

use crate::ids::{FrameId, LinkId, NodeId};

/// Errors raised while mutating or querying the network topology.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The referenced node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    /// The referenced link does not exist.
    #[error("link not found: {0}")]
    LinkNotFound(LinkId),
    /// No link connects the two given nodes.
    #[error("no link between {0} and {1}")]
    NoSuchEdge(NodeId, NodeId),
    /// No path exists between the two nodes in the current topology.
    #[error("no path between {0} and {1}")]
    NoPath(NodeId, NodeId),
    /// No path whose interior nodes are all switches exists between the two
    /// nodes (end systems may only appear as the path's endpoints).
    #[error("no path avoiding end systems between {0} and {1}")]
    NoPathAvoidingEndSystems(NodeId, NodeId),
}

/// Errors raised while mutating or querying a frame's schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The link has no offset entry on this frame.
    #[error("frame {0} has no offset on link {1}")]
    NoOffsetOnLink(FrameId, LinkId),
    /// The instance or replica index is out of bounds for this offset.
    #[error("offset instance/replica out of range: instance {0}, replica {1}")]
    OutOfRange(usize, usize),
    /// An already-set transmission/ending time was overwritten with a
    /// different value.
    #[error("conflicting value for frame {0} on link {1}: already {2}, got {3}")]
    ConflictingValue(FrameId, LinkId, i64, i64),
    /// A schedule-shaping parameter (period, deadline, size, ...) was out of
    /// its valid range.
    #[error("invalid frame parameter: {0}")]
    InvalidParameter(String),
}
