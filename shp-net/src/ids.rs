//! Lightweight identifier newtypes.
//!
//! Links and frames are identified by the small integers that appear in the
//! XML documents (`LinkID`, `FrameID`), independent of any in-memory graph
//! index; nodes additionally carry a `petgraph` index so the topology can
//! look them up in constant time.

use std::fmt;

/// Identifies a node (end system, switch or access point) in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

/// Identifies a directed link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u32);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl From<u32> for LinkId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

/// Identifies a frame (a periodic traffic flow) in the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl From<u32> for FrameId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}
