//! Available Transmission Range (ATR) calculation.
//!
//! When a link fails mid-schedule, the replacement path's links need a
//! transmission window of their own. The ATR is the time range, per
//! instance, within which the frame may legally transmit on a given link of
//! the replacement path without violating the deadline or colliding with
//! whatever the frame already does on the hops immediately before and after
//! it. Ported from the reference simulator's `get_atr` /
//! `get_available_transmission_range`.

use thiserror::Error;

use crate::ids::LinkId;
use crate::schedule::{Frame, Offset};
use crate::topology::Topology;

/// Errors raised while computing an available transmission range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AtrError {
    /// The computed range for some instance has a lower bound greater than
    /// its upper bound: the schedule as it stands cannot accommodate the
    /// new path at all.
    #[error("inconsistent transmission range for instance {0}: [{1}, {2}]")]
    Inconsistent(usize, i64, i64),
    /// The given link does not appear on the new path.
    #[error("link {0} is not on the given path")]
    LinkNotOnPath(LinkId),
}

/// A closed-open transmission window `[lower, upper)` in nanoseconds, one
/// per scheduled instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    /// Lower (inclusive) bound, in nanoseconds.
    pub lower: i64,
    /// Upper (exclusive) bound, in nanoseconds.
    pub upper: i64,
}

/// Computes available transmission ranges for a frame being rerouted.
pub struct AtrCalculator<'a> {
    topology: &'a Topology,
    minimum_switch_time_ns: i64,
    time_slot_ns: i64,
}

impl<'a> AtrCalculator<'a> {
    /// Create a new calculator bound to a topology, the fixed minimum
    /// switch-processing delay, and the schedule's time-slot quantum.
    pub fn new(topology: &'a Topology, minimum_switch_time_ns: i64, time_slot_ns: i64) -> Self {
        AtrCalculator {
            topology,
            minimum_switch_time_ns,
            time_slot_ns,
        }
    }

    /// The unconstrained-by-neighbors range every instance of `frame` could
    /// use on the replacement path, given that the replacement path ends at
    /// `last_link`, tightened against each receiver's *existing* path around
    /// the hop it takes in place of `broken_link` (the link being rerouted
    /// around, not yet spliced into any receiver's path).
    pub fn available_transmission_range(
        &self,
        frame: &Frame,
        offset: &Offset,
        broken_link: LinkId,
        last_link: LinkId,
    ) -> Result<Vec<Range>, AtrError> {
        let hyper_period = frame.period_ns() * offset.num_instances().max(1) as i64;
        let mut ranges: Vec<Range> = (0..offset.num_instances())
            .map(|_| Range { lower: 0, upper: hyper_period })
            .collect();

        let (_, last_speed) = self
            .topology
            .link(last_link)
            .map(|(_, _, l)| ((), l.speed))
            .map_err(|_| AtrError::LinkNotOnPath(last_link))?;
        let last_hop_tx_ns = frame.size_bytes() * 1000 / last_speed.max(1);

        for receiver in frame.receivers() {
            let links = match frame.path(*receiver) {
                Some(p) => p,
                None => continue,
            };
            let pos = match links.iter().position(|l| *l == broken_link) {
                Some(p) => p,
                None => continue,
            };

            for instance in 0..offset.num_instances() {
                let mut lower;
                let mut upper;
                if pos == 0 {
                    lower = frame.period_ns() * instance as i64;
                    let next_link = links[pos + 1];
                    let next_offset = frame
                        .offset(next_link)
                        .and_then(|o| o.transmission_time(instance, 0).ok().flatten());
                    upper = next_offset.unwrap_or(frame.deadline_ns() + frame.period_ns() * instance as i64)
                        - self.minimum_switch_time_ns;
                } else if pos == links.len() - 1 {
                    let prev_link = links[pos - 1];
                    let prev_offset = frame
                        .offset(prev_link)
                        .and_then(|o| o.ending_time(instance, 0).ok().flatten());
                    lower = prev_offset.unwrap_or(0) + self.minimum_switch_time_ns;
                    upper = frame.deadline_ns() + frame.period_ns() * instance as i64;
                } else {
                    let prev_link = links[pos - 1];
                    let next_link = links[pos + 1];
                    let prev_offset = frame
                        .offset(prev_link)
                        .and_then(|o| o.ending_time(instance, 0).ok().flatten());
                    let next_offset = frame
                        .offset(next_link)
                        .and_then(|o| o.transmission_time(instance, 0).ok().flatten());
                    lower = prev_offset.unwrap_or(0) + self.minimum_switch_time_ns;
                    upper = next_offset.unwrap_or(frame.deadline_ns() + frame.period_ns() * instance as i64)
                        - self.minimum_switch_time_ns;
                }
                upper -= last_hop_tx_ns;
                if lower > upper {
                    return Err(AtrError::Inconsistent(instance, lower, upper));
                }
                let r = &mut ranges[instance];
                r.lower = r.lower.max(lower);
                r.upper = r.upper.min(upper);
            }
        }
        Ok(ranges)
    }

    /// The available transmission range for `frame` on `link`, which lies at
    /// some position in `new_path` (a sequence of link ids, not nodes)
    /// replacing `broken_link`, after splitting the overall range
    /// proportionally across the path's hops and tightening against whatever
    /// the frame already has scheduled on the hops immediately before and
    /// after `link`.
    pub fn atr(
        &self,
        frame: &Frame,
        offset: &Offset,
        new_path: &[LinkId],
        link: LinkId,
        broken_link: LinkId,
    ) -> Result<Vec<Range>, AtrError> {
        let last_link = *new_path.last().ok_or(AtrError::LinkNotOnPath(link))?;
        let mut ranges = self.available_transmission_range(frame, offset, broken_link, last_link)?;

        let position = new_path
            .iter()
            .position(|l| *l == link)
            .ok_or(AtrError::LinkNotOnPath(link))?;
        let path_len = new_path.len();

        for r in ranges.iter_mut() {
            let span = r.upper - r.lower;
            let new_upper = (position + 1) as i64 * (span / path_len as i64) + r.lower;
            let new_lower = position as i64 * (span / path_len as i64) + r.lower;
            r.lower = new_lower + self.minimum_switch_time_ns;
            r.upper = new_upper;
        }

        if position != 0 {
            let prev = new_path[position - 1];
            if let Some(prev_offset) = frame.offset(prev) {
                for (instance, r) in ranges.iter_mut().enumerate() {
                    if let Ok(Some(end)) = prev_offset.ending_time(instance, 0) {
                        r.lower = end + self.minimum_switch_time_ns;
                    }
                }
            }
        }
        if position != path_len - 1 {
            let next = new_path[position + 1];
            if let Some(next_offset) = frame.offset(next) {
                let (_, _, link_weight) = self
                    .topology
                    .link(link)
                    .map_err(|_| AtrError::LinkNotOnPath(link))?;
                let this_hop_tx_ns = frame.size_bytes() * 1000 / link_weight.speed.max(1);
                for (instance, r) in ranges.iter_mut().enumerate() {
                    if let Ok(Some(tx)) = next_offset.transmission_time(instance, 0) {
                        r.upper = tx - this_hop_tx_ns - self.minimum_switch_time_ns;
                    }
                }
            }
        }

        for r in ranges.iter_mut() {
            r.lower /= self.time_slot_ns.max(1);
            r.upper /= self.time_slot_ns.max(1);
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Frame;
    use crate::topology::{Link, LinkKind, Node, NodeKind};
    use crate::ids::{FrameId, NodeId};

    fn topo() -> Topology {
        let mut t = Topology::new();
        t.add_node(Node::new(NodeId(0), NodeKind::EndSystem));
        t.add_node(Node::new(NodeId(1), NodeKind::Switch));
        t.add_node(Node::new(NodeId(2), NodeKind::Switch));
        t.add_node(Node::new(NodeId(3), NodeKind::EndSystem));
        t.add_link(NodeId(1), NodeId(2), Link { id: LinkId(1), kind: LinkKind::Wired, speed: 1_000_000_000 }).unwrap();
        t
    }

    #[test]
    fn range_splits_proportionally_across_two_hops() {
        let t = topo();
        let calc = AtrCalculator::new(&t, 0, 1);
        let mut frame = Frame::new(FrameId(0), NodeId(0), vec![NodeId(3)], 1_000_000, 0, 64, 0, 0).unwrap();
        let mut offset = Offset::new();
        offset.prepare(1, 0).unwrap();
        frame.set_path_links(NodeId(3), vec![LinkId(1)]).unwrap();
        let ranges = calc
            .atr(&frame, &offset, &[LinkId(1), LinkId(9)], LinkId(1), LinkId(1))
            .unwrap();
        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].lower <= ranges[0].upper);
    }
}
