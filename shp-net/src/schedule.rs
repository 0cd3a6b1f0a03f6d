//! Frames, per-link offsets, and the schedule they together describe.
//!
//! Grounded in the reference implementation's `Frame`/`Offset` classes: the
//! sentinel `-1` marking an unset instance/replica slot, and the invariant
//! that a slot already holding a real value may only be "set" again to the
//! exact same value (anything else is a scheduling conflict, not an update).

use std::collections::{HashMap, HashSet};

use crate::error::ScheduleError;
use crate::ids::{FrameId, LinkId, NodeId};

const UNSET: i64 = -1;

/// The transmission and ending times of a frame on a single link, one entry
/// per (instance, replica) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    num_instances: usize,
    num_replicas: usize,
    transmission_times: Vec<Vec<i64>>,
    ending_times: Vec<Vec<i64>>,
}

impl Offset {
    /// Create an offset with no instances prepared yet.
    pub fn new() -> Self {
        Offset {
            num_instances: 0,
            num_replicas: 0,
            transmission_times: Vec::new(),
            ending_times: Vec::new(),
        }
    }

    /// Number of scheduled instances within the hyperperiod.
    pub fn num_instances(&self) -> usize {
        self.num_instances
    }

    /// Number of redundant replicas per instance (0 if none).
    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }

    /// Allocate the instance/replica matrices, filled with the unset
    /// sentinel. A no-op if the offset was already prepared, matching the
    /// idempotent guard of the reference implementation.
    pub fn prepare(&mut self, num_instances: usize, num_replicas: usize) -> Result<(), ScheduleError> {
        if num_instances == 0 {
            return Err(ScheduleError::InvalidParameter(
                "num_instances must be positive".into(),
            ));
        }
        if !self.transmission_times.is_empty() {
            return Ok(());
        }
        self.num_instances = num_instances;
        self.num_replicas = num_replicas;
        self.transmission_times = vec![vec![UNSET; num_replicas + 1]; num_instances];
        self.ending_times = vec![vec![UNSET; num_replicas + 1]; num_instances];
        Ok(())
    }

    /// Read the transmission time of an instance/replica, or `None` if it
    /// has not been set yet.
    pub fn transmission_time(&self, instance: usize, replica: usize) -> Result<Option<i64>, ScheduleError> {
        let v = *self
            .transmission_times
            .get(instance)
            .and_then(|r| r.get(replica))
            .ok_or(ScheduleError::OutOfRange(instance, replica))?;
        Ok((v != UNSET).then_some(v))
    }

    /// Read the ending time of an instance/replica, or `None` if it has not
    /// been set yet.
    pub fn ending_time(&self, instance: usize, replica: usize) -> Result<Option<i64>, ScheduleError> {
        let v = *self
            .ending_times
            .get(instance)
            .and_then(|r| r.get(replica))
            .ok_or(ScheduleError::OutOfRange(instance, replica))?;
        Ok((v != UNSET).then_some(v))
    }

    /// Set the transmission time of an instance/replica. Raises
    /// [`ScheduleError::ConflictingValue`] if a different value was already
    /// recorded there.
    pub fn set_transmission_time(
        &mut self,
        frame: FrameId,
        link: LinkId,
        instance: usize,
        replica: usize,
        time: i64,
    ) -> Result<(), ScheduleError> {
        let slot = self
            .transmission_times
            .get_mut(instance)
            .and_then(|r| r.get_mut(replica))
            .ok_or(ScheduleError::OutOfRange(instance, replica))?;
        if *slot != UNSET && *slot != time {
            return Err(ScheduleError::ConflictingValue(frame, link, *slot, time));
        }
        *slot = time;
        Ok(())
    }

    /// Set the ending time of an instance/replica. Raises
    /// [`ScheduleError::ConflictingValue`] if a different value was already
    /// recorded there.
    pub fn set_ending_time(
        &mut self,
        frame: FrameId,
        link: LinkId,
        instance: usize,
        replica: usize,
        time: i64,
    ) -> Result<(), ScheduleError> {
        let slot = self
            .ending_times
            .get_mut(instance)
            .and_then(|r| r.get_mut(replica))
            .ok_or(ScheduleError::OutOfRange(instance, replica))?;
        if *slot != UNSET && *slot != time {
            return Err(ScheduleError::ConflictingValue(frame, link, *slot, time));
        }
        *slot = time;
        Ok(())
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::new()
    }
}

/// A periodic traffic flow from one sender to one or more receivers.
#[derive(Debug, Clone)]
pub struct Frame {
    id: FrameId,
    sender: NodeId,
    receivers: Vec<NodeId>,
    period_ns: i64,
    deadline_ns: i64,
    size_bytes: i64,
    starting_time_ns: i64,
    end_to_end_ns: i64,
    paths: HashMap<NodeId, Vec<LinkId>>,
    offsets: HashMap<LinkId, Offset>,
}

impl Frame {
    /// Create a new frame. `deadline` of `0` means "equal to the period";
    /// `end_to_end` of `0` means "equal to the deadline", matching the
    /// reference model's defaulting rules.
    pub fn new(
        id: FrameId,
        sender: NodeId,
        receivers: Vec<NodeId>,
        period_ns: i64,
        deadline_ns: i64,
        size_bytes: i64,
        starting_time_ns: i64,
        end_to_end_ns: i64,
    ) -> Result<Self, ScheduleError> {
        if period_ns <= 0 {
            return Err(ScheduleError::InvalidParameter("period must be positive".into()));
        }
        if size_bytes <= 0 {
            return Err(ScheduleError::InvalidParameter("size must be positive".into()));
        }
        if receivers.contains(&sender) {
            return Err(ScheduleError::InvalidParameter(
                "sender cannot be one of its own receivers".into(),
            ));
        }
        let deadline_ns = if deadline_ns == 0 { period_ns } else { deadline_ns };
        if deadline_ns < 0 || deadline_ns > period_ns {
            return Err(ScheduleError::InvalidParameter(
                "deadline must be within (0, period]".into(),
            ));
        }
        if starting_time_ns < 0 || starting_time_ns >= deadline_ns {
            return Err(ScheduleError::InvalidParameter(
                "starting time must be within [0, deadline)".into(),
            ));
        }
        let end_to_end_ns = if end_to_end_ns == 0 { deadline_ns } else { end_to_end_ns };
        if end_to_end_ns < 0 || end_to_end_ns > deadline_ns {
            return Err(ScheduleError::InvalidParameter(
                "end-to-end delay must be within [0, deadline]".into(),
            ));
        }
        Ok(Frame {
            id,
            sender,
            receivers,
            period_ns,
            deadline_ns,
            size_bytes,
            starting_time_ns,
            end_to_end_ns,
            paths: HashMap::new(),
            offsets: HashMap::new(),
        })
    }

    /// The frame's identifier.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The frame's sender.
    pub fn sender(&self) -> NodeId {
        self.sender
    }

    /// The frame's receivers.
    pub fn receivers(&self) -> &[NodeId] {
        &self.receivers
    }

    /// The frame's period in nanoseconds.
    pub fn period_ns(&self) -> i64 {
        self.period_ns
    }

    /// The frame's deadline in nanoseconds (relative to each period start).
    pub fn deadline_ns(&self) -> i64 {
        self.deadline_ns
    }

    /// The frame's size in bytes.
    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    /// The earliest permissible starting time in nanoseconds.
    pub fn starting_time_ns(&self) -> i64 {
        self.starting_time_ns
    }

    /// The end-to-end delay budget in nanoseconds.
    pub fn end_to_end_ns(&self) -> i64 {
        self.end_to_end_ns
    }

    /// The path taken to a given receiver, as an ordered sequence of link
    /// ids, if one has been set.
    pub fn path(&self, receiver: NodeId) -> Option<&[LinkId]> {
        self.paths.get(&receiver).map(|p| p.as_slice())
    }

    /// All paths, keyed by receiver.
    pub fn paths(&self) -> &HashMap<NodeId, Vec<LinkId>> {
        &self.paths
    }

    /// Whether any of the frame's paths traverses the given link.
    pub fn link_in_path(&self, link: LinkId) -> bool {
        self.paths.values().any(|path| path.contains(&link))
    }

    /// The offset on a given link, if the frame has one there.
    pub fn offset(&self, link: LinkId) -> Option<&Offset> {
        self.offsets.get(&link)
    }

    /// A mutable reference to the offset on a given link.
    pub fn offset_mut(&mut self, link: LinkId) -> Result<&mut Offset, ScheduleError> {
        self.offsets
            .get_mut(&link)
            .ok_or(ScheduleError::NoOffsetOnLink(self.id, link))
    }

    /// All (link, offset) pairs currently recorded for this frame.
    pub fn offsets(&self) -> &HashMap<LinkId, Offset> {
        &self.offsets
    }

    /// Set the path to a receiver as an ordered sequence of link ids, and
    /// create an (empty, unprepared) [`Offset`] entry for every link that
    /// does not already have one.
    pub fn set_path_links(&mut self, receiver: NodeId, links: Vec<LinkId>) -> Result<(), ScheduleError> {
        if !self.receivers.contains(&receiver) {
            return Err(ScheduleError::InvalidParameter(format!(
                "{receiver} is not a receiver of frame {}",
                self.id
            )));
        }
        for link in &links {
            self.offsets.entry(*link).or_insert_with(Offset::new);
        }
        self.paths.insert(receiver, links);
        Ok(())
    }

    /// Splice `new_links` in place of `broken_link` in every path that
    /// contains it, creating offsets for the newly introduced links. Because
    /// paths are stored as link sequences, this is a direct splice at the
    /// broken link's position — no node/topology lookup is needed, so it
    /// still works after the broken link has been removed from the topology.
    pub fn exchange_link(&mut self, broken_link: LinkId, new_links: &[LinkId]) {
        for path in self.paths.values_mut() {
            if let Some(idx) = path.iter().position(|l| *l == broken_link) {
                path.splice(idx..idx + 1, new_links.iter().copied());
            }
        }
        for link in new_links {
            self.offsets.entry(*link).or_insert_with(Offset::new);
        }
    }

    /// Drop every offset entry whose link no longer appears on any path.
    pub fn remove_unused_offsets(&mut self) {
        let used: HashSet<LinkId> = self.paths.values().flatten().copied().collect();
        self.offsets.retain(|link, _| used.contains(link));
    }

    /// The offset entry for a link, creating an empty unprepared one if it
    /// does not already exist.
    pub fn ensure_offset(&mut self, link: LinkId) -> &mut Offset {
        self.offsets.entry(link).or_insert_with(Offset::new)
    }

    /// Collapse a repeated node in a receiver's path: if the path re-enters a
    /// node it already visited, excise every link between the two visits,
    /// keeping a single occurrence. Repeats until no duplicate remains.
    /// `endpoints` resolves a link id to its `(sender, receiver)` node pair;
    /// it is only ever called on links still present on the path, which by
    /// construction have not been removed from the topology.
    pub fn eliminate_loops(&mut self, receiver: NodeId, endpoints: impl Fn(LinkId) -> Option<(NodeId, NodeId)>) {
        let Some(path) = self.paths.get_mut(&receiver) else {
            return;
        };
        loop {
            let mut nodes = vec![self.sender];
            let mut resolved = true;
            for &link in path.iter() {
                match endpoints(link) {
                    Some((_, to)) => nodes.push(to),
                    None => {
                        resolved = false;
                        break;
                    }
                }
            }
            if !resolved {
                return;
            }
            let mut repeat = None;
            'search: for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    if nodes[i] == nodes[j] {
                        repeat = Some((i, j));
                        break 'search;
                    }
                }
            }
            match repeat {
                Some((i, j)) => {
                    path.drain(i..j);
                }
                None => return,
            }
        }
    }
}

/// A schedule: the complete set of frames and the offsets assigned to them.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    frames: HashMap<FrameId, Frame>,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Schedule {
            frames: HashMap::new(),
        }
    }

    /// Insert or replace a frame.
    pub fn insert(&mut self, frame: Frame) {
        self.frames.insert(frame.id(), frame);
    }

    /// Look up a frame by id.
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    /// Look up a mutable reference to a frame by id.
    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(&id)
    }

    /// Iterate over all frames.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// All `(frame id, offset)` pairs where the frame has an offset on the
    /// given link.
    pub fn offsets_by_link(&self, link: LinkId) -> Vec<(FrameId, &Offset)> {
        self.frames
            .values()
            .filter_map(|f| f.offset(link).map(|o| (f.id(), o)))
            .collect()
    }

    /// Total number of scheduled instances across all frames on the given
    /// link (used to decide whether a broken link carried any traffic).
    pub fn num_offsets(&self, link: LinkId) -> usize {
        self.offsets_by_link(link)
            .into_iter()
            .map(|(_, o)| o.num_instances())
            .sum()
    }

    /// The hyperperiod: the least common multiple of every frame's period.
    pub fn hyper_period_ns(&self) -> i64 {
        self.frames
            .values()
            .map(|f| f.period_ns())
            .fold(1, lcm)
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        0
    } else {
        (a / gcd(a, b)) * b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_overwrite_same_value_ok() {
        let mut o = Offset::new();
        o.prepare(2, 0).unwrap();
        o.set_transmission_time(FrameId(0), LinkId(0), 0, 0, 100).unwrap();
        o.set_transmission_time(FrameId(0), LinkId(0), 0, 0, 100).unwrap();
        assert_eq!(o.transmission_time(0, 0).unwrap(), Some(100));
    }

    #[test]
    fn offset_overwrite_different_value_errors() {
        let mut o = Offset::new();
        o.prepare(2, 0).unwrap();
        o.set_transmission_time(FrameId(0), LinkId(0), 0, 0, 100).unwrap();
        let err = o.set_transmission_time(FrameId(0), LinkId(0), 0, 0, 200);
        assert!(err.is_err());
    }

    #[test]
    fn deadline_defaults_to_period() {
        let f = Frame::new(FrameId(0), NodeId(0), vec![NodeId(1)], 1000, 0, 64, 0, 0).unwrap();
        assert_eq!(f.deadline_ns(), 1000);
        assert_eq!(f.end_to_end_ns(), 1000);
    }

    #[test]
    fn hyper_period_is_lcm_of_periods() {
        let mut s = Schedule::new();
        s.insert(Frame::new(FrameId(0), NodeId(0), vec![NodeId(1)], 1000, 0, 64, 0, 0).unwrap());
        s.insert(Frame::new(FrameId(1), NodeId(0), vec![NodeId(1)], 1500, 0, 64, 0, 0).unwrap());
        assert_eq!(s.hyper_period_ns(), 3000);
    }
}
