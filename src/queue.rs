//! Per-node, time-ordered event queues.

use std::collections::HashSet;

use shp_net::NodeId;

use crate::event::{Event, FrameName};

/// A single node's pending events, ordered by time ascending, ties broken by
/// insertion order. Backed by a sorted `Vec` with binary-search insertion
/// (not a binary heap): a heap does not preserve FIFO order among equal-time
/// entries, which the insertion-order tie-break requires.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
    notified: HashSet<u32>,
    found: HashSet<u32>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        EventQueue {
            events: Vec::new(),
            notified: HashSet::new(),
            found: HashSet::new(),
        }
    }

    /// Insert an event in time order. `Notification`/`FindingPath` frame
    /// events for a failure id this node has already seen are silently
    /// dropped instead of being queued, matching the dedup rule of the
    /// broadcast-style SHP variants.
    pub fn push(&mut self, event: Event) {
        if let Event::Frame(f) = &event {
            if f.name.is_deduplicated() {
                let seen = match f.name {
                    FrameName::Notification => &mut self.notified,
                    FrameName::FindingPath => &mut self.found,
                    _ => unreachable!(),
                };
                if !seen.insert(f.failure_id) {
                    return;
                }
            }
        }
        let pos = self
            .events
            .partition_point(|e| e.time_ns() <= event.time_ns());
        self.events.insert(pos, event);
    }

    /// The earliest pending event, without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.events.first()
    }

    /// Remove and return the earliest pending event.
    pub fn pop(&mut self) -> Option<Event> {
        (!self.events.is_empty()).then(|| self.events.remove(0))
    }

    /// Whether the queue has no pending events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// All per-node queues in the simulated network, plus the global
/// earliest-event selection used by the main loop.
#[derive(Debug, Default)]
pub struct GlobalQueue {
    queues: std::collections::BTreeMap<NodeId, EventQueue>,
}

impl GlobalQueue {
    /// Create a global queue over the given node ids, each starting empty.
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        GlobalQueue {
            queues: nodes.into_iter().map(|n| (n, EventQueue::new())).collect(),
        }
    }

    /// Enqueue an event at the node it names as its current owner.
    pub fn push(&mut self, node: NodeId, event: Event) {
        self.queues.entry(node).or_default().push(event);
    }

    /// Whether every node's queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(|q| q.is_empty())
    }

    /// Select and remove the globally earliest pending event, tie-broken by
    /// ascending node id (the `BTreeMap`'s natural iteration order) and then
    /// by each node's own insertion order.
    pub fn pop_next(&mut self) -> Option<(NodeId, Event)> {
        let winner = self
            .queues
            .iter()
            .filter_map(|(id, q)| q.peek().map(|e| (*id, e.time_ns())))
            .min_by_key(|(id, t)| (*t, *id))
            .map(|(id, _)| id)?;
        self.queues.get_mut(&winner).and_then(|q| q.pop()).map(|e| (winner, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExecutionEvent, ExecutionName};

    fn exec(failure_id: u32, time_ns: i64, node: NodeId) -> Event {
        Event::Execution(ExecutionEvent {
            failure_id,
            name: ExecutionName::Patch,
            time_ns,
            node,
        })
    }

    #[test]
    fn picks_smallest_time_across_nodes() {
        let mut q = GlobalQueue::new([NodeId(0), NodeId(1)]);
        q.push(NodeId(1), exec(0, 50, NodeId(1)));
        q.push(NodeId(0), exec(1, 10, NodeId(0)));
        let (node, event) = q.pop_next().unwrap();
        assert_eq!(node, NodeId(0));
        assert_eq!(event.time_ns(), 10);
    }

    #[test]
    fn ties_broken_by_node_id_then_insertion_order() {
        let mut q = GlobalQueue::new([NodeId(0), NodeId(1)]);
        q.push(NodeId(1), exec(0, 10, NodeId(1)));
        q.push(NodeId(0), exec(1, 10, NodeId(0)));
        let (node, _) = q.pop_next().unwrap();
        assert_eq!(node, NodeId(0));
        let (node, _) = q.pop_next().unwrap();
        assert_eq!(node, NodeId(1));
    }

    #[test]
    fn dedups_notification_frames_per_failure() {
        use crate::event::FrameEvent;
        let mut nq = EventQueue::new();
        nq.push(Event::Frame(FrameEvent {
            failure_id: 7,
            name: FrameName::Notification,
            time_ns: 0,
            size_bits: 10,
            path: vec![NodeId(0)],
        }));
        nq.push(Event::Frame(FrameEvent {
            failure_id: 7,
            name: FrameName::Notification,
            time_ns: 1,
            size_bits: 10,
            path: vec![NodeId(0)],
        }));
        assert!(nq.pop().is_some());
        assert!(nq.pop().is_none());
    }
}
