//! The physical network topology: nodes, links, and path queries over them.
//!
//! Backed by [`petgraph::stable_graph::StableDiGraph`] rather than a plain
//! `Graph`: removing a link during a repair must not invalidate the indices
//! of links discovered earlier in the same failure's handling, the same
//! property `bgpsim`'s `IgpNetwork` relies on for its router indices.

use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::error::TopologyError;
use crate::ids::{LinkId, NodeId};

/// The role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A talker or listener; may only appear as a path endpoint.
    EndSystem,
    /// A time-triggered switch; may relay traffic and act as a healing
    /// protocol leader.
    Switch,
    /// An access point bridging a wired segment to a wireless one.
    AccessPoint,
}

/// A node in the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's identifier.
    pub id: NodeId,
    /// The node's kind.
    pub kind: NodeKind,
    /// Whether this switch is a "high-performance" switch eligible to act as
    /// a self-healing protocol leader. Always `false` for end systems.
    pub high_performance: bool,
}

impl Node {
    /// Create a new node description.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Node {
            id,
            kind,
            high_performance: false,
        }
    }
}

/// The physical medium a link runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A wired link.
    Wired,
    /// A wireless link.
    Wireless,
}

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The link's identifier, stable across `StableDiGraph` compaction.
    pub id: LinkId,
    /// The link's medium.
    pub kind: LinkKind,
    /// Link speed in bytes per second.
    pub speed: i64,
}

/// The network topology: a directed multigraph of [`Node`]s connected by
/// [`Link`]s, indexed both by `petgraph`'s internal index and by the
/// document-level [`LinkId`]/[`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: StableDiGraph<Node, Link>,
    node_index: HashMap<NodeId, NodeIndex>,
    link_index: HashMap<LinkId, EdgeIndex>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the topology.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        id
    }

    /// Add a directed link between two existing nodes.
    pub fn add_link(
        &mut self,
        sender: NodeId,
        receiver: NodeId,
        link: Link,
    ) -> Result<(), TopologyError> {
        let id = link.id;
        let s = self.node_idx(sender)?;
        let r = self.node_idx(receiver)?;
        let e = self.graph.add_edge(s, r, link);
        self.link_index.insert(id, e);
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node, TopologyError> {
        let idx = self.node_idx(id)?;
        Ok(&self.graph[idx])
    }

    /// Look up a mutable reference to a node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TopologyError> {
        let idx = self.node_idx(id)?;
        Ok(&mut self.graph[idx])
    }

    /// Iterate over all nodes in the topology.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Look up a link by id, along with its sender and receiver.
    pub fn link(&self, id: LinkId) -> Result<(NodeId, NodeId, &Link), TopologyError> {
        let e = *self
            .link_index
            .get(&id)
            .ok_or(TopologyError::LinkNotFound(id))?;
        let (s, r) = self
            .graph
            .edge_endpoints(e)
            .ok_or(TopologyError::LinkNotFound(id))?;
        Ok((self.graph[s].id, self.graph[r].id, &self.graph[e]))
    }

    /// Look up the link id (and weight) connecting `sender` to `receiver`,
    /// if a direct edge exists.
    pub fn link_between(
        &self,
        sender: NodeId,
        receiver: NodeId,
    ) -> Result<(LinkId, &Link), TopologyError> {
        let s = self.node_idx(sender)?;
        let r = self.node_idx(receiver)?;
        let e = self
            .graph
            .find_edge(s, r)
            .ok_or(TopologyError::NoSuchEdge(sender, receiver))?;
        Ok((self.graph[e].id, &self.graph[e]))
    }

    /// Remove a link from the topology. The node indices of both endpoints
    /// remain valid (`StableDiGraph` never shifts indices on removal).
    pub fn remove_link(&mut self, id: LinkId) -> Result<(), TopologyError> {
        let e = *self
            .link_index
            .get(&id)
            .ok_or(TopologyError::LinkNotFound(id))?;
        self.graph.remove_edge(e);
        self.link_index.remove(&id);
        Ok(())
    }

    /// All link ids incident to a node, in either direction.
    pub fn incident_links(&self, id: NodeId) -> Result<Vec<LinkId>, TopologyError> {
        let idx = self.node_idx(id)?;
        let mut out: Vec<LinkId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.weight().id)
            .chain(
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| e.weight().id),
            )
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Map a sequence of consecutive nodes to the link ids that connect them.
    pub fn path_to_links(&self, path: &[NodeId]) -> Result<Vec<LinkId>, TopologyError> {
        path.windows(2)
            .map(|w| self.link_between(w[0], w[1]).map(|(id, _)| id))
            .collect()
    }

    /// Shortest path (by hop count) between two nodes, unconstrained.
    pub fn shortest_path(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> Result<Vec<NodeId>, TopologyError> {
        if from == to {
            return Ok(vec![from]);
        }
        let s = self.node_idx(from)?;
        let t = self.node_idx(to)?;
        let result = petgraph::algo::astar(
            &self.graph,
            s,
            |n| n == t,
            |_| 1i64,
            |_| 0i64,
        );
        match result {
            Some((_, path)) => Ok(path.into_iter().map(|i| self.graph[i].id).collect()),
            None => Err(TopologyError::NoPath(from, to)),
        }
    }

    /// Shortest path between two nodes whose interior nodes (everything but
    /// the endpoints) are all switches, never end systems.
    ///
    /// Mirrors the original simulator's widening-cutoff search: try paths of
    /// length 1 hop, then 2, then 3, ... and return the first one (in
    /// `petgraph`'s enumeration order, which like the reference
    /// implementation's DFS-based generator favors earlier-added edges)
    /// whose interior avoids end systems.
    pub fn shortest_path_no_end_systems(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> Result<Vec<NodeId>, TopologyError> {
        if from == to {
            return Ok(vec![]);
        }
        let s = self.node_idx(from)?;
        let t = self.node_idx(to)?;
        const CUTOFF: usize = 25;
        for length in 1..=CUTOFF {
            let paths = petgraph::algo::all_simple_paths::<Vec<_>, _>(
                &self.graph,
                s,
                t,
                0,
                Some(length.saturating_sub(1)),
            );
            for candidate in paths {
                if candidate.len() != length + 1 {
                    continue;
                }
                let interior_ok = candidate[1..candidate.len() - 1]
                    .iter()
                    .all(|&n| self.graph[n].kind != NodeKind::EndSystem);
                if interior_ok {
                    return Ok(candidate.into_iter().map(|i| self.graph[i].id).collect());
                }
            }
        }
        Err(TopologyError::NoPathAvoidingEndSystems(from, to))
    }

    fn node_idx(&self, id: NodeId) -> Result<NodeIndex, TopologyError> {
        self.node_index
            .get(&id)
            .copied()
            .ok_or(TopologyError::NodeNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_topology() -> Topology {
        let mut t = Topology::new();
        t.add_node(Node::new(NodeId(0), NodeKind::EndSystem));
        t.add_node(Node::new(NodeId(1), NodeKind::Switch));
        t.add_node(Node::new(NodeId(2), NodeKind::Switch));
        t.add_node(Node::new(NodeId(3), NodeKind::EndSystem));
        t.add_link(
            NodeId(0),
            NodeId(1),
            Link {
                id: LinkId(0),
                kind: LinkKind::Wired,
                speed: 1_000_000_000,
            },
        )
        .unwrap();
        t.add_link(
            NodeId(1),
            NodeId(2),
            Link {
                id: LinkId(1),
                kind: LinkKind::Wired,
                speed: 1_000_000_000,
            },
        )
        .unwrap();
        t.add_link(
            NodeId(2),
            NodeId(3),
            Link {
                id: LinkId(2),
                kind: LinkKind::Wired,
                speed: 1_000_000_000,
            },
        )
        .unwrap();
        t
    }

    #[test]
    fn finds_shortest_path() {
        let t = line_topology();
        let path = t.shortest_path(NodeId(0), NodeId(3)).unwrap();
        assert_eq!(path, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn no_end_systems_in_interior() {
        let t = line_topology();
        let path = t
            .shortest_path_no_end_systems(NodeId(1), NodeId(2))
            .unwrap();
        assert_eq!(path, vec![NodeId(1), NodeId(2)]);
    }

    #[test]
    fn removing_link_keeps_other_indices_stable() {
        let mut t = line_topology();
        let before = t.link(LinkId(2)).unwrap().2.clone();
        t.remove_link(LinkId(0)).unwrap();
        let after = t.link(LinkId(2)).unwrap().2.clone();
        assert_eq!(before, after);
        assert!(t.link(LinkId(0)).is_err());
    }

    #[test]
    fn no_path_once_severed() {
        let mut t = line_topology();
        t.remove_link(LinkId(1)).unwrap();
        assert!(t.shortest_path(NodeId(0), NodeId(3)).is_err());
    }
}
