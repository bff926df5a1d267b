// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the process graph.

use crate::node::NodeId;
use crate::port::{PortDirection, PortRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEdge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source node ID
    pub source_node: NodeId,
    /// Output index on the source node
    pub source_port: usize,
    /// Target node ID
    pub target_node: NodeId,
    /// Input index on the target node
    pub target_port: usize,
}

impl ProcessEdge {
    /// Create a new edge
    pub fn new(
        source_node: NodeId,
        source_port: usize,
        target_node: NodeId,
        target_port: usize,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            source_node,
            source_port,
            target_node,
            target_port,
        }
    }

    /// Source endpoint
    pub fn source(&self) -> PortRef {
        PortRef::output(self.source_node, self.source_port)
    }

    /// Target endpoint
    pub fn target(&self) -> PortRef {
        PortRef::input(self.target_node, self.target_port)
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }

    /// Check if this edge attaches to a specific port
    pub fn involves_port(&self, port: &PortRef) -> bool {
        match port.direction {
            PortDirection::Output => self.source() == *port,
            PortDirection::Input => self.target() == *port,
        }
    }

    /// Whether this edge uses a port index at or beyond `count` on one side of `node_id`
    pub fn exceeds(&self, node_id: NodeId, direction: PortDirection, count: usize) -> bool {
        match direction {
            PortDirection::Output => self.source_node == node_id && self.source_port >= count,
            PortDirection::Input => self.target_node == node_id && self.target_port >= count,
        }
    }

    /// Whether two edges wire the identical port pair
    pub fn same_endpoints(&self, other: &ProcessEdge) -> bool {
        self.source() == other.source() && self.target() == other.target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds_is_side_specific() {
        let a = NodeId::new();
        let b = NodeId::new();
        let edge = ProcessEdge::new(a, 1, b, 0);

        assert!(edge.exceeds(a, PortDirection::Output, 1));
        assert!(!edge.exceeds(a, PortDirection::Output, 2));
        assert!(!edge.exceeds(a, PortDirection::Input, 0));
        assert!(edge.exceeds(b, PortDirection::Input, 0));
    }

    #[test]
    fn test_involves_port() {
        let a = NodeId::new();
        let b = NodeId::new();
        let edge = ProcessEdge::new(a, 0, b, 2);

        assert!(edge.involves_port(&PortRef::output(a, 0)));
        assert!(edge.involves_port(&PortRef::input(b, 2)));
        assert!(!edge.involves_port(&PortRef::input(a, 0)));
        assert!(!edge.involves_port(&PortRef::input(b, 1)));
    }
}
