// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process step nodes.

use crate::port::{PortCounts, PortDirection, PortRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A process step in the graph.
///
/// Port counts are only changed through [`crate::ProcessGraph`], which prunes
/// edges in the same call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Unique instance ID
    pub id: NodeId,
    /// Display name
    pub label: String,
    /// Position on the canvas
    pub position: [f32; 2],
    counts: PortCounts,
}

impl ProcessNode {
    /// Create a node with the given port counts
    pub fn new(label: impl Into<String>, counts: PortCounts) -> Self {
        Self::with_id(NodeId::new(), label, counts)
    }

    /// Create a node with a known ID (document import)
    pub fn with_id(id: NodeId, label: impl Into<String>, counts: PortCounts) -> Self {
        Self {
            id,
            label: label.into(),
            position: [0.0, 0.0],
            counts,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Number of input ports
    pub fn input_count(&self) -> usize {
        self.counts.inputs
    }

    /// Number of output ports
    pub fn output_count(&self) -> usize {
        self.counts.outputs
    }

    /// Both port counts
    pub fn counts(&self) -> PortCounts {
        self.counts
    }

    /// Number of ports on one side
    pub fn port_count(&self, direction: PortDirection) -> usize {
        self.counts.get(direction)
    }

    /// Whether `port` currently exists on this node
    pub fn has_port(&self, port: &PortRef) -> bool {
        port.node == self.id && port.index < self.port_count(port.direction)
    }

    /// All current ports on one side, in index order
    pub fn ports(&self, direction: PortDirection) -> impl Iterator<Item = PortRef> + '_ {
        (0..self.port_count(direction)).map(move |index| PortRef {
            node: self.id,
            direction,
            index,
        })
    }

    /// Input port identifiers, `<id>#input_0 ..`
    pub fn input_port_ids(&self) -> Vec<String> {
        self.ports(PortDirection::Input).map(|p| p.to_string()).collect()
    }

    /// Output port identifiers, `<id>#output_0 ..`
    pub fn output_port_ids(&self) -> Vec<String> {
        self.ports(PortDirection::Output).map(|p| p.to_string()).collect()
    }

    pub(crate) fn increment(&mut self, direction: PortDirection) -> usize {
        let count = self.counts.get_mut(direction);
        *count += 1;
        *count
    }

    /// Returns the new count, or `None` when already at zero
    pub(crate) fn decrement(&mut self, direction: PortDirection) -> Option<usize> {
        let count = self.counts.get_mut(direction);
        *count = count.checked_sub(1)?;
        Some(*count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_port_ids() {
        let node = ProcessNode::new("Mix", PortCounts::new(2, 1));
        let ids = node.input_port_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], format!("{}#input_0", node.id));
        assert_eq!(ids[1], format!("{}#input_1", node.id));
        assert_eq!(node.output_port_ids(), vec![format!("{}#output_0", node.id)]);
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut node = ProcessNode::new("Idle", PortCounts::default());
        assert_eq!(node.decrement(PortDirection::Input), None);
        assert_eq!(node.input_count(), 0);

        assert_eq!(node.increment(PortDirection::Input), 1);
        assert_eq!(node.decrement(PortDirection::Input), Some(0));
    }

    #[test]
    fn test_has_port_tracks_count() {
        let node = ProcessNode::new("Bottle", PortCounts::new(1, 0));
        assert!(node.has_port(&PortRef::input(node.id, 0)));
        assert!(!node.has_port(&PortRef::input(node.id, 1)));
        assert!(!node.has_port(&PortRef::output(node.id, 0)));
        assert!(!node.has_port(&PortRef::input(NodeId::new(), 0)));
    }
}
