// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port addressing for process nodes.
//!
//! Ports have no stable handle of their own. A port is the pair of a
//! direction and an index below the node's current count for that direction,
//! so an index stops existing as soon as the count drops to or below it.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port (edge target)
    Input,
    /// Output port (edge source)
    Output,
}

impl PortDirection {
    /// Name used in port identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// The direction an edge must attach to on the other end
    pub fn opposite(&self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a single port: `(node, direction, index)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Side of the node
    pub direction: PortDirection,
    /// Zero-based position within the current count
    pub index: usize,
}

impl PortRef {
    /// Address an input port
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            index,
        }
    }

    /// Address an output port
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            index,
        }
    }

    /// Whether two ports can be wired together, in either drag order
    pub fn can_pair_with(&self, other: &PortRef) -> bool {
        self.direction == other.direction.opposite()
    }
}

/// Renders as `<node>#input_<index>` or `<node>#output_<index>`
impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}_{}", self.node, self.direction, self.index)
    }
}

/// Input and output port counts of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortCounts {
    /// Number of input ports
    pub inputs: usize,
    /// Number of output ports
    pub outputs: usize,
}

impl PortCounts {
    /// Create a port count pair
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }

    /// Count for one side
    pub fn get(&self, direction: PortDirection) -> usize {
        match direction {
            PortDirection::Input => self.inputs,
            PortDirection::Output => self.outputs,
        }
    }

    /// Mutable count for one side
    pub fn get_mut(&mut self, direction: PortDirection) -> &mut usize {
        match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_port_ref_display() {
        let node = NodeId(Uuid::nil());
        assert_eq!(
            PortRef::input(node, 2).to_string(),
            "00000000-0000-0000-0000-000000000000#input_2"
        );
        assert_eq!(
            PortRef::output(node, 0).to_string(),
            "00000000-0000-0000-0000-000000000000#output_0"
        );
    }

    #[test]
    fn test_pairing_requires_opposite_directions() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert!(PortRef::output(a, 0).can_pair_with(&PortRef::input(b, 0)));
        assert!(PortRef::input(a, 0).can_pair_with(&PortRef::output(b, 1)));
        assert!(!PortRef::input(a, 0).can_pair_with(&PortRef::input(b, 0)));
    }

    #[test]
    fn test_counts_by_direction() {
        let mut counts = PortCounts::new(3, 1);
        assert_eq!(counts.get(PortDirection::Input), 3);
        *counts.get_mut(PortDirection::Output) += 1;
        assert_eq!(counts.outputs, 2);
    }
}
