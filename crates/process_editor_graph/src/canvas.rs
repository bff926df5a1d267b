// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rendering capability for process graphs.
//!
//! Any diagram toolkit can host the editor by implementing [`GraphCanvas`]:
//! draw a positioned node with its connection points, draw edges between
//! those points, and report user gestures back as [`CanvasEvent`]s.

use crate::connection::EdgeId;
use crate::layout::NodeView;
use crate::node::NodeId;
use crate::port::{PortDirection, PortRef};

/// An edge resolved against the current node views
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    /// Edge being drawn
    pub edge: EdgeId,
    /// Output endpoint
    pub source: PortRef,
    /// Input endpoint
    pub target: PortRef,
    /// Canvas position of the output connection point
    pub from: [f32; 2],
    /// Canvas position of the input connection point
    pub to: [f32; 2],
}

/// Something drawn by [`crate::ProcessEditor::render`]
pub trait GraphCanvas {
    /// Called once before any node or edge of a frame
    fn begin_frame(&mut self, _locked: bool) {}

    /// Draw one node at its canvas position
    fn draw_node(&mut self, view: &NodeView, position: [f32; 2]);

    /// Draw one edge
    fn draw_edge(&mut self, edge: &EdgeView);

    /// Called once after every node and edge of a frame
    fn end_frame(&mut self) {}
}

/// User gesture reported by a canvas
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A drag from one connection point was released over another
    DragConnect {
        /// Port the drag started on
        from: PortRef,
        /// Port the drag was released over
        to: PortRef,
    },
    /// The +/- control on one side of a node was clicked
    AdjustPorts {
        /// Node being adjusted
        node: NodeId,
        /// Side being adjusted
        direction: PortDirection,
        /// `true` for +, `false` for -
        increase: bool,
    },
    /// A node was dragged to a new position
    MoveNode {
        /// Node being moved
        node: NodeId,
        /// New canvas position
        position: [f32; 2],
    },
    /// Delete was requested for a node
    DeleteNode(NodeId),
    /// Delete was requested for an edge
    DeleteEdge(EdgeId),
    /// A new node was requested at a canvas position
    AddNode {
        /// Canvas position
        position: [f32; 2],
    },
}

/// Canvas position of a connection point on a node at `position` with `width`
pub fn port_anchor(view: &NodeView, position: [f32; 2], width: f32, port: &PortRef) -> Option<[f32; 2]> {
    let offset = view.port_offset(port)?;
    let x = match port.direction {
        PortDirection::Input => position[0],
        PortDirection::Output => position[0] + width,
    };
    Some([x, position[1] + offset])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PortLayout;
    use crate::node::ProcessNode;
    use crate::port::PortCounts;

    #[test]
    fn test_port_anchor_sides() {
        let node = ProcessNode::new("Mix", PortCounts::new(2, 1));
        let view = NodeView::build(&node, &PortLayout::default());

        assert_eq!(
            port_anchor(&view, [100.0, 50.0], 180.0, &PortRef::input(node.id, 1)),
            Some([100.0, 90.0])
        );
        assert_eq!(
            port_anchor(&view, [100.0, 50.0], 180.0, &PortRef::output(node.id, 0)),
            Some([280.0, 70.0])
        );
        assert_eq!(
            port_anchor(&view, [0.0, 0.0], 180.0, &PortRef::output(node.id, 1)),
            None
        );
    }
}
