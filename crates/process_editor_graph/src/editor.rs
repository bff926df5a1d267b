// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session over a single process graph.
//!
//! [`ProcessEditor`] is the one authority UI code talks to. Canvases report
//! gestures, the editor turns them into [`EditorAction`]s, and each action is
//! applied to the graph in full or not at all. Rejected actions come from a UI
//! that only offers valid choices, so they are logged and dropped.

use crate::canvas::{port_anchor, CanvasEvent, EdgeView, GraphCanvas};
use crate::connection::{EdgeId, ProcessEdge};
use crate::graph::{GraphError, ProcessGraph};
use crate::layout::{NodeView, PortLayout};
use crate::node::{NodeId, ProcessNode};
use crate::port::PortDirection;
use std::collections::HashMap;

/// Default node width on the canvas
pub const NODE_WIDTH: f32 = 180.0;

/// Label given to nodes added from the canvas
pub const NEW_NODE_LABEL: &str = "New Step";

/// A structural change requested by the user
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Add a node
    AddNode {
        /// Initial label
        label: String,
        /// Canvas position
        position: [f32; 2],
    },
    /// Remove a node and its edges
    RemoveNode(NodeId),
    /// Change a node's label
    RenameNode(NodeId, String),
    /// Move a node on the canvas
    MoveNode(NodeId, [f32; 2]),
    /// Add an input port
    IncrementInputs(NodeId),
    /// Remove the last input port
    DecrementInputs(NodeId),
    /// Add an output port
    IncrementOutputs(NodeId),
    /// Remove the last output port
    DecrementOutputs(NodeId),
    /// Wire an output port to an input port
    Connect {
        /// Source node
        source: NodeId,
        /// Output index on the source
        source_port: usize,
        /// Target node
        target: NodeId,
        /// Input index on the target
        target_port: usize,
    },
    /// Remove an edge
    Disconnect(EdgeId),
    /// Make the graph read-only
    Lock,
    /// Make the graph editable
    Unlock,
}

impl EditorAction {
    /// Translate a canvas gesture
    pub fn from_event(event: CanvasEvent) -> Option<Self> {
        let action = match event {
            CanvasEvent::DragConnect { from, to } => {
                if !from.can_pair_with(&to) {
                    return None;
                }
                let (out, inp) = match from.direction {
                    PortDirection::Output => (from, to),
                    PortDirection::Input => (to, from),
                };
                Self::Connect {
                    source: out.node,
                    source_port: out.index,
                    target: inp.node,
                    target_port: inp.index,
                }
            }
            CanvasEvent::AdjustPorts { node, direction, increase } => match (direction, increase) {
                (PortDirection::Input, true) => Self::IncrementInputs(node),
                (PortDirection::Input, false) => Self::DecrementInputs(node),
                (PortDirection::Output, true) => Self::IncrementOutputs(node),
                (PortDirection::Output, false) => Self::DecrementOutputs(node),
            },
            CanvasEvent::MoveNode { node, position } => Self::MoveNode(node, position),
            CanvasEvent::DeleteNode(node) => Self::RemoveNode(node),
            CanvasEvent::DeleteEdge(edge) => Self::Disconnect(edge),
            CanvasEvent::AddNode { position } => Self::AddNode {
                label: NEW_NODE_LABEL.to_string(),
                position,
            },
        };
        Some(action)
    }
}

/// Result of an applied action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A node was created
    NodeAdded(NodeId),
    /// A node was removed
    NodeRemoved(ProcessNode),
    /// A port count changed; carries the new count
    PortCount(usize),
    /// An edge was created
    Connected(EdgeId),
    /// An edge was removed
    Disconnected(ProcessEdge),
    /// Anything else that succeeded
    Applied,
}

/// Editing session state
#[derive(Debug, Clone)]
pub struct ProcessEditor {
    graph: ProcessGraph,
    layout: PortLayout,
    node_width: f32,
    revision: u64,
}

impl ProcessEditor {
    /// Start a session on `graph`
    pub fn new(graph: ProcessGraph) -> Self {
        Self {
            graph,
            layout: PortLayout::default(),
            node_width: NODE_WIDTH,
            revision: 0,
        }
    }

    /// Set the port layout
    pub fn with_layout(mut self, layout: PortLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The graph being edited
    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    /// Replace the graph, e.g. after an import. Refused while locked.
    pub fn replace_graph(&mut self, graph: ProcessGraph) -> Result<(), GraphError> {
        if self.is_locked() {
            return Err(GraphError::Locked);
        }
        self.graph = graph;
        self.revision += 1;
        Ok(())
    }

    /// Port layout used for views
    pub fn layout(&self) -> &PortLayout {
        &self.layout
    }

    /// Node width used for edge anchors
    pub fn node_width(&self) -> f32 {
        self.node_width
    }

    /// Bumped after every action that changed the graph
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the graph is read-only
    pub fn is_locked(&self) -> bool {
        self.graph.is_locked()
    }

    /// Apply an action. Rejections are logged and ignored.
    pub fn apply(&mut self, action: EditorAction) -> Option<ActionOutcome> {
        let unchanged = self.leaves_unchanged(&action);
        match self.try_apply(&action) {
            Ok(outcome) => {
                if !unchanged {
                    self.revision += 1;
                }
                Some(outcome)
            }
            Err(err) => {
                tracing::debug!("Ignored {action:?}: {err}");
                None
            }
        }
    }

    /// Actions that succeed without touching the graph
    fn leaves_unchanged(&self, action: &EditorAction) -> bool {
        let graph = &self.graph;
        match action {
            EditorAction::RenameNode(node, label) => graph.node(*node).is_some_and(|n| n.label == *label),
            EditorAction::MoveNode(node, position) => {
                graph.node(*node).is_some_and(|n| n.position == *position)
            }
            EditorAction::DecrementInputs(node) => graph.node(*node).is_some_and(|n| n.input_count() == 0),
            EditorAction::DecrementOutputs(node) => graph.node(*node).is_some_and(|n| n.output_count() == 0),
            EditorAction::Lock => graph.is_locked(),
            EditorAction::Unlock => !graph.is_locked(),
            _ => false,
        }
    }

    /// Apply a canvas gesture
    pub fn handle_event(&mut self, event: CanvasEvent) -> Option<ActionOutcome> {
        match EditorAction::from_event(event) {
            Some(action) => self.apply(action),
            None => {
                tracing::debug!("Ignored gesture between ports on the same side");
                None
            }
        }
    }

    /// Apply an action, reporting why it was rejected
    pub fn try_apply(&mut self, action: &EditorAction) -> Result<ActionOutcome, GraphError> {
        let graph = &mut self.graph;
        let outcome = match *action {
            EditorAction::AddNode { ref label, position } => {
                ActionOutcome::NodeAdded(graph.add_node_at(label.clone(), position)?)
            }
            EditorAction::RemoveNode(node) => ActionOutcome::NodeRemoved(graph.remove_node(node)?),
            EditorAction::RenameNode(node, ref label) => {
                graph.rename_node(node, label.clone())?;
                ActionOutcome::Applied
            }
            EditorAction::MoveNode(node, position) => {
                graph.move_node(node, position)?;
                ActionOutcome::Applied
            }
            EditorAction::IncrementInputs(node) => ActionOutcome::PortCount(graph.increment_inputs(node)?),
            EditorAction::DecrementInputs(node) => ActionOutcome::PortCount(graph.decrement_inputs(node)?),
            EditorAction::IncrementOutputs(node) => ActionOutcome::PortCount(graph.increment_outputs(node)?),
            EditorAction::DecrementOutputs(node) => ActionOutcome::PortCount(graph.decrement_outputs(node)?),
            EditorAction::Connect { source, source_port, target, target_port } => {
                ActionOutcome::Connected(graph.connect(source, source_port, target, target_port)?)
            }
            EditorAction::Disconnect(edge) => ActionOutcome::Disconnected(graph.disconnect(edge)?),
            EditorAction::Lock => {
                graph.lock();
                ActionOutcome::Applied
            }
            EditorAction::Unlock => {
                graph.unlock();
                ActionOutcome::Applied
            }
        };
        Ok(outcome)
    }

    /// Views of every node, keyed by node
    pub fn views(&self) -> HashMap<NodeId, NodeView> {
        self.graph
            .nodes()
            .map(|n| (n.id, NodeView::build(n, &self.layout)))
            .collect()
    }

    /// Edges resolved to canvas positions
    pub fn edge_views(&self, views: &HashMap<NodeId, NodeView>) -> Vec<EdgeView> {
        self.graph
            .edges()
            .filter_map(|edge| {
                let (source, target) = (edge.source(), edge.target());
                let from_node = self.graph.node(source.node)?;
                let to_node = self.graph.node(target.node)?;
                let from = port_anchor(views.get(&source.node)?, from_node.position, self.node_width, &source)?;
                let to = port_anchor(views.get(&target.node)?, to_node.position, self.node_width, &target)?;
                Some(EdgeView {
                    edge: edge.id,
                    source,
                    target,
                    from,
                    to,
                })
            })
            .collect()
    }

    /// Draw the whole graph: edges first, then nodes on top
    pub fn render(&self, canvas: &mut impl GraphCanvas) {
        let views = self.views();
        canvas.begin_frame(self.is_locked());
        for edge in self.edge_views(&views) {
            canvas.draw_edge(&edge);
        }
        for node in self.graph.nodes() {
            if let Some(view) = views.get(&node.id) {
                canvas.draw_node(view, node.position);
            }
        }
        canvas.end_frame();
    }
}

impl Default for ProcessEditor {
    fn default() -> Self {
        Self::new(ProcessGraph::default())
    }
}
