// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process graph containing nodes and edges.
//!
//! [`ProcessGraph`] is the only place port counts change. Every decrement
//! removes the edges that referenced the vanished port before returning, so
//! callers never observe an edge pointing past a node's current count.

use crate::connection::{EdgeId, ProcessEdge};
use crate::node::{NodeId, ProcessNode};
use crate::port::{PortCounts, PortDirection, PortRef};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Whether the graph accepts structural changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Accepts all mutations
    #[default]
    Editable,
    /// Rendering only, e.g. when confirming a finalized process
    Locked,
}

/// Rules applied by [`ProcessGraph::connect`] on top of port validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionPolicy {
    /// Allow an edge from a node's output to its own input
    pub allow_self_loops: bool,
}

/// A process flow graph.
///
/// Saved and loaded through [`crate::GraphDocument`], which rebuilds edges
/// with [`ProcessGraph::connect`].
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, ProcessNode>,
    /// Edges between node ports
    edges: IndexMap<EdgeId, ProcessEdge>,
    mode: EditMode,
    policy: ConnectionPolicy,
    default_ports: PortCounts,
}

impl ProcessGraph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            mode: EditMode::Editable,
            policy: ConnectionPolicy::default(),
            default_ports: PortCounts::default(),
        }
    }

    /// Set the connection policy
    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the port counts new nodes start with
    pub fn with_default_ports(mut self, counts: PortCounts) -> Self {
        self.default_ports = counts;
        self
    }

    /// Current connection policy
    pub fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    /// Port counts new nodes start with
    pub fn default_ports(&self) -> PortCounts {
        self.default_ports
    }

    // ---- edit mode ----

    /// Switch edit mode
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            tracing::debug!("Graph '{}' mode {:?} -> {:?}", self.name, self.mode, mode);
            self.mode = mode;
        }
    }

    /// Make the graph read-only
    pub fn lock(&mut self) {
        self.set_mode(EditMode::Locked);
    }

    /// Make the graph editable again
    pub fn unlock(&mut self) {
        self.set_mode(EditMode::Editable);
    }

    /// Whether mutations are currently rejected
    pub fn is_locked(&self) -> bool {
        self.mode == EditMode::Locked
    }

    fn ensure_editable(&self) -> Result<(), GraphError> {
        if self.is_locked() {
            Err(GraphError::Locked)
        } else {
            Ok(())
        }
    }

    // ---- nodes ----

    /// Add a node with the default port counts
    pub fn add_node(&mut self, label: impl Into<String>) -> Result<NodeId, GraphError> {
        self.insert_node(ProcessNode::new(label, self.default_ports))
    }

    /// Add a node at a canvas position
    pub fn add_node_at(
        &mut self,
        label: impl Into<String>,
        position: [f32; 2],
    ) -> Result<NodeId, GraphError> {
        let node = ProcessNode::new(label, self.default_ports).with_position(position[0], position[1]);
        self.insert_node(node)
    }

    /// Insert a fully built node, keeping its ID and counts.
    ///
    /// An ID already in the graph is refused: replacing the node could drop
    /// ports that existing edges still use.
    pub fn insert_node(&mut self, node: ProcessNode) -> Result<NodeId, GraphError> {
        self.ensure_editable()?;
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<ProcessNode, GraphError> {
        self.ensure_editable()?;
        let node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;

        let before = self.edges.len();
        self.edges.retain(|_, e| !e.involves_node(node_id));
        let removed = before - self.edges.len();
        if removed > 0 {
            tracing::debug!("Removed node '{}' and {} attached edge(s)", node.label, removed);
        }
        Ok(node)
    }

    /// Change a node's label
    pub fn rename_node(&mut self, node_id: NodeId, label: impl Into<String>) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.label = label.into();
        Ok(())
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<(), GraphError> {
        self.ensure_editable()?;
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.position = position;
        Ok(())
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&ProcessNode> {
        self.nodes.get(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &ProcessNode> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- port counts ----

    /// Add one input port; returns the new count
    pub fn increment_inputs(&mut self, node_id: NodeId) -> Result<usize, GraphError> {
        self.increment_ports(node_id, PortDirection::Input)
    }

    /// Remove the last input port and any edge into it; returns the new count
    pub fn decrement_inputs(&mut self, node_id: NodeId) -> Result<usize, GraphError> {
        self.decrement_ports(node_id, PortDirection::Input)
    }

    /// Add one output port; returns the new count
    pub fn increment_outputs(&mut self, node_id: NodeId) -> Result<usize, GraphError> {
        self.increment_ports(node_id, PortDirection::Output)
    }

    /// Remove the last output port and any edge out of it; returns the new count
    pub fn decrement_outputs(&mut self, node_id: NodeId) -> Result<usize, GraphError> {
        self.decrement_ports(node_id, PortDirection::Output)
    }

    /// Add one port on the given side
    pub fn increment_ports(
        &mut self,
        node_id: NodeId,
        direction: PortDirection,
    ) -> Result<usize, GraphError> {
        self.ensure_editable()?;
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        Ok(node.increment(direction))
    }

    /// Remove the last port on the given side. At zero this is a no-op.
    pub fn decrement_ports(
        &mut self,
        node_id: NodeId,
        direction: PortDirection,
    ) -> Result<usize, GraphError> {
        self.ensure_editable()?;
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let Some(count) = node.decrement(direction) else {
            return Ok(0);
        };

        let before = self.edges.len();
        self.edges.retain(|_, e| !e.exceeds(node_id, direction, count));
        let pruned = before - self.edges.len();
        if pruned > 0 {
            tracing::debug!(
                "Pruned {} edge(s) from {} ports of node {} (count now {})",
                pruned,
                direction,
                node_id,
                count
            );
        }
        Ok(count)
    }

    // ---- edges ----

    /// Wire `source`'s output `source_port` to `target`'s input `target_port`
    pub fn connect(
        &mut self,
        source: NodeId,
        source_port: usize,
        target: NodeId,
        target_port: usize,
    ) -> Result<EdgeId, GraphError> {
        self.ensure_editable()?;

        // Validate nodes exist
        let source_node = self.nodes.get(&source).ok_or(GraphError::NodeNotFound(source))?;
        let target_node = self.nodes.get(&target).ok_or(GraphError::NodeNotFound(target))?;

        // Validate ports exist right now
        let from = PortRef::output(source, source_port);
        let to = PortRef::input(target, target_port);
        if !source_node.has_port(&from) {
            return Err(GraphError::PortOutOfRange(from));
        }
        if !target_node.has_port(&to) {
            return Err(GraphError::PortOutOfRange(to));
        }

        if source == target && !self.policy.allow_self_loops {
            return Err(GraphError::SelfLoop);
        }

        let edge = ProcessEdge::new(source, source_port, target, target_port);
        if let Some(existing) = self.edges.values().find(|e| e.same_endpoints(&edge)) {
            return Err(GraphError::DuplicateEdge(existing.id));
        }

        let id = edge.id;
        self.edges.insert(id, edge);
        Ok(id)
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<ProcessEdge, GraphError> {
        self.ensure_editable()?;
        self.edges
            .shift_remove(&edge_id)
            .ok_or(GraphError::EdgeNotFound(edge_id))
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&ProcessEdge> {
        self.edges.get(&edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &ProcessEdge> {
        self.edges.values()
    }

    /// Get edges leaving an output port
    pub fn edges_out_of(&self, port: PortRef) -> impl Iterator<Item = &ProcessEdge> {
        self.edges
            .values()
            .filter(move |e| port.direction == PortDirection::Output && e.involves_port(&port))
    }

    /// Get edges entering an input port
    pub fn edges_into(&self, port: PortRef) -> impl Iterator<Item = &ProcessEdge> {
        self.edges
            .values()
            .filter(move |e| port.direction == PortDirection::Input && e.involves_port(&port))
    }

    /// Get edges involving a node
    pub fn edges_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &ProcessEdge> {
        self.edges.values().filter(move |e| e.involves_node(node_id))
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ---- structure ----

    /// Check that every edge references existing nodes and in-range ports
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        for edge in self.edges.values() {
            for port in [edge.source(), edge.target()] {
                let node = self.nodes.get(&port.node).ok_or(GraphError::NodeNotFound(port.node))?;
                if !node.has_port(&port) {
                    return Err(GraphError::PortOutOfRange(port));
                }
            }
        }
        Ok(())
    }

    /// Ports with no edge attached, in node order
    pub fn unconnected_ports(&self) -> Vec<PortRef> {
        let connected: HashSet<PortRef> = self
            .edges
            .values()
            .flat_map(|e| [e.source(), e.target()])
            .collect();

        self.nodes
            .values()
            .flat_map(|n| n.ports(PortDirection::Input).chain(n.ports(PortDirection::Output)))
            .filter(|p| !connected.contains(p))
            .collect()
    }

    /// Process steps ordered so every step comes after the steps feeding it
    pub fn process_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError(node_id));
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Upstream steps first
        for edge in self.edges.values().filter(|e| e.target_node == node_id) {
            self.visit(edge.source_node, visited, temp_mark, order)?;
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }
}

impl Default for ProcessGraph {
    fn default() -> Self {
        Self::new("Untitled Process")
    }
}

/// Rejected graph mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Edge not found
    #[error("Edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    /// Port index is not below the node's current count
    #[error("Port does not exist: {0}")]
    PortOutOfRange(PortRef),

    /// A node with this ID is already in the graph
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    /// The identical port pair is already wired
    #[error("Edge already exists: {0:?}")]
    DuplicateEdge(EdgeId),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Graph is read-only
    #[error("Graph is locked")]
    Locked,
}

/// Error when the process contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Process contains a cycle through node {0}")]
pub struct CycleError(pub NodeId);

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ports(graph: &mut ProcessGraph, label: &str, inputs: usize, outputs: usize) -> NodeId {
        let id = graph.add_node(label).unwrap();
        for _ in 0..inputs {
            graph.increment_inputs(id).unwrap();
        }
        for _ in 0..outputs {
            graph.increment_outputs(id).unwrap();
        }
        id
    }

    #[test]
    fn test_add_node_uses_default_ports() {
        let mut graph = ProcessGraph::new("Line").with_default_ports(PortCounts::new(1, 2));
        let id = graph.add_node("Cut").unwrap();
        let node = graph.node(id).unwrap();
        assert_eq!(node.input_count(), 1);
        assert_eq!(node.output_count(), 2);
        assert_eq!(node.label, "Cut");
    }

    #[test]
    fn test_decrement_at_zero_is_noop() {
        let mut graph = ProcessGraph::default();
        let id = graph.add_node("Empty").unwrap();
        assert_eq!(graph.decrement_inputs(id), Ok(0));
        assert_eq!(graph.decrement_outputs(id), Ok(0));
        assert_eq!(graph.node(id).unwrap().counts(), PortCounts::default());
    }

    #[test]
    fn test_decrement_prunes_only_vanished_ports() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 3);
        let b = with_ports(&mut graph, "B", 3, 0);

        let keep = graph.connect(a, 0, b, 0).unwrap();
        graph.connect(a, 2, b, 1).unwrap();
        graph.connect(a, 1, b, 2).unwrap();

        assert_eq!(graph.decrement_outputs(a), Ok(2));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.decrement_inputs(b), Ok(2));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge(keep).is_some());
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_connect_rejects_missing_ports() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 1);
        let b = with_ports(&mut graph, "B", 1, 0);

        assert_eq!(
            graph.connect(a, 1, b, 0),
            Err(GraphError::PortOutOfRange(PortRef::output(a, 1)))
        );
        assert_eq!(
            graph.connect(a, 0, b, 1),
            Err(GraphError::PortOutOfRange(PortRef::input(b, 1)))
        );
        let ghost = NodeId::new();
        assert_eq!(graph.connect(ghost, 0, b, 0), Err(GraphError::NodeNotFound(ghost)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 1);
        let b = with_ports(&mut graph, "B", 1, 0);

        let first = graph.connect(a, 0, b, 0).unwrap();
        assert_eq!(graph.connect(a, 0, b, 0), Err(GraphError::DuplicateEdge(first)));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_self_loop_policy() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "Loop", 1, 1);
        assert_eq!(graph.connect(a, 0, a, 0), Err(GraphError::SelfLoop));

        let mut permissive = ProcessGraph::default().with_policy(ConnectionPolicy {
            allow_self_loops: true,
        });
        let a = with_ports(&mut permissive, "Loop", 1, 1);
        assert!(permissive.connect(a, 0, a, 0).is_ok());
    }

    #[test]
    fn test_insert_existing_id_is_refused() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 2);
        let b = with_ports(&mut graph, "B", 1, 0);
        graph.connect(a, 1, b, 0).unwrap();

        let replacement = ProcessNode::with_id(a, "A2", PortCounts::new(0, 0));
        assert_eq!(graph.insert_node(replacement), Err(GraphError::DuplicateNode(a)));

        assert_eq!(graph.node(a).unwrap().label, "A");
        assert_eq!(graph.node(a).unwrap().output_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_remove_node_cascades_only_its_edges() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 1);
        let b = with_ports(&mut graph, "B", 1, 1);
        let c = with_ports(&mut graph, "C", 1, 0);
        let d = with_ports(&mut graph, "D", 1, 0);

        graph.connect(a, 0, b, 0).unwrap();
        graph.connect(b, 0, c, 0).unwrap();
        let untouched = graph.connect(a, 0, d, 0).unwrap();

        graph.remove_node(b).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge(untouched).is_some());
        assert_eq!(graph.remove_node(b), Err(GraphError::NodeNotFound(b)));
    }

    #[test]
    fn test_locked_graph_rejects_mutations() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 1);
        let b = with_ports(&mut graph, "B", 1, 0);
        let edge = graph.connect(a, 0, b, 0).unwrap();

        graph.lock();
        assert!(graph.is_locked());
        assert_eq!(graph.add_node("C"), Err(GraphError::Locked));
        assert_eq!(graph.decrement_outputs(a), Err(GraphError::Locked));
        assert_eq!(graph.increment_inputs(a), Err(GraphError::Locked));
        assert_eq!(graph.disconnect(edge), Err(GraphError::Locked));
        assert_eq!(graph.rename_node(a, "X"), Err(GraphError::Locked));
        assert_eq!(graph.remove_node(a).unwrap_err(), GraphError::Locked);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        graph.unlock();
        assert!(graph.disconnect(edge).is_ok());
    }

    #[test]
    fn test_edge_queries() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 0, 2);
        let b = with_ports(&mut graph, "B", 2, 0);
        graph.connect(a, 0, b, 0).unwrap();
        graph.connect(a, 0, b, 1).unwrap();
        graph.connect(a, 1, b, 1).unwrap();

        assert_eq!(graph.edges_out_of(PortRef::output(a, 0)).count(), 2);
        assert_eq!(graph.edges_into(PortRef::input(b, 1)).count(), 2);
        assert_eq!(graph.edges_into(PortRef::output(a, 0)).count(), 0);
        assert_eq!(graph.edges_for_node(b).count(), 3);
    }

    #[test]
    fn test_unconnected_ports() {
        let mut graph = ProcessGraph::default();
        let a = with_ports(&mut graph, "A", 1, 1);
        let b = with_ports(&mut graph, "B", 1, 0);
        graph.connect(a, 0, b, 0).unwrap();

        assert_eq!(graph.unconnected_ports(), vec![PortRef::input(a, 0)]);
    }

    #[test]
    fn test_process_order() {
        let mut graph = ProcessGraph::default();
        let bottle = with_ports(&mut graph, "Bottle", 1, 1);
        let mix = with_ports(&mut graph, "Mix", 0, 1);
        let pack = with_ports(&mut graph, "Pack", 1, 1);
        graph.connect(mix, 0, bottle, 0).unwrap();
        graph.connect(bottle, 0, pack, 0).unwrap();

        assert_eq!(graph.process_order().unwrap(), vec![mix, bottle, pack]);

        graph.connect(pack, 0, bottle, 0).unwrap();
        assert!(graph.process_order().is_err());
    }

    #[test]
    fn test_rename_and_move() {
        let mut graph = ProcessGraph::default();
        let a = graph.add_node_at("Mix", [10.0, 20.0]).unwrap();
        graph.rename_node(a, "Blend").unwrap();
        graph.move_node(a, [5.0, 5.0]).unwrap();

        let node = graph.node(a).unwrap();
        assert_eq!(node.label, "Blend");
        assert_eq!(node.position, [5.0, 5.0]);
    }
}
