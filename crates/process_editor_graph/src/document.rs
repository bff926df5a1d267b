// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat node/edge document for exchanging process graphs.
//!
//! The JSON form is the compatibility contract for anything that stores a
//! process outside the editor:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "...", "label": "Mix", "inputCount": 0, "outputCount": 2 }],
//!   "edges": [{ "sourceNodeId": "...", "sourcePortIndex": 1,
//!               "targetNodeId": "...", "targetPortIndex": 0 }]
//! }
//! ```
//!
//! Import replays every edge through [`ProcessGraph::connect`], so a document
//! that references a missing node or port never produces a graph.

use crate::graph::{GraphError, ProcessGraph};
use crate::node::{NodeId, ProcessNode};
use crate::port::PortCounts;
use serde::{Deserialize, Serialize};

/// One node of a [`GraphDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node ID
    pub id: NodeId,
    /// Display name
    pub label: String,
    /// Number of input ports
    pub input_count: usize,
    /// Number of output ports
    pub output_count: usize,
    /// Canvas position; absent in documents produced elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 2]>,
}

/// One edge of a [`GraphDocument`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Source node ID
    pub source_node_id: NodeId,
    /// Output index on the source
    pub source_port_index: usize,
    /// Target node ID
    pub target_node_id: NodeId,
    /// Input index on the target
    pub target_port_index: usize,
}

/// Serializable snapshot of a process graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Graph name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Nodes in insertion order
    pub nodes: Vec<NodeRecord>,
    /// Edges in insertion order
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    /// Snapshot a graph
    pub fn from_graph(graph: &ProcessGraph) -> Self {
        Self {
            name: Some(graph.name.clone()),
            nodes: graph
                .nodes()
                .map(|n| NodeRecord {
                    id: n.id,
                    label: n.label.clone(),
                    input_count: n.input_count(),
                    output_count: n.output_count(),
                    position: Some(n.position),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|e| EdgeRecord {
                    source_node_id: e.source_node,
                    source_port_index: e.source_port,
                    target_node_id: e.target_node,
                    target_port_index: e.target_port,
                })
                .collect(),
        }
    }

    /// Rebuild into `graph`, which supplies name, policy and defaults.
    ///
    /// Nodes and edges already in `graph` are kept.
    pub fn into_graph(self, mut graph: ProcessGraph) -> Result<ProcessGraph, DocumentError> {
        if let Some(name) = self.name {
            graph.name = name;
        }

        for record in self.nodes {
            let counts = PortCounts::new(record.input_count, record.output_count);
            let mut node = ProcessNode::with_id(record.id, record.label, counts);
            if let Some(position) = record.position {
                node.position = position;
            }
            graph.insert_node(node)?;
        }

        for (index, record) in self.edges.into_iter().enumerate() {
            graph
                .connect(
                    record.source_node_id,
                    record.source_port_index,
                    record.target_node_id,
                    record.target_port_index,
                )
                .map_err(|source| DocumentError::InvalidEdge { index, source })?;
        }

        Ok(graph)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse from RON
    pub fn from_ron(ron: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(ron)?)
    }
}

/// Error reading or applying a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON serialization error
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// An edge could not be recreated
    #[error("Edge #{index} rejected: {source}")]
    InvalidEdge {
        /// Position in the edge list
        index: usize,
        /// Why the graph refused it
        source: GraphError,
    },

    /// Target graph refused a node
    #[error("Graph rejected document: {0}")]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ProcessGraph, NodeId, NodeId) {
        let mut graph = ProcessGraph::new("Bottling");
        let mix = graph.add_node_at("Mix", [10.0, 10.0]).unwrap();
        let bottle = graph.add_node("Bottle").unwrap();
        graph.increment_outputs(mix).unwrap();
        graph.increment_outputs(mix).unwrap();
        graph.increment_inputs(bottle).unwrap();
        graph.connect(mix, 1, bottle, 0).unwrap();
        (graph, mix, bottle)
    }

    #[test]
    fn test_json_field_names() {
        let (graph, mix, bottle) = sample();
        let json = GraphDocument::from_graph(&graph).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let node = &value["nodes"][0];
        assert_eq!(node["id"], mix.0.to_string());
        assert_eq!(node["label"], "Mix");
        assert_eq!(node["inputCount"], 0);
        assert_eq!(node["outputCount"], 2);

        let edge = &value["edges"][0];
        assert_eq!(edge["sourceNodeId"], mix.0.to_string());
        assert_eq!(edge["sourcePortIndex"], 1);
        assert_eq!(edge["targetNodeId"], bottle.0.to_string());
        assert_eq!(edge["targetPortIndex"], 0);
    }

    #[test]
    fn test_import_restores_graph() {
        let (graph, mix, bottle) = sample();
        let json = GraphDocument::from_graph(&graph).to_json().unwrap();

        let restored = GraphDocument::from_json(&json)
            .unwrap()
            .into_graph(ProcessGraph::default())
            .unwrap();
        assert_eq!(restored.name, "Bottling");
        assert_eq!(restored.node(mix).unwrap().output_count(), 2);
        assert_eq!(restored.node(mix).unwrap().position, [10.0, 10.0]);
        assert_eq!(restored.edges_for_node(bottle).count(), 1);
        restored.check_consistency().unwrap();
    }

    #[test]
    fn test_import_without_positions() {
        let a = NodeId::new();
        let json = format!(
            r#"{{"nodes":[{{"id":"{}","label":"Cut","inputCount":1,"outputCount":1}}],"edges":[]}}"#,
            a.0
        );
        let graph = GraphDocument::from_json(&json)
            .unwrap()
            .into_graph(ProcessGraph::default())
            .unwrap();
        assert_eq!(graph.node(a).unwrap().position, [0.0, 0.0]);
    }

    #[test]
    fn test_import_rejects_out_of_range_port() {
        let (graph, mix, _) = sample();
        let mut doc = GraphDocument::from_graph(&graph);
        doc.edges[0].source_port_index = 5;

        let err = doc.into_graph(ProcessGraph::default()).unwrap_err();
        match err {
            DocumentError::InvalidEdge { index, source } => {
                assert_eq!(index, 0);
                assert_eq!(source, GraphError::PortOutOfRange(crate::PortRef::output(mix, 5)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_import_rejects_duplicate_node() {
        let (graph, _, _) = sample();
        let mut doc = GraphDocument::from_graph(&graph);
        let first = doc.nodes[0].clone();
        doc.nodes.push(first);
        assert!(matches!(
            doc.into_graph(ProcessGraph::default()),
            Err(DocumentError::Graph(GraphError::DuplicateNode(_)))
        ));
    }

    #[test]
    fn test_ron_form() {
        let (graph, _, _) = sample();
        let doc = GraphDocument::from_graph(&graph);
        let ron = doc.to_ron().unwrap();
        assert!(ron.contains("GraphDocument"));
        assert_eq!(GraphDocument::from_ron(&ron).unwrap(), doc);
    }
}
