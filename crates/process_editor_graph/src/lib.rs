// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process flow graph for the production process editor.
//!
//! A process is a directed graph of steps. Each step exposes a user-adjustable
//! number of input and output ports, and edges wire one step's output port to
//! another step's input port.
//!
//! ## Architecture
//!
//! - [`ProcessGraph`] is the single owner of nodes and edges. Every structural
//!   mutation goes through it, so edges never reference a port that no longer
//!   exists.
//! - [`ProcessEditor`] wraps a graph for an editing session and translates
//!   canvas gestures into graph operations.
//! - [`GraphCanvas`] is the rendering capability. [`ui::GraphEditorState`]
//!   implements it on top of egui.
//! - [`GraphDocument`] is the flat node/edge list used for import and export.

pub mod node;
pub mod port;
pub mod connection;
pub mod graph;
pub mod layout;
pub mod canvas;
pub mod editor;
pub mod document;
pub mod ui;

pub use node::{NodeId, ProcessNode};
pub use port::{PortCounts, PortDirection, PortRef};
pub use connection::{EdgeId, ProcessEdge};
pub use graph::{ConnectionPolicy, CycleError, EditMode, GraphError, ProcessGraph};
pub use layout::{NodeView, PortLayout, PortView};
pub use canvas::{CanvasEvent, EdgeView, GraphCanvas};
pub use editor::{ActionOutcome, EditorAction, ProcessEditor};
pub use document::{DocumentError, GraphDocument};
