// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render model for process nodes.
//!
//! A [`NodeView`] is a pure function of a node's label and port counts. It is
//! rebuilt on every change and carries one [`PortView`] per port, each at a
//! fixed vertical offset so existing endpoints stay put as counts grow.

use crate::node::{NodeId, ProcessNode};
use crate::port::{PortDirection, PortRef};
use serde::{Deserialize, Serialize};

/// Vertical placement of connection points on a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortLayout {
    /// Offset of the first port from the top of the node
    pub base: f32,
    /// Distance between consecutive ports
    pub spacing: f32,
}

impl PortLayout {
    /// Create a layout
    pub fn new(base: f32, spacing: f32) -> Self {
        Self { base, spacing }
    }

    /// Vertical offset of the port at `index`
    pub fn offset(&self, index: usize) -> f32 {
        self.base + index as f32 * self.spacing
    }

    /// Node body height needed to fit `port_count` ports on one side
    pub fn body_height(&self, port_count: usize) -> f32 {
        self.offset(port_count.max(1))
    }
}

impl Default for PortLayout {
    fn default() -> Self {
        Self::new(20.0, 20.0)
    }
}

/// A single rendered connection point
#[derive(Debug, Clone, PartialEq)]
pub struct PortView {
    /// Port address
    pub port: PortRef,
    /// Stable identifier, `<node>#input_<i>`
    pub id: String,
    /// Vertical offset from the top of the node
    pub offset: f32,
}

/// Everything a canvas needs to draw one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    /// Node being drawn
    pub node: NodeId,
    /// Display name
    pub label: String,
    /// Input connection points, in index order
    pub inputs: Vec<PortView>,
    /// Output connection points, in index order
    pub outputs: Vec<PortView>,
    /// Body height fitting the longer port column
    pub height: f32,
}

impl NodeView {
    /// Build the view of `node`
    pub fn build(node: &ProcessNode, layout: &PortLayout) -> Self {
        let ports = |direction: PortDirection| {
            node.ports(direction)
                .map(|port| PortView {
                    port,
                    id: port.to_string(),
                    offset: layout.offset(port.index),
                })
                .collect::<Vec<_>>()
        };

        Self {
            node: node.id,
            label: node.label.clone(),
            inputs: ports(PortDirection::Input),
            outputs: ports(PortDirection::Output),
            height: layout.body_height(node.input_count().max(node.output_count())),
        }
    }

    /// Connection points on one side
    pub fn ports(&self, direction: PortDirection) -> &[PortView] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Offset of a specific port, if it is part of this view
    pub fn port_offset(&self, port: &PortRef) -> Option<f32> {
        if port.node != self.node {
            return None;
        }
        self.ports(port.direction).get(port.index).map(|p| p.offset)
    }
}
