// SPDX-License-Identifier: MIT OR Apache-2.0
//! Side panels around the process canvas.

use process_editor_graph::ui::GraphEditorState;
use process_editor_graph::{EditorAction, NodeId, PortDirection, ProcessEditor};

/// Toolbar request that needs the application (file access)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    /// Write the process document
    Export,
    /// Replace the process with the document on disk
    Import,
    /// Start over with an empty process
    Clear,
}

/// Top toolbar: add step, lock toggle, document commands
pub fn toolbar(ui: &mut egui::Ui, editor: &mut ProcessEditor, canvas: &GraphEditorState) -> Option<ToolbarCommand> {
    let mut command = None;
    let locked = editor.is_locked();

    ui.horizontal(|ui| {
        ui.strong(&editor.graph().name);
        ui.separator();

        if ui.add_enabled(!locked, egui::Button::new("Add Step")).clicked() {
            // Drop new steps near the middle of the current view
            let position = [-canvas.pan.x, -canvas.pan.y];
            editor.apply(EditorAction::AddNode {
                label: process_editor_graph::editor::NEW_NODE_LABEL.to_string(),
                position,
            });
        }

        let lock_label = if locked { "Unlock" } else { "Lock" };
        if ui.button(lock_label).clicked() {
            editor.apply(if locked { EditorAction::Unlock } else { EditorAction::Lock });
        }

        ui.separator();

        if ui.button("Export").clicked() {
            command = Some(ToolbarCommand::Export);
        }
        if ui.add_enabled(!locked, egui::Button::new("Import")).clicked() {
            command = Some(ToolbarCommand::Import);
        }
        if ui.add_enabled(!locked, egui::Button::new("Clear")).clicked() {
            command = Some(ToolbarCommand::Clear);
        }
    });

    command
}

/// Inspector for the selected step
#[derive(Default)]
pub struct InspectorPanel {
    /// Node whose label is being edited
    editing: Option<NodeId>,
    /// Label text buffer
    label_buffer: String,
}

impl InspectorPanel {
    /// Create a new inspector
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the inspector
    pub fn ui(&mut self, ui: &mut egui::Ui, editor: &mut ProcessEditor, canvas: &GraphEditorState) {
        ui.heading("Step");
        ui.separator();

        let selected = if canvas.selected_nodes.len() == 1 {
            canvas.selected_nodes.iter().next().copied()
        } else {
            None
        };

        let Some(node) = selected.and_then(|id| editor.graph().node(id)).cloned() else {
            self.editing = None;
            ui.label("Select a single step to edit it.");
            ui.add_space(12.0);
            self.process_summary(ui, editor);
            return;
        };

        if self.editing != Some(node.id) {
            self.editing = Some(node.id);
            self.label_buffer = node.label.clone();
        }

        let locked = editor.is_locked();
        ui.horizontal(|ui| {
            ui.label("Label");
            let response = ui.add_enabled(!locked, egui::TextEdit::singleline(&mut self.label_buffer));
            if response.lost_focus() && self.label_buffer != node.label {
                editor.apply(EditorAction::RenameNode(node.id, self.label_buffer.clone()));
            }
        });

        for (direction, count) in [
            (PortDirection::Input, node.input_count()),
            (PortDirection::Output, node.output_count()),
        ] {
            ui.horizontal(|ui| {
                ui.label(format!("{}s: {}", capitalize(direction.as_str()), count));
                if ui.add_enabled(!locked && count > 0, egui::Button::new("-")).clicked() {
                    editor.apply(match direction {
                        PortDirection::Input => EditorAction::DecrementInputs(node.id),
                        PortDirection::Output => EditorAction::DecrementOutputs(node.id),
                    });
                }
                if ui.add_enabled(!locked, egui::Button::new("+")).clicked() {
                    editor.apply(match direction {
                        PortDirection::Input => EditorAction::IncrementInputs(node.id),
                        PortDirection::Output => EditorAction::IncrementOutputs(node.id),
                    });
                }
            });
        }

        ui.label(format!("Edges: {}", editor.graph().edges_for_node(node.id).count()));

        ui.add_space(8.0);
        if ui.add_enabled(!locked, egui::Button::new("Remove Step")).clicked() {
            editor.apply(EditorAction::RemoveNode(node.id));
            self.editing = None;
        }

        ui.add_space(12.0);
        self.process_summary(ui, editor);
    }

    fn process_summary(&self, ui: &mut egui::Ui, editor: &ProcessEditor) {
        let graph = editor.graph();
        ui.heading("Process");
        ui.separator();
        ui.label(format!("Steps: {}", graph.node_count()));
        ui.label(format!("Edges: {}", graph.edge_count()));
        ui.label(format!("Unconnected ports: {}", graph.unconnected_ports().len()));

        match graph.process_order() {
            Ok(order) => {
                ui.label("Order:");
                for (step, id) in order.iter().enumerate() {
                    if let Some(node) = graph.node(*id) {
                        ui.label(format!("{}. {}", step + 1, node.label));
                    }
                }
            }
            Err(e) => {
                ui.colored_label(egui::Color32::from_rgb(220, 120, 80), e.to_string());
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
