// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui canvas for the process editor.
//!
//! Features:
//! - Node rendering with one connection point per port
//! - Edge rendering (bezier curves)
//! - Pan/zoom navigation
//! - Drag-to-connect between ports
//! - +/- controls for input and output counts
//! - Node dragging and deletion
//! - Read-only rendering while the graph is locked
//!
//! The canvas never mutates the graph directly. Gestures are queued as
//! [`CanvasEvent`]s and handed to [`ProcessEditor::handle_event`] at the end
//! of the frame.

use crate::canvas::{port_anchor, CanvasEvent, EdgeView, GraphCanvas};
use crate::connection::EdgeId;
use crate::editor::ProcessEditor;
use crate::layout::NodeView;
use crate::node::NodeId;
use crate::port::{PortDirection, PortRef};
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use std::collections::{HashMap, HashSet};

/// Node visual dimensions
const NODE_HEADER_HEIGHT: f32 = 24.0;
const NODE_FOOTER_HEIGHT: f32 = 20.0;
const PORT_RADIUS: f32 = 6.0;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;
const BUTTON_SIZE: f32 = 14.0;
const BUTTON_GAP: f32 = 4.0;

/// Edge visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const EDGE_THICKNESS: f32 = 2.5;
const EDGE_HIT_DISTANCE: f32 = 6.0;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

const INPUT_COLOR: Color32 = Color32::from_rgb(80, 200, 200);
const OUTPUT_COLOR: Color32 = Color32::from_rgb(200, 150, 80);
const EDGE_COLOR: Color32 = Color32::from_rgb(180, 180, 190);

/// Dragging state for creating edges
#[derive(Debug, Clone)]
pub struct ConnectionDrag {
    /// Port the drag started on
    pub from: PortRef,
    /// Current mouse position (screen space)
    pub current_pos: Pos2,
}

/// Canvas interaction mode
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    /// Default mode - selecting
    #[default]
    Normal,
    /// Panning the view
    Panning,
    /// Dragging selected nodes
    DraggingNodes,
    /// Creating an edge
    CreatingConnection(ConnectionDrag),
}

/// What lies under the pointer, in priority order
#[derive(Debug, Clone, Copy, PartialEq)]
enum Hit {
    Port(PortRef),
    Button {
        node: NodeId,
        direction: PortDirection,
        increase: bool,
    },
    Node(NodeId),
    Edge(EdgeId),
}

/// Canvas UI state
pub struct GraphEditorState {
    /// Current pan offset (graph space)
    pub pan: Vec2,
    /// Current zoom level
    pub zoom: f32,
    /// Selected nodes
    pub selected_nodes: HashSet<NodeId>,
    /// Selected edge
    pub selected_edge: Option<EdgeId>,
    /// Current interaction mode
    pub mode: InteractionMode,
    /// Show grid
    pub show_grid: bool,
    /// Snap to grid
    pub snap_to_grid: bool,
    /// Grid size for snapping
    pub snap_size: f32,
    /// Last mouse position
    last_mouse_pos: Pos2,
    /// Element under the pointer this frame
    hovered: Option<Hit>,
    /// Gestures waiting to be applied
    pending: Vec<CanvasEvent>,
}

impl GraphEditorState {
    /// Create a new canvas state
    pub fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            selected_nodes: HashSet::new(),
            selected_edge: None,
            mode: InteractionMode::Normal,
            show_grid: true,
            snap_to_grid: false,
            snap_size: GRID_SPACING,
            last_mouse_pos: Pos2::ZERO,
            hovered: None,
            pending: Vec::new(),
        }
    }

    /// Convert screen position to graph position
    pub fn screen_to_graph(&self, screen_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (screen_pos.x - center.x) / self.zoom - self.pan.x,
            (screen_pos.y - center.y) / self.zoom - self.pan.y,
        )
    }

    /// Convert graph position to screen position
    pub fn graph_to_screen(&self, graph_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (graph_pos.x + self.pan.x) * self.zoom + center.x,
            (graph_pos.y + self.pan.y) * self.zoom + center.y,
        )
    }

    /// Snap position to grid
    pub fn snap_position(&self, pos: [f32; 2]) -> [f32; 2] {
        if self.snap_to_grid {
            [
                (pos[0] / self.snap_size).round() * self.snap_size,
                (pos[1] / self.snap_size).round() * self.snap_size,
            ]
        } else {
            pos
        }
    }

    /// Clear selection
    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.selected_edge = None;
    }

    /// Select a node (optionally add to selection)
    pub fn select_node(&mut self, node_id: NodeId, add_to_selection: bool) {
        if !add_to_selection {
            self.clear_selection();
        }
        self.selected_nodes.insert(node_id);
    }

    /// Queue deletion of the selected elements
    pub fn delete_selected(&mut self) {
        if let Some(edge) = self.selected_edge.take() {
            self.pending.push(CanvasEvent::DeleteEdge(edge));
        }
        for node_id in self.selected_nodes.drain() {
            self.pending.push(CanvasEvent::DeleteNode(node_id));
        }
    }

    /// Render the canvas and apply this frame's gestures to `editor`
    pub fn ui(&mut self, ui: &mut egui::Ui, editor: &mut ProcessEditor) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let views = editor.views();

        // Forget elements that no longer exist
        let graph = editor.graph();
        self.selected_nodes.retain(|id| graph.node(*id).is_some());
        if self.selected_edge.is_some_and(|id| graph.edge(id).is_none()) {
            self.selected_edge = None;
        }

        if self.show_grid {
            self.draw_grid(&painter, rect);
        }

        self.handle_input(ui, &response, rect, editor, &views);

        {
            let mut canvas = EguiCanvas {
                state: self,
                painter: &painter,
                rect,
                locked: editor.is_locked(),
                node_width: editor.node_width(),
            };
            editor.render(&mut canvas);
        }

        if let InteractionMode::CreatingConnection(ref drag) = self.mode {
            self.draw_connection_drag(&painter, rect, editor, &views, drag);
        }

        self.draw_status_bar(ui, rect, editor);

        let revision = editor.revision();
        for event in self.pending.drain(..) {
            editor.handle_event(event);
        }
        if editor.revision() != revision {
            ui.ctx().request_repaint();
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let spacing = GRID_SPACING * self.zoom;
        let major_spacing = spacing * 5.0;

        let grid_color_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
        let grid_color_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

        let offset_x = (self.pan.x * self.zoom) % major_spacing;
        let offset_y = (self.pan.y * self.zoom) % major_spacing;

        for (step, color) in [(spacing, grid_color_minor), (major_spacing, grid_color_major)] {
            let mut x = rect.left() + offset_x % step;
            while x < rect.right() {
                painter.line_segment(
                    [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                    Stroke::new(1.0, color),
                );
                x += step;
            }

            let mut y = rect.top() + offset_y % step;
            while y < rect.bottom() {
                painter.line_segment(
                    [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                    Stroke::new(1.0, color),
                );
                y += step;
            }
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        editor: &ProcessEditor,
        views: &HashMap<NodeId, NodeView>,
    ) {
        let mouse_pos = ui.input(|i| i.pointer.hover_pos().unwrap_or(self.last_mouse_pos));
        let delta = mouse_pos - self.last_mouse_pos;
        self.last_mouse_pos = mouse_pos;

        let graph_pos = self.screen_to_graph(mouse_pos, rect);
        let locked = editor.is_locked();
        self.hovered = self.hit_test(graph_pos, editor, views);

        // Zoom with scroll wheel
        ui.input(|i| {
            if rect.contains(mouse_pos) {
                let scroll_delta = i.raw_scroll_delta.y;
                if scroll_delta != 0.0 {
                    let zoom_factor = 1.0 + scroll_delta * 0.001;
                    let old_zoom = self.zoom;
                    self.zoom = (self.zoom * zoom_factor).clamp(0.1, 4.0);

                    // Zoom toward mouse position
                    if self.zoom != old_zoom {
                        let zoom_ratio = self.zoom / old_zoom;
                        self.pan.x += graph_pos.x * (1.0 - zoom_ratio);
                        self.pan.y += graph_pos.y * (1.0 - zoom_ratio);
                    }
                }
            }
        });

        match &mut self.mode {
            InteractionMode::Normal => {
                if response.dragged_by(egui::PointerButton::Middle) {
                    self.mode = InteractionMode::Panning;
                }

                if response.clicked() {
                    let shift_held = ui.input(|i| i.modifiers.shift);
                    match self.hovered {
                        Some(Hit::Button { node, direction, increase }) if !locked => {
                            self.pending.push(CanvasEvent::AdjustPorts { node, direction, increase });
                        }
                        Some(Hit::Node(node_id) | Hit::Button { node: node_id, .. }) => {
                            self.select_node(node_id, shift_held);
                        }
                        Some(Hit::Port(port)) => self.select_node(port.node, shift_held),
                        Some(Hit::Edge(edge_id)) => {
                            self.selected_nodes.clear();
                            self.selected_edge = Some(edge_id);
                        }
                        None if !shift_held => self.clear_selection(),
                        None => {}
                    }
                }

                if response.double_clicked() && self.hovered.is_none() && !locked {
                    let position = self.snap_position([graph_pos.x, graph_pos.y]);
                    self.pending.push(CanvasEvent::AddNode { position });
                }

                if response.drag_started_by(egui::PointerButton::Primary) {
                    match self.hovered {
                        Some(Hit::Port(from)) if !locked => {
                            self.mode = InteractionMode::CreatingConnection(ConnectionDrag {
                                from,
                                current_pos: mouse_pos,
                            });
                        }
                        Some(Hit::Node(node_id)) if !locked => {
                            if !self.selected_nodes.contains(&node_id) {
                                self.select_node(node_id, false);
                            }
                            self.mode = InteractionMode::DraggingNodes;
                        }
                        _ => self.mode = InteractionMode::Panning,
                    }
                }
            }

            InteractionMode::Panning => {
                if response.dragged() {
                    self.pan += delta / self.zoom;
                }
                if response.drag_stopped() {
                    self.mode = InteractionMode::Normal;
                }
            }

            InteractionMode::DraggingNodes => {
                if response.dragged() {
                    let graph_delta = delta / self.zoom;
                    for node_id in &self.selected_nodes {
                        if let Some(node) = editor.graph().node(*node_id) {
                            self.pending.push(CanvasEvent::MoveNode {
                                node: *node_id,
                                position: [
                                    node.position[0] + graph_delta.x,
                                    node.position[1] + graph_delta.y,
                                ],
                            });
                        }
                    }
                }
                if response.drag_stopped() {
                    // Snap to grid on release
                    if self.snap_to_grid {
                        for node_id in &self.selected_nodes {
                            if let Some(node) = editor.graph().node(*node_id) {
                                let position = self.snap_position(node.position);
                                self.pending.push(CanvasEvent::MoveNode {
                                    node: *node_id,
                                    position,
                                });
                            }
                        }
                    }
                    self.mode = InteractionMode::Normal;
                }
            }

            InteractionMode::CreatingConnection(drag) => {
                drag.current_pos = mouse_pos;

                if response.drag_stopped() {
                    if let Some(Hit::Port(to)) = self.hovered {
                        if to != drag.from {
                            self.pending.push(CanvasEvent::DragConnect { from: drag.from, to });
                        }
                    }
                    self.mode = InteractionMode::Normal;
                }
            }
        }

        // Delete key
        let delete = ui.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if delete && response.hovered() && !locked {
            self.delete_selected();
        }
    }

    fn hit_test(&self, graph_pos: Pos2, editor: &ProcessEditor, views: &HashMap<NodeId, NodeView>) -> Option<Hit> {
        let width = editor.node_width();
        let port_reach = PORT_RADIUS * 1.5;
        let mut node_hit = None;

        // Later nodes draw on top, so the last match wins
        for node in editor.graph().nodes() {
            let Some(view) = views.get(&node.id) else {
                continue;
            };

            for direction in [PortDirection::Input, PortDirection::Output] {
                for port_view in view.ports(direction) {
                    if let Some([x, y]) = port_anchor(view, node.position, width, &port_view.port) {
                        if Pos2::new(x, y).distance(graph_pos) <= port_reach {
                            return Some(Hit::Port(port_view.port));
                        }
                    }
                }
            }

            if !editor.is_locked() {
                for (button, direction, increase) in port_buttons(view, node.position, width) {
                    if button.contains(graph_pos) {
                        return Some(Hit::Button {
                            node: node.id,
                            direction,
                            increase,
                        });
                    }
                }
            }

            if node_rect(view, node.position, width).contains(graph_pos) {
                node_hit = Some(Hit::Node(node.id));
            }
        }

        if node_hit.is_some() {
            return node_hit;
        }

        let reach = EDGE_HIT_DISTANCE / self.zoom;
        editor
            .edge_views(views)
            .into_iter()
            .find(|edge| {
                let points = bezier_points(
                    Pos2::new(edge.from[0], edge.from[1]),
                    Pos2::new(edge.to[0], edge.to[1]),
                    BEZIER_CURVATURE,
                    16,
                );
                points
                    .windows(2)
                    .any(|w| distance_to_segment(graph_pos, w[0], w[1]) <= reach)
            })
            .map(|edge| Hit::Edge(edge.edge))
    }

    fn draw_connection_drag(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        editor: &ProcessEditor,
        views: &HashMap<NodeId, NodeView>,
        drag: &ConnectionDrag,
    ) {
        let Some(node) = editor.graph().node(drag.from.node) else {
            return;
        };
        let Some(view) = views.get(&node.id) else {
            return;
        };
        let Some([x, y]) = port_anchor(view, node.position, editor.node_width(), &drag.from) else {
            return;
        };

        let anchor = self.graph_to_screen(Pos2::new(x, y), rect);
        let color = port_color(drag.from.direction);
        if drag.from.direction == PortDirection::Output {
            self.draw_bezier(painter, anchor, drag.current_pos, color);
        } else {
            self.draw_bezier(painter, drag.current_pos, anchor, color);
        }
    }

    fn draw_bezier(&self, painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32) {
        let points = bezier_points(from, to, BEZIER_CURVATURE * self.zoom, 32);
        for w in points.windows(2) {
            painter.line_segment([w[0], w[1]], Stroke::new(EDGE_THICKNESS * self.zoom, color));
        }
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui, rect: Rect, editor: &ProcessEditor) {
        let graph = editor.graph();
        let mode = if editor.is_locked() { "Locked" } else { "Editing" };

        ui.painter().text(
            Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0),
            egui::Align2::LEFT_CENTER,
            format!(
                "Steps: {} | Edges: {} | Zoom: {:.0}% | Selected: {} | {}",
                graph.node_count(),
                graph.edge_count(),
                self.zoom * 100.0,
                self.selected_nodes.len(),
                mode,
            ),
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );
    }
}

impl Default for GraphEditorState {
    fn default() -> Self {
        Self::new()
    }
}

/// egui implementation of the rendering capability
struct EguiCanvas<'a> {
    state: &'a GraphEditorState,
    painter: &'a egui::Painter,
    rect: Rect,
    locked: bool,
    node_width: f32,
}

impl EguiCanvas<'_> {
    fn to_screen(&self, pos: [f32; 2]) -> Pos2 {
        self.state.graph_to_screen(Pos2::new(pos[0], pos[1]), self.rect)
    }

    fn to_screen_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(
            self.to_screen([rect.min.x, rect.min.y]),
            self.to_screen([rect.max.x, rect.max.y]),
        )
    }

    fn draw_port(&self, port: &PortRef, pos: Pos2) {
        let zoom = self.state.zoom;
        let radius = PORT_RADIUS * zoom;
        let color = port_color(port.direction);

        if self.state.hovered == Some(Hit::Port(*port)) && !self.locked {
            self.painter.circle_filled(pos, radius * 1.3, color);
        } else {
            self.painter.circle_filled(pos, radius, color);
        }
        self.painter.circle_stroke(pos, radius, Stroke::new(1.0, Color32::from_gray(30)));
    }

    fn draw_button(&self, button: Rect, increase: bool, hovered: bool) {
        let screen = self.to_screen_rect(button);
        let fill = if hovered {
            Color32::from_rgb(90, 110, 140)
        } else {
            Color32::from_rgb(60, 60, 66)
        };
        self.painter.rect_filled(screen, 2.0 * self.state.zoom, fill);
        self.painter.text(
            screen.center(),
            egui::Align2::CENTER_CENTER,
            if increase { "+" } else { "-" },
            egui::FontId::monospace(11.0 * self.state.zoom),
            Color32::WHITE,
        );
    }
}

impl GraphCanvas for EguiCanvas<'_> {
    fn begin_frame(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn draw_node(&mut self, view: &NodeView, position: [f32; 2]) {
        let zoom = self.state.zoom;
        let screen_rect = self.to_screen_rect(node_rect(view, position, self.node_width));

        if !screen_rect.intersects(self.rect) {
            return;
        }

        let is_selected = self.state.selected_nodes.contains(&view.node);

        // Shadow
        let shadow_rect = screen_rect.translate(Vec2::new(NODE_SHADOW_OFFSET, NODE_SHADOW_OFFSET));
        self.painter.rect_filled(
            shadow_rect,
            NODE_ROUNDING * zoom,
            Color32::from_rgba_unmultiplied(0, 0, 0, 60),
        );

        // Background
        let bg_color = if is_selected {
            Color32::from_rgb(60, 70, 90)
        } else {
            Color32::from_rgb(45, 45, 48)
        };
        self.painter.rect_filled(screen_rect, NODE_ROUNDING * zoom, bg_color);

        // Header with the step label
        let header_rect = Rect::from_min_size(
            screen_rect.min,
            Vec2::new(screen_rect.width(), NODE_HEADER_HEIGHT * zoom),
        );
        let header_color = if self.locked {
            Color32::from_rgb(90, 90, 96)
        } else {
            Color32::from_rgb(70, 100, 130)
        };
        self.painter.rect_filled(
            header_rect,
            egui::Rounding {
                nw: NODE_ROUNDING * zoom,
                ne: NODE_ROUNDING * zoom,
                sw: 0.0,
                se: 0.0,
            },
            header_color,
        );
        self.painter.text(
            header_rect.center(),
            egui::Align2::CENTER_CENTER,
            &view.label,
            egui::FontId::proportional(12.0 * zoom),
            Color32::WHITE,
        );

        if is_selected {
            self.painter.rect_stroke(
                screen_rect,
                NODE_ROUNDING * zoom,
                Stroke::new(2.0, Color32::from_rgb(100, 150, 255)),
            );
        }

        // One connection point per port
        for direction in [PortDirection::Input, PortDirection::Output] {
            for port_view in view.ports(direction) {
                if let Some(anchor) = port_anchor(view, position, self.node_width, &port_view.port) {
                    self.draw_port(&port_view.port, self.to_screen(anchor));
                }
            }
        }

        if self.locked {
            return;
        }

        // Port count controls
        for (button, direction, increase) in port_buttons(view, position, self.node_width) {
            let hovered = self.state.hovered
                == Some(Hit::Button {
                    node: view.node,
                    direction,
                    increase,
                });
            self.draw_button(button, increase, hovered);
        }

        let counts = format!("{} in / {} out", view.inputs.len(), view.outputs.len());
        let footer_center = self.to_screen([
            position[0] + self.node_width / 2.0,
            position[1] + view.height + NODE_FOOTER_HEIGHT / 2.0,
        ]);
        self.painter.text(
            footer_center,
            egui::Align2::CENTER_CENTER,
            counts,
            egui::FontId::proportional(10.0 * zoom),
            Color32::from_gray(170),
        );
    }

    fn draw_edge(&mut self, edge: &EdgeView) {
        let from = self.to_screen(edge.from);
        let to = self.to_screen(edge.to);

        let color = if self.state.selected_edge == Some(edge.edge) {
            Color32::WHITE
        } else if self.state.hovered == Some(Hit::Edge(edge.edge)) {
            Color32::from_rgb(220, 220, 235)
        } else {
            EDGE_COLOR
        };
        self.state.draw_bezier(self.painter, from, to, color);
    }
}

fn port_color(direction: PortDirection) -> Color32 {
    match direction {
        PortDirection::Input => INPUT_COLOR,
        PortDirection::Output => OUTPUT_COLOR,
    }
}

/// Node bounds in graph space; the header sits above `position`
fn node_rect(view: &NodeView, position: [f32; 2], width: f32) -> Rect {
    Rect::from_min_max(
        Pos2::new(position[0], position[1] - NODE_HEADER_HEIGHT),
        Pos2::new(position[0] + width, position[1] + view.height + NODE_FOOTER_HEIGHT),
    )
}

/// The four +/- controls in the node footer, in graph space
fn port_buttons(view: &NodeView, position: [f32; 2], width: f32) -> [(Rect, PortDirection, bool); 4] {
    let top = position[1] + view.height + (NODE_FOOTER_HEIGHT - BUTTON_SIZE) / 2.0;
    let size = Vec2::splat(BUTTON_SIZE);
    let at = |x: f32| Rect::from_min_size(Pos2::new(x, top), size);

    let left = position[0] + BUTTON_GAP;
    let right = position[0] + width - BUTTON_GAP - BUTTON_SIZE;
    [
        (at(left), PortDirection::Input, false),
        (at(left + BUTTON_SIZE + BUTTON_GAP), PortDirection::Input, true),
        (at(right - BUTTON_SIZE - BUTTON_GAP), PortDirection::Output, false),
        (at(right), PortDirection::Output, true),
    ]
}

/// Points along a horizontal-tangent cubic bezier from `from` to `to`
fn bezier_points(from: Pos2, to: Pos2, curvature: f32, segments: usize) -> Vec<Pos2> {
    let distance = (to.x - from.x).abs();
    let curvature = curvature.min(distance * 0.5).max(curvature * 0.5);
    let p1 = Pos2::new(from.x + curvature, from.y);
    let p2 = Pos2::new(to.x - curvature, to.y);

    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * from.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * to.x;
        let y = mt3 * from.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * to.y;

        points.push(Pos2::new(x, y));
    }
    points
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
