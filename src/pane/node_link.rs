use std::collections::HashMap;

use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, Ui, pos2, vec2,
};

use crate::config::ExplorerConfig;
use crate::dataset::GraphData;
use crate::layout::{BuildDiagnostic, FrameScheduler, QuadtreeCell, Simulation};
use crate::selection::{ElementKind, SelectionHandle};
use crate::util::node_label;
use crate::viewport::{
    ContentBounds, GestureEvent, GestureKind, GestureOutcome, SurfaceSize, TargetRole,
    ViewportCommand, ViewportController, background_drags_only, take_viewport_commands,
};

use super::highlight::{ElementStyle, Emphasis, Palette, fill_draw_order};
use super::input::{DragPhase, PointerFrame, PointerHit, nearest_circle, nearest_segment, route_click};
use super::render::{
    blend_color, circle_visible, draw_background, edge_visible, normalize, to_screen,
};
use super::SelectionLink;

const EDGE_HIT_TOLERANCE: f32 = 4.0;
const MIN_SCREEN_RADIUS: f32 = 2.0;
const VALUE_ACCENT: Color32 = Color32::from_rgb(214, 96, 77);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragTarget {
    Node(u32),
    Viewport,
}

struct NodeAttributes {
    label: String,
    value: Option<f64>,
}

#[derive(Default)]
struct ViewScratch {
    node_order: Vec<usize>,
    edge_order: Vec<usize>,
    order_revision: Option<u64>,
    quadtree_cells: Vec<QuadtreeCell>,
}

/// Force-directed node-link diagram over one dataset's graph.
pub struct NodeLinkPane {
    link: SelectionLink,
    generation: u64,
    graph: Option<GraphData>,
    attributes: HashMap<u32, NodeAttributes>,
    value_range: Option<(f64, f64)>,
    config: ExplorerConfig,
    simulation: Option<Simulation>,
    diagnostics: Vec<BuildDiagnostic>,
    viewport: ViewportController,
    dragging: Option<DragTarget>,
    hovered: PointerHit,
    show_quadtree: bool,
    scratch: ViewScratch,
}

impl NodeLinkPane {
    pub fn new(
        selection: SelectionHandle,
        graph: Option<GraphData>,
        config: &ExplorerConfig,
        generation: u64,
        repaint: egui::Context,
    ) -> Self {
        let mut viewport = ViewportController::new(config.node_link_viewport);
        viewport.set_filter(background_drags_only);

        let mut attributes = HashMap::new();
        let mut value_range: Option<(f64, f64)> = None;
        for node in graph.iter().flat_map(|graph| &graph.nodes) {
            if let Some(value) = node.value.filter(|value| value.is_finite()) {
                value_range = Some(match value_range {
                    Some((min, max)) => (min.min(value), max.max(value)),
                    None => (value, value),
                });
            }
            attributes.entry(node.node_idx).or_insert_with(|| NodeAttributes {
                label: node_label(node.label.as_deref(), node.node_idx),
                value: node.value,
            });
        }

        Self {
            link: SelectionLink::attach(selection, repaint),
            generation,
            graph,
            attributes,
            value_range,
            config: config.clone(),
            simulation: None,
            diagnostics: Vec::new(),
            viewport,
            dragging: None,
            hovered: PointerHit::Background,
            show_quadtree: false,
            scratch: ViewScratch::default(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.graph.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn zoom_percent(&self) -> u32 {
        self.viewport.zoom_percent()
    }

    pub fn show_quadtree(&self) -> bool {
        self.show_quadtree
    }

    pub fn set_show_quadtree(&mut self, show: bool) {
        self.show_quadtree = show;
    }

    pub fn label(&self, node_idx: u32) -> Option<&str> {
        self.attributes
            .get(&node_idx)
            .map(|attributes| attributes.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.attributes
            .iter()
            .map(|(node_idx, attributes)| (*node_idx, attributes.label.as_str()))
    }

    pub fn content_bounds(&self) -> Option<ContentBounds> {
        self.simulation.as_ref().and_then(Simulation::content_bounds)
    }

    pub fn apply_command(&mut self, command: ViewportCommand) {
        let bounds = self.content_bounds();
        self.viewport
            .apply_command(command, bounds, self.config.fit_padding);
    }

    /// Surface-local position of a node under the current transform.
    pub fn surface_position(&self, node_idx: u32) -> Option<Pos2> {
        let node = self.simulation.as_ref()?.node(node_idx)?;
        Some(self.viewport.transform().apply(node.position()))
    }

    /// The first usable size builds the simulation; later sizes re-center it.
    pub fn set_surface(&mut self, surface: SurfaceSize) {
        if surface.is_degenerate() || surface == self.viewport.surface() {
            return;
        }
        self.viewport.set_surface(surface);

        if let Some(simulation) = &mut self.simulation {
            simulation.resize(surface);
            return;
        }
        let Some(graph) = &self.graph else {
            return;
        };

        let build = Simulation::build(
            &graph.nodes,
            &graph.edges,
            surface,
            &self.config.layout,
            self.generation,
        );
        self.diagnostics = build.diagnostics;
        self.simulation = Some(build.simulation);
    }

    /// Steps the viewport transition and the simulation. Returns whether the
    /// viewport is still animating.
    pub fn advance(&mut self, now: f64, scheduler: &impl FrameScheduler) -> bool {
        let animating = self.viewport.advance(now);
        if let Some(simulation) = &mut self.simulation {
            if simulation.generation() == self.generation {
                simulation.advance(scheduler);
            } else {
                log::warn!(
                    "refusing to drive simulation generation {} from pane generation {}",
                    simulation.generation(),
                    self.generation
                );
            }
        }
        animating
    }

    pub fn hit_test(&self, pointer: Pos2) -> PointerHit {
        let Some(simulation) = &self.simulation else {
            return PointerHit::Background;
        };
        let transform = self.viewport.transform();
        let node_radius = self.config.layout.node_radius;
        let store = self.link.handle().read();

        let nodes = simulation.nodes();
        let hit_node = nearest_circle(
            pointer,
            nodes.iter().enumerate().map(|(index, node)| {
                let style = ElementStyle::new(
                    Emphasis::of(&store, ElementKind::Node, node.node_idx),
                    &Palette::NODE,
                );
                (
                    index,
                    transform.apply(node.position()),
                    screen_radius(node_radius, transform.scale, style),
                )
            }),
        );
        if let Some(index) = hit_node {
            return PointerHit::Element(ElementKind::Node, nodes[index].node_idx);
        }

        let edges = simulation.edges();
        let hit_edge = nearest_segment(
            pointer,
            EDGE_HIT_TOLERANCE,
            edges.iter().enumerate().map(|(index, edge)| {
                (
                    index,
                    transform.apply(nodes[edge.source].position()),
                    transform.apply(nodes[edge.target].position()),
                )
            }),
        );
        match hit_edge {
            Some(index) => PointerHit::Element(ElementKind::Edge, edges[index].edge_idx),
            None => PointerHit::Background,
        }
    }

    pub fn route_pointer(&mut self, frame: &PointerFrame) {
        if self.simulation.is_none() {
            return;
        }

        match frame.drag {
            Some(DragPhase::Started) => {
                if let Some(origin) = frame.press_origin.or(frame.pointer) {
                    self.begin_drag(origin);
                }
                if let Some(pointer) = frame.pointer {
                    self.continue_drag(pointer);
                }
            }
            Some(DragPhase::Moved) => {
                if let Some(pointer) = frame.pointer {
                    self.continue_drag(pointer);
                }
            }
            Some(DragPhase::Stopped) => self.end_drag(frame.pointer),
            None => {}
        }

        self.hovered = match (self.dragging, frame.hover) {
            (Some(DragTarget::Node(node_idx)), _) => PointerHit::Element(ElementKind::Node, node_idx),
            (_, Some(pointer)) => self.hit_test(pointer),
            (_, None) => PointerHit::Background,
        };
        self.link.set_hover(self.hovered.element());

        if let Some(pointer) = frame.hover {
            if frame.wheel.abs() > f32::EPSILON {
                let event = GestureEvent::new(
                    GestureKind::Wheel {
                        delta_y: frame.wheel,
                    },
                    pointer,
                    self.hovered.role(),
                );
                self.viewport.handle_gesture(&event);
            }

            if frame.double_clicked && self.hovered == PointerHit::Background {
                let event =
                    GestureEvent::new(GestureKind::DoubleClick, pointer, TargetRole::Background);
                self.viewport.handle_gesture(&event);
            }
        }

        if frame.clicked {
            let hit = frame
                .pointer
                .or(frame.hover)
                .map_or(PointerHit::Background, |pointer| self.hit_test(pointer));
            route_click(self.link.handle(), hit);
        }
    }

    fn begin_drag(&mut self, origin: Pos2) {
        let hit = self.hit_test(origin);
        let event = GestureEvent::new(GestureKind::DragStart, origin, hit.role());
        if self.viewport.handle_gesture(&event) == GestureOutcome::Consumed {
            self.dragging = Some(DragTarget::Viewport);
            return;
        }

        if let (PointerHit::Element(ElementKind::Node, node_idx), Some(simulation)) =
            (hit, &mut self.simulation)
            && simulation.drag_start(node_idx)
        {
            self.dragging = Some(DragTarget::Node(node_idx));
        }
    }

    fn continue_drag(&mut self, pointer: Pos2) {
        match self.dragging {
            Some(DragTarget::Node(node_idx)) => {
                let content = self.viewport.transform().invert(pointer);
                if let Some(simulation) = &mut self.simulation {
                    simulation.drag_move(node_idx, content);
                }
            }
            Some(DragTarget::Viewport) => {
                let event = GestureEvent::new(GestureKind::DragMove, pointer, TargetRole::Background);
                self.viewport.handle_gesture(&event);
            }
            None => {}
        }
    }

    fn end_drag(&mut self, pointer: Option<Pos2>) {
        match self.dragging.take() {
            Some(DragTarget::Node(node_idx)) => {
                if let Some(simulation) = &mut self.simulation {
                    simulation.drag_end(node_idx);
                }
            }
            Some(DragTarget::Viewport) => {
                let pointer = pointer.unwrap_or_default();
                let event = GestureEvent::new(GestureKind::DragEnd, pointer, TargetRole::Background);
                self.viewport.handle_gesture(&event);
            }
            None => {}
        }
    }

    pub fn show(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.set_surface(SurfaceSize::from_rect(rect));

        if response.clicked() || response.drag_started() {
            response.request_focus();
        }
        if response.has_focus() {
            let commands = ui.ctx().input_mut(take_viewport_commands);
            for command in commands {
                self.apply_command(command);
            }
        }

        let frame = PointerFrame::from_response(&response, rect);
        self.route_pointer(&frame);

        let now = ui.input(|input| input.time);
        if self.advance(now, ui.ctx()) || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        match (self.dragging, self.hovered) {
            (Some(_), _) => ui.ctx().set_cursor_icon(CursorIcon::Grabbing),
            (None, PointerHit::Element(..)) => ui.ctx().set_cursor_icon(CursorIcon::PointingHand),
            (None, PointerHit::Background) => {}
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.viewport.transform());

        let empty_message = match (&self.graph, &self.simulation) {
            (None, _) => Some("No node-link data for this dataset."),
            (Some(_), Some(simulation)) if simulation.nodes().is_empty() => {
                Some("This dataset has no nodes.")
            }
            _ => None,
        };
        if let Some(message) = empty_message {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(14.0),
                Color32::from_gray(170),
            );
            return;
        }

        if self.show_quadtree {
            self.draw_quadtree(&painter, rect);
        }
        self.draw_graph(&painter, rect);
    }

    fn draw_quadtree(&mut self, painter: &egui::Painter, rect: Rect) {
        let Some(simulation) = &self.simulation else {
            return;
        };
        let transform = self.viewport.transform();
        simulation.quadtree_cells(&mut self.scratch.quadtree_cells);

        for cell in &self.scratch.quadtree_cells {
            let min = to_screen(
                rect,
                transform,
                pos2(cell.center.x - cell.half_extent, cell.center.y - cell.half_extent),
            );
            let max = to_screen(
                rect,
                transform,
                pos2(cell.center.x + cell.half_extent, cell.center.y + cell.half_extent),
            );
            let alpha = if cell.is_leaf { 110 } else { 55 };
            let width = (1.4 - cell.depth as f32 * 0.09).clamp(0.45, 1.4);
            painter.rect_stroke(
                Rect::from_min_max(min, max),
                0.0,
                Stroke::new(width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                egui::StrokeKind::Middle,
            );
        }
    }

    fn draw_graph(&mut self, painter: &egui::Painter, rect: Rect) {
        let Some(simulation) = &self.simulation else {
            return;
        };
        let transform = self.viewport.transform();
        let node_radius = self.config.layout.node_radius;
        let store = self.link.handle().read();
        let nodes = simulation.nodes();
        let edges = simulation.edges();

        let revision = self.link.last_revision();
        let scratch = &mut self.scratch;
        if scratch.order_revision != Some(revision)
            || scratch.node_order.len() != nodes.len()
            || scratch.edge_order.len() != edges.len()
        {
            fill_draw_order(&mut scratch.node_order, nodes.len(), |index| {
                Emphasis::of(&store, ElementKind::Node, nodes[index].node_idx)
            });
            fill_draw_order(&mut scratch.edge_order, edges.len(), |index| {
                Emphasis::of(&store, ElementKind::Edge, edges[index].edge_idx)
            });
            scratch.order_revision = Some(revision);
        }

        let edge_width = (1.2 * transform.scale.sqrt()).clamp(0.6, 3.0);
        for &index in &scratch.edge_order {
            let edge = edges[index];
            let start = to_screen(rect, transform, nodes[edge.source].position());
            let end = to_screen(rect, transform, nodes[edge.target].position());
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let style = ElementStyle::new(
                Emphasis::of(&store, ElementKind::Edge, edge.edge_idx),
                &Palette::EDGE,
            );
            painter.line_segment([start, end], Stroke::new(edge_width * style.size_scale, style.color));
        }

        let mut hover_caption = None;
        for &index in &scratch.node_order {
            let node = &nodes[index];
            let emphasis = Emphasis::of(&store, ElementKind::Node, node.node_idx);
            let style = ElementStyle::new(emphasis, &Palette::NODE);
            let position = to_screen(rect, transform, node.position());
            let radius = screen_radius(node_radius, transform.scale, style);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let attributes = self.attributes.get(&node.node_idx);
            let color = match emphasis {
                Emphasis::Base => base_color(attributes, self.value_range),
                _ => style.color,
            };
            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if style.raised {
                painter.circle_stroke(
                    position,
                    radius + 3.0,
                    Stroke::new(1.4, style.color.gamma_multiply(0.6)),
                );
                if let Some(attributes) = attributes {
                    painter.text(
                        position + vec2(radius + 5.0, 0.0),
                        Align2::LEFT_CENTER,
                        &attributes.label,
                        FontId::proportional(12.0),
                        Color32::from_gray(238),
                    );
                }
            }

            if self.hovered == PointerHit::Element(ElementKind::Node, node.node_idx) {
                hover_caption = attributes.map(|attributes| {
                    match attributes.value {
                        Some(value) => format!("{}  |  value {value:.3}", attributes.label),
                        None => attributes.label.clone(),
                    }
                });
            }
        }

        if let Some(caption) = hover_caption {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                caption,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

fn screen_radius(node_radius: f32, scale: f32, style: ElementStyle) -> f32 {
    (node_radius * scale * style.size_scale).max(MIN_SCREEN_RADIUS)
}

fn base_color(attributes: Option<&NodeAttributes>, value_range: Option<(f64, f64)>) -> Color32 {
    match (attributes.and_then(|attributes| attributes.value), value_range) {
        (Some(value), Some((min, max))) => {
            blend_color(Palette::NODE.base, VALUE_ACCENT, normalize(value, min, max))
        }
        _ => Palette::NODE.base,
    }
}

impl Drop for NodeLinkPane {
    fn drop(&mut self) {
        if let Some(simulation) = &mut self.simulation {
            simulation.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{EdgeRecord, NodeRecord};
    use crate::layout::LayoutConfig;

    use super::*;

    fn graph() -> GraphData {
        GraphData {
            nodes: (0..4)
                .map(|node_idx| NodeRecord {
                    node_idx,
                    label: Some(format!("n{node_idx}")),
                    value: Some(node_idx as f64),
                })
                .collect(),
            edges: vec![
                EdgeRecord {
                    edge_idx: 0,
                    source: 0,
                    target: 1,
                },
                EdgeRecord {
                    edge_idx: 1,
                    source: 1,
                    target: 2,
                },
            ],
        }
    }

    fn pane(selection: &SelectionHandle, graph: Option<GraphData>) -> NodeLinkPane {
        let config = ExplorerConfig {
            layout: LayoutConfig {
                seed: Some(3),
                ..LayoutConfig::default()
            },
            ..ExplorerConfig::default()
        };
        let mut pane = NodeLinkPane::new(selection.clone(), graph, &config, 1, egui::Context::default());
        pane.set_surface(SurfaceSize::new(400.0, 300.0));
        pane
    }

    fn at(pointer: Pos2) -> PointerFrame {
        PointerFrame {
            hover: Some(pointer),
            pointer: Some(pointer),
            ..PointerFrame::default()
        }
    }

    const FAR_AWAY: Pos2 = pos2(-900.0, -900.0);

    #[test]
    fn first_surface_builds_the_simulation() {
        let selection = SelectionHandle::new();
        let pane = pane(&selection, Some(graph()));
        let simulation = pane.simulation().unwrap();
        assert_eq!(simulation.nodes().len(), 4);
        assert_eq!(simulation.generation(), 1);
        assert!(pane.diagnostics().is_empty());
    }

    #[test]
    fn missing_graph_shows_empty_state_and_only_subscribes() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, None);
        assert!(!pane.has_data());
        assert!(pane.simulation().is_none());
        assert_eq!(selection.read().subscriber_count(), 1);

        pane.route_pointer(&PointerFrame {
            clicked: true,
            ..at(pos2(10.0, 10.0))
        });
        assert_eq!(selection.read().revision(), 0);
    }

    #[test]
    fn clicking_a_node_toggles_it() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        let position = pane.surface_position(2).unwrap();

        pane.route_pointer(&PointerFrame {
            clicked: true,
            ..at(position)
        });
        assert!(selection.read().is_selected(ElementKind::Node, 2));
        assert!(selection.read().is_hovered(ElementKind::Node, 2));

        pane.route_pointer(&PointerFrame {
            clicked: true,
            ..at(FAR_AWAY)
        });
        assert!(selection.read().selected(ElementKind::Node).is_empty());
        assert!(selection.read().hovered(ElementKind::Node).is_empty());
    }

    #[test]
    fn dragging_a_node_pins_it_without_panning() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        let start = pane.surface_position(1).unwrap();
        let end = start + vec2(30.0, -12.0);

        pane.route_pointer(&PointerFrame {
            press_origin: Some(start),
            drag: Some(DragPhase::Started),
            ..at(end)
        });
        let node = *pane.simulation().unwrap().node(1).unwrap();
        assert_eq!(node.fx, Some(end.x));
        assert_eq!(node.fy, Some(end.y));
        assert_eq!(pane.viewport().transform().translation(), vec2(0.0, 0.0));
        assert!(selection.read().is_hovered(ElementKind::Node, 1));

        pane.route_pointer(&PointerFrame {
            drag: Some(DragPhase::Stopped),
            ..at(end)
        });
        let node = *pane.simulation().unwrap().node(1).unwrap();
        assert_eq!(node.fx, None);
        assert_eq!(pane.simulation().unwrap().alpha_target(), 0.0);
    }

    #[test]
    fn dragging_the_background_pans() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));

        pane.route_pointer(&PointerFrame {
            press_origin: Some(FAR_AWAY),
            drag: Some(DragPhase::Started),
            ..at(FAR_AWAY + vec2(20.0, 10.0))
        });
        pane.route_pointer(&PointerFrame {
            drag: Some(DragPhase::Moved),
            ..at(FAR_AWAY + vec2(25.0, 10.0))
        });
        pane.route_pointer(&PointerFrame {
            drag: Some(DragPhase::Stopped),
            ..at(FAR_AWAY + vec2(25.0, 10.0))
        });

        assert_eq!(pane.viewport().transform().translation(), vec2(25.0, 10.0));
        assert!(!pane.viewport().is_panning());
        assert_eq!(pane.simulation().unwrap().pinned_count(), 0);
    }

    #[test]
    fn wheel_zooms_about_the_pointer() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        pane.route_pointer(&PointerFrame {
            wheel: 500.0,
            ..at(FAR_AWAY)
        });
        assert_eq!(pane.zoom_percent(), 200);
        let fixed = pane.viewport().transform().invert(FAR_AWAY);
        assert!((fixed - FAR_AWAY).length() < 1e-2);
    }

    #[test]
    fn leaving_the_pane_releases_its_hover() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        let position = pane.surface_position(0).unwrap();

        pane.route_pointer(&at(position));
        assert!(selection.read().is_hovered(ElementKind::Node, 0));

        pane.route_pointer(&PointerFrame::default());
        assert!(selection.read().hovered(ElementKind::Node).is_empty());
    }

    #[test]
    fn resize_recenters_the_layout() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        pane.set_surface(SurfaceSize::new(800.0, 600.0));
        assert_eq!(pane.simulation().unwrap().center(), vec2(400.0, 300.0));
        pane.set_surface(SurfaceSize::new(0.0, 600.0));
        assert_eq!(pane.viewport().surface(), SurfaceSize::new(800.0, 600.0));
    }

    #[test]
    fn fit_command_frames_the_layout() {
        let selection = SelectionHandle::new();
        let mut pane = pane(&selection, Some(graph()));
        pane.apply_command(ViewportCommand::FitToContent);
        assert!(pane.viewport().is_animating());
        pane.advance(10.0, &egui::Context::default());
        assert!(!pane.viewport().is_animating());

        let bounds = pane.content_bounds().unwrap();
        let center = pane.viewport().transform().apply(bounds.center());
        assert!((center - pos2(200.0, 150.0)).length() < 1.0);
    }

    #[test]
    fn dropping_the_pane_unsubscribes() {
        let selection = SelectionHandle::new();
        let pane = pane(&selection, Some(graph()));
        assert_eq!(selection.read().subscriber_count(), 1);
        drop(pane);
        assert_eq!(selection.read().subscriber_count(), 0);
    }
}
