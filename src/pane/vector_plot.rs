use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, pos2, vec2,
};

use crate::config::ExplorerConfig;
use crate::dataset::NodeVector;
use crate::selection::{ElementKind, SelectionHandle};
use crate::viewport::{
    ContentBounds, GestureEvent, GestureKind, SurfaceSize, TargetRole, ViewportCommand,
    ViewportController, take_viewport_commands,
};

use super::highlight::{ElementStyle, Emphasis, Palette, fill_draw_order};
use super::input::{DragPhase, PointerFrame, PointerHit, nearest_segment, route_click};
use super::render::{draw_background, to_screen};
use super::SelectionLink;

const STEP_X: f32 = 40.0;
const PLOT_HEIGHT: f32 = 200.0;
const POINT_MARGIN: f32 = 8.0;
const LINE_HIT_TOLERANCE: f32 = 5.0;
const BASE_LINE_WIDTH: f32 = 1.5;
const AXIS: Color32 = Color32::from_rgba_premultiplied(70, 78, 90, 160);

struct Series {
    node_idx: u32,
    points: Vec<Pos2>,
}

/// Lays every vector out in one shared frame: index `i` sits at `x = 40 i`,
/// and the largest magnitude across all vectors reaches the top of the plot.
fn plot_series(vectors: &[NodeVector]) -> (Vec<Series>, Option<ContentBounds>) {
    let peak = vectors
        .iter()
        .flat_map(|vector| &vector.values)
        .filter(|value| value.is_finite())
        .fold(0.0_f64, |peak, value| peak.max(value.abs()));
    let peak = if peak > 0.0 { peak } else { 1.0 };

    let series = vectors
        .iter()
        .map(|vector| Series {
            node_idx: vector.node_idx,
            points: vector
                .values
                .iter()
                .enumerate()
                .filter(|(_, value)| value.is_finite())
                .map(|(index, value)| {
                    pos2(
                        index as f32 * STEP_X,
                        PLOT_HEIGHT - (value / peak) as f32 * PLOT_HEIGHT,
                    )
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let bounds = ContentBounds::from_points(
        series
            .iter()
            .flat_map(|series| series.points.iter().copied()),
    )
    .map(|bounds| bounds.expand(POINT_MARGIN));
    (series, bounds)
}

/// Per-node invariant plot: one polyline per node vector.
pub struct VectorPlotPane {
    link: SelectionLink,
    generation: u64,
    series: Option<Vec<Series>>,
    bounds: Option<ContentBounds>,
    viewport: ViewportController,
    fit_padding: f32,
    fitted: bool,
    panning: bool,
    hovered: PointerHit,
    order: Vec<usize>,
    order_revision: Option<u64>,
}

impl VectorPlotPane {
    pub fn new(
        selection: SelectionHandle,
        vectors: Option<Vec<NodeVector>>,
        config: &ExplorerConfig,
        generation: u64,
        repaint: egui::Context,
    ) -> Self {
        let (series, bounds) = match vectors {
            Some(vectors) => {
                let (series, bounds) = plot_series(&vectors);
                (Some(series), bounds)
            }
            None => (None, None),
        };

        Self {
            link: SelectionLink::attach(selection, repaint),
            generation,
            series,
            bounds,
            viewport: ViewportController::new(config.vector_plot_viewport),
            fit_padding: config.fit_padding,
            fitted: false,
            panning: false,
            hovered: PointerHit::Background,
            order: Vec::new(),
            order_revision: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.series.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn series_count(&self) -> usize {
        self.series.as_ref().map_or(0, Vec::len)
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn zoom_percent(&self) -> u32 {
        self.viewport.zoom_percent()
    }

    pub fn content_bounds(&self) -> Option<ContentBounds> {
        self.bounds
    }

    pub fn apply_command(&mut self, command: ViewportCommand) {
        self.viewport
            .apply_command(command, self.bounds, self.fit_padding);
    }

    /// Content-space points of the polyline for `node_idx`.
    pub fn series_points(&self, node_idx: u32) -> Option<&[Pos2]> {
        self.series
            .as_ref()?
            .iter()
            .find(|series| series.node_idx == node_idx)
            .map(|series| series.points.as_slice())
    }

    /// The first usable size also frames the whole plot.
    pub fn set_surface(&mut self, surface: SurfaceSize) {
        if surface.is_degenerate() || surface == self.viewport.surface() {
            return;
        }
        self.viewport.set_surface(surface);

        if !self.fitted
            && let Some(bounds) = self.bounds
        {
            self.fitted = self.viewport.fit_to_content(bounds, self.fit_padding);
        }
    }

    pub fn advance(&mut self, now: f64) -> bool {
        self.viewport.advance(now)
    }

    pub fn hit_test(&self, pointer: Pos2) -> PointerHit {
        let Some(series) = &self.series else {
            return PointerHit::Background;
        };
        let transform = self.viewport.transform();

        let segments = series.iter().enumerate().flat_map(|(index, series)| {
            let points = &series.points;
            let pairs = points.windows(2).map(|pair| (pair[0], pair[1]));
            let single = (points.len() == 1).then(|| (points[0], points[0]));
            pairs
                .chain(single)
                .map(move |(start, end)| (index, transform.apply(start), transform.apply(end)))
        });
        match nearest_segment(pointer, LINE_HIT_TOLERANCE, segments) {
            Some(index) => PointerHit::Element(ElementKind::Node, series[index].node_idx),
            None => PointerHit::Background,
        }
    }

    pub fn route_pointer(&mut self, frame: &PointerFrame) {
        if self.series.is_none() {
            return;
        }

        match frame.drag {
            Some(DragPhase::Started) => {
                if let Some(origin) = frame.press_origin.or(frame.pointer) {
                    let role = self.hit_test(origin).role();
                    let event = GestureEvent::new(GestureKind::DragStart, origin, role);
                    self.viewport.handle_gesture(&event);
                    self.panning = self.viewport.is_panning();
                }
                self.pan_to(frame.pointer);
            }
            Some(DragPhase::Moved) => self.pan_to(frame.pointer),
            Some(DragPhase::Stopped) => {
                if self.panning {
                    let pointer = frame.pointer.unwrap_or_default();
                    let event = GestureEvent::new(GestureKind::DragEnd, pointer, TargetRole::Background);
                    self.viewport.handle_gesture(&event);
                    self.panning = false;
                }
            }
            None => {}
        }

        self.hovered = match frame.hover {
            Some(pointer) if !self.panning => self.hit_test(pointer),
            _ => PointerHit::Background,
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

    fn pan_to(&mut self, pointer: Option<Pos2>) {
        if let (true, Some(pointer)) = (self.panning, pointer) {
            let event = GestureEvent::new(GestureKind::DragMove, pointer, TargetRole::Background);
            self.viewport.handle_gesture(&event);
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
        if self.advance(now) {
            ui.ctx().request_repaint();
        }
        if self.panning {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if self.hovered != PointerHit::Background {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.viewport.transform());

        let empty_message = match &self.series {
            None => Some("No vector data for this dataset."),
            Some(series) if series.iter().all(|series| series.points.is_empty()) => {
                Some("This dataset's vectors are empty.")
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

        self.draw_plot(&painter, rect);
    }

    fn draw_plot(&mut self, painter: &egui::Painter, rect: Rect) {
        let Some(series) = &self.series else {
            return;
        };
        let transform = self.viewport.transform();
        let store = self.link.handle().read();

        if let Some(bounds) = self.bounds {
            let axis_start = to_screen(rect, transform, pos2(0.0, PLOT_HEIGHT));
            let axis_end = to_screen(rect, transform, pos2(bounds.max().x, PLOT_HEIGHT));
            painter.line_segment([axis_start, axis_end], Stroke::new(1.0, AXIS));
        }

        let revision = self.link.last_revision();
        if self.order_revision != Some(revision) || self.order.len() != series.len() {
            fill_draw_order(&mut self.order, series.len(), |index| {
                Emphasis::of(&store, ElementKind::Node, series[index].node_idx)
            });
            self.order_revision = Some(revision);
        }

        for &index in &self.order {
            let series = &series[index];
            let style = ElementStyle::new(
                Emphasis::of(&store, ElementKind::Node, series.node_idx),
                &Palette::SERIES,
            );
            let points = series
                .points
                .iter()
                .map(|point| to_screen(rect, transform, *point))
                .collect::<Vec<_>>();
            let stroke = Stroke::new(BASE_LINE_WIDTH * style.size_scale, style.color);

            match points.as_slice() {
                [] => continue,
                [point] => {
                    painter.circle_filled(*point, stroke.width * 1.5, style.color);
                }
                _ => {
                    painter.add(Shape::line(points.clone(), stroke));
                }
            }

            if style.raised
                && let Some(last) = points.last()
            {
                painter.text(
                    *last + vec2(6.0, 0.0),
                    Align2::LEFT_CENTER,
                    format!("#{}", series.node_idx),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }
}
