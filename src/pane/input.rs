use eframe::egui::{self, Pos2, Rect};

use crate::selection::{ElementId, ElementKind, SelectionHandle};
use crate::viewport::TargetRole;

/// What the pointer is over, in pane terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerHit {
    Element(ElementKind, ElementId),
    Background,
}

impl PointerHit {
    pub fn role(self) -> TargetRole {
        match self {
            Self::Element(ElementKind::Node, _) => TargetRole::Node,
            Self::Element(ElementKind::Edge, _) => TargetRole::Edge,
            Self::Background => TargetRole::Background,
        }
    }

    pub fn element(self) -> Option<(ElementKind, ElementId)> {
        match self {
            Self::Element(kind, id) => Some((kind, id)),
            Self::Background => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Started,
    Moved,
    Stopped,
}

/// One frame of pointer input in surface-local coordinates (origin at the
/// pane's top-left corner).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerFrame {
    pub hover: Option<Pos2>,
    pub pointer: Option<Pos2>,
    pub press_origin: Option<Pos2>,
    pub drag: Option<DragPhase>,
    pub wheel: f32,
    pub clicked: bool,
    pub double_clicked: bool,
}

impl PointerFrame {
    pub fn from_response(response: &egui::Response, rect: Rect) -> Self {
        let origin = rect.min.to_vec2();
        let local = |position: Pos2| position - origin;
        let button = egui::PointerButton::Primary;

        let drag = if response.drag_started_by(button) {
            Some(DragPhase::Started)
        } else if response.drag_stopped_by(button) {
            Some(DragPhase::Stopped)
        } else if response.dragged_by(button) {
            Some(DragPhase::Moved)
        } else {
            None
        };

        let (press_origin, wheel) = response.ctx.input(|input| {
            let wheel = if response.hovered() {
                input.raw_scroll_delta.y
            } else {
                0.0
            };
            (input.pointer.press_origin(), wheel)
        });

        Self {
            hover: response.hover_pos().map(local),
            pointer: response
                .interact_pointer_pos()
                .or_else(|| response.hover_pos())
                .map(local),
            press_origin: press_origin.map(local),
            drag,
            wheel,
            clicked: response.clicked_by(button),
            double_clicked: response.double_clicked_by(button),
        }
    }
}

/// Nearest circle containing `pointer`, among `(index, center, radius)`.
pub fn nearest_circle(
    pointer: Pos2,
    circles: impl IntoIterator<Item = (usize, Pos2, f32)>,
) -> Option<usize> {
    circles
        .into_iter()
        .filter_map(|(index, center, radius)| {
            let distance = center.distance(pointer);
            (distance <= radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Nearest segment within `tolerance` of `pointer`.
pub fn nearest_segment(
    pointer: Pos2,
    tolerance: f32,
    segments: impl IntoIterator<Item = (usize, Pos2, Pos2)>,
) -> Option<usize> {
    segments
        .into_iter()
        .filter_map(|(index, start, end)| {
            let distance = distance_to_segment(pointer, start, end);
            (distance <= tolerance).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Primary click: an element toggles its own selection; the background
/// clears the selection. Never both.
pub fn route_click(selection: &SelectionHandle, hit: PointerHit) {
    let mut store = selection.write();
    match hit {
        PointerHit::Element(kind, id) => store.toggle_selection(kind, id),
        PointerHit::Background => store.clear_selection(),
    }
}
