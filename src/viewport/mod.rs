mod gesture;
mod transform;
mod transition;

use eframe::egui::{Pos2, Vec2};

pub use gesture::{
    GestureEvent, GestureFilter, GestureKind, GestureOutcome, TargetRole, ViewportCommand,
    allow_all, background_drags_only, command_for_key, take_viewport_commands,
};
pub use transform::{ContentBounds, SurfaceSize, Transform};
use transition::Transition;

const WHEEL_ZOOM_RATE: f32 = 0.002;
const DOUBLE_CLICK_FACTOR: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub translate_extent: Option<ContentBounds>,
    pub zoom_step: f32,
    pub transition_secs: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::node_link()
    }
}

impl ViewportConfig {
    pub fn node_link() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            translate_extent: None,
            zoom_step: 0.25,
            transition_secs: 0.2,
        }
    }

    pub fn vector_plot() -> Self {
        Self {
            min_scale: 0.5,
            ..Self::node_link()
        }
    }
}

pub struct ViewportController {
    transform: Transform,
    config: ViewportConfig,
    surface: SurfaceSize,
    transition: Option<Transition>,
    clock: f64,
    filter: GestureFilter,
    pan_anchor: Option<Pos2>,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            transform: Transform::IDENTITY,
            config,
            surface: SurfaceSize::default(),
            transition: None,
            clock: 0.0,
            filter: Box::new(allow_all),
            pan_anchor: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Where the viewport is heading: the in-flight transition's target, or
    /// the current transform when idle.
    pub fn target_transform(&self) -> Transform {
        self.transition
            .as_ref()
            .map_or(self.transform, Transition::target)
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.transform.scale * 100.0).round() as u32
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn set_surface(&mut self, surface: SurfaceSize) {
        self.surface = surface;
        self.transform = self.constrain(self.transform);
    }

    pub fn set_filter(&mut self, filter: impl Fn(&GestureEvent) -> bool + 'static) {
        self.filter = Box::new(filter);
    }

    /// Moves the clock forward and samples any in-flight transition. Returns
    /// whether a transition is still running afterwards.
    pub fn advance(&mut self, now: f64) -> bool {
        self.clock = now.max(self.clock);
        let Some(transition) = self.transition else {
            return false;
        };

        self.transform = transition.sample(self.clock);
        if transition.is_finished(self.clock) {
            self.transition = None;
            return false;
        }
        true
    }

    pub fn zoom_in(&mut self) {
        let factor = 1.0 + self.config.zoom_step;
        self.zoom_centered_by(factor);
    }

    pub fn zoom_out(&mut self) {
        let factor = 1.0 + self.config.zoom_step;
        self.zoom_centered_by(1.0 / factor);
    }

    pub fn reset(&mut self) {
        self.transition_to(Transform::IDENTITY);
    }

    /// Returns `false` without touching the transform when the surface or the
    /// bounds have no area.
    pub fn fit_to_content(&mut self, bounds: ContentBounds, padding: f32) -> bool {
        if self.surface.is_degenerate() || bounds.is_degenerate() {
            return false;
        }

        let usable_width = self.surface.width - padding * 2.0;
        let usable_height = self.surface.height - padding * 2.0;
        if usable_width <= 0.0 || usable_height <= 0.0 {
            return false;
        }

        let scale =
            self.clamp_scale((usable_width / bounds.width).min(usable_height / bounds.height));
        let target = Transform::anchored(bounds.center(), self.surface.center(), scale);
        self.transition_to(target);
        true
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transition = None;
        self.transform = self.constrain(transform);
    }

    pub fn apply_command(
        &mut self,
        command: ViewportCommand,
        content: Option<ContentBounds>,
        padding: f32,
    ) {
        match command {
            ViewportCommand::ZoomIn => self.zoom_in(),
            ViewportCommand::ZoomOut => self.zoom_out(),
            ViewportCommand::Reset => self.reset(),
            ViewportCommand::FitToContent => {
                if let Some(bounds) = content {
                    self.fit_to_content(bounds, padding);
                }
            }
        }
    }

    pub fn handle_gesture(&mut self, event: &GestureEvent) -> GestureOutcome {
        if !(self.filter)(event) {
            return GestureOutcome::Ignored;
        }

        match event.kind {
            GestureKind::Wheel { delta_y } => {
                if delta_y.abs() <= f32::EPSILON {
                    return GestureOutcome::Ignored;
                }
                self.transition = None;
                let factor = 2.0_f32.powf(delta_y * WHEEL_ZOOM_RATE);
                self.transform = self.scaled_about(self.transform, event.pointer, factor);
            }
            GestureKind::DragStart => {
                self.transition = None;
                self.pan_anchor = Some(event.pointer);
            }
            GestureKind::DragMove => {
                let Some(anchor) = self.pan_anchor else {
                    return GestureOutcome::Ignored;
                };
                let delta = event.pointer - anchor;
                self.pan_anchor = Some(event.pointer);
                self.transform = self.translated(self.transform, delta);
            }
            GestureKind::DragEnd => {
                if self.pan_anchor.take().is_none() {
                    return GestureOutcome::Ignored;
                }
            }
            GestureKind::DoubleClick => {
                let target = self.scaled_about(
                    self.target_transform(),
                    event.pointer,
                    DOUBLE_CLICK_FACTOR,
                );
                self.transition_to(target);
            }
        }
        GestureOutcome::Consumed
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    fn zoom_centered_by(&mut self, factor: f32) {
        let target =
            self.scaled_about(self.target_transform(), self.surface.center(), factor);
        self.transition_to(target);
    }

    fn transition_to(&mut self, target: Transform) {
        let target = self.constrain(target);
        if self.config.transition_secs <= 0.0 {
            self.transition = None;
            self.transform = target;
            return;
        }

        self.transition = Some(Transition::new(
            self.transform,
            target,
            self.surface,
            self.clock,
            self.config.transition_secs,
        ));
    }

    fn scaled_about(&self, from: Transform, anchor: Pos2, factor: f32) -> Transform {
        let content = from.invert(anchor);
        let scale = self.clamp_scale(from.scale * factor);
        self.constrain(Transform::anchored(content, anchor, scale))
    }

    fn translated(&self, from: Transform, delta: Vec2) -> Transform {
        self.constrain(Transform::new(
            from.translate_x + delta.x,
            from.translate_y + delta.y,
            from.scale,
        ))
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.config.min_scale, self.config.max_scale)
    }

    fn constrain(&self, transform: Transform) -> Transform {
        let transform = Transform {
            scale: self.clamp_scale(transform.scale),
            ..transform
        };

        let Some(extent) = self.config.translate_extent else {
            return transform;
        };
        if self.surface.is_degenerate() {
            return transform;
        }

        let view_min = transform.invert(Pos2::ZERO);
        let view_max = transform.invert(Pos2::new(self.surface.width, self.surface.height));
        let extent_max = extent.max();

        let shift_x = axis_shift(view_min.x - extent.x, view_max.x - extent_max.x);
        let shift_y = axis_shift(view_min.y - extent.y, view_max.y - extent_max.y);

        Transform::new(
            transform.translate_x + shift_x * transform.scale,
            transform.translate_y + shift_y * transform.scale,
            transform.scale,
        )
    }
}

// Content-space shift that brings the visible span inside the extent, or
// centers it when the span is wider than the extent.
fn axis_shift(low_gap: f32, high_gap: f32) -> f32 {
    if high_gap > low_gap {
        (low_gap + high_gap) / 2.0
    } else if low_gap < 0.0 {
        low_gap
    } else if high_gap > 0.0 {
        high_gap
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn controller(config: ViewportConfig, width: f32, height: f32) -> ViewportController {
        let mut controller = ViewportController::new(config);
        controller.set_surface(SurfaceSize::new(width, height));
        controller
    }

    fn settle(controller: &mut ViewportController) {
        let now = controller.clock + 10.0;
        controller.advance(now);
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn starts_at_identity() {
        let controller = controller(ViewportConfig::node_link(), 100.0, 100.0);
        assert_eq!(controller.transform(), Transform::IDENTITY);
        assert_eq!(controller.zoom_percent(), 100);
    }

    #[test]
    fn repeated_zoom_stays_within_extent() {
        let mut controller = controller(ViewportConfig::node_link(), 300.0, 200.0);
        for _ in 0..40 {
            controller.zoom_in();
            settle(&mut controller);
            assert!(controller.transform().scale <= 4.0);
        }
        assert!(close(controller.transform().scale, 4.0));
        assert_eq!(controller.zoom_percent(), 400);

        for _ in 0..80 {
            controller.zoom_out();
            settle(&mut controller);
            assert!(controller.transform().scale >= 0.1);
        }
        assert!(close(controller.transform().scale, 0.1));
    }

    #[test]
    fn zoom_in_is_anchored_at_surface_center() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 100.0);
        let center_before = controller.transform().invert(pos2(100.0, 50.0));
        controller.zoom_in();
        settle(&mut controller);

        let center_after = controller.transform().invert(pos2(100.0, 50.0));
        assert!(close(controller.transform().scale, 1.25));
        assert!(close(center_before.x, center_after.x));
        assert!(close(center_before.y, center_after.y));
    }

    #[test]
    fn fit_to_content_centers_bounds() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        assert!(controller.fit_to_content(ContentBounds::new(0.0, 0.0, 100.0, 50.0), 0.0));
        settle(&mut controller);

        let transform = controller.transform();
        assert!(close(transform.scale, 2.0));
        let mapped = transform.apply(pos2(50.0, 25.0));
        assert!(close(mapped.x, 100.0));
        assert!(close(mapped.y, 100.0));
    }

    #[test]
    fn fit_to_content_respects_padding_and_max_scale() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.fit_to_content(ContentBounds::new(0.0, 0.0, 100.0, 100.0), 50.0);
        settle(&mut controller);
        assert!(close(controller.transform().scale, 1.0));

        controller.fit_to_content(ContentBounds::new(10.0, 10.0, 1.0, 1.0), 0.0);
        settle(&mut controller);
        assert!(close(controller.transform().scale, 4.0));
    }

    #[test]
    fn fit_below_min_scale_still_centers_bounds() {
        let mut controller = controller(ViewportConfig::vector_plot(), 400.0, 300.0);
        let bounds = ContentBounds::new(0.0, 0.0, 4000.0, 200.0);
        assert!(controller.fit_to_content(bounds, 0.0));
        settle(&mut controller);

        let transform = controller.transform();
        assert!(close(transform.scale, 0.5));
        let mapped = transform.apply(bounds.center());
        assert!(close(mapped.x, 200.0));
        assert!(close(mapped.y, 150.0));
    }

    #[test]
    fn degenerate_fit_is_a_no_op() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.set_transform(Transform::new(5.0, 6.0, 1.5));

        assert!(!controller.fit_to_content(ContentBounds::new(0.0, 0.0, 0.0, 10.0), 0.0));
        assert!(!controller.is_animating());
        assert_eq!(controller.transform(), Transform::new(5.0, 6.0, 1.5));

        controller.set_surface(SurfaceSize::new(0.0, 200.0));
        assert!(!controller.fit_to_content(ContentBounds::new(0.0, 0.0, 10.0, 10.0), 0.0));
        assert_eq!(controller.transform(), Transform::new(5.0, 6.0, 1.5));
    }

    #[test]
    fn new_transition_overrides_the_one_in_flight() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.zoom_in();
        controller.advance(0.05);
        assert!(controller.is_animating());

        controller.fit_to_content(ContentBounds::new(0.0, 0.0, 100.0, 50.0), 0.0);
        assert!(close(controller.target_transform().scale, 2.0));
        controller.advance(0.1);
        controller.advance(10.0);
        assert!(!controller.is_animating());
        assert!(close(controller.transform().scale, 2.0));
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.set_transform(Transform::new(-40.0, 12.0, 3.0));
        controller.reset();
        settle(&mut controller);
        assert_eq!(controller.transform(), Transform::IDENTITY);
    }

    #[test]
    fn set_transform_clamps_scale() {
        let mut controller = controller(ViewportConfig::vector_plot(), 100.0, 100.0);
        controller.set_transform(Transform::new(0.0, 0.0, 0.2));
        assert_eq!(controller.transform().scale, 0.5);
    }

    #[test]
    fn drag_pans_by_pointer_delta() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        let drag = |kind, x, y| GestureEvent::new(kind, pos2(x, y), TargetRole::Background);

        controller.handle_gesture(&drag(GestureKind::DragStart, 10.0, 10.0));
        controller.handle_gesture(&drag(GestureKind::DragMove, 15.0, 7.0));
        controller.handle_gesture(&drag(GestureKind::DragMove, 30.0, 7.0));
        controller.handle_gesture(&drag(GestureKind::DragEnd, 30.0, 7.0));

        assert_eq!(controller.transform(), Transform::new(20.0, -3.0, 1.0));
        assert!(!controller.is_panning());
    }

    #[test]
    fn filtered_drag_leaves_transform_alone() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.set_filter(background_drags_only);
        let drag = |kind, x| GestureEvent::new(kind, pos2(x, 0.0), TargetRole::Node);

        assert_eq!(
            controller.handle_gesture(&drag(GestureKind::DragStart, 0.0)),
            GestureOutcome::Ignored
        );
        assert_eq!(
            controller.handle_gesture(&drag(GestureKind::DragMove, 50.0)),
            GestureOutcome::Ignored
        );
        assert_eq!(controller.transform(), Transform::IDENTITY);
    }

    #[test]
    fn wheel_zoom_keeps_pointer_anchored() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        let pointer = pos2(40.0, 160.0);
        let before = controller.transform().invert(pointer);
        controller.handle_gesture(&GestureEvent::new(
            GestureKind::Wheel { delta_y: 120.0 },
            pointer,
            TargetRole::Background,
        ));

        let transform = controller.transform();
        assert!(transform.scale > 1.0);
        let after = transform.invert(pointer);
        assert!(close(before.x, after.x));
        assert!(close(before.y, after.y));
    }

    #[test]
    fn translate_extent_bounds_panning() {
        let config = ViewportConfig {
            translate_extent: Some(ContentBounds::new(0.0, 0.0, 400.0, 400.0)),
            ..ViewportConfig::node_link()
        };
        let mut controller = controller(config, 200.0, 200.0);
        let drag = |kind, x, y| GestureEvent::new(kind, pos2(x, y), TargetRole::Background);

        controller.handle_gesture(&drag(GestureKind::DragStart, 0.0, 0.0));
        controller.handle_gesture(&drag(GestureKind::DragMove, 500.0, 500.0));
        assert_eq!(controller.transform(), Transform::IDENTITY);

        controller.handle_gesture(&drag(GestureKind::DragMove, -1000.0, -1000.0));
        assert_eq!(controller.transform(), Transform::new(-200.0, -200.0, 1.0));
    }

    #[test]
    fn translate_extent_centers_when_smaller_than_view() {
        let config = ViewportConfig {
            translate_extent: Some(ContentBounds::new(0.0, 0.0, 100.0, 100.0)),
            ..ViewportConfig::node_link()
        };
        let mut controller = controller(config, 200.0, 200.0);
        controller.set_transform(Transform::new(300.0, -80.0, 1.0));
        assert_eq!(controller.transform(), Transform::new(50.0, 50.0, 1.0));
    }

    #[test]
    fn resize_reapplies_translate_extent() {
        let config = ViewportConfig {
            translate_extent: Some(ContentBounds::new(0.0, 0.0, 400.0, 400.0)),
            ..ViewportConfig::node_link()
        };
        let mut controller = controller(config, 200.0, 200.0);
        controller.set_transform(Transform::new(-200.0, -200.0, 1.0));

        controller.set_surface(SurfaceSize::new(300.0, 300.0));
        assert_eq!(controller.transform(), Transform::new(-100.0, -100.0, 1.0));
    }

    #[test]
    fn gestures_cancel_running_transition() {
        let mut controller = controller(ViewportConfig::node_link(), 200.0, 200.0);
        controller.zoom_in();
        assert!(controller.is_animating());
        controller.handle_gesture(&GestureEvent::new(
            GestureKind::DragStart,
            pos2(0.0, 0.0),
            TargetRole::Background,
        ));
        assert!(!controller.is_animating());
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let config = ViewportConfig {
            transition_secs: 0.0,
            ..ViewportConfig::node_link()
        };
        let mut controller = controller(config, 200.0, 200.0);
        controller.zoom_in();
        assert!(!controller.is_animating());
        assert!(close(controller.transform().scale, 1.25));
    }
}
