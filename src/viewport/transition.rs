use eframe::egui::Pos2;

use super::transform::{SurfaceSize, Transform};

#[derive(Clone, Copy, Debug)]
pub(super) struct Transition {
    from: Transform,
    to: Transform,
    surface: SurfaceSize,
    start: f64,
    duration: f64,
}

impl Transition {
    pub(super) fn new(
        from: Transform,
        to: Transform,
        surface: SurfaceSize,
        start: f64,
        duration: f64,
    ) -> Self {
        Self {
            from,
            to,
            surface,
            start,
            duration,
        }
    }

    pub(super) fn target(&self) -> Transform {
        self.to
    }

    pub(super) fn is_finished(&self, now: f64) -> bool {
        self.duration <= 0.0 || now - self.start >= self.duration
    }

    /// Interpolates the view center in content space and the scale geometrically,
    /// so whatever content point sits at the surface center stays put when only
    /// the scale changes.
    pub(super) fn sample(&self, now: f64) -> Transform {
        if self.is_finished(now) {
            return self.to;
        }

        let progress = ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        let eased = ease_cubic_in_out(progress);

        let anchor = self.surface.center();
        let from_center = self.from.invert(anchor);
        let to_center = self.to.invert(anchor);
        let center = Pos2::new(
            from_center.x + (to_center.x - from_center.x) * eased,
            from_center.y + (to_center.y - from_center.y) * eased,
        );

        let from_log = self.from.scale.ln();
        let to_log = self.to.scale.ln();
        let scale = (from_log + (to_log - from_log) * eased).exp();

        Transform::anchored(center, anchor, scale)
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}
