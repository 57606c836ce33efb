use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn new(translate_x: f32, translate_y: f32, scale: f32) -> Self {
        Self {
            translate_x,
            translate_y,
            scale,
        }
    }

    pub fn translation(self) -> Vec2 {
        vec2(self.translate_x, self.translate_y)
    }

    pub fn apply(self, content: Pos2) -> Pos2 {
        pos2(
            content.x * self.scale + self.translate_x,
            content.y * self.scale + self.translate_y,
        )
    }

    pub fn invert(self, surface: Pos2) -> Pos2 {
        pos2(
            (surface.x - self.translate_x) / self.scale,
            (surface.y - self.translate_y) / self.scale,
        )
    }

    /// Transform with the given scale that maps `content` onto `surface`.
    pub fn anchored(content: Pos2, surface: Pos2, scale: f32) -> Self {
        Self::new(
            surface.x - content.x * scale,
            surface.y - content.y * scale,
            scale,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct ContentBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ContentBounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Pos2>) -> Option<Self> {
        let mut min = pos2(f32::INFINITY, f32::INFINITY);
        let mut max = pos2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    pub fn expand(self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    pub fn center(self) -> Pos2 {
        pos2(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn max(self) -> Pos2 {
        pos2(self.x + self.width, self.y + self.height)
    }

    pub fn is_degenerate(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.width(), rect.height())
    }

    pub fn center(self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    pub fn is_degenerate(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_undoes_apply() {
        let transform = Transform::new(12.0, -30.0, 2.5);
        let point = pos2(7.0, 3.0);
        let back = transform.invert(transform.apply(point));
        assert!((back.x - point.x).abs() < 1e-5);
        assert!((back.y - point.y).abs() < 1e-5);
    }

    #[test]
    fn anchored_maps_content_point_to_surface_point() {
        let transform = Transform::anchored(pos2(50.0, 25.0), pos2(100.0, 100.0), 2.0);
        assert_eq!(transform.apply(pos2(50.0, 25.0)), pos2(100.0, 100.0));
    }

    #[test]
    fn bounds_from_points_covers_every_point() {
        let bounds =
            ContentBounds::from_points([pos2(-2.0, 4.0), pos2(6.0, -1.0), pos2(1.0, 1.0)])
                .unwrap();
        assert_eq!(bounds, ContentBounds::new(-2.0, -1.0, 8.0, 5.0));
        assert!(ContentBounds::from_points([]).is_none());
    }

    #[test]
    fn single_point_bounds_are_degenerate_until_expanded() {
        let bounds = ContentBounds::from_points([pos2(3.0, 3.0)]).unwrap();
        assert!(bounds.is_degenerate());
        assert!(!bounds.expand(8.0).is_degenerate());
    }
}
