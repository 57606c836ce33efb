use eframe::egui::{Vec2, vec2};

/// Deterministic unit vector used to separate coincident points.
pub fn fallback_direction(first: usize, second: usize) -> Vec2 {
    let angle =
        ((first as f32) * 0.618_034 + (second as f32) * 0.414_214 + 0.11) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub fn node_label(label: Option<&str>, node_idx: u32) -> String {
    match label {
        Some(label) if !label.trim().is_empty() => label.to_owned(),
        _ => format!("#{node_idx}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_direction_is_unit_length() {
        for (first, second) in [(0, 0), (3, 9), (120, 7)] {
            assert!((fallback_direction(first, second).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn blank_labels_fall_back_to_the_index() {
        assert_eq!(node_label(Some("hub"), 3), "hub");
        assert_eq!(node_label(Some("  "), 3), "#3");
        assert_eq!(node_label(None, 12), "#12");
    }
}
