use eframe::egui::Color32;

use crate::selection::{ElementId, ElementKind, SelectionStore};

const HIGHLIGHT_SIZE_SCALE: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Emphasis {
    Base,
    Hovered,
    Selected,
}

impl Emphasis {
    /// Selected wins when an element is both hovered and selected.
    pub fn of(store: &SelectionStore, kind: ElementKind, id: ElementId) -> Self {
        if store.is_selected(kind, id) {
            Self::Selected
        } else if store.is_hovered(kind, id) {
            Self::Hovered
        } else {
            Self::Base
        }
    }

    pub fn is_highlighted(self) -> bool {
        self != Self::Base
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub base: Color32,
    pub hovered: Color32,
    pub selected: Color32,
}

impl Palette {
    pub const NODE: Self = Self {
        base: Color32::from_rgb(92, 148, 206),
        hovered: Color32::from_rgb(255, 164, 101),
        selected: Color32::from_rgb(245, 206, 93),
    };

    pub const EDGE: Self = Self {
        base: Color32::from_rgba_premultiplied(72, 78, 88, 190),
        hovered: Color32::from_rgb(241, 146, 94),
        selected: Color32::from_rgb(246, 206, 104),
    };

    pub const SERIES: Self = Self {
        base: Color32::from_rgba_premultiplied(80, 116, 150, 150),
        hovered: Color32::from_rgb(255, 164, 101),
        selected: Color32::from_rgb(245, 206, 93),
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementStyle {
    pub color: Color32,
    pub size_scale: f32,
    pub raised: bool,
}

impl ElementStyle {
    pub fn new(emphasis: Emphasis, palette: &Palette) -> Self {
        match emphasis {
            Emphasis::Base => Self {
                color: palette.base,
                size_scale: 1.0,
                raised: false,
            },
            Emphasis::Hovered => Self {
                color: palette.hovered,
                size_scale: HIGHLIGHT_SIZE_SCALE,
                raised: true,
            },
            Emphasis::Selected => Self {
                color: palette.selected,
                size_scale: HIGHLIGHT_SIZE_SCALE,
                raised: true,
            },
        }
    }
}

/// Fills `order` with `0..len`, moving highlighted elements after the rest.
/// The sort is stable, so siblings keep their relative order.
pub fn fill_draw_order(order: &mut Vec<usize>, len: usize, emphasis: impl Fn(usize) -> Emphasis) {
    order.clear();
    order.extend(0..len);
    order.sort_by_key(|&index| emphasis(index).is_highlighted());
}
