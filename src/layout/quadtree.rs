use std::ops::Range;

use eframe::egui::{Vec2, vec2};

const MAX_DEPTH: u16 = 16;

/// Axis-aligned square anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
    pub(super) origin: Vec2,
    pub(super) side: f32,
}

impl Square {
    /// Smallest power-of-two square on the integer grid that covers every
    /// point. `None` for empty or non-finite input.
    fn covering(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        let origin = vec2(min.x.floor(), min.y.floor());
        let span = (max.x - origin.x).max(max.y - origin.y).max(1.0);
        Some(Self {
            origin,
            side: 2.0_f32.powi(span.log2().ceil() as i32),
        })
    }

    pub(super) fn midpoint(self) -> Vec2 {
        self.origin + Vec2::splat(self.side * 0.5)
    }

    // Bit 0 is east, bit 1 is south.
    fn quadrant_of(self, point: Vec2) -> usize {
        let mid = self.midpoint();
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        Self {
            origin: self.origin
                + vec2((quadrant & 1) as f32 * half, (quadrant >> 1) as f32 * half),
            side: half,
        }
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let far = self.origin + Vec2::splat(self.side);
        (self.origin.x..=far.x).contains(&point.x) && (self.origin.y..=far.y).contains(&point.y)
    }

    /// Squared distance from `point` to the nearest point of the square.
    pub(super) fn distance_sq_from(self, point: Vec2) -> f32 {
        let far = self.origin + Vec2::splat(self.side);
        let dx = (self.origin.x - point.x).max(point.x - far.x).max(0.0);
        let dy = (self.origin.y - point.y).max(point.y - far.y).max(0.0);
        dx * dx + dy * dy
    }
}

#[derive(Clone, Debug)]
pub(super) struct QuadCell {
    pub(super) square: Square,
    pub(super) depth: u16,
    /// Unit charge per point below this cell.
    pub(super) weight: f32,
    /// Charge-weighted centroid of the points below this cell.
    pub(super) centroid: Vec2,
    members: Range<usize>,
    children: [Option<usize>; 4],
}

impl QuadCell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Flattened quadtree cell for the debug overlay.
#[derive(Clone, Copy, Debug)]
pub struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Point quadtree over one position snapshot. Cells live in a flat arena in
/// pre-order, and every cell owns a contiguous run of `order`, so leaves
/// hold either one distinct position or a stack of coincident ones.
pub(super) struct Quadtree {
    cells: Vec<QuadCell>,
    order: Vec<usize>,
}

impl Quadtree {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let square = Square::covering(points)?;
        let mut tree = Self {
            cells: Vec::with_capacity(points.len() * 2),
            order: (0..points.len()).collect(),
        };
        tree.split(square, 0, 0..points.len(), points);
        Some(tree)
    }

    fn split(
        &mut self,
        square: Square,
        depth: u16,
        members: Range<usize>,
        points: &[Vec2],
    ) -> usize {
        let id = self.cells.len();
        self.cells.push(QuadCell {
            square,
            depth,
            weight: 0.0,
            centroid: Vec2::ZERO,
            members: members.clone(),
            children: [None; 4],
        });

        let run = &mut self.order[members.clone()];
        let first = points[run[0]];
        let coincident = run.iter().all(|&index| points[index] == first);
        if coincident || depth >= MAX_DEPTH {
            let weight = run.len() as f32;
            let sum = run.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]);
            let cell = &mut self.cells[id];
            cell.weight = weight;
            cell.centroid = sum / weight;
            return id;
        }

        run.sort_unstable_by_key(|&index| square.quadrant_of(points[index]));
        let mut counts = [0usize; 4];
        for &index in run.iter() {
            counts[square.quadrant_of(points[index])] += 1;
        }

        let mut start = members.start;
        let mut weight = 0.0;
        let mut moment = Vec2::ZERO;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.split(
                square.quadrant(quadrant),
                depth + 1,
                start..start + count,
                points,
            );
            let child_cell = &self.cells[child];
            weight += child_cell.weight;
            moment += child_cell.centroid * child_cell.weight;
            self.cells[id].children[quadrant] = Some(child);
            start += count;
        }

        let cell = &mut self.cells[id];
        cell.weight = weight;
        cell.centroid = moment / weight;
        id
    }

    pub(super) fn root(&self) -> &QuadCell {
        &self.cells[0]
    }

    /// Point indices stored below `cell`.
    pub(super) fn members(&self, cell: &QuadCell) -> &[usize] {
        &self.order[cell.members.clone()]
    }

    /// Pre-order walk from the root. `descend` decides whether a cell's
    /// children are visited; `stack` is scratch space reused across walks.
    pub(super) fn visit(
        &self,
        stack: &mut Vec<usize>,
        mut descend: impl FnMut(&QuadCell) -> bool,
    ) {
        stack.clear();
        stack.push(0);
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id];
            if descend(cell) {
                stack.extend(cell.children.iter().rev().flatten());
            }
        }
    }

    pub(super) fn overlay_cells(&self) -> impl Iterator<Item = QuadtreeCell> + '_ {
        self.cells.iter().map(|cell| QuadtreeCell {
            center: cell.square.midpoint(),
            half_extent: cell.square.side * 0.5,
            depth: usize::from(cell.depth),
            is_leaf: cell.is_leaf(),
        })
    }
}
