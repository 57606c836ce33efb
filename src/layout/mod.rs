mod build;
mod forces;
mod quadtree;

use std::collections::{HashMap, HashSet};

use eframe::egui::{self, Pos2, Vec2, pos2, vec2};
use serde::Deserialize;

use crate::viewport::{ContentBounds, SurfaceSize};

pub use build::{BuildDiagnostic, Endpoint, SimulationBuild};
use forces::{CollisionParams, LinkParams, apply_center, apply_charge, apply_collision, apply_link};
use quadtree::Quadtree;
pub use quadtree::QuadtreeCell;

/// Host hook for "call me again next frame".
pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for egui::Context {
    fn request_frame(&self) {
        self.request_repaint();
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub link_distance: f32,
    pub charge_strength: f32,
    pub theta: f32,
    pub center_strength: f32,
    pub node_radius: f32,
    pub collision_strength: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
    pub resize_alpha: f32,
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            link_distance: 30.0,
            charge_strength: -100.0,
            theta: 0.9,
            center_strength: 1.0,
            node_radius: 8.0,
            collision_strength: 1.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            resize_alpha: 0.3,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationNode {
    pub node_idx: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl SimulationNode {
    pub fn position(&self) -> Pos2 {
        pos2(self.x, self.y)
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Endpoints are indices into [`Simulation::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationEdge {
    pub edge_idx: u32,
    pub source: usize,
    pub target: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyState {
    /// An interaction holds the alpha target up.
    Active,
    Settling,
    Idle,
}

#[derive(Default)]
struct ForceScratch {
    positions: Vec<Vec2>,
}

pub struct Simulation {
    nodes: Vec<SimulationNode>,
    edges: Vec<SimulationEdge>,
    index_by_id: HashMap<u32, usize>,
    links: Vec<LinkParams>,
    config: LayoutConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    pinned: HashSet<u32>,
    running: bool,
    torn_down: bool,
    generation: u64,
    tick_count: u64,
    scratch: ForceScratch,
}

impl Simulation {
    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SimulationEdge] {
        &self.edges
    }

    pub fn node(&self, node_idx: u32) -> Option<&SimulationNode> {
        self.index_by_id
            .get(&node_idx)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn energy(&self) -> EnergyState {
        if !self.running {
            EnergyState::Idle
        } else if self.alpha_target >= self.config.alpha_min {
            EnergyState::Active
        } else {
            EnergyState::Settling
        }
    }

    pub fn restart(&mut self) {
        if self.torn_down || self.nodes.is_empty() {
            return;
        }
        if !self.running {
            log::trace!("simulation generation {} restarted", self.generation);
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops ticking for good and releases the node and edge arrays.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        log::debug!(
            "tearing down simulation generation {} after {} ticks",
            self.generation,
            self.tick_count
        );
        self.running = false;
        self.torn_down = true;
        self.pinned.clear();
        self.nodes = Vec::new();
        self.edges = Vec::new();
        self.links = Vec::new();
        self.index_by_id = HashMap::new();
        self.scratch = ForceScratch::default();
    }

    /// Ticks once if running and asks for another frame while energy remains.
    pub fn advance(&mut self, scheduler: &impl FrameScheduler) -> bool {
        if !self.running {
            return false;
        }
        let running = self.tick();
        if running {
            scheduler.request_frame();
        }
        running
    }

    /// One integration step. Returns whether the simulation keeps running.
    pub fn tick(&mut self) -> bool {
        if self.torn_down || self.nodes.is_empty() {
            self.running = false;
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        apply_link(
            &mut self.nodes,
            &self.edges,
            &self.links,
            self.config.link_distance,
            alpha,
        );

        self.scratch.positions.clear();
        self.scratch
            .positions
            .extend(self.nodes.iter().map(|node| vec2(node.x, node.y)));
        if let Some(tree) = Quadtree::build(&self.scratch.positions) {
            apply_charge(
                &mut self.nodes,
                &tree,
                &self.scratch.positions,
                self.config.charge_strength,
                self.config.theta,
                alpha,
            );
        }

        apply_center(&mut self.nodes, self.center, self.config.center_strength);

        self.scratch.positions.clear();
        self.scratch.positions.extend(
            self.nodes
                .iter()
                .map(|node| vec2(node.x + node.vx, node.y + node.vy)),
        );
        if let Some(tree) = Quadtree::build(&self.scratch.positions) {
            apply_collision(
                &mut self.nodes,
                &tree,
                &self.scratch.positions,
                CollisionParams {
                    min_distance: self.config.node_radius * 2.0,
                    strength: self.config.collision_strength,
                },
            );
        }

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= retain;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= retain;
                    node.y += node.vy;
                }
            }
        }

        self.tick_count += 1;
        if self.alpha < self.config.alpha_min {
            log::trace!(
                "simulation generation {} settled after {} ticks",
                self.generation,
                self.tick_count
            );
            self.running = false;
        }
        self.running
    }

    /// Pins `node_idx` where it stands. The first concurrent pin raises the
    /// alpha target and restarts ticking.
    pub fn drag_start(&mut self, node_idx: u32) -> bool {
        let Some(&index) = self.index_by_id.get(&node_idx) else {
            return false;
        };

        if self.pinned.is_empty() {
            self.alpha_target = self.config.drag_alpha_target;
            self.restart();
        }
        self.pinned.insert(node_idx);

        let node = &mut self.nodes[index];
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        true
    }

    pub fn drag_move(&mut self, node_idx: u32, position: Pos2) -> bool {
        if !self.pinned.contains(&node_idx) {
            return false;
        }
        let Some(&index) = self.index_by_id.get(&node_idx) else {
            return false;
        };

        let node = &mut self.nodes[index];
        node.fx = Some(position.x);
        node.fy = Some(position.y);
        true
    }

    pub fn drag_end(&mut self, node_idx: u32) -> bool {
        if !self.pinned.remove(&node_idx) {
            return false;
        }
        if self.pinned.is_empty() {
            self.alpha_target = 0.0;
        }

        if let Some(&index) = self.index_by_id.get(&node_idx) {
            let node = &mut self.nodes[index];
            node.fx = None;
            node.fy = None;
        }
        true
    }

    pub fn pinned_count(&self) -> usize {
        self.pinned.len()
    }

    /// Re-targets the center force and reheats so nodes spread into the new
    /// bounds. Zero-area sizes are ignored.
    pub fn resize(&mut self, surface: SurfaceSize) {
        if surface.is_degenerate() {
            return;
        }

        let center = vec2(surface.width * 0.5, surface.height * 0.5);
        if center == self.center {
            return;
        }
        self.center = center;
        self.alpha = self.alpha.max(self.config.resize_alpha);
        self.restart();
    }

    pub fn content_bounds(&self) -> Option<ContentBounds> {
        ContentBounds::from_points(self.nodes.iter().map(SimulationNode::position))
            .map(|bounds| bounds.expand(self.config.node_radius))
    }

    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .nodes
            .iter()
            .map(|node| vec2(node.x, node.y))
            .collect::<Vec<_>>();
        if let Some(tree) = Quadtree::build(&positions) {
            cells.extend(tree.overlay_cells());
        }
    }
}
