use eframe::egui::{Vec2, vec2};

use crate::util::fallback_direction;

use super::quadtree::Quadtree;
use super::{SimulationEdge, SimulationNode};

const MIN_DISTANCE_SQ: f32 = 1.0;
const JIGGLE: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct LinkParams {
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Strength falls off with the busier endpoint's degree; bias splits each
/// correction so the lighter endpoint moves more.
pub(super) fn link_params(node_count: usize, edges: &[SimulationEdge]) -> Vec<LinkParams> {
    let mut degree = vec![0u32; node_count];
    for edge in edges {
        degree[edge.source] += 1;
        degree[edge.target] += 1;
    }

    edges
        .iter()
        .map(|edge| {
            let source = degree[edge.source].max(1) as f32;
            let target = degree[edge.target].max(1) as f32;
            LinkParams {
                strength: 1.0 / source.min(target),
                bias: source / (source + target),
            }
        })
        .collect()
}

pub(super) fn apply_link(
    nodes: &mut [SimulationNode],
    edges: &[SimulationEdge],
    params: &[LinkParams],
    distance: f32,
    alpha: f32,
) {
    for (edge, link) in edges.iter().zip(params) {
        if edge.source == edge.target {
            continue;
        }

        let source = nodes[edge.source];
        let target = nodes[edge.target];
        let mut delta = vec2(
            target.x + target.vx - source.x - source.vx,
            target.y + target.vy - source.y - source.vy,
        );
        if delta.length_sq() <= f32::EPSILON {
            delta = fallback_direction(edge.source, edge.target) * JIGGLE;
        }

        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * link.strength);

        nodes[edge.target].vx -= correction.x * link.bias;
        nodes[edge.target].vy -= correction.y * link.bias;
        nodes[edge.source].vx += correction.x * (1.0 - link.bias);
        nodes[edge.source].vy += correction.y * (1.0 - link.bias);
    }
}

/// Barnes-Hut repulsion: a cell seen from outside at a small enough angle
/// acts as one charge at its centroid.
pub(super) fn apply_charge(
    nodes: &mut [SimulationNode],
    tree: &Quadtree,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    alpha: f32,
) {
    let weight = strength * alpha;
    let theta_sq = theta * theta;
    let mut stack = Vec::new();

    for (index, node) in nodes.iter_mut().enumerate() {
        let point = positions[index];
        let mut velocity = Vec2::ZERO;
        tree.visit(&mut stack, |cell| {
            if !cell.is_leaf() {
                let delta = cell.centroid - point;
                let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
                let side = cell.square.side;
                if !cell.square.contains(point) && side * side / distance_sq < theta_sq {
                    velocity += delta * (weight * cell.weight / distance_sq);
                    return false;
                }
                return true;
            }

            for &other in tree.members(cell) {
                if other != index {
                    velocity += charge_between(positions[other] - point, weight, index, other);
                }
            }
            false
        });
        node.vx += velocity.x;
        node.vy += velocity.y;
    }
}

fn charge_between(delta: Vec2, weight: f32, first: usize, second: usize) -> Vec2 {
    let delta = if delta.length_sq() <= f32::EPSILON {
        fallback_direction(first, second) * JIGGLE
    } else {
        delta
    };
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    delta * (weight / distance_sq)
}

/// Shifts every node so the centroid moves toward `center`.
pub(super) fn apply_center(nodes: &mut [SimulationNode], center: Vec2, strength: f32) {
    if nodes.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for node in nodes.iter() {
        centroid += vec2(node.x, node.y);
    }
    centroid /= nodes.len() as f32;

    let shift = (centroid - center) * strength;
    for node in nodes.iter_mut() {
        node.x -= shift.x;
        node.y -= shift.y;
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) min_distance: f32,
    pub(super) strength: f32,
}

/// Resolves overlaps on predicted positions. Each node walks only the cells
/// within reach, and each pair is resolved once from its lower index.
pub(super) fn apply_collision(
    nodes: &mut [SimulationNode],
    tree: &Quadtree,
    predicted: &[Vec2],
    params: CollisionParams,
) {
    let reach_sq = params.min_distance * params.min_distance;
    let mut stack = Vec::new();

    for (index, &point) in predicted.iter().enumerate() {
        tree.visit(&mut stack, |cell| {
            if cell.square.distance_sq_from(point) > reach_sq {
                return false;
            }
            if !cell.is_leaf() {
                return true;
            }
            for &other in tree.members(cell) {
                if other > index {
                    collide_pair(nodes, predicted, index, other, params);
                }
            }
            false
        });
    }
}

fn collide_pair(
    nodes: &mut [SimulationNode],
    predicted: &[Vec2],
    first: usize,
    second: usize,
    params: CollisionParams,
) {
    let mut delta = predicted[first] - predicted[second];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.min_distance * params.min_distance {
        return;
    }

    if distance_sq <= f32::EPSILON {
        delta = fallback_direction(first, second) * JIGGLE;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((params.min_distance - distance) / distance * params.strength * 0.5);
    nodes[first].vx += push.x;
    nodes[first].vy += push.y;
    nodes[second].vx -= push.x;
    nodes[second].vy -= push.y;
}
