use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use eframe::egui::vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::dataset::{EdgeRecord, NodeRecord};
use crate::viewport::SurfaceSize;

use super::forces::link_params;
use super::{LayoutConfig, Simulation, SimulationEdge, SimulationNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildDiagnostic {
    #[error("edge {edge_idx} {} references unknown node {node_idx}", .endpoint.label())]
    UnresolvedEndpoint {
        edge_idx: u32,
        endpoint: Endpoint,
        node_idx: u32,
    },
    #[error("node {node_idx} appears more than once; keeping the first record")]
    DuplicateNode { node_idx: u32 },
    #[error("edge {edge_idx} appears more than once; keeping the first record")]
    DuplicateEdge { edge_idx: u32 },
}

pub struct SimulationBuild {
    pub simulation: Simulation,
    pub diagnostics: Vec<BuildDiagnostic>,
}

impl Simulation {
    /// Builds a simulation for one dataset. Bad records are reported in the
    /// returned diagnostics and skipped; the rest of the graph still builds.
    pub fn build(
        nodes: &[NodeRecord],
        edges: &[EdgeRecord],
        surface: SurfaceSize,
        config: &LayoutConfig,
        generation: u64,
    ) -> SimulationBuild {
        let mut diagnostics = Vec::new();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let width = surface.width.max(1.0);
        let height = surface.height.max(1.0);

        let mut sim_nodes = Vec::with_capacity(nodes.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for record in nodes {
            match index_by_id.entry(record.node_idx) {
                Entry::Occupied(_) => {
                    diagnostics.push(BuildDiagnostic::DuplicateNode {
                        node_idx: record.node_idx,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(sim_nodes.len());
                    sim_nodes.push(SimulationNode {
                        node_idx: record.node_idx,
                        x: rng.random_range(0.0..width),
                        y: rng.random_range(0.0..height),
                        vx: 0.0,
                        vy: 0.0,
                        fx: None,
                        fy: None,
                    });
                }
            }
        }

        let mut sim_edges = Vec::with_capacity(edges.len());
        let mut seen_edges = HashSet::with_capacity(edges.len());
        for record in edges {
            if !seen_edges.insert(record.edge_idx) {
                diagnostics.push(BuildDiagnostic::DuplicateEdge {
                    edge_idx: record.edge_idx,
                });
                continue;
            }

            let source = index_by_id.get(&record.source).copied();
            let target = index_by_id.get(&record.target).copied();
            if source.is_none() {
                diagnostics.push(BuildDiagnostic::UnresolvedEndpoint {
                    edge_idx: record.edge_idx,
                    endpoint: Endpoint::Source,
                    node_idx: record.source,
                });
            }
            if target.is_none() {
                diagnostics.push(BuildDiagnostic::UnresolvedEndpoint {
                    edge_idx: record.edge_idx,
                    endpoint: Endpoint::Target,
                    node_idx: record.target,
                });
            }

            if let (Some(source), Some(target)) = (source, target) {
                sim_edges.push(SimulationEdge {
                    edge_idx: record.edge_idx,
                    source,
                    target,
                });
            }
        }

        for diagnostic in &diagnostics {
            log::warn!("layout build (generation {generation}): {diagnostic}");
        }
        log::debug!(
            "built simulation generation {generation}: {} nodes, {} edges, {} diagnostics",
            sim_nodes.len(),
            sim_edges.len(),
            diagnostics.len()
        );

        let links = link_params(sim_nodes.len(), &sim_edges);
        let running = !sim_nodes.is_empty();

        SimulationBuild {
            simulation: Simulation {
                nodes: sim_nodes,
                edges: sim_edges,
                index_by_id,
                links,
                config: config.clone(),
                center: vec2(surface.width * 0.5, surface.height * 0.5),
                alpha: 1.0,
                alpha_target: 0.0,
                pinned: Default::default(),
                running,
                torn_down: false,
                generation,
                tick_count: 0,
                scratch: Default::default(),
            },
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn nodes(ids: &[u32]) -> Vec<NodeRecord> {
        ids.iter()
            .map(|&node_idx| NodeRecord {
                node_idx,
                label: None,
                value: None,
            })
            .collect()
    }

    fn edge(edge_idx: u32, source: u32, target: u32) -> EdgeRecord {
        EdgeRecord {
            edge_idx,
            source,
            target,
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            seed: Some(7),
            ..LayoutConfig::default()
        }
    }

    fn connectivity(simulation: &Simulation) -> BTreeSet<(u32, u32, u32)> {
        simulation
            .edges()
            .iter()
            .map(|edge| {
                (
                    edge.edge_idx,
                    simulation.nodes()[edge.source].node_idx,
                    simulation.nodes()[edge.target].node_idx,
                )
            })
            .collect()
    }

    #[test]
    fn initial_positions_fall_inside_surface() {
        let surface = SurfaceSize::new(300.0, 120.0);
        let build = Simulation::build(&nodes(&[1, 2, 3, 4]), &[], surface, &config(), 1);
        for node in build.simulation.nodes() {
            assert!((0.0..300.0).contains(&node.x));
            assert!((0.0..120.0).contains(&node.y));
        }
    }

    #[test]
    fn unresolved_edges_are_reported_and_skipped() {
        let edges = vec![edge(0, 1, 2), edge(1, 2, 99), edge(2, 42, 43)];
        let build = Simulation::build(
            &nodes(&[1, 2, 3]),
            &edges,
            SurfaceSize::new(100.0, 100.0),
            &config(),
            1,
        );

        assert_eq!(connectivity(&build.simulation), BTreeSet::from([(0, 1, 2)]));
        assert_eq!(
            build.diagnostics,
            vec![
                BuildDiagnostic::UnresolvedEndpoint {
                    edge_idx: 1,
                    endpoint: Endpoint::Target,
                    node_idx: 99,
                },
                BuildDiagnostic::UnresolvedEndpoint {
                    edge_idx: 2,
                    endpoint: Endpoint::Source,
                    node_idx: 42,
                },
                BuildDiagnostic::UnresolvedEndpoint {
                    edge_idx: 2,
                    endpoint: Endpoint::Target,
                    node_idx: 43,
                },
            ]
        );
        assert_eq!(build.simulation.nodes().len(), 3);
    }

    #[test]
    fn rebuilding_resolves_the_same_structure() {
        let node_list = nodes(&[10, 20, 30, 40]);
        let edges = vec![edge(5, 10, 20), edge(6, 20, 30), edge(7, 40, 10), edge(8, 30, 77)];
        let surface = SurfaceSize::new(100.0, 100.0);

        let first = Simulation::build(&node_list, &edges, surface, &LayoutConfig::default(), 1);
        let second = Simulation::build(&node_list, &edges, surface, &LayoutConfig::default(), 2);

        let ids = |simulation: &Simulation| {
            simulation
                .nodes()
                .iter()
                .map(|node| node.node_idx)
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(ids(&first.simulation), ids(&second.simulation));
        assert_eq!(
            connectivity(&first.simulation),
            connectivity(&second.simulation)
        );
        assert_eq!(
            connectivity(&first.simulation),
            BTreeSet::from([(5, 10, 20), (6, 20, 30), (7, 40, 10)])
        );
    }

    #[test]
    fn duplicates_keep_first_record() {
        let edges = vec![edge(0, 1, 2), edge(0, 2, 1)];
        let build = Simulation::build(
            &nodes(&[1, 2, 1]),
            &edges,
            SurfaceSize::new(50.0, 50.0),
            &config(),
            1,
        );

        assert_eq!(build.simulation.nodes().len(), 2);
        assert_eq!(build.simulation.edges().len(), 1);
        assert_eq!(
            build.diagnostics,
            vec![
                BuildDiagnostic::DuplicateNode { node_idx: 1 },
                BuildDiagnostic::DuplicateEdge { edge_idx: 0 },
            ]
        );
    }

    #[test]
    fn diagnostics_render_readable_messages() {
        let diagnostic = BuildDiagnostic::UnresolvedEndpoint {
            edge_idx: 4,
            endpoint: Endpoint::Source,
            node_idx: 12,
        };
        assert_eq!(
            diagnostic.to_string(),
            "edge 4 source references unknown node 12"
        );
    }

    #[test]
    fn empty_graph_builds_an_idle_simulation() {
        let build = Simulation::build(&[], &[], SurfaceSize::new(100.0, 100.0), &config(), 1);
        assert!(build.simulation.nodes().is_empty());
        assert!(!build.simulation.is_running());
        assert!(build.diagnostics.is_empty());
    }

    #[test]
    fn degenerate_surface_still_places_nodes() {
        let build = Simulation::build(&nodes(&[1, 2]), &[], SurfaceSize::default(), &config(), 1);
        assert_eq!(build.simulation.nodes().len(), 2);
        for node in build.simulation.nodes() {
            assert!(node.x.is_finite() && node.y.is_finite());
        }
    }
}
