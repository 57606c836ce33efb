use eframe::egui;

use crate::config::ExplorerConfig;
use crate::dataset::Dataset;
use crate::pane::{NodeLinkPane, VectorPlotPane};
use crate::selection::SelectionHandle;

/// Everything bound to one installed dataset.
pub struct Workspace {
    pub dataset_id: String,
    pub node_link: NodeLinkPane,
    pub vector_plot: VectorPlotPane,
}

/// Owns the shared selection store and the currently installed dataset.
pub struct Session {
    selection: SelectionHandle,
    config: ExplorerConfig,
    generation: u64,
    workspace: Option<Workspace>,
}

impl Session {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            selection: SelectionHandle::new(),
            config,
            generation: 0,
            workspace: None,
        }
    }

    pub fn selection(&self) -> &SelectionHandle {
        &self.selection
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        self.workspace.as_mut()
    }

    /// Tears down the current panes and empties the store, then returns the
    /// generation the next dataset must be installed under.
    pub fn begin_switch(&mut self) -> u64 {
        if let Some(workspace) = self.workspace.take() {
            log::info!("leaving dataset {}", workspace.dataset_id);
        }
        self.selection.write().clear_all();
        self.generation += 1;
        self.generation
    }

    /// Installs `dataset` if `generation` is still current. Results of an
    /// abandoned switch are dropped.
    pub fn install(&mut self, generation: u64, dataset: Dataset, repaint: &egui::Context) -> bool {
        if generation != self.generation {
            log::debug!(
                "discarding dataset {} for stale generation {generation} (current {})",
                dataset.id,
                self.generation
            );
            return false;
        }

        log::info!("installing dataset {} as generation {generation}", dataset.id);
        let node_link = NodeLinkPane::new(
            self.selection.clone(),
            dataset.graph,
            &self.config,
            generation,
            repaint.clone(),
        );
        let vector_plot = VectorPlotPane::new(
            self.selection.clone(),
            dataset.vectors,
            &self.config,
            generation,
            repaint.clone(),
        );
        self.workspace = Some(Workspace {
            dataset_id: dataset.id,
            node_link,
            vector_plot,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{GraphData, NodeRecord, NodeVector};
    use crate::selection::ElementKind;

    use super::*;

    fn dataset(id: &str) -> Dataset {
        Dataset {
            id: id.to_owned(),
            graph: Some(GraphData {
                nodes: vec![NodeRecord {
                    node_idx: 1,
                    label: None,
                    value: None,
                }],
                edges: Vec::new(),
            }),
            vectors: Some(vec![NodeVector {
                node_idx: 1,
                values: vec![1.0, 2.0],
            }]),
        }
    }

    #[test]
    fn switching_datasets_isolates_selection_and_subscribers() {
        let ctx = egui::Context::default();
        let mut session = Session::new(ExplorerConfig::default());

        let first = session.begin_switch();
        assert!(session.install(first, dataset("a"), &ctx));
        assert_eq!(session.selection().read().subscriber_count(), 2);
        {
            let mut store = session.selection().write();
            store.toggle_selection(ElementKind::Node, 1);
            store.hover(ElementKind::Edge, [4]);
        }

        let second = session.begin_switch();
        assert!(session.workspace().is_none());
        assert!(session.selection().read().is_empty());
        assert_eq!(session.selection().read().subscriber_count(), 0);

        assert!(!session.install(first, dataset("a"), &ctx));
        assert!(session.workspace().is_none());

        assert!(session.install(second, dataset("b"), &ctx));
        let workspace = session.workspace().unwrap();
        assert_eq!(workspace.dataset_id, "b");
        assert_eq!(workspace.node_link.generation(), second);
        assert_eq!(workspace.vector_plot.generation(), second);
        assert!(session.selection().read().is_empty());
        assert_eq!(session.selection().read().subscriber_count(), 2);
    }

    #[test]
    fn missing_sub_resources_still_install() {
        let ctx = egui::Context::default();
        let mut session = Session::new(ExplorerConfig::default());
        let generation = session.begin_switch();
        let empty = Dataset {
            id: "bare".to_owned(),
            ..Dataset::default()
        };

        assert!(session.install(generation, empty, &ctx));
        let workspace = session.workspace().unwrap();
        assert!(!workspace.node_link.has_data());
        assert!(!workspace.vector_plot.has_data());
    }
}
