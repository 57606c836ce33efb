use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::config::ExplorerConfig;
use crate::dataset::{Dataset, list_datasets, load_dataset};

mod panels;
mod session;

pub use session::{Session, Workspace};

pub struct ExplorerApp {
    data_dir: PathBuf,
    datasets: Vec<String>,
    session: Session,
    state: AppState,
    search: String,
}

enum AppState {
    Loading {
        dataset: String,
        rx: Receiver<LoadMessage>,
    },
    Ready,
    Error {
        dataset: Option<String>,
        message: String,
    },
}

struct LoadMessage {
    generation: u64,
    result: Result<Dataset, String>,
}

impl ExplorerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        data_dir: PathBuf,
        initial_dataset: Option<String>,
        config: ExplorerConfig,
    ) -> Self {
        let mut app = Self {
            data_dir,
            datasets: Vec::new(),
            session: Session::new(config),
            state: AppState::Ready,
            search: String::new(),
        };
        app.rescan(initial_dataset, &cc.egui_ctx);
        app
    }

    fn rescan(&mut self, preferred: Option<String>, ctx: &Context) {
        match list_datasets(&self.data_dir) {
            Ok(datasets) => {
                log::info!(
                    "found {} datasets in {}",
                    datasets.len(),
                    self.data_dir.display()
                );
                self.datasets = datasets;
                match preferred.or_else(|| self.datasets.first().cloned()) {
                    Some(id) => self.switch_dataset(id, ctx),
                    None => {
                        self.state = AppState::Error {
                            dataset: None,
                            message: format!("No datasets found in {}", self.data_dir.display()),
                        }
                    }
                }
            }
            Err(error) => {
                log::warn!("{error:#}");
                self.state = AppState::Error {
                    dataset: None,
                    message: format!("{error:#}"),
                };
            }
        }
    }

    fn switch_dataset(&mut self, id: String, ctx: &Context) {
        let generation = self.session.begin_switch();
        log::info!("switching to dataset {id} (generation {generation})");
        self.search.clear();
        self.state = AppState::Loading {
            rx: Self::spawn_load(self.data_dir.clone(), id.clone(), generation, ctx.clone()),
            dataset: id,
        };
    }

    fn spawn_load(
        data_dir: PathBuf,
        id: String,
        generation: u64,
        ctx: Context,
    ) -> Receiver<LoadMessage> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&data_dir, &id).map_err(|error| format!("{error:#}"));
            let _ = tx.send(LoadMessage { generation, result });
            ctx.request_repaint();
        });

        rx
    }

    fn current_dataset(&self) -> Option<&str> {
        match &self.state {
            AppState::Loading { dataset, .. } => Some(dataset.as_str()),
            AppState::Error { dataset, .. } => dataset.as_deref(),
            AppState::Ready => self
                .session
                .workspace()
                .map(|workspace| workspace.dataset_id.as_str()),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let is_loading = matches!(self.state, AppState::Loading { .. });
        let requested = panels::top_bar(
            ctx,
            &self.datasets,
            self.current_dataset(),
            self.session.workspace(),
            is_loading,
        );

        let mut transition = None;
        let mut retry = None;

        match &mut self.state {
            AppState::Loading { dataset, rx } => {
                match rx.try_recv() {
                    Ok(message) => match message.result {
                        Ok(loaded) => {
                            if self.session.install(message.generation, loaded, ctx) {
                                transition = Some(AppState::Ready);
                            }
                        }
                        Err(error) => {
                            log::warn!("failed to load dataset {dataset}: {error}");
                            transition = Some(AppState::Error {
                                dataset: Some(dataset.clone()),
                                message: error,
                            });
                        }
                    },
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error {
                            dataset: Some(dataset.clone()),
                            message: "Background load worker disconnected".to_owned(),
                        });
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading dataset {dataset}..."));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error { dataset, message } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dataset");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = Some(dataset.clone());
                    }
                });
            }
            AppState::Ready => {
                let selection = self.session.selection().clone();
                if let Some(workspace) = self.session.workspace_mut() {
                    egui::SidePanel::left("controls")
                        .resizable(true)
                        .default_width(300.0)
                        .show(ctx, |ui| {
                            panels::draw_controls(ui, workspace, &selection, &mut self.search)
                        });
                    egui::CentralPanel::default().show(ctx, |ui| {
                        panels::draw_panes(ui, workspace);
                    });
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
            ctx.request_repaint();
        }
        if let Some(dataset) = retry {
            match dataset {
                Some(id) => self.switch_dataset(id, ctx),
                None => self.rescan(None, ctx),
            }
        } else if let Some(id) = requested {
            self.switch_dataset(id, ctx);
        }
    }
}
