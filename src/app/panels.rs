use eframe::egui::{self, Align, Context, Layout, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::selection::{ElementKind, SelectionHandle};
use crate::util::node_label;
use crate::viewport::ViewportCommand;

use super::Workspace;

const SEARCH_RESULT_LIMIT: usize = 20;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Best fuzzy matches for `query`, highest score first, ties by node index.
fn search_nodes<'a>(
    labels: impl IntoIterator<Item = (u32, &'a str)>,
    query: &str,
    limit: usize,
) -> Vec<(u32, &'a str)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut matches = labels
        .into_iter()
        .filter_map(|(node_idx, label)| {
            fuzzy_match_score(&matcher, label, query).map(|score| (score, node_idx, label))
        })
        .collect::<Vec<_>>();
    matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    matches
        .into_iter()
        .take(limit)
        .map(|(_, node_idx, label)| (node_idx, label))
        .collect()
}

/// Returns the dataset the user picked, if it differs from the current one.
pub(super) fn top_bar(
    ctx: &Context,
    datasets: &[String],
    current: Option<&str>,
    workspace: Option<&Workspace>,
    is_loading: bool,
) -> Option<String> {
    let mut requested = None;

    egui::TopBottomPanel::top("top_bar")
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("netlens");
                ui.separator();

                ui.add_enabled_ui(!is_loading && !datasets.is_empty(), |ui| {
                    egui::ComboBox::from_id_salt("dataset")
                        .selected_text(current.unwrap_or("select a dataset"))
                        .show_ui(ui, |ui| {
                            for id in datasets {
                                let is_current = current == Some(id.as_str());
                                if ui.selectable_label(is_current, id).clicked() && !is_current {
                                    requested = Some(id.clone());
                                }
                            }
                        });
                    if let Some(id) = current
                        && ui.button("Reload").clicked()
                    {
                        requested = Some(id.to_owned());
                    }
                });

                if let Some(workspace) = workspace {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(simulation) = workspace.node_link.simulation() {
                            ui.label(format!(
                                "nodes: {}  edges: {}  vectors: {}",
                                simulation.nodes().len(),
                                simulation.edges().len(),
                                workspace.vector_plot.series_count()
                            ));
                        }
                    });
                }
            });
        });

    requested
}

fn zoom_controls(ui: &mut Ui, percent: u32) -> Option<ViewportCommand> {
    let mut command = None;
    ui.horizontal(|ui| {
        if ui.button("-").on_hover_text("Zoom out").clicked() {
            command = Some(ViewportCommand::ZoomOut);
        }
        if ui.button("+").on_hover_text("Zoom in").clicked() {
            command = Some(ViewportCommand::ZoomIn);
        }
        if ui.button("Reset").clicked() {
            command = Some(ViewportCommand::Reset);
        }
        if ui.button("Fit").clicked() {
            command = Some(ViewportCommand::FitToContent);
        }
        ui.label(format!("{percent}%"));
    });
    command
}

pub(super) fn draw_controls(
    ui: &mut Ui,
    workspace: &mut Workspace,
    selection: &SelectionHandle,
    search: &mut String,
) {
    ui.heading("Views");
    ui.separator();

    ui.label("Node-link");
    if let Some(command) = zoom_controls(ui, workspace.node_link.zoom_percent()) {
        workspace.node_link.apply_command(command);
    }
    if let Some(simulation) = workspace.node_link.simulation() {
        ui.label(format!(
            "layout: {:?}  alpha {:.3}  ticks {}",
            simulation.energy(),
            simulation.alpha(),
            simulation.tick_count()
        ));
    }
    let mut show_quadtree = workspace.node_link.show_quadtree();
    if ui
        .checkbox(&mut show_quadtree, "Quadtree overlay")
        .on_hover_text("Draw the Barnes-Hut cells used for repulsion.")
        .changed()
    {
        workspace.node_link.set_show_quadtree(show_quadtree);
    }

    ui.add_space(6.0);
    ui.label("Vector plot");
    if let Some(command) = zoom_controls(ui, workspace.vector_plot.zoom_percent()) {
        workspace.vector_plot.apply_command(command);
    }
    ui.label("Keys (focused view): + / - zoom, Home reset, 0 fit");

    ui.separator();
    draw_selection(ui, workspace, selection);

    ui.separator();
    ui.label("Search nodes");
    ui.text_edit_singleline(search)
        .on_hover_text("Fuzzy match node labels; click a result to toggle its selection.");
    let results = search_nodes(
        workspace.node_link.labels(),
        search,
        SEARCH_RESULT_LIMIT,
    );
    let mut toggled = None;
    for (node_idx, label) in results {
        let is_selected = selection.read().is_selected(ElementKind::Node, node_idx);
        if ui.selectable_label(is_selected, label).clicked() {
            toggled = Some(node_idx);
        }
    }
    if let Some(node_idx) = toggled {
        selection
            .write()
            .toggle_selection(ElementKind::Node, node_idx);
    }

    let diagnostics = workspace.node_link.diagnostics();
    if !diagnostics.is_empty() {
        ui.separator();
        egui::CollapsingHeader::new(format!("Build diagnostics ({})", diagnostics.len()))
            .default_open(false)
            .show(ui, |ui| {
                egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                    for diagnostic in diagnostics {
                        ui.label(diagnostic.to_string());
                    }
                });
            });
    }
}

fn draw_selection(ui: &mut Ui, workspace: &Workspace, selection: &SelectionHandle) {
    let (mut nodes, mut edges, hovered) = {
        let store = selection.read();
        let mut hovered = store
            .hovered(ElementKind::Node)
            .iter()
            .map(|node_idx| format!("node {node_idx}"))
            .chain(
                store
                    .hovered(ElementKind::Edge)
                    .iter()
                    .map(|edge_idx| format!("edge {edge_idx}")),
            )
            .collect::<Vec<_>>();
        hovered.sort();
        (
            store
                .selected(ElementKind::Node)
                .iter()
                .copied()
                .collect::<Vec<_>>(),
            store
                .selected(ElementKind::Edge)
                .iter()
                .copied()
                .collect::<Vec<_>>(),
            hovered,
        )
    };
    nodes.sort_unstable();
    edges.sort_unstable();

    ui.label("Selection");
    if hovered.is_empty() {
        ui.weak("hover: none");
    } else {
        ui.weak(format!("hover: {}", hovered.join(", ")));
    }

    let mut removed = None;
    egui::ScrollArea::vertical()
        .id_salt("selection_list")
        .max_height(180.0)
        .show(ui, |ui| {
            for &node_idx in &nodes {
                ui.horizontal(|ui| {
                    ui.label(node_label(workspace.node_link.label(node_idx), node_idx));
                    if ui.small_button("x").clicked() {
                        removed = Some((ElementKind::Node, node_idx));
                    }
                });
            }
            for &edge_idx in &edges {
                ui.horizontal(|ui| {
                    ui.label(format!("edge {edge_idx}"));
                    if ui.small_button("x").clicked() {
                        removed = Some((ElementKind::Edge, edge_idx));
                    }
                });
            }
        });

    if let Some((kind, id)) = removed {
        selection.write().deselect(kind, [id]);
    }

    let has_selection = !nodes.is_empty() || !edges.is_empty();
    if ui
        .add_enabled(has_selection, egui::Button::new("Clear selection"))
        .clicked()
    {
        selection.write().clear_selection();
    }
}

pub(super) fn draw_panes(ui: &mut Ui, workspace: &mut Workspace) {
    ui.columns(2, |columns| {
        columns[0].label("Node-link diagram");
        workspace.node_link.show(&mut columns[0]);
        columns[1].label("Vector plot");
        workspace.vector_plot.show(&mut columns[1]);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ranks_closer_matches_first() {
        let labels = [(0, "alpha"), (1, "beta"), (2, "alphabet"), (3, "gamma")];
        let results = search_nodes(labels, "alpha", 10);
        let ids = results.iter().map(|(node_idx, _)| *node_idx).collect::<Vec<_>>();
        assert!(ids.contains(&0) && ids.contains(&2));
        assert!(!ids.contains(&3));
    }

    #[test]
    fn search_is_case_insensitive_and_limited() {
        let labels = (0..50).map(|node_idx| (node_idx, "Node")).collect::<Vec<_>>();
        assert_eq!(search_nodes(labels.clone(), "node", 5).len(), 5);
        assert!(search_nodes(labels, "   ", 5).is_empty());
    }
}
