mod highlight;
mod input;
mod node_link;
mod render;
mod vector_plot;

use std::cell::Cell;
use std::rc::Rc;

use eframe::egui;

use crate::selection::{ElementId, ElementKind, SelectionHandle, SelectionStore, SubscriptionId};

pub use highlight::{ElementStyle, Emphasis, Palette, fill_draw_order};
pub use input::{DragPhase, PointerFrame, PointerHit, distance_to_segment, route_click};
pub use node_link::NodeLinkPane;
pub use vector_plot::VectorPlotPane;

/// A pane's tie to the shared selection store: the change subscription and
/// the hover it is responsible for. Unsubscribes on drop.
struct SelectionLink {
    handle: SelectionHandle,
    subscription: SubscriptionId,
    last_revision: Rc<Cell<u64>>,
    owned_hover: Option<(ElementKind, ElementId)>,
}

impl SelectionLink {
    fn attach(handle: SelectionHandle, repaint: egui::Context) -> Self {
        let last_revision = Rc::new(Cell::new(handle.read().revision()));
        let seen = Rc::clone(&last_revision);
        let subscription = handle.write().subscribe(move |notice| {
            seen.set(notice.revision);
            repaint.request_repaint();
        });

        Self {
            handle,
            subscription,
            last_revision,
            owned_hover: None,
        }
    }

    fn handle(&self) -> &SelectionHandle {
        &self.handle
    }

    fn last_revision(&self) -> u64 {
        self.last_revision.get()
    }

    /// Points the shared hover at `hit`, or releases it. A release only clears
    /// the store when the hover there is still the one this pane set.
    fn set_hover(&mut self, hit: Option<(ElementKind, ElementId)>) {
        match hit {
            Some((kind, id)) => {
                if self.owned_hover == hit && holds_only(&self.handle.read(), kind, id) {
                    return;
                }
                let (nodes, edges) = match kind {
                    ElementKind::Node => (Some(id), None),
                    ElementKind::Edge => (None, Some(id)),
                };
                self.handle.write().replace_hover(nodes, edges);
                self.owned_hover = hit;
            }
            None => {
                let Some((kind, id)) = self.owned_hover.take() else {
                    return;
                };
                let mut store = self.handle.write();
                if holds_only(&store, kind, id) {
                    store.clear_hover();
                }
            }
        }
    }
}

fn holds_only(store: &SelectionStore, kind: ElementKind, id: ElementId) -> bool {
    let other = match kind {
        ElementKind::Node => ElementKind::Edge,
        ElementKind::Edge => ElementKind::Node,
    };
    store.hovered(kind).len() == 1 && store.is_hovered(kind, id) && store.hovered(other).is_empty()
}

impl Drop for SelectionLink {
    fn drop(&mut self) {
        if let Some(mut store) = self.handle.try_write() {
            store.unsubscribe(self.subscription);
        } else {
            log::warn!("selection store busy while dropping a pane; subscription leaked");
        }
    }
}
