use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

pub type ElementId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    Hover,
    Selection,
    ClearAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionNotice {
    pub revision: u64,
    pub change: SelectionChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(SelectionNotice)>;

/// Hover and selection sets shared by every pane.
///
/// Subscribers are called synchronously, in subscription order, once per
/// mutation. A call that leaves all four sets untouched is not a mutation.
#[derive(Default)]
pub struct SelectionStore {
    hovered_nodes: HashSet<ElementId>,
    hovered_edges: HashSet<ElementId>,
    selected_nodes: HashSet<ElementId>,
    selected_edges: HashSet<ElementId>,
    revision: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(SelectionNotice) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscription, _)| *subscription != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the hovered set of `kind`. An empty `ids` clears both hovered sets.
    pub fn hover(&mut self, kind: ElementKind, ids: impl IntoIterator<Item = ElementId>) {
        let ids = ids.into_iter().collect::<HashSet<_>>();
        if ids.is_empty() {
            self.clear_hover();
            return;
        }

        let hovered = self.hovered_mut(kind);
        if *hovered == ids {
            return;
        }
        *hovered = ids;
        self.notify(SelectionChange::Hover);
    }

    pub fn replace_hover(
        &mut self,
        nodes: impl IntoIterator<Item = ElementId>,
        edges: impl IntoIterator<Item = ElementId>,
    ) {
        let nodes = nodes.into_iter().collect::<HashSet<_>>();
        let edges = edges.into_iter().collect::<HashSet<_>>();
        if self.hovered_nodes == nodes && self.hovered_edges == edges {
            return;
        }
        self.hovered_nodes = nodes;
        self.hovered_edges = edges;
        self.notify(SelectionChange::Hover);
    }

    pub fn clear_hover(&mut self) {
        if self.hovered_nodes.is_empty() && self.hovered_edges.is_empty() {
            return;
        }
        self.hovered_nodes.clear();
        self.hovered_edges.clear();
        self.notify(SelectionChange::Hover);
    }

    pub fn toggle_selection(&mut self, kind: ElementKind, id: ElementId) {
        let selected = self.selected_mut(kind);
        if !selected.remove(&id) {
            selected.insert(id);
        }
        self.notify(SelectionChange::Selection);
    }

    pub fn select(&mut self, kind: ElementKind, ids: impl IntoIterator<Item = ElementId>) {
        let selected = self.selected_mut(kind);
        let mut changed = false;
        for id in ids {
            changed |= selected.insert(id);
        }
        if changed {
            self.notify(SelectionChange::Selection);
        }
    }

    pub fn deselect(&mut self, kind: ElementKind, ids: impl IntoIterator<Item = ElementId>) {
        let selected = self.selected_mut(kind);
        let mut changed = false;
        for id in ids {
            changed |= selected.remove(&id);
        }
        if changed {
            self.notify(SelectionChange::Selection);
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selected_nodes.is_empty() && self.selected_edges.is_empty() {
            return;
        }
        self.selected_nodes.clear();
        self.selected_edges.clear();
        self.notify(SelectionChange::Selection);
    }

    pub fn clear_all(&mut self) {
        if self.is_empty() {
            return;
        }
        self.hovered_nodes.clear();
        self.hovered_edges.clear();
        self.selected_nodes.clear();
        self.selected_edges.clear();
        self.notify(SelectionChange::ClearAll);
    }

    pub fn is_hovered(&self, kind: ElementKind, id: ElementId) -> bool {
        self.hovered(kind).contains(&id)
    }

    pub fn is_selected(&self, kind: ElementKind, id: ElementId) -> bool {
        self.selected(kind).contains(&id)
    }

    pub fn is_highlighted(&self, kind: ElementKind, id: ElementId) -> bool {
        self.is_hovered(kind, id) || self.is_selected(kind, id)
    }

    pub fn hovered(&self, kind: ElementKind) -> &HashSet<ElementId> {
        match kind {
            ElementKind::Node => &self.hovered_nodes,
            ElementKind::Edge => &self.hovered_edges,
        }
    }

    pub fn selected(&self, kind: ElementKind) -> &HashSet<ElementId> {
        match kind {
            ElementKind::Node => &self.selected_nodes,
            ElementKind::Edge => &self.selected_edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hovered_nodes.is_empty()
            && self.hovered_edges.is_empty()
            && self.selected_nodes.is_empty()
            && self.selected_edges.is_empty()
    }

    fn hovered_mut(&mut self, kind: ElementKind) -> &mut HashSet<ElementId> {
        match kind {
            ElementKind::Node => &mut self.hovered_nodes,
            ElementKind::Edge => &mut self.hovered_edges,
        }
    }

    fn selected_mut(&mut self, kind: ElementKind) -> &mut HashSet<ElementId> {
        match kind {
            ElementKind::Node => &mut self.selected_nodes,
            ElementKind::Edge => &mut self.selected_edges,
        }
    }

    fn notify(&mut self, change: SelectionChange) {
        self.revision += 1;
        let notice = SelectionNotice {
            revision: self.revision,
            change,
        };
        for (_, subscriber) in &mut self.subscribers {
            subscriber(notice);
        }
    }
}

/// Cloneable handle to the one store a session shares between its panes.
#[derive(Clone, Default)]
pub struct SelectionHandle(Rc<RefCell<SelectionStore>>);

impl SelectionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> Ref<'_, SelectionStore> {
        self.0.borrow()
    }

    pub fn write(&self) -> RefMut<'_, SelectionStore> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_write(&self) -> Option<RefMut<'_, SelectionStore>> {
        self.0.try_borrow_mut().ok()
    }
}
