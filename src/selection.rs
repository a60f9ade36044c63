//! Modifier-key-driven selection model.
//!
//! Tracks a single active leaf (with a snapshot of its display state) plus a
//! multi-select set that is only populated while multi-select mode is
//! active. Every operation is total: no combination of clicks errors.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::store::{ChangeKind, NodeId, PathStore};
use crate::view::ViewCache;

struct SelectionState<S> {
    selected_leaf: Option<(NodeId, S)>,
    selected_paths: HashSet<NodeId>,
}

/// Selection over the ordering of one [`ViewCache`].
pub struct SelectionModel<S> {
    inner: Rc<RefCell<SelectionState<S>>>,
    state_fn: Rc<dyn Fn(NodeId) -> S>,
}

impl<S> SelectionModel<S> {
    /// Create a selection model subscribed to `store`: removal and reload
    /// notifications clear the active selection (they are treated
    /// identically).
    pub fn new<T>(store: &mut PathStore<T>, state_fn: impl Fn(NodeId) -> S + 'static) -> Self
    where
        S: 'static,
    {
        Self::with_shared_state(store, Rc::new(state_fn))
    }

    /// Like [`SelectionModel::new`] but sharing an existing state callback.
    pub fn with_shared_state<T>(
        store: &mut PathStore<T>,
        state_fn: Rc<dyn Fn(NodeId) -> S>,
    ) -> Self
    where
        S: 'static,
    {
        let inner = Rc::new(RefCell::new(SelectionState {
            selected_leaf: None,
            selected_paths: HashSet::new(),
        }));
        let observer = Rc::downgrade(&inner);
        store.subscribe(move |change| {
            let Some(inner) = observer.upgrade() else {
                return;
            };
            match change.kind {
                ChangeKind::Removed | ChangeKind::Reload => {
                    let mut state = inner.borrow_mut();
                    state.selected_leaf = None;
                    if change.kind == ChangeKind::Removed {
                        state.selected_paths.remove(&change.node);
                    } else {
                        state.selected_paths.clear();
                    }
                }
                ChangeKind::Added | ChangeKind::Moved => {}
            }
        });
        Self { inner, state_fn }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// The single active leaf, if any.
    pub fn selected_leaf(&self) -> Option<NodeId> {
        self.inner.borrow().selected_leaf.as_ref().map(|(id, _)| *id)
    }

    /// Inspect the snapshot state captured when the leaf was selected.
    pub fn with_selected_state<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.inner
            .borrow()
            .selected_leaf
            .as_ref()
            .map(|(_, state)| f(state))
    }

    /// All multi-selected nodes (unordered).
    pub fn selected_paths(&self) -> Vec<NodeId> {
        self.inner.borrow().selected_paths.iter().copied().collect()
    }

    /// Whether the node is part of the current selection (either kind).
    pub fn is_selected(&self, id: NodeId) -> bool {
        let state = self.inner.borrow();
        state.selected_paths.contains(&id)
            || state.selected_leaf.as_ref().is_some_and(|(l, _)| *l == id)
    }

    /// Whether multi-select mode is active.
    pub fn is_multi(&self) -> bool {
        !self.inner.borrow().selected_paths.is_empty()
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Handle a click on a visible node.
    ///
    /// - No modifier: a leaf becomes the active selection; a folder toggles
    ///   its expand state instead of selecting.
    /// - Ctrl: toggles the node in the multi-select set; the first toggle
    ///   folds an existing active leaf into the set so it is not lost.
    /// - Shift: range-select between the current anchor and the target when
    ///   both are visible at equal depth; a depth mismatch is routine input
    ///   and silently ignored.
    pub fn click<T>(
        &mut self,
        store: &mut PathStore<T>,
        cache: &mut ViewCache<S>,
        id: NodeId,
        ctrl: bool,
        shift: bool,
    ) {
        if !store.contains(id) {
            return;
        }
        if shift {
            self.shift_click(cache, id);
        } else if ctrl {
            self.ctrl_click(id);
        } else if store.is_leaf(id) {
            self.select_leaf(id);
        } else {
            cache.toggle(store, id);
        }
    }

    /// Make `id` the active leaf, snapshotting its display state, and leave
    /// multi-select mode.
    pub fn select_leaf(&mut self, id: NodeId) {
        let mut state = self.inner.borrow_mut();
        state.selected_leaf = Some((id, (self.state_fn)(id)));
        state.selected_paths.clear();
    }

    fn ctrl_click(&mut self, id: NodeId) {
        let mut state = self.inner.borrow_mut();
        if state.selected_paths.is_empty() {
            // Entering multi-select: fold the active leaf in first.
            if let Some((leaf, _)) = state.selected_leaf.take() {
                state.selected_paths.insert(leaf);
            }
        }
        if !state.selected_paths.remove(&id) {
            state.selected_paths.insert(id);
        }
    }

    fn shift_click(&mut self, cache: &ViewCache<S>, target: NodeId) {
        let anchor = {
            let state = self.inner.borrow();
            match (&state.selected_leaf, state.selected_paths.len()) {
                (Some((leaf, _)), 0) => Some(*leaf),
                (None, 1) => state.selected_paths.iter().next().copied(),
                _ => None,
            }
        };
        let Some(anchor) = anchor else {
            return;
        };
        let (Some(ai), Some(ti)) = (cache.index_of(anchor), cache.index_of(target)) else {
            return;
        };
        let (Some(ae), Some(te)) = (cache.entry(ai), cache.entry(ti)) else {
            return;
        };
        if ae.depth != te.depth {
            // Ambiguous across folder boundaries: silent no-op.
            return;
        }
        let (lo, hi) = if ai <= ti { (ai, ti) } else { (ti, ai) };
        let mut state = self.inner.borrow_mut();
        state.selected_leaf = None;
        for index in lo..=hi {
            if let Some(entry) = cache.entry(index) {
                state.selected_paths.insert(entry.id);
            }
        }
    }

    /// Remove a node from the multi-select set. When exactly one member
    /// remains and it is a leaf, it is promoted back to the active leaf
    /// (multi-select auto-collapses to single-select).
    pub fn remove_from_selection<T>(&mut self, store: &PathStore<T>, id: NodeId) {
        let mut state = self.inner.borrow_mut();
        state.selected_paths.remove(&id);
        if state.selected_paths.len() == 1 {
            let sole = state
                .selected_paths
                .iter()
                .next()
                .copied()
                .unwrap_or(id);
            if store.is_leaf(sole) {
                state.selected_paths.clear();
                state.selected_leaf = Some((sole, (self.state_fn)(sole)));
            }
        }
    }

    /// Empty both the active leaf and the multi-select set.
    pub fn clear(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.selected_leaf = None;
        state.selected_paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortMode;

    struct Fixture {
        store: PathStore<u32>,
        cache: ViewCache<u32>,
        selection: SelectionModel<u32>,
    }

    /// Depth-2 siblings x, y, z under A/B, everything open.
    fn fixture() -> Fixture {
        let mut store = PathStore::from_items([
            ("A/B/x".to_string(), 1),
            ("A/B/y".to_string(), 2),
            ("A/B/z".to_string(), 3),
        ]);
        let a = store.find("A").unwrap();
        let b = store.find("A/B").unwrap();
        store.set_open(a, true);
        store.set_open(b, true);
        let mut cache = ViewCache::new(&mut store, |id| id.raw() as u32);
        cache.set_sort(SortMode::Name);
        cache.ensure_fresh(&mut store);
        let selection = SelectionModel::new(&mut store, |id| id.raw() as u32);
        Fixture {
            store,
            cache,
            selection,
        }
    }

    #[test]
    fn plain_click_selects_leaf_and_clears_multi() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, false, false);
        assert_eq!(fx.selection.selected_leaf(), Some(y));
        assert!(fx.selection.selected_paths().is_empty());
    }

    #[test]
    fn plain_click_on_folder_toggles_open() {
        let mut fx = fixture();
        let b = fx.store.find("A/B").unwrap();
        let before = fx.cache.len();
        fx.selection.click(&mut fx.store, &mut fx.cache, b, false, false);
        assert!(!fx.store.is_open(b));
        assert!(fx.cache.len() < before);
        assert_eq!(fx.selection.selected_leaf(), None);
    }

    #[test]
    fn ctrl_click_folds_active_leaf_into_set() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.select_leaf(x);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        assert_eq!(fx.selection.selected_leaf(), None);
        let selected = fx.selection.selected_paths();
        assert_eq!(selected.len(), 2);
        assert!(selected.contains(&x));
        assert!(selected.contains(&y));
    }

    #[test]
    fn ctrl_click_toggles_membership() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        assert!(fx.selection.is_selected(x));
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        assert!(!fx.selection.is_selected(x));
    }

    #[test]
    fn shift_click_selects_sibling_range() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        let z = fx.store.find("A/B/z").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, false, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, z, false, true);
        let selected = fx.selection.selected_paths();
        assert_eq!(selected.len(), 3);
        for id in [x, y, z] {
            assert!(selected.contains(&id));
        }
    }

    #[test]
    fn shift_click_depth_mismatch_is_silent_noop() {
        let mut fx = fixture();
        let b = fx.store.find("A/B").unwrap();
        let z = fx.store.find("A/B/z").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, z, false, false);
        // Anchor depth 2, target depth 1
        fx.selection.click(&mut fx.store, &mut fx.cache, b, false, true);
        assert_eq!(fx.selection.selected_leaf(), Some(z));
        assert!(fx.selection.selected_paths().is_empty());
    }

    #[test]
    fn shift_click_without_single_anchor_is_noop() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        let z = fx.store.find("A/B/z").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        // Two members: no unambiguous anchor
        fx.selection.click(&mut fx.store, &mut fx.cache, z, false, true);
        assert!(!fx.selection.is_selected(z));
    }

    #[test]
    fn shift_click_anchor_from_sole_multi_member() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let z = fx.store.find("A/B/z").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, z, false, true);
        assert_eq!(fx.selection.selected_paths().len(), 3);
    }

    #[test]
    fn remove_from_selection_promotes_sole_leaf() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        fx.selection.remove_from_selection(&fx.store, y);
        assert_eq!(fx.selection.selected_leaf(), Some(x));
        assert!(fx.selection.selected_paths().is_empty());
    }

    #[test]
    fn remove_from_selection_keeps_sole_folder_in_set() {
        let mut fx = fixture();
        let b = fx.store.find("A/B").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, b, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        fx.selection.remove_from_selection(&fx.store, y);
        // Sole member is a folder: no promotion
        assert_eq!(fx.selection.selected_leaf(), None);
        assert_eq!(fx.selection.selected_paths(), vec![b]);
    }

    #[test]
    fn delete_clears_active_selection() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        fx.selection.select_leaf(x);
        fx.store.delete(x).unwrap();
        assert_eq!(fx.selection.selected_leaf(), None);
    }

    #[test]
    fn delete_of_ancestor_prunes_selected_descendants() {
        let mut fx = fixture();
        let a = fx.store.find("A").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        let w = fx.store.insert_leaf("C/w", 9).unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, w, true, false);
        fx.store.delete(a).unwrap();
        assert!(!fx.store.contains(y));
        assert!(!fx.selection.is_selected(y));
        // The survivor outside the deleted subtree stays selected.
        assert_eq!(fx.selection.selected_paths(), vec![w]);
    }

    #[test]
    fn reload_clears_selection_like_removal() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, true, false);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        fx.store.notify_reload();
        assert_eq!(fx.selection.selected_leaf(), None);
        assert!(fx.selection.selected_paths().is_empty());
    }

    #[test]
    fn snapshot_state_captured_at_selection_time() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        fx.selection.select_leaf(x);
        let snapshot = fx.selection.with_selected_state(|s| *s);
        assert_eq!(snapshot, Some(x.raw() as u32));
    }

    #[test]
    fn click_on_stale_node_is_total() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        fx.store.delete(x).unwrap();
        fx.selection.click(&mut fx.store, &mut fx.cache, x, false, false);
        assert_eq!(fx.selection.selected_leaf(), None);
    }

    #[test]
    fn clear_empties_both() {
        let mut fx = fixture();
        let x = fx.store.find("A/B/x").unwrap();
        let y = fx.store.find("A/B/y").unwrap();
        fx.selection.select_leaf(x);
        fx.selection.click(&mut fx.store, &mut fx.cache, y, true, false);
        fx.selection.clear();
        assert_eq!(fx.selection.selected_leaf(), None);
        assert!(fx.selection.selected_paths().is_empty());
    }
}
