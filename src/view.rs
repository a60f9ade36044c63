//! Incremental filtered-view materialization.
//!
//! [`ViewCache`] keeps a flattened, depth-annotated sequence of the nodes
//! currently visible in the tree view, so a virtualized renderer can index
//! straight into it without rescanning the tree every frame. The sequence is
//! a pre-order walk that only descends into open folders, restricted to
//! nodes that pass the filter directly or (for folders) through a matching
//! descendant.

use std::cell::Cell;
use std::rc::Rc;

use crate::filter::FilterFn;
use crate::store::{NodeId, PathStore, SortMode};

/// One cache entry: a visible node and its indentation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEntry {
    pub id: NodeId,
    pub depth: usize,
}

/// A renderable row: entry plus the caller-supplied per-node display state.
#[derive(Debug)]
pub struct Row<S> {
    pub id: NodeId,
    pub depth: usize,
    pub state: S,
}

/// Flattened visible-node cache over one [`PathStore`].
///
/// Several independent caches may observe the same store; each keeps its own
/// entries, filter and dirty flag. The dirty flag is raised by the store
/// subscription (established at construction), by filter changes, and by
/// [`ViewCache::mark_dirty`]; it is cleared exactly once, lazily, in
/// [`ViewCache::ensure_fresh`].
pub struct ViewCache<S> {
    entries: Vec<ViewEntry>,
    dirty: Rc<Cell<bool>>,
    filter: Option<FilterFn>,
    sort: SortMode,
    auto_focus: bool,
    state_fn: Rc<dyn Fn(NodeId) -> S>,
}

impl<S> ViewCache<S> {
    /// Create a cache subscribed to `store`, with an injected callback that
    /// supplies per-node display state.
    pub fn new<T>(store: &mut PathStore<T>, state_fn: impl Fn(NodeId) -> S + 'static) -> Self {
        Self::with_shared_state(store, Rc::new(state_fn))
    }

    /// Like [`ViewCache::new`] but sharing an existing state callback.
    pub fn with_shared_state<T>(
        store: &mut PathStore<T>,
        state_fn: Rc<dyn Fn(NodeId) -> S>,
    ) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = dirty.clone();
        store.subscribe(move |_| flag.set(true));
        Self {
            entries: Vec::new(),
            dirty,
            filter: None,
            sort: SortMode::default(),
            auto_focus: true,
            state_fn,
        }
    }

    /// Replace the filter predicate (`None` shows everything).
    pub fn set_filter(&mut self, filter: Option<FilterFn>) {
        self.filter = filter;
        self.mark_dirty();
    }

    /// Change the sibling sort order.
    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        self.mark_dirty();
    }

    /// Enable or disable single-match auto-focus.
    pub fn set_auto_focus(&mut self, enabled: bool) {
        self.auto_focus = enabled;
    }

    /// Request a full rebuild on the next [`ViewCache::ensure_fresh`].
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Whether a rebuild is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    // ── Query surface ────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<ViewEntry> {
        self.entries.get(index).copied()
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    /// Entry plus display state, produced through the injected callback.
    pub fn row(&self, index: usize) -> Option<Row<S>> {
        self.entries.get(index).map(|e| Row {
            id: e.id,
            depth: e.depth,
            state: (self.state_fn)(e.id),
        })
    }

    /// First index whose entry satisfies the predicate (jump-to-item scroll).
    pub fn find_index(&self, pred: impl Fn(&ViewEntry) -> bool) -> Option<usize> {
        self.entries.iter().position(pred)
    }

    /// Cache index of a node, if currently visible.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    // ── Rebuild ──────────────────────────────────────────────────────────

    /// Rebuild the cache if dirty; clears the flag exactly once.
    ///
    /// Returns the single-match auto-focus target when a rebuild found
    /// exactly one matching leaf in the whole tree: its ancestors have been
    /// auto-opened and the caller should make it the active selection.
    pub fn ensure_fresh<T>(&mut self, store: &mut PathStore<T>) -> Option<NodeId> {
        if !self.dirty.get() {
            return None;
        }
        self.dirty.set(false);
        let matched = self.rebuild(store);
        if self.auto_focus && self.filter.is_some() && matched.len() == 1 {
            let target = matched[0];
            if open_ancestors(store, target) {
                self.rebuild(store);
            }
            return Some(target);
        }
        None
    }

    /// Open every closed ancestor folder of `id` so it can become visible.
    ///
    /// Returns whether anything changed; marks the cache dirty when it did.
    pub fn expand_ancestors<T>(&mut self, store: &mut PathStore<T>, id: NodeId) -> bool {
        let changed = open_ancestors(store, id);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    fn rebuild<T>(&mut self, store: &PathStore<T>) -> Vec<NodeId> {
        let mut entries = Vec::new();
        let mut matched = Vec::new();
        for child in store
            .children(store.root(), self.sort)
            .unwrap_or_default()
        {
            self.visit(store, child, 0, &mut entries, &mut matched);
        }
        self.entries = entries;
        matched
    }

    /// Pre-order visit of one node. Folders are inserted speculatively and
    /// the whole inserted span is rolled back when the subtree turns out to
    /// contain zero matches, which avoids a separate bottom-up visibility
    /// pre-pass. Returns whether the subtree contained any match.
    fn visit<T>(
        &self,
        store: &PathStore<T>,
        id: NodeId,
        depth: usize,
        out: &mut Vec<ViewEntry>,
        matched: &mut Vec<NodeId>,
    ) -> bool {
        let name = store.name(id).unwrap_or_default().to_string();
        if store.is_leaf(id) {
            let hit = self.passes(&name);
            if hit {
                out.push(ViewEntry { id, depth });
                if self.filter.is_some() {
                    matched.push(id);
                }
            }
            return hit;
        }

        let mark = out.len();
        out.push(ViewEntry { id, depth });
        let mut any = self.passes(&name);
        if store.is_open(id) {
            for child in store.children(id, self.sort).unwrap_or_default() {
                if self.visit(store, child, depth + 1, out, matched) {
                    any = true;
                }
            }
        } else if self.filter.is_some() && self.probe(store, id, matched) {
            // Closed folders are probed for visibility only, not
            // materialized.
            any = true;
        }
        if !any {
            out.truncate(mark);
        }
        any
    }

    /// Scan a closed folder's subtree for matches without emitting entries.
    /// Matching leaves are still recorded for single-match auto-focus.
    fn probe<T>(&self, store: &PathStore<T>, folder: NodeId, matched: &mut Vec<NodeId>) -> bool {
        let mut any = false;
        for child in store
            .children(folder, SortMode::Insertion)
            .unwrap_or_default()
        {
            let name = store.name(child).unwrap_or_default().to_string();
            if store.is_leaf(child) {
                if self.passes(&name) {
                    matched.push(child);
                    any = true;
                }
            } else {
                if self.passes(&name) {
                    any = true;
                }
                if self.probe(store, child, matched) {
                    any = true;
                }
            }
        }
        any
    }

    fn passes(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|f| f(name))
    }

    // ── Incremental expand / collapse ────────────────────────────────────

    /// Open the folder at `index` and splice its visible filtered subtree
    /// right after it, leaving the rest of the cache untouched.
    pub fn expand<T>(&mut self, store: &mut PathStore<T>, index: usize) {
        let Some(entry) = self.entry(index) else {
            return;
        };
        if !store.is_folder(entry.id) || store.is_open(entry.id) {
            return;
        }
        store.set_open(entry.id, true);
        let mut rows = Vec::new();
        let mut matched = Vec::new();
        for child in store.children(entry.id, self.sort).unwrap_or_default() {
            self.visit(store, child, entry.depth + 1, &mut rows, &mut matched);
        }
        self.entries.splice(index + 1..index + 1, rows);
    }

    /// Close the folder at `index` and remove the contiguous span of
    /// following entries deeper than it. Cost is proportional to the
    /// removed span, not to tree size.
    pub fn collapse<T>(&mut self, store: &mut PathStore<T>, index: usize) {
        let Some(entry) = self.entry(index) else {
            return;
        };
        if !store.is_folder(entry.id) || !store.is_open(entry.id) {
            return;
        }
        store.set_open(entry.id, false);
        let mut end = index + 1;
        while end < self.entries.len() && self.entries[end].depth > entry.depth {
            end += 1;
        }
        self.entries.drain(index + 1..end);
    }

    /// Expand or collapse a visible folder by id.
    pub fn toggle<T>(&mut self, store: &mut PathStore<T>, id: NodeId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        if store.is_open(id) {
            self.collapse(store, index);
        } else {
            self.expand(store, index);
        }
    }
}

/// Open all closed ancestors of `id`. Returns whether any state changed.
fn open_ancestors<T>(store: &mut PathStore<T>, id: NodeId) -> bool {
    let mut changed = false;
    let mut cur = store.parent(id);
    while let Some(folder) = cur {
        if folder != store.root() && !store.is_open(folder) {
            store.set_open(folder, true);
            changed = true;
        }
        cur = store.parent(folder);
    }
    changed
}
