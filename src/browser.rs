//! Renderer-facing facade.
//!
//! [`TreeBrowser`] wires one store, one view cache, one selection model and
//! one action queue into the surface an immediate-mode renderer consumes:
//! refresh before drawing, index into rows while drawing, enqueue
//! mutations during the pass, drain them afterwards. Rendering itself is
//! out of scope; all presentation state comes through the injected
//! per-node state callback.

use std::collections::HashSet;
use std::rc::Rc;

use crate::actions::{ActionCtx, ActionQueue};
use crate::config::ViewConfig;
use crate::drag;
use crate::error::{Result, TreeError};
use crate::filter::FilterFn;
use crate::selection::SelectionModel;
use crate::store::{NodeId, PathStore, SortMode};
use crate::view::{Row, ViewCache, ViewEntry};

/// One store plus the components backing a single tree-view widget.
///
/// Additional independent views over the same data can be built by
/// constructing further [`ViewCache`] / [`SelectionModel`] pairs against
/// the shared store.
pub struct TreeBrowser<T, S> {
    pub store: PathStore<T>,
    pub cache: ViewCache<S>,
    pub selection: SelectionModel<S>,
    actions: ActionQueue<T, S>,
}

impl<T, S: 'static> TreeBrowser<T, S> {
    /// Build a browser over `items` with default view configuration.
    pub fn new(
        items: impl IntoIterator<Item = (String, T)>,
        state_fn: impl Fn(NodeId) -> S + 'static,
    ) -> Self {
        Self::with_config(items, state_fn, &ViewConfig::default())
    }

    /// Build a browser honoring a loaded [`ViewConfig`].
    pub fn with_config(
        items: impl IntoIterator<Item = (String, T)>,
        state_fn: impl Fn(NodeId) -> S + 'static,
        config: &ViewConfig,
    ) -> Self {
        let mut store = PathStore::from_items(items);
        let state_fn: Rc<dyn Fn(NodeId) -> S> = Rc::new(state_fn);
        let mut cache = ViewCache::with_shared_state(&mut store, state_fn.clone());
        cache.set_sort(config.sort());
        cache.set_auto_focus(config.auto_focus_single_match());
        let selection = SelectionModel::with_shared_state(&mut store, state_fn);
        Self {
            store,
            cache,
            selection,
            actions: ActionQueue::new(),
        }
    }

    /// Install the handler that receives errors from drained actions.
    pub fn set_error_handler(&mut self, handler: impl Fn(&TreeError) + 'static) {
        self.actions.set_error_handler(handler);
    }

    // ── Render-pass surface ──────────────────────────────────────────────

    /// Bring the cache up to date. Call once at the top of each render
    /// pass; a single-match auto-focus becomes the active selection here.
    pub fn refresh(&mut self) {
        if let Some(focused) = self.cache.ensure_fresh(&mut self.store) {
            self.selection.select_leaf(focused);
        }
    }

    /// Number of visible rows.
    pub fn count(&self) -> usize {
        self.cache.len()
    }

    /// Visible entry at `index`.
    pub fn entry(&self, index: usize) -> Option<ViewEntry> {
        self.cache.entry(index)
    }

    /// Visible row at `index`, display state included.
    pub fn row(&self, index: usize) -> Option<Row<S>> {
        self.cache.row(index)
    }

    /// First visible index satisfying the predicate (jump-to-item scroll).
    pub fn find_index(&self, pred: impl Fn(&ViewEntry) -> bool) -> Option<usize> {
        self.cache.find_index(pred)
    }

    /// Open every closed ancestor of `id`; returns whether anything
    /// changed (the cache rebuilds on the next refresh if so).
    pub fn expand_ancestors(&mut self, id: NodeId) -> bool {
        self.cache.expand_ancestors(&mut self.store, id)
    }

    /// Replace the filter predicate (`None` shows everything).
    pub fn set_filter(&mut self, filter: Option<FilterFn>) {
        self.cache.set_filter(filter);
    }

    /// Change the sibling sort order.
    pub fn set_sort(&mut self, sort: SortMode) {
        self.cache.set_sort(sort);
    }

    /// Request a full rebuild on the next refresh.
    pub fn mark_dirty(&self) {
        self.cache.mark_dirty();
    }

    // ── Deferred mutations ───────────────────────────────────────────────

    /// Record a click on a visible node. The selection/expand effect is
    /// applied on the next [`TreeBrowser::drain_actions`], never
    /// mid-render.
    pub fn click(&mut self, id: NodeId, ctrl: bool, shift: bool) {
        self.actions.enqueue(move |ctx| {
            ctx.selection.click(ctx.store, ctx.cache, id, ctrl, shift);
            Ok(())
        });
    }

    /// Defer an arbitrary structural mutation to the next drain.
    pub fn enqueue(
        &mut self,
        action: impl FnOnce(&mut ActionCtx<'_, T, S>) -> Result<()> + 'static,
    ) {
        self.actions.enqueue(action);
    }

    /// Defer deletion of a node.
    pub fn enqueue_delete(&mut self, id: NodeId) {
        self.actions.enqueue(move |ctx| ctx.store.delete(id));
    }

    /// Defer a rename commit.
    pub fn enqueue_rename(&mut self, id: NodeId, new_name: String) {
        self.actions
            .enqueue(move |ctx| ctx.store.rename(id, &new_name));
    }

    /// Record a drag-drop of `origin` (plus the current multi-selection,
    /// if any) onto `dest`.
    ///
    /// The candidate set is captured by value now, in visible cache order,
    /// so later selection changes cannot alter what moves.
    pub fn drop_onto(&mut self, origin: NodeId, dest: NodeId) {
        let mut candidates = Vec::new();
        let selected: HashSet<NodeId> = self.selection.selected_paths().into_iter().collect();
        for entry in self.cache.entries() {
            if selected.contains(&entry.id) {
                candidates.push(entry.id);
            }
        }
        // Selected nodes hidden by a collapse or filter still travel,
        // ordered by id so the move order is reproducible.
        let mut hidden: Vec<NodeId> = selected
            .into_iter()
            .filter(|id| !candidates.contains(id))
            .collect();
        hidden.sort_by_key(|id| id.raw());
        candidates.extend(hidden);
        if !candidates.contains(&origin) {
            candidates.push(origin);
        }
        self.actions
            .enqueue(move |ctx| drag::execute_moves(ctx.store, &candidates, dest).map(|_| ()));
    }

    /// Run all queued actions in order. Call strictly once between render
    /// passes.
    pub fn drain_actions(&mut self) {
        let mut ctx = ActionCtx {
            store: &mut self.store,
            cache: &mut self.cache,
            selection: &mut self.selection,
        };
        self.actions.drain(&mut ctx);
    }
}
