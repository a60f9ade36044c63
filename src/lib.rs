//! In-memory hierarchical path store with an incremental filtered tree
//! view for virtualized UIs.
//!
//! The crate backs an interactive tree-view widget that browses arbitrary
//! typed collections as if they were files in folders:
//!
//! - [`store::PathStore`] — generic node tree with naming, collision and
//!   cycle rules, plus synchronous change notifications.
//! - [`view::ViewCache`] — flattened, depth-annotated, filter-aware cache
//!   of the visible nodes, maintained incrementally across expand/collapse.
//! - [`selection::SelectionModel`] — single/multi/range selection driven by
//!   modifier keys.
//! - [`actions::ActionQueue`] — defers structural mutations raised during a
//!   render pass to a safe point between passes.
//! - [`drag`] — minimal cycle-safe move-set planning for multi-item
//!   drag-drop.
//! - [`browser::TreeBrowser`] — facade wiring the above into the surface a
//!   renderer consumes.
//!
//! Everything is single-threaded and driven by an external render/tick
//! loop; there are no internal threads and no async suspension points.

pub mod actions;
pub mod browser;
pub mod config;
pub mod drag;
pub mod error;
pub mod filter;
pub mod selection;
pub mod store;
pub mod view;

pub use actions::{Action, ActionCtx, ActionQueue};
pub use browser::TreeBrowser;
pub use config::ViewConfig;
pub use error::{Result, TreeError};
pub use filter::FilterFn;
pub use selection::SelectionModel;
pub use store::{Change, ChangeKind, NodeId, PathStore, SortMode};
pub use view::{Row, ViewCache, ViewEntry};
