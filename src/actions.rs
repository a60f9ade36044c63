//! Deferred mutation queue.
//!
//! Structural mutations requested from within a render pass (expand,
//! rename commit, drop-to-move, delete) must not run mid-traversal: the
//! renderer's index bookkeeping for the current frame depends on the cache
//! staying put. Requests are captured as commands with their state bound by
//! value at enqueue time and drained in FIFO order between passes.

use std::collections::VecDeque;

use crate::error::{Result, TreeError};
use crate::selection::SelectionModel;
use crate::store::PathStore;
use crate::view::ViewCache;

/// Mutable component access handed to each drained command.
pub struct ActionCtx<'a, T, S> {
    pub store: &'a mut PathStore<T>,
    pub cache: &'a mut ViewCache<S>,
    pub selection: &'a mut SelectionModel<S>,
}

/// A deferred zero-argument command.
pub type Action<T, S> = Box<dyn FnOnce(&mut ActionCtx<'_, T, S>) -> Result<()>>;

/// FIFO queue of deferred commands.
///
/// Once enqueued a command always runs, to completion or failure; a failing
/// command's error goes to the injected handler and never blocks the
/// commands behind it. Commands enqueued while draining run in the next
/// drain.
pub struct ActionQueue<T, S> {
    queue: VecDeque<Action<T, S>>,
    on_error: Box<dyn Fn(&TreeError)>,
}

impl<T, S> ActionQueue<T, S> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            on_error: Box::new(|_| {}),
        }
    }

    /// Install the error handler invoked for each failed command.
    pub fn set_error_handler(&mut self, handler: impl Fn(&TreeError) + 'static) {
        self.on_error = Box::new(handler);
    }

    /// Append a command; it runs in the next [`ActionQueue::drain`].
    pub fn enqueue(&mut self, action: impl FnOnce(&mut ActionCtx<'_, T, S>) -> Result<()> + 'static) {
        self.queue.push_back(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run all currently queued commands in enqueue order.
    ///
    /// Call strictly once per tick, after the render pass completes and
    /// before the next begins.
    pub fn drain(&mut self, ctx: &mut ActionCtx<'_, T, S>) {
        let pending: Vec<Action<T, S>> = self.queue.drain(..).collect();
        for action in pending {
            if let Err(err) = action(ctx) {
                (self.on_error)(&err);
            }
        }
    }
}

impl<T, S> Default for ActionQueue<T, S> {
    fn default() -> Self {
        Self::new()
    }
}
