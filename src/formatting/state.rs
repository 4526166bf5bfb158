// src/formatting/state.rs
//! Numbering state threaded through one top-level render call.
//!
//! The context is owned by a single render and passed down by `&mut`; two
//! renders never share one, which keeps rendering pure from the caller's
//! point of view.

use std::collections::BTreeMap;

/// Per-depth numbered-list counters.
///
/// An absent entry means the next numbered item at that depth is `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    counters: BTreeMap<usize, usize>,
}

impl RenderContext {
    /// Creates a new, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number for the next numbered item at `depth` and advances
    /// the counter.
    pub fn next_number(&mut self, depth: usize) -> usize {
        let counter = self.counters.entry(depth).or_insert(1);
        let current = *counter;
        *counter += 1;
        current
    }

    /// Restarts numbering at `depth`. Called for every non-numbered block.
    pub fn reset(&mut self, depth: usize) {
        self.counters.remove(&depth);
    }

    /// Clears every counter deeper than `parent_depth` before descending into
    /// a block's children, so sibling subtrees never share numbering.
    pub fn enter_children(&mut self, parent_depth: usize) {
        let _deeper = self.counters.split_off(&(parent_depth + 1));
    }

    /// Whether no counter is active.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
