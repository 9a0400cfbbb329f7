//! Back-navigation stack of visited catalogs.
use crate::catalog::Catalog;

/// Ordered stack of loaded catalogs; the last one is on screen.
///
/// Following a catalog link pushes; going back pops; submitting a new
/// top-level URL starts over.
#[derive(Debug, Clone, Default)]
pub struct CatalogHistory {
    stack: Vec<Catalog>,
}

impl CatalogHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly loaded catalog and makes it current.
    pub fn push(&mut self, catalog: Catalog) {
        self.stack.push(catalog);
    }

    /// Clears the stack and starts again from `catalog`.
    pub fn reset(&mut self, catalog: Catalog) {
        self.stack.clear();
        self.stack.push(catalog);
    }

    /// Drops the current catalog and returns the one before it.
    ///
    /// Does nothing (returns `None`) when there is nowhere to go back to.
    pub fn back(&mut self) -> Option<&Catalog> {
        if !self.can_go_back() {
            return None;
        }
        self.stack.pop();
        self.stack.last()
    }

    pub fn current(&self) -> Option<&Catalog> {
        self.stack.last()
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
