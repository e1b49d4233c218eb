use std::collections::HashSet;

/// Ids whose children are shown in the tree.
///
/// Survives data reloads untouched: entries for topics that disappeared are
/// kept, so a topic that comes back reappears expanded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionSet {
    expanded: HashSet<String>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership. Returns true if `id` is expanded afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        if !self.expanded.contains(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Seeds the set with `root_ids` when it is empty and there is at least
    /// one root. Returns whether it fired.
    ///
    /// After `collapse_all` the set is empty again, so the next non-empty
    /// snapshot re-expands the roots.
    pub fn auto_expand_roots_once<I, S>(&mut self, root_ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.expanded.is_empty() {
            return false;
        }
        self.expanded.extend(root_ids.into_iter().map(Into::into));
        !self.expanded.is_empty()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
