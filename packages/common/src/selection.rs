use std::collections::BTreeSet;

/// Row identifiers checked for a bulk operation.
///
/// Lives only as long as the view that owns it and is cleared whenever the
/// visible rows change (see [`crate::table::TableController`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<i32>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row. Returns whether the row is selected afterwards.
    pub fn toggle(&mut self, id: i32) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn select(&mut self, id: i32) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: i32) {
        self.selected.remove(&id);
    }

    /// Header checkbox: select every visible row, or deselect them all when
    /// they are already selected.
    pub fn toggle_all(&mut self, visible: &[i32]) {
        if self.all_selected(visible) {
            for id in visible {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(visible.iter().copied());
        }
    }

    /// True when `visible` is non-empty and every id in it is selected.
    pub fn all_selected(&self, visible: &[i32]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id))
    }

    pub fn is_selected(&self, id: i32) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected ids in ascending order, ready for a bulk-delete request.
    pub fn ids(&self) -> Vec<i32> {
        self.selected.iter().copied().collect()
    }
}
