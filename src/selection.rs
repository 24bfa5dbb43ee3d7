use std::collections::HashSet;
use std::hash::Hash;

/// Selection state for a family of ids (nodes or edges).
#[derive(Debug, Clone)]
pub struct SelectionSet<T> {
    selected: HashSet<T>,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }
}

impl<T> SelectionSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle selection of an item based on interaction modifiers
    pub fn handle_interaction(&mut self, id: T, shift_held: bool) {
        if shift_held {
            if self.selected.contains(&id) {
                self.selected.remove(&id);
            } else {
                self.selected.insert(id);
            }
        } else {
            if self.selected.len() == 1 && self.selected.contains(&id) {
                return;
            }
            self.selected.clear();
            self.selected.insert(id);
        }
    }

    /// Set an item's selected flag directly (delta application)
    pub fn set_selected(&mut self, id: T, selected: bool) {
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Clear the current selection
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Replace the current selection with a new set of IDs
    ///
    /// Useful for box selection sync
    pub fn replace_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.selected.clear();
        self.selected.extend(ids);
    }

    /// Check if an ID is selected
    pub fn contains(&self, id: &T) -> bool {
        self.selected.contains(id)
    }

    /// Get an iterator over the selected IDs
    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, T> {
        self.selected.iter()
    }

    /// Get the number of selected items
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
