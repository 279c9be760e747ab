//! Marked entries of the current directory.

use indexmap::IndexSet;

use craftpanel_core::RemotePath;

/// Items the operator has marked in the current directory, in marking order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    items: IndexSet<RemotePath>,
}

impl Selection {
    /// Toggle a path; returns whether it is now selected.
    pub fn toggle(&mut self, path: RemotePath) -> bool {
        if self.items.shift_remove(&path) {
            false
        } else {
            self.items.insert(path);
            true
        }
    }

    pub fn contains(&self, path: &RemotePath) -> bool {
        self.items.contains(path)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Keep only the paths accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&RemotePath) -> bool) {
        self.items.retain(|path| keep(path));
    }

    /// The selected path if exactly one is selected.
    pub fn single(&self) -> Option<&RemotePath> {
        match self.items.len() {
            1 => self.items.first(),
            _ => None,
        }
    }

    /// Take every selected path, leaving the selection empty.
    pub fn take(&mut self) -> Vec<RemotePath> {
        self.items.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemotePath> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
