//! Staged-move clipboard.

use indexmap::IndexSet;

use craftpanel_core::{RemotePath, ValidationError};

/// Clipboard mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMode {
    /// Nothing staged.
    #[default]
    Idle,
    /// Items were cut and wait for a paste.
    Staged,
    /// Move requests for the staged items are on the wire.
    Pasting,
}

/// Paths staged for moving.
///
/// The staged set is non-empty exactly when the mode is not idle.
#[derive(Debug, Clone, Default)]
pub struct ClipboardState {
    staged: IndexSet<RemotePath>,
    mode: ClipboardMode,
}

impl ClipboardState {
    /// Stage `paths` for moving, replacing anything staged before.
    pub fn cut(&mut self, paths: impl IntoIterator<Item = RemotePath>) -> Result<usize, ValidationError> {
        if self.mode == ClipboardMode::Pasting {
            return Err(ValidationError::PasteInFlight);
        }
        let staged: IndexSet<RemotePath> = paths.into_iter().collect();
        if staged.is_empty() {
            return Err(ValidationError::NoSelection);
        }
        self.staged = staged;
        self.mode = ClipboardMode::Staged;
        Ok(self.staged.len())
    }

    /// Enter the pasting stage and hand out the staged paths.
    pub fn begin_paste(&mut self) -> Result<Vec<RemotePath>, ValidationError> {
        match self.mode {
            ClipboardMode::Idle => Err(ValidationError::NothingStaged),
            ClipboardMode::Pasting => Err(ValidationError::PasteInFlight),
            ClipboardMode::Staged => {
                self.mode = ClipboardMode::Pasting;
                Ok(self.staged.iter().cloned().collect())
            }
        }
    }

    /// Every move request resolved; the clipboard empties regardless of outcome.
    pub fn finish_paste(&mut self) {
        self.clear();
    }

    /// Drop the staged set without issuing anything.
    pub fn cancel(&mut self) -> Result<usize, ValidationError> {
        match self.mode {
            ClipboardMode::Idle => Err(ValidationError::NothingStaged),
            ClipboardMode::Pasting => Err(ValidationError::PasteInFlight),
            ClipboardMode::Staged => {
                let count = self.staged.len();
                self.clear();
                Ok(count)
            }
        }
    }

    fn clear(&mut self) {
        self.staged.clear();
        self.mode = ClipboardMode::Idle;
    }

    pub fn mode(&self) -> ClipboardMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == ClipboardMode::Idle
    }

    /// Check whether a path is staged.
    pub fn contains(&self, path: &RemotePath) -> bool {
        self.staged.contains(path)
    }

    /// Staged paths in the order they were cut.
    pub fn paths(&self) -> impl Iterator<Item = &RemotePath> {
        self.staged.iter()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
