//! Application state types and enums.

use strum::{Display, EnumIter, FromRepr, IntoEnumIterator};

use craftpanel_core::{DirectoryView, ListingRow, RemotePath};

/// Application mode representing the current UI state.
///
/// Remote calls never block a mode: they run in the background while the
/// operator keeps interacting in Normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    Help,
    /// Entering a new name for the selected entry.
    Renaming,
    /// Entering local paths to upload.
    Uploading,
    /// Entering a console command.
    Command,
    /// Waiting for y/n before triggering a backup.
    ConfirmBackup,
    Quit,
}

impl AppMode {
    /// Whether keys go to the text prompt instead of the keymap.
    pub fn is_input(self) -> bool {
        matches!(self, Self::Renaming | Self::Uploading | Self::Command)
    }
}

/// Active view/tab during normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, FromRepr)]
pub enum View {
    #[default]
    Files,
    Console,
    Backup,
}

impl View {
    /// Move to next view (cyclic).
    pub fn next(self) -> Self {
        let next = (self as usize + 1) % Self::iter().count();
        Self::from_repr(next).unwrap_or_default()
    }

    /// Move to previous view (cyclic).
    pub fn prev(self) -> Self {
        let count = Self::iter().count();
        let prev = (self as usize + count - 1) % count;
        Self::from_repr(prev).unwrap_or_default()
    }
}

/// One line of the Files view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEntry<'a> {
    /// Fixed root shortcut.
    Shortcut(&'a RemotePath),
    /// Link to the parent directory.
    Up(&'a RemotePath),
    Row(&'a ListingRow),
}

impl FileEntry<'_> {
    /// Where Enter on this entry navigates, if anywhere.
    pub fn target(&self) -> Option<&RemotePath> {
        match self {
            Self::Shortcut(path) | Self::Up(path) => Some(path),
            Self::Row(row) if row.is_dir => Some(&row.path),
            Self::Row(_) => None,
        }
    }
}

/// Lines of the Files view in display order: shortcuts, up link, entries.
pub fn file_entries(view: &DirectoryView) -> Vec<FileEntry<'_>> {
    view.shortcuts
        .iter()
        .map(FileEntry::Shortcut)
        .chain(view.up.iter().map(FileEntry::Up))
        .chain(view.rows.iter().map(FileEntry::Row))
        .collect()
}
