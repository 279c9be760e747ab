//! Directory listings as returned by the panel and as presented to the operator.

use serde::{Deserialize, Serialize};

use crate::path::{Breadcrumb, RemotePath};

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    /// Create a directory entry.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }
}

/// A rendered row of the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub name: String,
    pub is_dir: bool,
    /// Full remote path of the entry.
    pub path: RemotePath,
}

/// Everything the operator sees for one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
    pub path: RemotePath,
    /// Fixed shortcut entries, only populated at root.
    pub shortcuts: Vec<RemotePath>,
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Target of the "up" link; `None` at root.
    pub up: Option<RemotePath>,
    pub rows: Vec<ListingRow>,
}

impl DirectoryView {
    /// Build the view for `path` from fetched entries.
    ///
    /// Rows are ordered directories first, then case-insensitively by name.
    pub fn new(path: RemotePath, entries: Vec<DirEntry>, shortcuts: &[String]) -> Self {
        let mut rows: Vec<ListingRow> = entries
            .into_iter()
            .map(|entry| ListingRow {
                path: path.child(&entry.name),
                name: entry.name,
                is_dir: entry.is_dir,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        let shortcuts = if path.is_root() {
            shortcuts.iter().map(|s| RemotePath::parse(s)).collect()
        } else {
            Vec::new()
        };

        Self {
            breadcrumbs: path.breadcrumbs(),
            up: path.parent(),
            shortcuts,
            rows,
            path,
        }
    }

    /// Find a row by its full path.
    pub fn row(&self, path: &RemotePath) -> Option<&ListingRow> {
        self.rows.iter().find(|row| &row.path == path)
    }

    /// Number of rows (excluding shortcuts and the up link).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the directory has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcuts() -> Vec<String> {
        vec!["minecraft".to_string(), "backup".to_string()]
    }

    #[test]
    fn test_root_view_has_shortcuts_and_no_up_link() {
        let view = DirectoryView::new(
            RemotePath::root(),
            vec![DirEntry::dir("minecraft"), DirEntry::file("notes.txt")],
            &shortcuts(),
        );
        assert_eq!(view.shortcuts.len(), 2);
        assert!(view.up.is_none());
        assert!(view.breadcrumbs.is_empty());
        assert_eq!(view.rows[0].path.to_wire(), "minecraft");
    }

    #[test]
    fn test_nested_view_has_up_link() {
        let view = DirectoryView::new(
            RemotePath::parse("minecraft/plugins"),
            vec![DirEntry::file("Essentials.jar")],
            &shortcuts(),
        );
        assert!(view.shortcuts.is_empty());
        assert_eq!(view.up, Some(RemotePath::parse("minecraft")));
        assert_eq!(view.rows[0].path.to_wire(), "minecraft/plugins/Essentials.jar");
    }

    #[test]
    fn test_row_paths_keep_entry_names_verbatim() {
        let view = DirectoryView::new(
            RemotePath::parse("minecraft"),
            vec![
                DirEntry::file(" notes.txt"),
                DirEntry::file("a\\b.txt"),
                DirEntry::file(".."),
            ],
            &[],
        );
        let paths: Vec<String> = view.rows.iter().map(|r| r.path.to_wire()).collect();
        assert!(paths.contains(&"minecraft/ notes.txt".to_string()));
        assert!(paths.contains(&"minecraft/a\\b.txt".to_string()));
        assert!(paths.contains(&"minecraft/..".to_string()));
        assert!(view.rows.iter().all(|r| r.path.depth() == 2));

        let spaced = RemotePath::parse("minecraft").child(" notes.txt");
        assert_eq!(view.row(&spaced).map(|r| r.name.as_str()), Some(" notes.txt"));
    }

    #[test]
    fn test_rows_sorted_dirs_first() {
        let view = DirectoryView::new(
            RemotePath::root(),
            vec![
                DirEntry::file("b.txt"),
                DirEntry::dir("Zeta"),
                DirEntry::file("A.txt"),
                DirEntry::dir("alpha"),
            ],
            &[],
        );
        let names: Vec<&str> = view.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Zeta", "A.txt", "b.txt"]);
    }
}
