//! Directory browser with sequence-guarded navigation.

use tracing::debug;

use craftpanel_core::{DirEntry, DirectoryView, PanelError, RemotePath};

/// What applying a listing response did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The listing is now shown. `moved` is set when the directory changed.
    Applied { moved: bool },
    /// A newer navigation was issued after this one; the response was dropped.
    Stale,
    /// The fetch failed; the current path is unchanged.
    Failed(PanelError),
}

/// Tracks the current remote directory and its rendered listing.
#[derive(Debug, Clone)]
pub struct Browser {
    current: RemotePath,
    view: Option<DirectoryView>,
    shortcuts: Vec<String>,
    issued: u64,
    pending: Option<RemotePath>,
}

impl Browser {
    pub fn new(shortcuts: Vec<String>) -> Self {
        Self {
            current: RemotePath::root(),
            view: None,
            shortcuts,
            issued: 0,
            pending: None,
        }
    }

    /// Issue a navigation and return its sequence number.
    pub fn begin(&mut self, path: RemotePath) -> u64 {
        self.issued += 1;
        self.pending = Some(path);
        self.issued
    }

    /// Apply the response of navigation `seq`.
    pub fn complete(
        &mut self,
        seq: u64,
        path: RemotePath,
        result: Result<Vec<DirEntry>, PanelError>,
    ) -> NavOutcome {
        if seq != self.issued {
            debug!(seq, latest = self.issued, %path, "dropping stale listing");
            return NavOutcome::Stale;
        }
        self.pending = None;

        match result {
            Ok(entries) => {
                let moved = path != self.current;
                self.view = Some(DirectoryView::new(path.clone(), entries, &self.shortcuts));
                self.current = path;
                NavOutcome::Applied { moved }
            }
            Err(err) => NavOutcome::Failed(err),
        }
    }

    pub fn current(&self) -> &RemotePath {
        &self.current
    }

    /// The last successfully fetched listing.
    pub fn view(&self) -> Option<&DirectoryView> {
        self.view.as_ref()
    }

    /// The path of the latest navigation still waiting for its listing.
    pub fn pending(&self) -> Option<&RemotePath> {
        self.pending.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
