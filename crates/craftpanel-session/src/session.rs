//! The operator session: every piece of client state and its transitions.
//!
//! Operator actions validate locally and return the [`Effect`]s (remote
//! calls) to perform. Completions of those calls come back as
//! [`SessionEvent`]s and are applied in arrival order. Nothing here touches
//! the network, so every transition is testable without a runtime.

use std::time::Duration;

use chrono::Local;
use tracing::{debug, warn};

use craftpanel_core::{
    DirEntry, LogChannel, PanelConfig, PanelError, PushEvent, RemotePath, ValidationError,
};
use craftpanel_ops::{
    OperationComplete, OperationProgress, TransferProgress, UploadFile, prepare_rename,
};

use crate::browser::{Browser, NavOutcome};
use crate::clipboard::ClipboardState;
use crate::lifecycle::{ControlIntent, Lifecycle};
use crate::notice::Notice;
use crate::reconciler::Reconciler;
use crate::selection::Selection;
use crate::upload::UploadPipeline;

/// A remote call the session wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the listing for navigation `seq`.
    FetchListing { seq: u64, path: RemotePath },
    /// Move every source into `destination`, one request each.
    MoveBatch {
        sources: Vec<RemotePath>,
        destination: RemotePath,
    },
    Rename {
        source: RemotePath,
        new_name: String,
    },
    Upload {
        job: u64,
        files: Vec<UploadFile>,
        destination: RemotePath,
    },
    Control(ControlIntent),
    /// Query the running state once `after` has elapsed.
    QueryStatus { after: Duration },
    TriggerBackup,
    SendCommand(String),
}

/// Completion (or progress) of a remote call, fed back into the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Listing {
        seq: u64,
        path: RemotePath,
        result: Result<Vec<DirEntry>, PanelError>,
    },
    MoveProgress(OperationProgress),
    PasteFinished {
        destination: RemotePath,
        complete: OperationComplete,
    },
    RenameFinished {
        source: RemotePath,
        result: Result<String, PanelError>,
    },
    UploadProgress {
        job: u64,
        progress: TransferProgress,
    },
    UploadFinished {
        job: u64,
        destination: RemotePath,
        result: Result<String, PanelError>,
    },
    ControlFinished {
        intent: ControlIntent,
        result: Result<String, PanelError>,
    },
    StatusFinished(Result<bool, PanelError>),
    BackupFinished(Result<String, PanelError>),
    CommandFinished {
        command: String,
        result: Result<String, PanelError>,
    },
    Push(PushEvent),
}

/// All client state, mutated only through this type.
#[derive(Debug, Clone)]
pub struct Session {
    browser: Browser,
    selection: Selection,
    clipboard: ClipboardState,
    uploads: UploadPipeline,
    reconciler: Reconciler,
    lifecycle: Lifecycle,
    notice: Option<Notice>,
    batch_progress: Option<OperationProgress>,
    last_batch: Option<OperationComplete>,
    settle_delay: Duration,
}

impl Session {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            browser: Browser::new(config.shortcuts.clone()),
            selection: Selection::default(),
            clipboard: ClipboardState::default(),
            uploads: UploadPipeline::default(),
            reconciler: Reconciler::default(),
            lifecycle: Lifecycle::default(),
            notice: None,
            batch_progress: None,
            last_batch: None,
            settle_delay: config.settle_delay(),
        }
    }

    // ----- accessors -----

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn current_path(&self) -> &RemotePath {
        self.browser.current()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &ClipboardState {
        &self.clipboard
    }

    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Progress of the paste currently on the wire.
    pub fn batch_progress(&self) -> Option<&OperationProgress> {
        self.batch_progress.as_ref()
    }

    /// Result of the most recent paste.
    pub fn last_batch(&self) -> Option<&OperationComplete> {
        self.last_batch.as_ref()
    }

    /// Rename is offered only with exactly one selected item.
    pub fn can_rename(&self) -> bool {
        self.selection.single().is_some()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ----- navigation -----

    /// Navigate to `path`; the current path changes when the listing arrives.
    pub fn navigate(&mut self, path: RemotePath) -> Vec<Effect> {
        let seq = self.browser.begin(path.clone());
        debug!(seq, %path, "navigate");
        vec![Effect::FetchListing { seq, path }]
    }

    /// Re-fetch the current directory.
    pub fn refresh(&mut self) -> Vec<Effect> {
        self.navigate(self.browser.current().clone())
    }

    /// Navigate to the parent directory; nothing happens at root.
    pub fn go_up(&mut self) -> Vec<Effect> {
        match self.browser.current().parent() {
            Some(parent) => self.navigate(parent),
            None => Vec::new(),
        }
    }

    // ----- selection & clipboard -----

    /// Toggle one item's selection.
    pub fn toggle_select(&mut self, path: RemotePath) -> Result<bool, ValidationError> {
        if !self.clipboard.is_idle() {
            return self.reject(ValidationError::SelectionLocked);
        }
        Ok(self.selection.toggle(path))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Stage the selection for moving and clear it.
    pub fn cut(&mut self) -> Result<usize, ValidationError> {
        let paths = self.selection.take();
        self.cut_paths(paths)
    }

    /// Stage explicit paths for moving.
    pub fn cut_paths(&mut self, paths: Vec<RemotePath>) -> Result<usize, ValidationError> {
        let result = self.clipboard.cut(paths);
        let count = self.check(result)?;
        self.notice = Some(Notice::info(format!(
            "{count} item(s) staged. Navigate to the destination and paste."
        )));
        Ok(count)
    }

    /// Move everything staged into the current directory.
    pub fn paste(&mut self) -> Result<Vec<Effect>, ValidationError> {
        let result = self.clipboard.begin_paste();
        let sources = self.check(result)?;
        let destination = self.browser.current().clone();
        self.notice = Some(Notice::info(format!(
            "Moving {} item(s) to {destination}...",
            sources.len()
        )));
        Ok(vec![Effect::MoveBatch {
            sources,
            destination,
        }])
    }

    /// Drop the staged set without moving anything.
    pub fn cancel(&mut self) -> Result<usize, ValidationError> {
        let result = self.clipboard.cancel();
        let count = self.check(result)?;
        self.notice = Some(Notice::info("Move cancelled."));
        Ok(count)
    }

    /// Rename the single selected item.
    pub fn rename(&mut self, new_name: &str) -> Result<Vec<Effect>, ValidationError> {
        let Some(source) = self.selection.single().cloned() else {
            let err = match self.selection.len() {
                0 => ValidationError::NoSelection,
                selected => ValidationError::RenameNeedsSingleSelection { selected },
            };
            return self.reject(err);
        };

        let prepared = prepare_rename(&source, new_name);
        match self.check(prepared)? {
            Some(new_name) => Ok(vec![Effect::Rename { source, new_name }]),
            None => Ok(Vec::new()),
        }
    }

    // ----- uploads -----

    /// Record the local files to upload.
    pub fn choose_files(&mut self, files: Vec<UploadFile>) {
        self.uploads.choose(files);
    }

    /// Upload the chosen files into `destination`.
    pub fn upload(&mut self, destination: RemotePath) -> Result<Vec<Effect>, ValidationError> {
        let result = self.uploads.begin(destination);
        let (job, files) = self.check(result)?;
        self.notice = Some(Notice::info(format!(
            "Uploading {} file(s) to {}...",
            files.len(),
            job.destination
        )));
        Ok(vec![Effect::Upload {
            job: job.id,
            files,
            destination: job.destination,
        }])
    }

    // ----- lifecycle -----

    pub fn start(&mut self) -> Result<Vec<Effect>, ValidationError> {
        self.control(ControlIntent::Start)
    }

    pub fn stop(&mut self) -> Result<Vec<Effect>, ValidationError> {
        self.control(ControlIntent::Stop)
    }

    fn control(&mut self, intent: ControlIntent) -> Result<Vec<Effect>, ValidationError> {
        let result = self.lifecycle.request(intent);
        self.check(result)?;
        Ok(vec![Effect::Control(intent)])
    }

    /// Query the running state now.
    pub fn refresh_status(&mut self) -> Vec<Effect> {
        vec![Effect::QueryStatus {
            after: Duration::ZERO,
        }]
    }

    /// Trigger a backup; requires the operator's confirmation.
    pub fn backup(&mut self, confirmed: bool) -> Result<Vec<Effect>, ValidationError> {
        let result = self.lifecycle.begin_backup(confirmed, Local::now());
        let ack = self.check(result)?;
        self.reconciler.stream_mut(LogChannel::Backup).append(&ack);
        Ok(vec![Effect::TriggerBackup])
    }

    /// Send a console command to the managed process.
    pub fn send_command(&mut self, command: &str) -> Result<Vec<Effect>, ValidationError> {
        let command = command.trim();
        if command.is_empty() {
            return self.reject(ValidationError::EmptyCommand);
        }
        Ok(vec![Effect::SendCommand(command.to_string())])
    }

    // ----- completions -----

    /// Apply one completion and return follow-up effects.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Listing { seq, path, result } => {
                match self.browser.complete(seq, path, result) {
                    NavOutcome::Applied { moved: true } => self.selection.clear(),
                    NavOutcome::Applied { moved: false } => {
                        if let Some(view) = self.browser.view() {
                            self.selection.retain(|p| view.row(p).is_some());
                        }
                    }
                    NavOutcome::Stale => {}
                    NavOutcome::Failed(err) => self.fail(&err),
                }
                Vec::new()
            }

            SessionEvent::MoveProgress(progress) => {
                self.batch_progress = Some(progress);
                Vec::new()
            }

            SessionEvent::PasteFinished {
                destination,
                complete,
            } => {
                self.clipboard.finish_paste();
                self.batch_progress = None;
                self.notice = Some(if complete.is_success() {
                    Notice::success(complete.summary())
                } else {
                    Notice::error(complete.summary())
                });
                self.last_batch = Some(complete);
                self.navigate(destination)
            }

            SessionEvent::RenameFinished { source, result } => match result {
                Ok(message) => {
                    debug!(%source, "rename applied");
                    self.selection.clear();
                    self.notice = Some(Notice::success(message));
                    self.refresh()
                }
                Err(err) => {
                    self.fail(&err);
                    Vec::new()
                }
            },

            SessionEvent::UploadProgress { job, progress } => {
                self.uploads.progress(job, progress);
                Vec::new()
            }

            SessionEvent::UploadFinished {
                job,
                destination,
                result,
            } => {
                if self.uploads.finish(job, result.is_ok()).is_none() {
                    warn!(job, "completion for an unknown upload");
                    return Vec::new();
                }
                match result {
                    Ok(message) => {
                        self.notice = Some(Notice::success(message));
                        self.navigate(destination)
                    }
                    Err(err) => {
                        self.fail(&err);
                        Vec::new()
                    }
                }
            }

            SessionEvent::ControlFinished { intent, result } => match result {
                Ok(message) => {
                    self.notice = Some(Notice::success(message));
                    vec![Effect::QueryStatus {
                        after: self.settle_delay,
                    }]
                }
                Err(err) => {
                    self.lifecycle.request_failed(intent);
                    self.fail(&err);
                    Vec::new()
                }
            },

            SessionEvent::StatusFinished(result) => {
                self.lifecycle.apply_status(result.as_ref().copied());
                Vec::new()
            }

            SessionEvent::BackupFinished(result) => {
                match result {
                    Ok(message) => self.notice = Some(Notice::info(message)),
                    Err(err) => {
                        self.lifecycle.backup_failed();
                        self.fail(&err);
                    }
                }
                Vec::new()
            }

            SessionEvent::CommandFinished { command, result } => {
                match result {
                    Ok(message) => self.notice = Some(Notice::success(message)),
                    Err(err) => {
                        debug!(%command, "command refused");
                        self.fail(&err);
                    }
                }
                Vec::new()
            }

            SessionEvent::Push(event) => {
                if let Some(notice) = self.reconciler.apply(event) {
                    self.lifecycle.backup_settled(&notice);
                    let text = notice
                        .message
                        .clone()
                        .unwrap_or_else(|| "Backup finished.".to_string());
                    self.notice = Some(if notice.is_failure() {
                        Notice::error(text)
                    } else {
                        Notice::success(text)
                    });
                }
                Vec::new()
            }
        }
    }

    /// Mark the push channel as connecting.
    pub fn push_connecting(&mut self) {
        self.reconciler.set_connecting();
    }

    fn fail(&mut self, err: &PanelError) {
        self.notice = Some(Notice::error(err.to_string()));
    }

    fn check<T>(&mut self, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
        result.inspect_err(|err| self.notice = Some(Notice::error(err.to_string())))
    }

    fn reject<T>(&mut self, err: ValidationError) -> Result<T, ValidationError> {
        self.check(Err(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&PanelConfig::default())
    }

    fn listing(session: &mut Session, path: &str, entries: Vec<DirEntry>) {
        let effects = session.navigate(RemotePath::parse(path));
        let Effect::FetchListing { seq, path } = effects[0].clone() else {
            panic!("expected a fetch");
        };
        session.apply(SessionEvent::Listing {
            seq,
            path,
            result: Ok(entries),
        });
    }

    #[test]
    fn test_cut_clears_selection_and_locks_it() {
        let mut session = session();
        listing(&mut session, "minecraft", vec![DirEntry::file("a.jar")]);
        session.toggle_select(RemotePath::parse("minecraft/a.jar")).unwrap();

        assert_eq!(session.cut(), Ok(1));
        assert!(session.selection().is_empty());
        assert_eq!(
            session.toggle_select(RemotePath::parse("minecraft/a.jar")),
            Err(ValidationError::SelectionLocked)
        );
        assert!(session.notice().unwrap().is_error());
    }

    #[test]
    fn test_rename_requires_single_selection() {
        let mut session = session();
        listing(&mut session, "minecraft", vec![DirEntry::file("a"), DirEntry::file("b")]);
        assert_eq!(session.rename("x"), Err(ValidationError::NoSelection));

        session.toggle_select(RemotePath::parse("minecraft/a")).unwrap();
        session.toggle_select(RemotePath::parse("minecraft/b")).unwrap();
        assert!(!session.can_rename());
        assert_eq!(
            session.rename("x"),
            Err(ValidationError::RenameNeedsSingleSelection { selected: 2 })
        );
    }

    #[test]
    fn test_rename_unchanged_is_noop() {
        let mut session = session();
        listing(&mut session, "minecraft", vec![DirEntry::file("a")]);
        session.toggle_select(RemotePath::parse("minecraft/a")).unwrap();
        assert_eq!(session.rename("a"), Ok(Vec::new()));
        assert_eq!(session.rename("  "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_refresh_keeps_surviving_selection() {
        let mut session = session();
        listing(&mut session, "minecraft", vec![DirEntry::file("a"), DirEntry::file("b")]);
        session.toggle_select(RemotePath::parse("minecraft/a")).unwrap();
        session.toggle_select(RemotePath::parse("minecraft/b")).unwrap();

        listing(&mut session, "minecraft", vec![DirEntry::file("a")]);
        assert_eq!(session.selection().len(), 1);

        listing(&mut session, "backup", vec![]);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut session = session();
        assert_eq!(session.send_command("   "), Err(ValidationError::EmptyCommand));
        assert_eq!(
            session.send_command(" say hi "),
            Ok(vec![Effect::SendCommand("say hi".into())])
        );
    }

    #[test]
    fn test_backup_seeds_log_and_waits_for_notice() {
        let mut session = session();
        assert_eq!(session.backup(false), Err(ValidationError::ConfirmationRequired));
        assert_eq!(session.backup(true), Ok(vec![Effect::TriggerBackup]));
        assert!(
            session
                .reconciler()
                .stream(LogChannel::Backup)
                .text()
                .contains("Backup requested by operator.")
        );

        session.apply(SessionEvent::BackupFinished(Ok("Backup started.".into())));
        assert!(session.lifecycle().backup_busy());

        session.apply(SessionEvent::Push(PushEvent::BackupStatus(Default::default())));
        assert!(!session.lifecycle().backup_busy());
    }
}
