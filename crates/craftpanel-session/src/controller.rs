//! Drives a [`Session`] against a [`PanelApi`].
//!
//! The controller is the single writer of session state. Remote calls run
//! as spawned tasks that only hold the API handle; their completions come
//! back over one channel and are applied in arrival order. Push events from
//! the live channel join the same stream through an adapter task.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use craftpanel_core::{PanelConfig, PanelError, PushEvent, RemotePath, ValidationError};
use craftpanel_ops::{
    MoveResult, OPERATION_CHANNEL_SIZE, OperationComplete, PanelApi, UploadFile,
    UploadResult, push_url, rename, spawn_push_listener, start_move, start_upload,
};

use crate::lifecycle::ControlIntent;
use crate::session::{Effect, Session, SessionEvent};

/// A message waiting to be applied by [`Controller::dispatch`].
#[derive(Debug)]
pub struct Inbound(Message);

#[derive(Debug)]
enum Message {
    /// Final completion of a spawned call.
    Finished(SessionEvent),
    /// Intermediate progress of a spawned call.
    Progress(SessionEvent),
    Push(PushEvent),
}

/// Owns the session and runs its effects.
pub struct Controller<A: PanelApi + ?Sized> {
    api: Arc<A>,
    config: PanelConfig,
    session: Session,
    tx: mpsc::Sender<Inbound>,
    rx: mpsc::Receiver<Inbound>,
    in_flight: usize,
    push_cancel: Option<CancellationToken>,
}

impl<A: PanelApi + ?Sized> Controller<A> {
    pub fn new(api: Arc<A>, config: PanelConfig) -> Self {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        Self {
            api,
            session: Session::new(&config),
            config,
            tx,
            rx,
            in_flight: 0,
            push_cancel: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Number of spawned calls that have not reported completion.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dismiss_notice(&mut self) {
        self.session.dismiss_notice();
    }

    // ----- operator actions -----

    pub fn navigate(&mut self, path: RemotePath) {
        let effects = self.session.navigate(path);
        self.run(effects);
    }

    pub fn refresh(&mut self) {
        let effects = self.session.refresh();
        self.run(effects);
    }

    pub fn go_up(&mut self) {
        let effects = self.session.go_up();
        self.run(effects);
    }

    pub fn toggle_select(&mut self, path: RemotePath) -> Result<bool, ValidationError> {
        self.session.toggle_select(path)
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    pub fn cut(&mut self) -> Result<usize, ValidationError> {
        self.session.cut()
    }

    pub fn cut_paths(&mut self, paths: Vec<RemotePath>) -> Result<usize, ValidationError> {
        self.session.cut_paths(paths)
    }

    pub fn paste(&mut self) -> Result<(), ValidationError> {
        let effects = self.session.paste()?;
        self.run(effects);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<usize, ValidationError> {
        self.session.cancel()
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), ValidationError> {
        let effects = self.session.rename(new_name)?;
        self.run(effects);
        Ok(())
    }

    pub fn choose_files(&mut self, files: Vec<UploadFile>) {
        self.session.choose_files(files);
    }

    /// Stat local paths and record them as the upload choice.
    pub async fn choose_paths(&mut self, paths: &[PathBuf]) -> Result<usize, PanelError> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = UploadFile::from_path(path)
                .await
                .map_err(|e| PanelError::LocalFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            files.push(file);
        }
        let count = files.len();
        self.session.choose_files(files);
        Ok(count)
    }

    /// Upload the chosen files into `destination`, or the current directory.
    pub fn upload(&mut self, destination: Option<RemotePath>) -> Result<(), ValidationError> {
        let destination = destination.unwrap_or_else(|| self.session.current_path().clone());
        let effects = self.session.upload(destination)?;
        self.run(effects);
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ValidationError> {
        let effects = self.session.start()?;
        self.run(effects);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ValidationError> {
        let effects = self.session.stop()?;
        self.run(effects);
        Ok(())
    }

    pub fn backup(&mut self, confirmed: bool) -> Result<(), ValidationError> {
        let effects = self.session.backup(confirmed)?;
        self.run(effects);
        Ok(())
    }

    pub fn send_command(&mut self, command: &str) -> Result<(), ValidationError> {
        let effects = self.session.send_command(command)?;
        self.run(effects);
        Ok(())
    }

    pub fn refresh_status(&mut self) {
        let effects = self.session.refresh_status();
        self.run(effects);
    }

    // ----- push channel -----

    /// Open the panel's push channel. Any previous listener is stopped.
    pub fn connect_push(&mut self) -> Result<(), PanelError> {
        let url = push_url(&self.config)?;
        self.disconnect_push();

        let (push_tx, push_rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        info!(%url, "connecting push channel");
        spawn_push_listener(url, push_tx, cancel.clone());
        self.push_cancel = Some(cancel);
        self.session.push_connecting();
        self.attach_push(push_rx);
        Ok(())
    }

    /// Feed push events from any source into the session.
    pub fn attach_push(&mut self, mut push_rx: mpsc::Receiver<PushEvent>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(event) = push_rx.recv().await {
                if tx.send(Inbound(Message::Push(event))).await.is_err() {
                    break;
                }
            }
        });
    }

    /// Stop the push listener, if one is running.
    pub fn disconnect_push(&mut self) {
        if let Some(cancel) = self.push_cancel.take() {
            cancel.cancel();
        }
    }

    // ----- event loop -----

    /// Wait for the next completion, progress update or push event.
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }

    /// Apply a received message. Push events are handed back after applying.
    pub fn dispatch(&mut self, inbound: Inbound) -> Option<PushEvent> {
        let (event, push) = match inbound.0 {
            Message::Finished(event) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                (event, None)
            }
            Message::Progress(event) => (event, None),
            Message::Push(event) => (SessionEvent::Push(event.clone()), Some(event)),
        };
        let effects = self.session.apply(event);
        self.run(effects);
        push
    }

    /// Process messages until no spawned call remains outstanding.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(inbound) => {
                    self.dispatch(inbound);
                }
                None => break,
            }
        }
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&mut self, effect: Effect) {
        debug!(?effect, "spawning");
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;

        match effect {
            Effect::FetchListing { seq, path } => {
                tokio::spawn(async move {
                    let result = api.list_directory(&path).await;
                    finish(&tx, SessionEvent::Listing { seq, path, result }).await;
                });
            }

            Effect::MoveBatch {
                sources,
                destination,
            } => {
                let total = sources.len();
                let mut rx = start_move(api, sources, destination.clone());
                tokio::spawn(async move {
                    let mut complete = None;
                    while let Some(result) = rx.recv().await {
                        match result {
                            MoveResult::Progress(progress) => {
                                report(&tx, SessionEvent::MoveProgress(progress)).await;
                            }
                            MoveResult::Complete(done) => {
                                complete = Some(done);
                                break;
                            }
                        }
                    }
                    let complete = complete.unwrap_or(OperationComplete {
                        succeeded: 0,
                        failed: total,
                        errors: Vec::new(),
                    });
                    finish(
                        &tx,
                        SessionEvent::PasteFinished {
                            destination,
                            complete,
                        },
                    )
                    .await;
                });
            }

            Effect::Rename { source, new_name } => {
                tokio::spawn(async move {
                    let result = rename(api.as_ref(), &source, &new_name).await;
                    finish(&tx, SessionEvent::RenameFinished { source, result }).await;
                });
            }

            Effect::Upload {
                job,
                files,
                destination,
            } => {
                let mut rx = start_upload(api, files, destination.clone());
                tokio::spawn(async move {
                    let mut outcome = None;
                    while let Some(result) = rx.recv().await {
                        match result {
                            UploadResult::Progress(progress) => {
                                report(&tx, SessionEvent::UploadProgress { job, progress }).await;
                            }
                            UploadResult::Complete(result) => {
                                outcome = Some(result);
                                break;
                            }
                        }
                    }
                    let result = outcome
                        .unwrap_or_else(|| Err(PanelError::network("upload task ended early")));
                    finish(
                        &tx,
                        SessionEvent::UploadFinished {
                            job,
                            destination,
                            result,
                        },
                    )
                    .await;
                });
            }

            Effect::Control(intent) => {
                tokio::spawn(async move {
                    let result = match intent {
                        ControlIntent::Start => api.start_server().await,
                        ControlIntent::Stop => api.stop_server().await,
                    };
                    finish(&tx, SessionEvent::ControlFinished { intent, result }).await;
                });
            }

            Effect::QueryStatus { after } => {
                tokio::spawn(async move {
                    if !after.is_zero() {
                        tokio::time::sleep(after).await;
                    }
                    let result = api.server_status().await;
                    finish(&tx, SessionEvent::StatusFinished(result)).await;
                });
            }

            Effect::TriggerBackup => {
                tokio::spawn(async move {
                    let result = api.run_backup().await;
                    finish(&tx, SessionEvent::BackupFinished(result)).await;
                });
            }

            Effect::SendCommand(command) => {
                tokio::spawn(async move {
                    let result = api.send_command(&command).await;
                    finish(&tx, SessionEvent::CommandFinished { command, result }).await;
                });
            }
        }
    }
}

impl<A: PanelApi + ?Sized> Drop for Controller<A> {
    fn drop(&mut self) {
        self.disconnect_push();
    }
}

async fn finish(tx: &mpsc::Sender<Inbound>, event: SessionEvent) {
    let _ = tx.send(Inbound(Message::Finished(event))).await;
}

async fn report(tx: &mpsc::Sender<Inbound>, event: SessionEvent) {
    let _ = tx.send(Inbound(Message::Progress(event))).await;
}
