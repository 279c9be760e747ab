use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use craftpanel_core::{
    BackupNotice, DirEntry, LogChannel, PanelConfig, PanelError, PushEvent, RemotePath,
    ValidationError,
};
use craftpanel_ops::{PanelApi, TransferMeter, UploadFile};
use craftpanel_session::{ClipboardMode, ControlIntent, Controller, NoticeLevel};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List(String),
    Move { source: String, destination: String },
    Rename { path: String, new_name: String },
    Upload { files: Vec<String>, destination: String },
    Start,
    Stop,
    Status,
    Backup,
    Command(String),
}

#[derive(Default)]
struct FakeState {
    listings: HashMap<String, Vec<DirEntry>>,
    listing_delays: HashMap<String, Duration>,
    move_failures: HashMap<String, String>,
    rename_failure: Option<PanelError>,
    upload_failure: Option<PanelError>,
    start_failure: Option<PanelError>,
    backup_failure: Option<PanelError>,
    running: bool,
    calls: Vec<Call>,
    status_queries: Vec<Instant>,
}

/// In-memory panel recording every call it receives.
#[derive(Default)]
struct FakePanel {
    state: Mutex<FakeState>,
}

impl FakePanel {
    fn with_listing(self, path: &str, entries: Vec<DirEntry>) -> Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .insert(path.to_string(), entries);
        self
    }

    fn edit(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn moves(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Move { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl PanelApi for FakePanel {
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, PanelError> {
        let key = path.to_wire();
        self.record(Call::List(key.clone()));
        let delay = self
            .state
            .lock()
            .unwrap()
            .listing_delays
            .get(&key)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .unwrap()
            .listings
            .get(&key)
            .cloned()
            .ok_or_else(|| PanelError::rejected("Path does not exist."))
    }

    async fn start_server(&self) -> Result<String, PanelError> {
        self.record(Call::Start);
        let mut state = self.state.lock().unwrap();
        match state.start_failure.clone() {
            Some(err) => Err(err),
            None => {
                state.running = true;
                Ok("Server starting.".into())
            }
        }
    }

    async fn stop_server(&self) -> Result<String, PanelError> {
        self.record(Call::Stop);
        self.state.lock().unwrap().running = false;
        Ok("Server stopping.".into())
    }

    async fn server_status(&self) -> Result<bool, PanelError> {
        self.record(Call::Status);
        let mut state = self.state.lock().unwrap();
        state.status_queries.push(Instant::now());
        Ok(state.running)
    }

    async fn run_backup(&self) -> Result<String, PanelError> {
        self.record(Call::Backup);
        match self.state.lock().unwrap().backup_failure.clone() {
            Some(err) => Err(err),
            None => Ok("Backup started.".into()),
        }
    }

    async fn send_command(&self, command: &str) -> Result<String, PanelError> {
        self.record(Call::Command(command.to_string()));
        Ok(format!("Command '{command}' sent."))
    }

    async fn move_item(
        &self,
        source: &RemotePath,
        destination: &RemotePath,
    ) -> Result<String, PanelError> {
        self.record(Call::Move {
            source: source.to_wire(),
            destination: destination.to_wire(),
        });
        match self.state.lock().unwrap().move_failures.get(&source.to_wire()) {
            Some(message) => Err(PanelError::rejected(message.clone())),
            None => Ok("Moved.".into()),
        }
    }

    async fn rename_item(&self, path: &RemotePath, new_name: &str) -> Result<String, PanelError> {
        self.record(Call::Rename {
            path: path.to_wire(),
            new_name: new_name.to_string(),
        });
        match self.state.lock().unwrap().rename_failure.clone() {
            Some(err) => Err(err),
            None => Ok("Renamed.".into()),
        }
    }

    async fn upload(
        &self,
        files: &[UploadFile],
        destination: &RemotePath,
        meter: TransferMeter,
    ) -> Result<String, PanelError> {
        self.record(Call::Upload {
            files: files.iter().map(|f| f.file_name.clone()).collect(),
            destination: destination.to_wire(),
        });
        let chunk = (meter.total() / 4).max(1);
        for _ in 0..4 {
            meter.advance(chunk);
            tokio::task::yield_now().await;
        }
        match self.state.lock().unwrap().upload_failure.clone() {
            Some(err) => Err(err),
            None => Ok("Files uploaded.".into()),
        }
    }
}

fn minecraft_panel() -> FakePanel {
    FakePanel::default()
        .with_listing(
            ".",
            vec![DirEntry::dir("minecraft"), DirEntry::dir("backup"), DirEntry::file("notes.txt")],
        )
        .with_listing(
            "minecraft",
            vec![
                DirEntry::dir("plugins"),
                DirEntry::file("a.jar"),
                DirEntry::file("b.jar"),
            ],
        )
        .with_listing("minecraft/plugins", vec![DirEntry::file("Essentials.jar")])
        .with_listing("backup", vec![])
}

fn controller(panel: &Arc<FakePanel>) -> Controller<FakePanel> {
    Controller::new(Arc::clone(panel), PanelConfig::default())
}

async fn open(controller: &mut Controller<FakePanel>, path: &str) {
    controller.navigate(RemotePath::parse(path));
    controller.settle().await;
    assert_eq!(controller.session().current_path().to_wire(), path);
}

fn select(controller: &mut Controller<FakePanel>, paths: &[&str]) {
    for path in paths {
        controller.toggle_select(RemotePath::parse(path)).unwrap();
    }
}

fn notice_text(controller: &Controller<FakePanel>) -> String {
    controller
        .session()
        .notice()
        .map(|n| n.text.clone())
        .unwrap_or_default()
}

// ----- directory browser -----

#[tokio::test(start_paused = true)]
async fn test_root_shows_shortcuts_without_up_link() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, ".").await;

    let view = controller.session().browser().view().unwrap();
    let shortcuts: Vec<String> = view.shortcuts.iter().map(|p| p.to_wire()).collect();
    assert_eq!(shortcuts, vec!["minecraft", "backup"]);
    assert!(view.up.is_none());
    assert!(view.breadcrumbs.is_empty());
    assert_eq!(view.rows.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_subdirectory_has_up_link_and_breadcrumbs() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft/plugins").await;

    let view = controller.session().browser().view().unwrap();
    assert_eq!(view.up, Some(RemotePath::parse("minecraft")));
    assert!(view.shortcuts.is_empty());
    let labels: Vec<&str> = view.breadcrumbs.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["minecraft", "plugins"]);
    assert_eq!(view.breadcrumbs[0].path, RemotePath::parse("minecraft"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_navigation_keeps_current_path() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    controller.navigate(RemotePath::parse("minecraft/missing"));
    controller.settle().await;

    assert_eq!(controller.session().current_path().to_wire(), "minecraft");
    assert_eq!(notice_text(&controller), "Path does not exist.");
}

#[tokio::test(start_paused = true)]
async fn test_stale_listing_never_overwrites_newer_one() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| {
        s.listing_delays
            .insert("minecraft".into(), Duration::from_millis(500));
        s.listing_delays.insert("backup".into(), Duration::from_millis(10));
    });
    let mut controller = controller(&panel);

    controller.navigate(RemotePath::parse("minecraft"));
    controller.navigate(RemotePath::parse("backup"));
    controller.settle().await;

    assert_eq!(controller.session().current_path().to_wire(), "backup");
    assert!(controller.session().browser().view().unwrap().rows.is_empty());
}

// ----- clipboard / move engine -----

#[tokio::test(start_paused = true)]
async fn test_cut_then_cancel_issues_no_requests() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    select(&mut controller, &["minecraft/a.jar", "minecraft/b.jar"]);
    assert_eq!(controller.cut(), Ok(2));
    assert!(controller.session().selection().is_empty());
    assert_eq!(controller.cancel(), Ok(2));
    controller.settle().await;

    assert!(panel.moves().is_empty());
    assert_eq!(panel.calls(), vec![Call::List("minecraft".into())]);
    assert_eq!(controller.session().clipboard().mode(), ClipboardMode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_paste_moves_each_item_into_new_directory() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    select(&mut controller, &["minecraft/a.jar", "minecraft/b.jar"]);
    controller.cut().unwrap();
    open(&mut controller, "minecraft/plugins").await;

    controller.paste().unwrap();
    assert_eq!(controller.session().clipboard().mode(), ClipboardMode::Pasting);
    assert_eq!(controller.cancel(), Err(ValidationError::PasteInFlight));
    controller.settle().await;

    let moves = panel.moves();
    assert_eq!(moves.len(), 2);
    for source in ["minecraft/a.jar", "minecraft/b.jar"] {
        assert!(moves.contains(&Call::Move {
            source: source.into(),
            destination: "minecraft/plugins".into(),
        }));
    }
    assert_eq!(
        panel.calls().last(),
        Some(&Call::List("minecraft/plugins".into()))
    );
    assert!(controller.session().clipboard().is_empty());
    assert_eq!(notice_text(&controller), "2 item(s) moved successfully.");
}

#[tokio::test(start_paused = true)]
async fn test_partial_paste_still_clears_and_rerenders() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| {
        s.move_failures
            .insert("minecraft/b.jar".into(), "Destination already exists.".into());
    });
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    select(&mut controller, &["minecraft/a.jar", "minecraft/b.jar"]);
    controller.cut().unwrap();
    open(&mut controller, "backup").await;
    controller.paste().unwrap();
    controller.settle().await;

    assert_eq!(panel.moves().len(), 2);
    assert!(controller.session().clipboard().is_idle());
    assert_eq!(panel.calls().last(), Some(&Call::List("backup".into())));

    let notice = controller.session().notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("1 item(s) moved successfully."));
    assert!(notice.text.contains("- Destination already exists."));
    let batch = controller.session().last_batch().unwrap();
    assert_eq!((batch.succeeded, batch.failed), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_paste_with_nothing_staged_is_rejected() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    assert_eq!(controller.paste(), Err(ValidationError::NothingStaged));
    assert_eq!(controller.cut(), Err(ValidationError::NoSelection));
    assert!(panel.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rename_flow() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    select(&mut controller, &["minecraft/a.jar", "minecraft/b.jar"]);
    assert!(!controller.session().can_rename());
    assert!(controller.rename("c.jar").is_err());

    controller.toggle_select(RemotePath::parse("minecraft/b.jar")).unwrap();
    assert!(controller.session().can_rename());
    controller.rename("c.jar").unwrap();
    controller.settle().await;

    assert!(panel.calls().contains(&Call::Rename {
        path: "minecraft/a.jar".into(),
        new_name: "c.jar".into(),
    }));
    assert!(controller.session().selection().is_empty());
    assert_eq!(panel.calls().last(), Some(&Call::List("minecraft".into())));
}

#[tokio::test(start_paused = true)]
async fn test_failed_rename_leaves_listing_untouched() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| s.rename_failure = Some(PanelError::rejected("Target name already exists.")));
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    select(&mut controller, &["minecraft/a.jar"]);
    controller.rename("b.jar").unwrap();
    controller.settle().await;

    assert_eq!(notice_text(&controller), "Target name already exists.");
    assert_eq!(controller.session().selection().len(), 1);
    let listings = panel
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::List(_)))
        .count();
    assert_eq!(listings, 1);
}

// ----- upload pipeline -----

#[tokio::test(start_paused = true)]
async fn test_upload_progress_reaches_one_and_rerenders() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("Essentials.jar");
    std::fs::write(&jar, vec![0u8; 4096]).unwrap();

    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    open(&mut controller, "minecraft").await;

    assert_eq!(controller.choose_paths(&[jar]).await, Ok(1));
    controller
        .upload(Some(RemotePath::parse("minecraft/plugins")))
        .unwrap();
    assert_eq!(controller.upload(None), Err(ValidationError::UploadInFlight));

    let mut fractions = vec![0.0];
    while controller.in_flight() > 0 {
        let inbound = controller.recv().await.unwrap();
        controller.dispatch(inbound);
        if let Some(job) = controller.session().uploads().active() {
            fractions.push(job.progress());
        }
    }
    controller.settle().await;

    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(!controller.session().uploads().is_active());
    assert!(controller.session().uploads().chosen().is_empty());
    assert_eq!(notice_text(&controller), "Files uploaded.");
    assert_eq!(controller.session().current_path().to_wire(), "minecraft/plugins");
    assert!(panel.calls().contains(&Call::Upload {
        files: vec!["Essentials.jar".into()],
        destination: "minecraft/plugins".into(),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_keeps_file_choice() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("server.properties");
    std::fs::write(&file, b"motd=hi\n").unwrap();

    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| s.upload_failure = Some(PanelError::network("connection reset")));
    let mut controller = controller(&panel);

    controller.choose_paths(&[file]).await.unwrap();
    controller.upload(Some(RemotePath::parse("minecraft"))).unwrap();
    controller.settle().await;

    assert_eq!(
        notice_text(&controller),
        "A network error occurred while contacting the panel."
    );
    assert_eq!(controller.session().uploads().chosen().len(), 1);
    assert!(!controller.session().uploads().is_active());
}

#[tokio::test(start_paused = true)]
async fn test_upload_without_files_is_rejected() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    assert_eq!(controller.upload(None), Err(ValidationError::NoFileChosen));
    assert_eq!(notice_text(&controller), "Please select a file to upload");
}

// ----- live event reconciler -----

#[tokio::test(start_paused = true)]
async fn test_history_replaces_then_output_appends() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    let (push_tx, push_rx) = mpsc::channel(8);
    controller.attach_push(push_rx);

    let events = [
        PushEvent::Connected,
        PushEvent::Output {
            channel: LogChannel::Console,
            text: "old\n".into(),
        },
        PushEvent::History {
            channel: LogChannel::Console,
            text: "A".into(),
        },
        PushEvent::Output {
            channel: LogChannel::Console,
            text: "B".into(),
        },
        PushEvent::Uptime(3_661),
    ];
    for event in events.iter().cloned() {
        push_tx.send(event).await.unwrap();
    }
    for expected in events {
        let inbound = controller.recv().await.unwrap();
        assert_eq!(controller.dispatch(inbound), Some(expected));
    }

    let reconciler = controller.session().reconciler();
    assert_eq!(reconciler.stream(LogChannel::Console).text(), "AB");
    assert!(reconciler.stream(LogChannel::Console).history_replayed());
    assert!(reconciler.stream(LogChannel::Backup).is_empty());
    assert_eq!(reconciler.uptime_display().as_deref(), Some("01:01:01"));
}

// ----- lifecycle controller -----

#[tokio::test(start_paused = true)]
async fn test_start_reconciles_after_settle_delay() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    let started = Instant::now();

    controller.start().unwrap();
    assert!(!controller.session().lifecycle().is_enabled(ControlIntent::Start));
    assert_eq!(
        controller.start(),
        Err(ValidationError::ControlDisabled { control: "start" })
    );
    controller.settle().await;

    let queries = panel.state.lock().unwrap().status_queries.clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0] - started >= Duration::from_millis(3000));

    let lifecycle = controller.session().lifecycle();
    assert_eq!(lifecycle.running(), Some(true));
    assert!(!lifecycle.is_enabled(ControlIntent::Start));
    assert!(lifecycle.is_enabled(ControlIntent::Stop));
    assert_eq!(lifecycle.pending(), None);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_start_rolls_back() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| s.start_failure = Some(PanelError::rejected("Server is already running.")));
    let mut controller = controller(&panel);

    controller.start().unwrap();
    controller.settle().await;

    assert!(controller.session().lifecycle().is_enabled(ControlIntent::Start));
    assert_eq!(notice_text(&controller), "Server is already running.");
    assert!(!panel.calls().contains(&Call::Status));
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_status() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| s.running = true);
    let mut controller = controller(&panel);

    controller.refresh_status();
    controller.settle().await;
    assert_eq!(controller.session().lifecycle().running(), Some(true));

    controller.stop().unwrap();
    controller.settle().await;
    let lifecycle = controller.session().lifecycle();
    assert_eq!(lifecycle.running(), Some(false));
    assert!(lifecycle.is_enabled(ControlIntent::Start));
    assert!(!lifecycle.is_enabled(ControlIntent::Stop));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_backup_clears_gate_immediately() {
    let panel = Arc::new(minecraft_panel());
    panel.edit(|s| s.backup_failure = Some(PanelError::rejected("Backup script not found.")));
    let mut controller = controller(&panel);

    controller.backup(true).unwrap();
    assert!(controller.session().lifecycle().backup_busy());
    controller.settle().await;

    assert!(!controller.session().lifecycle().backup_busy());
    assert_eq!(notice_text(&controller), "Backup script not found.");
}

#[tokio::test(start_paused = true)]
async fn test_backup_gate_waits_for_push_notice() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);
    let (push_tx, push_rx) = mpsc::channel(8);
    controller.attach_push(push_rx);

    assert_eq!(controller.backup(false), Err(ValidationError::ConfirmationRequired));
    controller.backup(true).unwrap();
    controller.settle().await;
    assert!(controller.session().lifecycle().backup_busy());
    assert_eq!(controller.backup(true), Err(ValidationError::BackupBusy));
    assert_eq!(panel.calls(), vec![Call::Backup]);

    push_tx
        .send(PushEvent::BackupStatus(BackupNotice {
            status: Some("complete".into()),
            message: Some("Backup finished successfully.".into()),
        }))
        .await
        .unwrap();
    let inbound = controller.recv().await.unwrap();
    controller.dispatch(inbound);

    assert!(!controller.session().lifecycle().backup_busy());
    assert_eq!(notice_text(&controller), "Backup finished successfully.");
}

#[tokio::test(start_paused = true)]
async fn test_console_command() {
    let panel = Arc::new(minecraft_panel());
    let mut controller = controller(&panel);

    assert_eq!(controller.send_command(""), Err(ValidationError::EmptyCommand));
    controller.send_command("say hello").unwrap();
    controller.settle().await;

    assert_eq!(panel.calls(), vec![Call::Command("say hello".into())]);
    assert_eq!(notice_text(&controller), "Command 'say hello' sent.");
}
