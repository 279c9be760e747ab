//! Main application state and logic.

mod constants;
pub mod input;
mod render;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui::{DefaultTerminal, Frame};
use tracing::warn;

use craftpanel_core::{PanelConfig, RemotePath};
use craftpanel_ops::HttpPanelClient;
use craftpanel_session::{ClipboardMode, Controller};

use crate::event::KeyAction;
use crate::theme::Theme;

use self::constants::{LOG_SCROLL_STEP, TICK_INTERVAL_MS};
use self::input::{InputResult, InputState, join_paths, split_paths};
use self::render::{RenderContext, render_app};
use self::state::{AppMode, FileEntry, View, file_entries};

/// Application result type.
pub type AppResult<T> = color_eyre::Result<T>;

/// Main application state.
pub struct App {
    controller: Controller<HttpPanelClient>,
    mode: AppMode,
    view: View,
    theme: Theme,
    /// Cursor index into the Files view entries.
    cursor: usize,
    /// Directory the cursor index refers to.
    cursor_path: RemotePath,
    /// Lines scrolled back from the tail of the active log view.
    log_scroll: usize,
    /// Input state for rename, upload and console prompts.
    input_state: Option<InputState>,
    /// Local paths to stat and upload on the next loop iteration.
    pending_upload: Option<Vec<PathBuf>>,
    needs_redraw: bool,
}

impl App {
    /// Build the HTTP client and controller. Must run inside a tokio runtime.
    pub fn new(config: PanelConfig) -> AppResult<Self> {
        let client = HttpPanelClient::new(&config)?;
        Ok(Self {
            controller: Controller::new(Arc::new(client), config),
            mode: AppMode::Normal,
            view: View::Files,
            theme: Theme::default(),
            cursor: 0,
            cursor_path: RemotePath::root(),
            log_scroll: 0,
            input_state: None,
            pending_upload: None,
            needs_redraw: true,
        })
    }

    /// Run the application event loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.controller.navigate(RemotePath::root());
        self.controller.refresh_status();
        self.connect_push();

        let period = Duration::from_millis(TICK_INTERVAL_MS);
        let mut interval = tokio::time::interval(period);
        let mut events = EventStream::new();

        while self.mode != AppMode::Quit {
            if self.needs_redraw {
                terminal.draw(|frame| self.render(frame))?;
                self.needs_redraw = false;
            }

            tokio::select! {
                biased;

                Some(Ok(event)) = events.next() => {
                    if let Event::Key(key_event) = event {
                        if key_event.kind == KeyEventKind::Press {
                            self.handle_key(key_event);
                        }
                    }
                    self.needs_redraw = true;
                }

                Some(inbound) = self.controller.recv() => {
                    self.controller.dispatch(inbound);
                    self.sync_cursor();
                    self.needs_redraw = true;
                }

                _ = interval.tick() => {}
            }

            // Stat local files outside the key handler, which cannot await.
            if let Some(paths) = self.pending_upload.take() {
                self.start_upload(paths).await;
                self.needs_redraw = true;
            }
        }

        self.controller.disconnect_push();
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }

    fn connect_push(&mut self) {
        if let Err(err) = self.controller.connect_push() {
            warn!(error = %err, "push channel unavailable");
        }
    }

    async fn start_upload(&mut self, paths: Vec<PathBuf>) {
        match self.controller.choose_paths(&paths).await {
            Ok(_) => {
                // Rejections surface as the session notice.
                let _ = self.controller.upload(None);
            }
            Err(err) => {
                let mut input = InputState::with_initial(&join_paths(&paths));
                input.set_error(err.to_string());
                self.input_state = Some(input);
                self.mode = AppMode::Uploading;
            }
        }
    }

    /// Reset the cursor when the directory changed and keep it in range.
    fn sync_cursor(&mut self) {
        let session = self.controller.session();
        if session.current_path() != &self.cursor_path {
            self.cursor_path = session.current_path().clone();
            self.cursor = 0;
        }
        let len = self.entry_count();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn entry_count(&self) -> usize {
        self.controller
            .session()
            .browser()
            .view()
            .map(|view| file_entries(view).len())
            .unwrap_or(0)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.mode.is_input() {
            self.handle_input_event(key);
        } else if self.mode == AppMode::ConfirmBackup {
            self.handle_confirm_key(key);
        } else {
            self.handle_action(KeyAction::from_key_event(key));
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let _ = self.controller.backup(true);
                self.view = View::Backup;
                self.log_scroll = 0;
                self.mode = AppMode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = AppMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_input_event(&mut self, key: KeyEvent) {
        let Some(input) = self.input_state.as_mut() else {
            self.mode = AppMode::Normal;
            return;
        };

        match input.handle_key(key) {
            InputResult::Continue => {}
            InputResult::Cancel => {
                self.input_state = None;
                self.mode = AppMode::Normal;
            }
            InputResult::Submit(value) => {
                let result = match self.mode {
                    AppMode::Renaming => self.controller.rename(&value),
                    AppMode::Command => self.controller.send_command(&value),
                    AppMode::Uploading => match split_paths(&value) {
                        Ok(paths) => {
                            self.pending_upload = Some(paths);
                            Ok(())
                        }
                        Err(err) => {
                            if let Some(input) = self.input_state.as_mut() {
                                input.set_error(err);
                            }
                            return;
                        }
                    },
                    _ => Ok(()),
                };

                match result {
                    Ok(()) => {
                        self.input_state = None;
                        self.mode = AppMode::Normal;
                    }
                    Err(err) => {
                        if let Some(input) = self.input_state.as_mut() {
                            input.set_error(err.to_string());
                        }
                    }
                }
            }
        }
    }

    /// Handle a key action.
    fn handle_action(&mut self, action: KeyAction) {
        if self.mode == AppMode::Help {
            if matches!(
                action,
                KeyAction::ToggleHelp | KeyAction::Quit | KeyAction::Cancel
            ) {
                self.mode = AppMode::Normal;
            }
            return;
        }

        match action {
            KeyAction::Quit | KeyAction::ForceQuit => self.mode = AppMode::Quit,
            KeyAction::ToggleHelp => self.mode = AppMode::Help,
            KeyAction::NextTab => self.switch_view(self.view.next()),
            KeyAction::PrevTab => self.switch_view(self.view.prev()),

            KeyAction::Refresh => {
                self.controller.refresh();
                self.controller.refresh_status();
            }
            KeyAction::StartServer => {
                let _ = self.controller.start();
            }
            KeyAction::StopServer => {
                let _ = self.controller.stop();
            }
            KeyAction::Backup => self.mode = AppMode::ConfirmBackup,
            KeyAction::ConsoleCommand => {
                self.switch_view(View::Console);
                self.input_state = Some(InputState::new());
                self.mode = AppMode::Command;
            }
            KeyAction::Reconnect => self.connect_push(),
            KeyAction::Cancel => self.cancel(),

            KeyAction::MoveUp
            | KeyAction::MoveDown
            | KeyAction::JumpToTop
            | KeyAction::JumpToBottom => self.move_cursor(action),

            _ if self.view == View::Files => self.handle_files_action(action),
            _ => {}
        }
    }

    fn handle_files_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Open => {
                if let Some(target) = self.entry_under_cursor(|entry| entry.target().cloned()) {
                    self.controller.navigate(target);
                }
            }
            KeyAction::NavigateUp => self.controller.go_up(),
            KeyAction::ToggleSelect => {
                let row = self.entry_under_cursor(|entry| match entry {
                    FileEntry::Row(row) => Some(row.path.clone()),
                    _ => None,
                });
                if let Some(path) = row {
                    let _ = self.controller.toggle_select(path);
                    self.move_cursor(KeyAction::MoveDown);
                }
            }
            KeyAction::Cut => {
                let _ = self.controller.cut();
            }
            KeyAction::Paste => {
                let _ = self.controller.paste();
            }
            KeyAction::Rename => {
                let session = self.controller.session();
                if !session.can_rename() {
                    return;
                }
                let name = session
                    .selection()
                    .single()
                    .and_then(|path| path.file_name())
                    .unwrap_or_default();
                self.input_state = Some(InputState::with_initial(name));
                self.mode = AppMode::Renaming;
            }
            KeyAction::Upload => {
                if self.controller.session().uploads().is_active() {
                    let _ = self.controller.upload(None);
                    return;
                }
                let chosen: Vec<PathBuf> = self
                    .controller
                    .session()
                    .uploads()
                    .chosen()
                    .iter()
                    .map(|file| file.local_path.clone())
                    .collect();
                self.input_state = Some(if chosen.is_empty() {
                    InputState::new()
                } else {
                    InputState::with_initial(&join_paths(&chosen))
                });
                self.mode = AppMode::Uploading;
            }
            _ => {}
        }
    }

    /// Esc peels back one layer: staged cut, then selection, then notice.
    fn cancel(&mut self) {
        let session = self.controller.session();
        if session.clipboard().mode() == ClipboardMode::Staged {
            let _ = self.controller.cancel();
        } else if !session.selection().is_empty() {
            self.controller.clear_selection();
        } else {
            self.controller.dismiss_notice();
        }
    }

    fn switch_view(&mut self, view: View) {
        self.view = view;
        self.log_scroll = 0;
    }

    fn move_cursor(&mut self, action: KeyAction) {
        if self.view == View::Files {
            let last = self.entry_count().saturating_sub(1);
            self.cursor = match action {
                KeyAction::MoveUp => self.cursor.saturating_sub(1),
                KeyAction::MoveDown => (self.cursor + 1).min(last),
                KeyAction::JumpToTop => 0,
                KeyAction::JumpToBottom => last,
                _ => self.cursor,
            };
        } else {
            // Log views scroll from the tail; render clamps the upper bound.
            self.log_scroll = match action {
                KeyAction::MoveUp => self.log_scroll.saturating_add(LOG_SCROLL_STEP),
                KeyAction::MoveDown => self.log_scroll.saturating_sub(LOG_SCROLL_STEP),
                KeyAction::JumpToTop => usize::MAX,
                KeyAction::JumpToBottom => 0,
                _ => self.log_scroll,
            };
        }
    }

    fn entry_under_cursor<T>(&self, f: impl FnOnce(&FileEntry<'_>) -> Option<T>) -> Option<T> {
        let view = self.controller.session().browser().view()?;
        let entries = file_entries(view);
        entries.get(self.cursor).and_then(f)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.controller.session();
        let ctx = RenderContext {
            mode: self.mode,
            view: self.view,
            theme: &self.theme,
            session,
            base_url: &self.controller.config().base_url,
            cursor: self.cursor,
            log_scroll: self.log_scroll,
            input_state: self.input_state.as_ref(),
        };

        render_app(&ctx, area, buf);
    }
}
