//! Merges pushed events into the live log buffers.

use tracing::{debug, info};

use craftpanel_core::{BackupNotice, LogChannel, PushEvent, format_uptime};

/// One live log channel's buffer.
#[derive(Debug, Clone)]
pub struct LogStream {
    channel: LogChannel,
    buffer: String,
    history_replayed: bool,
}

impl LogStream {
    pub fn new(channel: LogChannel) -> Self {
        Self {
            channel,
            buffer: String::new(),
            history_replayed: false,
        }
    }

    /// Replace the whole buffer with a history snapshot.
    pub fn replace_history(&mut self, text: &str) {
        self.buffer.clear();
        self.buffer.push_str(text);
        self.history_replayed = true;
    }

    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn channel(&self) -> LogChannel {
        self.channel
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.buffer.lines()
    }

    pub fn history_replayed(&self) -> bool {
        self.history_replayed
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// State of the push channel as last reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Offline,
    Connecting,
    Online,
    Lost { reason: Option<String> },
}

/// Owns the console and backup buffers plus the uptime ticker.
#[derive(Debug, Clone)]
pub struct Reconciler {
    console: LogStream,
    backup: LogStream,
    uptime: Option<u64>,
    link: LinkState,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            console: LogStream::new(LogChannel::Console),
            backup: LogStream::new(LogChannel::Backup),
            uptime: None,
            link: LinkState::Offline,
        }
    }
}

impl Reconciler {
    /// Apply one push event in arrival order.
    ///
    /// Backup completion notices are handed back to the caller, which owns
    /// the backup gate.
    pub fn apply(&mut self, event: PushEvent) -> Option<BackupNotice> {
        match event {
            PushEvent::History { channel, text } => {
                debug!(%channel, bytes = text.len(), "history replayed");
                self.stream_mut(channel).replace_history(&text);
            }
            PushEvent::Output { channel, text } => self.stream_mut(channel).append(&text),
            PushEvent::Uptime(secs) => self.uptime = Some(secs),
            PushEvent::BackupStatus(notice) => return Some(notice),
            PushEvent::Connected => {
                info!("push channel connected");
                self.link = LinkState::Online;
            }
            PushEvent::Disconnected { reason } => self.link = LinkState::Lost { reason },
        }
        None
    }

    pub fn stream(&self, channel: LogChannel) -> &LogStream {
        match channel {
            LogChannel::Console => &self.console,
            LogChannel::Backup => &self.backup,
        }
    }

    pub fn stream_mut(&mut self, channel: LogChannel) -> &mut LogStream {
        match channel {
            LogChannel::Console => &mut self.console,
            LogChannel::Backup => &mut self.backup,
        }
    }

    pub fn set_connecting(&mut self) {
        self.link = LinkState::Connecting;
    }

    pub fn link(&self) -> &LinkState {
        &self.link
    }

    pub fn uptime(&self) -> Option<u64> {
        self.uptime
    }

    /// Uptime as `[Dd ]HH:MM:SS`, once the first broadcast arrived.
    pub fn uptime_display(&self) -> Option<String> {
        self.uptime.map(format_uptime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(channel: LogChannel, text: &str) -> PushEvent {
        PushEvent::Output {
            channel,
            text: text.into(),
        }
    }

    fn history(channel: LogChannel, text: &str) -> PushEvent {
        PushEvent::History {
            channel,
            text: text.into(),
        }
    }

    #[test]
    fn test_history_replaces_and_output_appends() {
        let mut reconciler = Reconciler::default();
        reconciler.apply(output(LogChannel::Console, "stale\n"));
        reconciler.apply(history(LogChannel::Console, "A"));
        reconciler.apply(output(LogChannel::Console, "B"));

        let console = reconciler.stream(LogChannel::Console);
        assert_eq!(console.text(), "AB");
        assert!(console.history_replayed());
        assert!(reconciler.stream(LogChannel::Backup).is_empty());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut reconciler = Reconciler::default();
        reconciler.apply(history(LogChannel::Backup, "rsync started\n"));
        reconciler.apply(output(LogChannel::Console, "[Server] hello\n"));
        reconciler.apply(history(LogChannel::Console, ""));

        assert_eq!(reconciler.stream(LogChannel::Backup).text(), "rsync started\n");
        assert_eq!(reconciler.stream(LogChannel::Console).text(), "");
        assert_eq!(reconciler.stream(LogChannel::Backup).lines().count(), 1);
    }

    #[test]
    fn test_uptime_and_link() {
        let mut reconciler = Reconciler::default();
        assert_eq!(reconciler.uptime_display(), None);
        reconciler.apply(PushEvent::Connected);
        reconciler.apply(PushEvent::Uptime(90061));
        assert_eq!(reconciler.link(), &LinkState::Online);
        assert_eq!(reconciler.uptime_display().as_deref(), Some("1d 01:01:01"));
    }

    #[test]
    fn test_backup_status_is_routed_out() {
        let mut reconciler = Reconciler::default();
        let notice = reconciler.apply(PushEvent::BackupStatus(BackupNotice::default()));
        assert_eq!(notice, Some(BackupNotice::default()));
    }
}
