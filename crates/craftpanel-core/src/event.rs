//! Typed events pushed by the panel over its live channel.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A live log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogChannel {
    Console,
    Backup,
}

/// Completion notice for a backup job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupNotice {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BackupNotice {
    /// Whether the job reported a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.status.as_deref(), Some("error" | "failed" | "failure"))
    }
}

/// One event from the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Full snapshot of a log channel; replaces the buffer.
    History { channel: LogChannel, text: String },
    /// Incremental chunk of a log channel; appended to the buffer.
    Output { channel: LogChannel, text: String },
    /// The running backup finished.
    BackupStatus(BackupNotice),
    /// Server process uptime in whole seconds.
    Uptime(u64),
    /// The push channel connected.
    Connected,
    /// The push channel dropped.
    Disconnected { reason: Option<String> },
}

impl PushEvent {
    /// Channel this event writes to, if it is a log event.
    pub fn log_channel(&self) -> Option<LogChannel> {
        match self {
            Self::History { channel, .. } | Self::Output { channel, .. } => Some(*channel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_channel_names() {
        assert_eq!(LogChannel::Console.to_string(), "console");
        assert_eq!(LogChannel::from_str("backup").unwrap(), LogChannel::Backup);
    }

    #[test]
    fn test_backup_notice_failure() {
        let notice = BackupNotice {
            status: Some("error".into()),
            message: None,
        };
        assert!(notice.is_failure());
        assert!(!BackupNotice::default().is_failure());
    }
}
