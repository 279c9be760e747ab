//! Start/stop controls and the backup gate.

use chrono::{DateTime, TimeZone};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info};

use craftpanel_core::{BackupNotice, PanelError, ValidationError};

/// A lifecycle request the operator can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ControlIntent {
    Start,
    Stop,
}

/// Server lifecycle as the client currently believes it to be.
///
/// `running` is `None` until the first successful status query, and again
/// whenever a status query fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    running: Option<bool>,
    pending: Option<ControlIntent>,
    start_enabled: bool,
    stop_enabled: bool,
    backup_busy: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            running: None,
            pending: None,
            start_enabled: true,
            stop_enabled: true,
            backup_busy: false,
        }
    }
}

impl Lifecycle {
    /// Optimistically disable the control for `intent`.
    pub fn request(&mut self, intent: ControlIntent) -> Result<(), ValidationError> {
        if !self.is_enabled(intent) {
            return Err(ValidationError::ControlDisabled {
                control: intent.into(),
            });
        }
        self.set_enabled(intent, false);
        self.pending = Some(intent);
        debug!(%intent, "lifecycle request sent");
        Ok(())
    }

    /// The request was rejected or never arrived: undo the optimistic disable.
    pub fn request_failed(&mut self, intent: ControlIntent) {
        self.set_enabled(intent, true);
        if self.pending == Some(intent) {
            self.pending = None;
        }
    }

    /// Apply an authoritative running-state query.
    pub fn apply_status(&mut self, result: Result<bool, &PanelError>) {
        match result {
            Ok(running) => {
                info!(running, "server status reconciled");
                self.running = Some(running);
                self.start_enabled = !running;
                self.stop_enabled = running;
            }
            Err(err) => {
                debug!(error = %err, "status unknown");
                self.running = None;
                self.start_enabled = true;
                self.stop_enabled = true;
            }
        }
        self.pending = None;
    }

    /// Close the backup gate and return the acknowledgement line for the log.
    pub fn begin_backup<Tz>(&mut self, confirmed: bool, now: DateTime<Tz>) -> Result<String, ValidationError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if !confirmed {
            return Err(ValidationError::ConfirmationRequired);
        }
        if self.backup_busy {
            return Err(ValidationError::BackupBusy);
        }
        self.backup_busy = true;
        Ok(format!(
            "[{}] Backup requested by operator.\n",
            now.format("%Y-%m-%d %H:%M:%S")
        ))
    }

    /// The trigger request failed; reopen the gate.
    pub fn backup_failed(&mut self) {
        self.backup_busy = false;
    }

    /// The backup job reported completion over the push channel.
    pub fn backup_settled(&mut self, notice: &BackupNotice) {
        info!(status = notice.status.as_deref().unwrap_or("done"), "backup settled");
        self.backup_busy = false;
    }

    pub fn is_enabled(&self, intent: ControlIntent) -> bool {
        match intent {
            ControlIntent::Start => self.start_enabled,
            ControlIntent::Stop => self.stop_enabled,
        }
    }

    fn set_enabled(&mut self, intent: ControlIntent, enabled: bool) {
        match intent {
            ControlIntent::Start => self.start_enabled = enabled,
            ControlIntent::Stop => self.stop_enabled = enabled,
        }
    }

    pub fn running(&self) -> Option<bool> {
        self.running
    }

    pub fn pending(&self) -> Option<ControlIntent> {
        self.pending
    }

    pub fn backup_busy(&self) -> bool {
        self.backup_busy
    }
}
