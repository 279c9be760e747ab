//! Progress reporting for move batches and uploads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use craftpanel_core::RemotePath;

/// A per-item failure inside a move batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The remote path the failure refers to.
    pub path: RemotePath,
    /// The panel's (or transport's) message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: RemotePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Item-level progress of a move batch.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// Number of items whose request has resolved.
    pub items_completed: usize,
    /// Total number of items in the batch.
    pub items_total: usize,
    /// The item that resolved most recently.
    pub current: Option<RemotePath>,
    /// Errors collected so far.
    pub errors: Vec<OperationError>,
}

impl OperationProgress {
    /// Create a progress tracker for `items_total` items.
    pub fn new(items_total: usize) -> Self {
        Self {
            items_completed: 0,
            items_total,
            current: None,
            errors: Vec::new(),
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.items_total > 0 {
            (self.items_completed as f64 / self.items_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Record a resolved item.
    pub fn complete_item(&mut self, path: RemotePath, error: Option<OperationError>) {
        self.items_completed += 1;
        self.current = Some(path);
        if let Some(error) = error {
            self.errors.push(error);
        }
    }
}

/// Byte-level progress of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl TransferProgress {
    /// Fraction of the transfer done, clamped to `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        (self.bytes_sent as f64 / self.bytes_total as f64).clamp(0.0, 1.0)
    }
}

/// Counts bytes flowing into a request body and publishes the running total.
///
/// Published values never decrease.
#[derive(Debug, Clone)]
pub struct TransferMeter {
    sent: Arc<AtomicU64>,
    total: u64,
    tx: Arc<watch::Sender<TransferProgress>>,
}

impl TransferMeter {
    /// Create a meter for `total` bytes and a receiver observing it.
    pub fn new(total: u64) -> (Self, watch::Receiver<TransferProgress>) {
        let (tx, rx) = watch::channel(TransferProgress {
            bytes_sent: 0,
            bytes_total: total,
        });
        (
            Self {
                sent: Arc::new(AtomicU64::new(0)),
                total,
                tx: Arc::new(tx),
            },
            rx,
        )
    }

    /// Total bytes expected.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Record `bytes` more bytes handed to the transport.
    pub fn advance(&self, bytes: u64) {
        let sent = (self.sent.fetch_add(bytes, Ordering::AcqRel) + bytes).min(self.total);
        self.publish(sent);
    }

    /// Mark the transfer as fully sent.
    pub fn finish(&self) {
        self.sent.store(self.total, Ordering::Release);
        self.publish(self.total);
    }

    fn publish(&self, sent: u64) {
        self.tx.send_if_modified(|progress| {
            if sent > progress.bytes_sent {
                progress.bytes_sent = sent;
                true
            } else {
                false
            }
        });
    }
}

/// Result of a completed move batch.
#[derive(Debug, Clone)]
pub struct OperationComplete {
    /// Number of items successfully processed.
    pub succeeded: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Errors that occurred, one per failed item.
    pub errors: Vec<OperationError>,
}

impl OperationComplete {
    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Whether some but not all items failed.
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} item(s) moved successfully.", self.succeeded);
        if self.failed > 0 {
            summary.push_str(&format!(
                "\n{} item(s) failed to move:\n{}",
                self.failed,
                self.errors.iter().map(|e| format!("- {}", e.message)).join("\n")
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_is_monotonic_and_clamped() {
        let (meter, rx) = TransferMeter::new(100);
        meter.advance(40);
        assert_eq!(rx.borrow().bytes_sent, 40);
        meter.advance(80);
        assert_eq!(rx.borrow().bytes_sent, 100);
        assert_eq!(rx.borrow().fraction(), 1.0);
    }

    #[test]
    fn test_fraction_for_empty_transfer() {
        let progress = TransferProgress::default();
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn test_summary_lists_failures() {
        let complete = OperationComplete {
            succeeded: 1,
            failed: 1,
            errors: vec![OperationError::new(
                RemotePath::parse("minecraft/world"),
                "Source path does not exist.",
            )],
        };
        assert!(complete.is_partial());
        assert_eq!(
            complete.summary(),
            "1 item(s) moved successfully.\n1 item(s) failed to move:\n- Source path does not exist."
        );
    }

    #[test]
    fn test_operation_progress_percentage() {
        let mut progress = OperationProgress::new(4);
        progress.complete_item(RemotePath::parse("a"), None);
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(progress.current, Some(RemotePath::parse("a")));
    }
}
