//! Error types shared by every craftpanel layer.

use thiserror::Error;

/// Operator-visible text for transport failures.
pub const NETWORK_FAILURE_MESSAGE: &str = "A network error occurred while contacting the panel.";

/// Errors produced by panel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// The request never completed or the reply could not be decoded.
    #[error("{}", NETWORK_FAILURE_MESSAGE)]
    Network { detail: String },

    /// The panel answered with `status: error`.
    #[error("{message}")]
    Rejected { message: String },

    /// A local file could not be read for upload.
    #[error("Cannot read {path}: {message}")]
    LocalFile { path: String, message: String },

    /// The operation was refused locally before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PanelError {
    /// Create a network failure with diagnostic detail.
    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network {
            detail: detail.into(),
        }
    }

    /// Create a remote rejection carrying the panel's message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Check whether this error came from the panel rather than the transport.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Local validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select at least one item first")]
    NoSelection,

    #[error("Rename needs exactly one selected item ({selected} selected)")]
    RenameNeedsSingleSelection { selected: usize },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Please select a file to upload")]
    NoFileChosen,

    #[error("An upload is already in progress")]
    UploadInFlight,

    #[error("Selection is locked while items are staged for moving")]
    SelectionLocked,

    #[error("Nothing is staged for moving")]
    NothingStaged,

    #[error("Staged items are already being moved")]
    PasteInFlight,

    #[error("Command cannot be empty")]
    EmptyCommand,

    #[error("Confirmation required")]
    ConfirmationRequired,

    #[error("A backup is already running")]
    BackupBusy,

    #[error("{control} is not available right now")]
    ControlDisabled { control: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_generic() {
        let err = PanelError::network("connection refused (os error 111)");
        assert_eq!(err.to_string(), NETWORK_FAILURE_MESSAGE);
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_rejection_is_verbatim() {
        let err = PanelError::rejected("Source path does not exist.");
        assert_eq!(err.to_string(), "Source path does not exist.");
        assert!(err.is_rejection());
    }

    #[test]
    fn test_validation_converts() {
        let err: PanelError = ValidationError::NoFileChosen.into();
        assert_eq!(err.to_string(), "Please select a file to upload");
    }
}
