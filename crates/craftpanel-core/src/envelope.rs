//! JSON response envelopes returned by the panel.

use serde::Deserialize;

use crate::error::PanelError;
use crate::listing::DirEntry;

/// `{status: "success", ...}` or `{status: "error", message}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success(T),
    Error {
        #[serde(default)]
        message: String,
    },
}

impl<T> Envelope<T> {
    /// Turn the envelope into a result, mapping `status: error` to a rejection.
    pub fn into_result(self) -> Result<T, PanelError> {
        match self {
            Self::Success(body) => Ok(body),
            Self::Error { message } => Err(PanelError::rejected(message)),
        }
    }
}

/// Body of replies that only carry a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: String,
}

/// Body of a directory listing reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingBody {
    #[serde(default)]
    pub contents: Vec<DirEntry>,
}

/// Body of a running-state reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusBody {
    pub is_running: bool,
}
