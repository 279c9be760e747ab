//! Rename operation.

use tracing::{debug, warn};

use craftpanel_core::{PanelError, RemotePath, ValidationError};

use crate::api::PanelApi;

/// Check a requested rename before anything is sent.
///
/// Returns `Ok(None)` when the name is unchanged (nothing to do) and the
/// trimmed name otherwise.
pub fn prepare_rename(source: &RemotePath, new_name: &str) -> Result<Option<String>, ValidationError> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if source.file_name() == Some(name) {
        return Ok(None);
    }
    validate_filename(name).map_err(|reason| ValidationError::InvalidName { reason })?;
    Ok(Some(name.to_string()))
}

/// Rename a single remote item.
pub async fn rename<A>(api: &A, source: &RemotePath, new_name: &str) -> Result<String, PanelError>
where
    A: PanelApi + ?Sized,
{
    match api.rename_item(source, new_name).await {
        Ok(message) => {
            debug!(%source, new_name, %message, "renamed");
            Ok(message)
        }
        Err(err) => {
            warn!(%source, new_name, error = %err, "rename failed");
            Err(err)
        }
    }
}

/// Validate a filename for the remote tree.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }

    for c in ['/', '\\', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain {c:?}"));
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
