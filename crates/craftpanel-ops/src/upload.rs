//! Multipart upload with byte-level progress.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use craftpanel_core::{PanelError, RemotePath, ValidationError};

use crate::OPERATION_CHANNEL_SIZE;
use crate::api::{PanelApi, UploadFile, total_size};
use crate::progress::{TransferMeter, TransferProgress};

/// Result sent through the channel during an upload.
#[derive(Debug)]
pub enum UploadResult {
    /// More bytes were handed to the transport.
    Progress(TransferProgress),
    /// The panel answered (or the transfer failed).
    Complete(Result<String, PanelError>),
}

/// Start a background upload of `files` into `destination`.
///
/// All files travel in a single request. Progress updates are forwarded
/// as the body is streamed; on success a final update reports every byte.
pub fn start_upload<A>(
    api: Arc<A>,
    files: Vec<UploadFile>,
    destination: RemotePath,
) -> mpsc::Receiver<UploadResult>
where
    A: PanelApi + ?Sized,
{
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        if files.is_empty() {
            let _ = tx
                .send(UploadResult::Complete(Err(ValidationError::NoFileChosen.into())))
                .await;
            return;
        }

        let (meter, mut progress_rx) = TransferMeter::new(total_size(&files));
        let upload = api.upload(&files, &destination, meter.clone());
        tokio::pin!(upload);

        let result = loop {
            tokio::select! {
                result = &mut upload => break result,
                Ok(()) = progress_rx.changed() => {
                    let progress = *progress_rx.borrow_and_update();
                    let _ = tx.send(UploadResult::Progress(progress)).await;
                }
            }
        };

        match &result {
            Ok(message) => {
                debug!(%destination, files = files.len(), %message, "upload complete");
                meter.finish();
                let progress = *progress_rx.borrow_and_update();
                let _ = tx.send(UploadResult::Progress(progress)).await;
            }
            Err(err) => warn!(%destination, error = %err, "upload failed"),
        }

        let _ = tx.send(UploadResult::Complete(result)).await;
    });

    rx
}
