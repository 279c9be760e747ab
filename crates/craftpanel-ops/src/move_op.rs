//! Batched move with fan-out/fan-in over independent requests.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use craftpanel_core::RemotePath;

use crate::OPERATION_CHANNEL_SIZE;
use crate::api::PanelApi;
use crate::progress::{OperationComplete, OperationError, OperationProgress};

/// Result sent through the channel during move operations.
#[derive(Debug)]
pub enum MoveResult {
    /// One more item resolved.
    Progress(OperationProgress),
    /// Every item resolved.
    Complete(OperationComplete),
}

/// Start a background batch move.
///
/// Returns a receiver for progress updates and the final result.
pub fn start_move<A>(
    api: Arc<A>,
    sources: Vec<RemotePath>,
    destination: RemotePath,
) -> mpsc::Receiver<MoveResult>
where
    A: PanelApi + ?Sized,
{
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::spawn(async move {
        let complete = move_batch(api.as_ref(), &sources, &destination, Some(&tx)).await;
        let _ = tx.send(MoveResult::Complete(complete)).await;
    });

    rx
}

/// Issue one move request per source concurrently and wait for all of them.
///
/// A failing or slow request never prevents the others from being reported;
/// the batch completes only once every request has resolved.
pub async fn move_batch<A>(
    api: &A,
    sources: &[RemotePath],
    destination: &RemotePath,
    progress_tx: Option<&mpsc::Sender<MoveResult>>,
) -> OperationComplete
where
    A: PanelApi + ?Sized,
{
    let mut progress = OperationProgress::new(sources.len());
    let mut succeeded = 0;

    let mut pending: FuturesUnordered<_> = sources
        .iter()
        .map(|source| async move { (source, api.move_item(source, destination).await) })
        .collect();

    while let Some((source, result)) = pending.next().await {
        match result {
            Ok(message) => {
                debug!(%source, %destination, %message, "moved");
                succeeded += 1;
                progress.complete_item(source.clone(), None);
            }
            Err(err) => {
                warn!(%source, %destination, error = %err, "move failed");
                progress.complete_item(
                    source.clone(),
                    Some(OperationError::new(source.clone(), err.to_string())),
                );
            }
        }

        if let Some(tx) = progress_tx {
            let _ = tx.send(MoveResult::Progress(progress.clone())).await;
        }
    }

    OperationComplete {
        succeeded,
        failed: progress.errors.len(),
        errors: progress.errors,
    }
}
