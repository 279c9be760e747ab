//! The request/response surface of the panel.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use craftpanel_core::{DirEntry, PanelError, RemotePath};

use crate::progress::TransferMeter;

/// A local file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Where the bytes are read from.
    pub local_path: PathBuf,
    /// Name the panel stores the file under.
    pub file_name: String,
    /// Size in bytes at the time the file was chosen.
    pub size: u64,
}

impl UploadFile {
    /// Stat a local file and prepare it for upload.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "Path has no file name")
            })?;

        Ok(Self {
            local_path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }
}

/// Total size of a set of upload files.
pub fn total_size(files: &[UploadFile]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Every remote call the client makes.
///
/// Implementations map transport failures to [`PanelError::Network`] and
/// `status: error` replies to [`PanelError::Rejected`].
#[async_trait]
pub trait PanelApi: Send + Sync + 'static {
    /// List a directory.
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, PanelError>;

    /// Ask the panel to start the managed process.
    async fn start_server(&self) -> Result<String, PanelError>;

    /// Ask the panel to stop the managed process.
    async fn stop_server(&self) -> Result<String, PanelError>;

    /// Query whether the managed process is running.
    async fn server_status(&self) -> Result<bool, PanelError>;

    /// Trigger the backup job.
    async fn run_backup(&self) -> Result<String, PanelError>;

    /// Send a console command to the managed process.
    async fn send_command(&self, command: &str) -> Result<String, PanelError>;

    /// Move one item into a destination directory.
    async fn move_item(
        &self,
        source: &RemotePath,
        destination: &RemotePath,
    ) -> Result<String, PanelError>;

    /// Rename one item in place.
    async fn rename_item(&self, path: &RemotePath, new_name: &str) -> Result<String, PanelError>;

    /// Upload files in one multipart request, reporting bytes through `meter`.
    async fn upload(
        &self,
        files: &[UploadFile],
        destination: &RemotePath,
        meter: TransferMeter,
    ) -> Result<String, PanelError>;
}
