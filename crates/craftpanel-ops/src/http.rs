//! HTTP implementation of [`PanelApi`].

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use craftpanel_core::{
    DirEntry, Envelope, ListingBody, MessageBody, PanelConfig, PanelError, RemotePath, StatusBody,
};

use crate::api::{PanelApi, UploadFile};
use crate::progress::TransferMeter;

const FILES: &str = "api/files";
const START_SERVER: &str = "api/start_server";
const STOP_SERVER: &str = "api/stop_server";
const SERVER_STATUS: &str = "api/server_status";
const RUN_BACKUP: &str = "api/run_backup";
const SEND_COMMAND: &str = "api/send_command";
const MOVE: &str = "api/move";
const RENAME: &str = "api/rename";
const UPLOAD: &str = "api/upload";

/// Talks to the panel's JSON API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPanelClient {
    client: Client,
    base: Url,
    chunk_size: usize,
}

impl HttpPanelClient {
    /// Build a client from configuration.
    pub fn new(config: &PanelConfig) -> Result<Self, PanelError> {
        let base = base_url(&config.base_url)?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("craftpanel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PanelError::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            chunk_size: config.upload_chunk_size.max(1),
        })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, PanelError> {
        self.base
            .join(path)
            .map_err(|e| PanelError::network(format!("Invalid endpoint {path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PanelError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, PanelError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn post_message(&self, path: &str, body: &impl Serialize) -> Result<String, PanelError> {
        self.post_json::<MessageBody>(path, body)
            .await
            .map(|body| body.message)
    }

    async fn file_part(&self, file: &UploadFile, meter: &TransferMeter) -> Result<Part, PanelError> {
        let handle = tokio::fs::File::open(&file.local_path)
            .await
            .map_err(|e| PanelError::LocalFile {
                path: file.local_path.display().to_string(),
                message: e.to_string(),
            })?;

        let stream = metered_stream(handle, self.chunk_size, meter.clone());
        Ok(Part::stream_with_length(reqwest::Body::wrap_stream(stream), file.size)
            .file_name(file.file_name.clone()))
    }
}

/// Read `handle` in `chunk_size` pieces, advancing `meter` as each one is handed on.
fn metered_stream(
    handle: tokio::fs::File,
    chunk_size: usize,
    meter: TransferMeter,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    ReaderStream::with_capacity(handle, chunk_size)
        .inspect_ok(move |chunk| meter.advance(chunk.len() as u64))
}

/// Parse the configured base URL so relative endpoints join beneath it.
fn base_url(raw: &str) -> Result<Url, PanelError> {
    let mut url =
        Url::parse(raw).map_err(|e| PanelError::network(format!("Invalid base URL {raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport_error(err: reqwest::Error) -> PanelError {
    warn!(error = %err, "request failed");
    PanelError::network(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PanelError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;
    let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
        warn!(%status, error = %e, "undecodable reply");
        PanelError::network(format!("HTTP {status}: undecodable reply: {e}"))
    })?;
    envelope.into_result().inspect_err(|err| {
        debug!(%status, error = %err, "panel rejected request");
    })
}

#[async_trait]
impl PanelApi for HttpPanelClient {
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, PanelError> {
        self.get::<ListingBody>(FILES, &[("path", path.to_wire())])
            .await
            .map(|body| body.contents)
    }

    async fn start_server(&self) -> Result<String, PanelError> {
        self.post_message(START_SERVER, &json!({})).await
    }

    async fn stop_server(&self) -> Result<String, PanelError> {
        self.post_message(STOP_SERVER, &json!({})).await
    }

    async fn server_status(&self) -> Result<bool, PanelError> {
        self.get::<StatusBody>(SERVER_STATUS, &[])
            .await
            .map(|body| body.is_running)
    }

    async fn run_backup(&self) -> Result<String, PanelError> {
        self.post_message(RUN_BACKUP, &json!({})).await
    }

    async fn send_command(&self, command: &str) -> Result<String, PanelError> {
        self.post_message(SEND_COMMAND, &json!({ "command": command }))
            .await
    }

    async fn move_item(
        &self,
        source: &RemotePath,
        destination: &RemotePath,
    ) -> Result<String, PanelError> {
        self.post_message(
            MOVE,
            &json!({ "source": source.to_wire(), "destination": destination.to_wire() }),
        )
        .await
    }

    async fn rename_item(&self, path: &RemotePath, new_name: &str) -> Result<String, PanelError> {
        self.post_message(
            RENAME,
            &json!({ "old_path": path.to_wire(), "new_name": new_name }),
        )
        .await
    }

    async fn upload(
        &self,
        files: &[UploadFile],
        destination: &RemotePath,
        meter: TransferMeter,
    ) -> Result<String, PanelError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("file", self.file_part(file, &meter).await?);
        }
        form = form.text("destination", destination.to_wire());

        let url = self.endpoint(UPLOAD)?;
        debug!(%url, files = files.len(), bytes = meter.total(), "POST multipart");
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        decode::<MessageBody>(response).await.map(|body| body.message)
    }
}
