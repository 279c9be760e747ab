//! Upload pipeline state: the chosen files and the single active job.

use craftpanel_core::{RemotePath, ValidationError};
use craftpanel_ops::{TransferProgress, UploadFile, total_size};

/// An upload in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJob {
    pub id: u64,
    pub file_names: Vec<String>,
    pub destination: RemotePath,
    pub bytes_total: u64,
    progress: f64,
}

impl UploadJob {
    /// Fraction of bytes handed to the transport, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }
}

/// At most one upload runs at a time; the file choice outlives failures.
#[derive(Debug, Clone, Default)]
pub struct UploadPipeline {
    chosen: Vec<UploadFile>,
    active: Option<UploadJob>,
    next_id: u64,
}

impl UploadPipeline {
    /// Replace the chosen files.
    pub fn choose(&mut self, files: Vec<UploadFile>) {
        self.chosen = files;
    }

    pub fn chosen(&self) -> &[UploadFile] {
        &self.chosen
    }

    /// Start a job for the chosen files.
    pub fn begin(&mut self, destination: RemotePath) -> Result<(UploadJob, Vec<UploadFile>), ValidationError> {
        if self.active.is_some() {
            return Err(ValidationError::UploadInFlight);
        }
        if self.chosen.is_empty() {
            return Err(ValidationError::NoFileChosen);
        }

        self.next_id += 1;
        let job = UploadJob {
            id: self.next_id,
            file_names: self.chosen.iter().map(|f| f.file_name.clone()).collect(),
            destination,
            bytes_total: total_size(&self.chosen),
            progress: 0.0,
        };
        self.active = Some(job.clone());
        Ok((job, self.chosen.clone()))
    }

    /// Record transfer progress. Updates never move the fraction backwards.
    pub fn progress(&mut self, id: u64, progress: TransferProgress) {
        if let Some(job) = self.active.as_mut().filter(|job| job.id == id) {
            job.progress = job.progress.max(progress.fraction());
        }
    }

    /// End job `id`. A success clears the chosen files.
    pub fn finish(&mut self, id: u64, succeeded: bool) -> Option<UploadJob> {
        if self.active.as_ref().is_none_or(|job| job.id != id) {
            return None;
        }
        let mut job = self.active.take()?;
        if succeeded {
            job.progress = 1.0;
            self.chosen.clear();
        }
        Some(job)
    }

    pub fn active(&self) -> Option<&UploadJob> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
