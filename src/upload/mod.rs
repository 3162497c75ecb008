//! Upload tracker
//!
//! Accepts selected files, validates them and simulates each upload with a
//! ticker that adds a random percentage every tick until the file reaches
//! 100%. Nothing is transferred anywhere; the tickers are timers on the
//! tracker's own [`Timeline`], and the random source is injected so a seeded
//! generator gives exact, repeatable tick counts.
//!
//! # Lifecycle
//!
//! | Status      | Entered when                   | Leaves                     |
//! |-------------|--------------------------------|----------------------------|
//! | `uploading` | validation passed on enqueue   | progress reaches 100       |
//! | `complete`  | progress reached 100           | never (removal only)       |
//! | `error`     | validation failed on enqueue   | never (removal only)       |
//!
//! Analysis may only start once at least one file is `complete`.

pub mod file;

pub use file::{validate, validate_with_limit, FileSpec, MAX_FILE_SIZE};

use crate::error::{FlowError, Result};
use crate::timeline::{Timeline, TimerId};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Opaque identifier of one selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        FileId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        FileId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Complete,
    Error,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Complete => write!(f, "complete"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub id: FileId,
    pub file: FileSpec,
    /// 0-100, never decreases
    pub progress: f64,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadedFile {
    pub fn is_complete(&self) -> bool {
        self.status == UploadStatus::Complete
    }
}

/// Tunables for the simulated upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Ticker period in milliseconds.
    pub tick_ms: u64,
    /// Each tick adds a random amount in `[0, max_increment)` percent.
    pub max_increment: f64,
    pub max_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            max_increment: 15.0,
            max_size: MAX_FILE_SIZE,
        }
    }
}

impl UploadConfig {
    /// Reject settings under which an accepted file could never finish.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(FlowError::InvalidConfig("upload tick must be positive".into()));
        }
        if !self.max_increment.is_finite() || self.max_increment <= 0.0 {
            return Err(FlowError::InvalidConfig(format!(
                "upload increment must be a positive number, got {}",
                self.max_increment
            )));
        }
        if self.max_size == 0 {
            return Err(FlowError::InvalidConfig("maximum file size must be positive".into()));
        }
        Ok(())
    }
}

/// What the upload screen hands to the analyzing screen: names only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSnapshot {
    pub files: Vec<UploadedFile>,
    pub ready: usize,
    pub total: usize,
    pub summary: String,
}

#[derive(Debug, Clone)]
enum UploadEvent {
    Tick(FileId),
}

pub struct UploadTracker<R> {
    config: UploadConfig,
    files: Vec<UploadedFile>,
    tickers: HashMap<FileId, TimerId>,
    timeline: Timeline<UploadEvent>,
    rng: R,
}

impl<R: Rng> UploadTracker<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(UploadConfig::default(), rng)
    }

    pub fn with_config(config: UploadConfig, rng: R) -> Self {
        Self {
            config,
            files: Vec::new(),
            tickers: HashMap::new(),
            timeline: Timeline::new(),
            rng,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Add one entry per file. Rejected files are kept as permanent errors at
    /// 0%; accepted files start uploading immediately.
    pub fn enqueue<I>(&mut self, files: I) -> Vec<FileId>
    where
        I: IntoIterator<Item = FileSpec>,
    {
        let mut ids = Vec::new();
        for file in files {
            let id = self.fresh_id();
            let error = validate_with_limit(&file, self.config.max_size);

            let status = match error {
                Some(ref reason) => {
                    warn!("Rejected {}: {}", file.name, reason);
                    UploadStatus::Error
                }
                None => {
                    debug!("Uploading {} ({}) as {}", file.name, file.size_label(), id);
                    let timer = self.timeline.set_interval(
                        Duration::from_millis(self.config.tick_ms),
                        UploadEvent::Tick(id.clone()),
                    );
                    self.tickers.insert(id.clone(), timer);
                    UploadStatus::Uploading
                }
            };

            self.files.push(UploadedFile {
                id: id.clone(),
                file,
                progress: 0.0,
                status,
                error,
            });
            ids.push(id);
        }
        ids
    }

    fn fresh_id(&mut self) -> FileId {
        loop {
            let id = FileId::generate(&mut self.rng);
            if !self.files.iter().any(|f| f.id == id) {
                return id;
            }
        }
    }

    /// Remove an entry whatever its status. Returns false for unknown ids.
    pub fn remove(&mut self, id: &FileId) -> bool {
        if let Some(timer) = self.tickers.remove(id) {
            self.timeline.cancel(timer);
        }
        let before = self.files.len();
        self.files.retain(|f| &f.id != id);
        let removed = before != self.files.len();
        if removed {
            debug!("Removed upload {}", id);
        }
        removed
    }

    /// Let `dt` of simulated time pass, running every due ticker.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.timeline.now() + dt;
        while let Some(fired) = self.timeline.pop_due(target) {
            match fired.event {
                UploadEvent::Tick(id) => self.tick(&id),
            }
        }
        self.timeline.settle(target);
    }

    fn tick(&mut self, id: &FileId) {
        let increment = if self.config.max_increment > 0.0 {
            self.rng.gen_range(0.0..self.config.max_increment)
        } else {
            0.0
        };

        let Some(entry) = self.files.iter_mut().find(|f| &f.id == id) else {
            return;
        };
        if entry.status != UploadStatus::Uploading {
            return;
        }

        entry.progress += increment;
        if entry.progress >= 100.0 {
            entry.progress = 100.0;
            entry.status = UploadStatus::Complete;
            info!("Upload complete: {}", entry.file.name);
            if let Some(timer) = self.tickers.remove(id) {
                self.timeline.cancel(timer);
            }
        }
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| &f.id == id)
    }

    pub fn ready_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_complete()).count()
    }

    /// True once no file is still uploading.
    pub fn is_settled(&self) -> bool {
        self.files
            .iter()
            .all(|f| f.status != UploadStatus::Uploading)
    }

    /// Simulated time elapsed on this tracker.
    pub fn elapsed(&self) -> Duration {
        self.timeline.now()
    }

    /// Per-file validation failures, for inline display.
    pub fn rejected(&self) -> Vec<FlowError> {
        self.files
            .iter()
            .filter_map(|f| {
                f.error.as_ref().map(|reason| FlowError::Validation {
                    file: f.file.name.clone(),
                    reason: reason.clone(),
                })
            })
            .collect()
    }

    pub fn summary_line(&self) -> String {
        format!("{} of {} files ready", self.ready_count(), self.files.len())
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        UploadSnapshot {
            files: self.files.clone(),
            ready: self.ready_count(),
            total: self.files.len(),
            summary: self.summary_line(),
        }
    }

    /// Hand the names of completed files to the analyzing stage, or refuse
    /// with a notice when nothing is ready. Refusal changes nothing.
    pub fn proceed(&self) -> Result<Handoff> {
        let files: Vec<String> = self
            .files
            .iter()
            .filter(|f| f.is_complete())
            .map(|f| f.file.name.clone())
            .collect();

        if files.is_empty() {
            warn!("Analyze requested with no completed uploads");
            return Err(FlowError::NoFilesReady);
        }
        Ok(Handoff { files })
    }

    /// Cancel every ticker. Entries keep their last state.
    pub fn shutdown(&mut self) {
        self.timeline.cancel_all();
        self.tickers.clear();
    }

    /// Live tickers, mostly for teardown checks.
    pub fn active_tickers(&self) -> usize {
        self.timeline.pending()
    }
}
