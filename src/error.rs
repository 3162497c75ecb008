//! Error type shared by the flow, the CLI and the web UI

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    /// A selected file failed type or size validation. Non-fatal: the file
    /// is kept in the list, marked as errored, and excluded from analysis.
    #[error("{file}: {reason}")]
    Validation { file: String, reason: String },

    /// Tried to start analysis with no completed uploads.
    #[error("No files ready: please wait for files to finish uploading.")]
    NoFilesReady,

    #[error("invalid sequencer configuration: {0}")]
    InvalidConfig(String),

    #[error("the verification code must be {0} digits")]
    InvalidOtp(usize),

    #[error("{0}")]
    InvalidState(String),

    #[error("unknown upload id {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}

impl FlowError {
    /// Precondition failures are shown as a transient notice; everything else
    /// is reported inline or as a hard error.
    pub fn is_notice(&self) -> bool {
        matches!(self, FlowError::NoFilesReady)
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
