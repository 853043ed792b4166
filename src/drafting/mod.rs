//! Section drafting: turns short examiner notes into a report-ready paragraph
//! through an external text-generation backend.
//!
//! Failures never propagate as panics or hard errors to the UI. A failed draft
//! yields an empty text plus a [`DraftError`] the caller must surface.

pub mod types;
pub mod prompt;
pub mod client;
pub mod drafter;

pub use types::*;
pub use prompt::*;
pub use client::*;
pub use drafter::*;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by an [`LlmClient`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend rate limit exceeded")]
    RateLimited { retry_after: Option<u64> },

    #[error("Cannot reach text-generation backend at {0}")]
    Connection(String),

    #[error("Backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Backend returned an empty completion")]
    EmptyResponse,
}

/// Drafting failure, as reported to the calling layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Rate limit reached while drafting {section}; wait a moment and try again")]
    RateLimited {
        section: String,
        retry_after: Option<u64>,
    },

    #[error("Failed to draft {section}: {detail}")]
    GenerationFailed { section: String, detail: String },
}

/// Tag for [`DraftError`] without its payload, for UI branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftErrorKind {
    RateLimited,
    GenerationFailed,
}

impl DraftError {
    /// Map a backend error onto the two-kind drafting taxonomy.
    pub fn from_backend(section: &str, err: BackendError) -> Self {
        match err {
            BackendError::RateLimited { retry_after } => Self::RateLimited {
                section: section.to_string(),
                retry_after,
            },
            other => Self::GenerationFailed {
                section: section.to_string(),
                detail: other.to_string(),
            },
        }
    }

    pub fn kind(&self) -> DraftErrorKind {
        match self {
            Self::RateLimited { .. } => DraftErrorKind::RateLimited,
            Self::GenerationFailed { .. } => DraftErrorKind::GenerationFailed,
        }
    }

    pub fn section(&self) -> &str {
        match self {
            Self::RateLimited { section, .. } | Self::GenerationFailed { section, .. } => section,
        }
    }
}
