use serde::{Deserialize, Serialize};

use super::{BackendError, DraftError};
use crate::config::{DraftingConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

/// Sampling parameters for a drafting request.
///
/// Report prose should be consistent across repeated drafts, so the default
/// temperature is low and the completion length is capped to one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0-1.0). Lower = more deterministic.
    pub temperature: f32,
    /// Maximum tokens in the generated response.
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl From<&DraftingConfig> for GenerationOptions {
    fn from(config: &DraftingConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// One backend call: fixed system instruction plus per-section user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Text-generation backend abstraction (allows mocking)
pub trait LlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError>;
}

impl<T: LlmClient + ?Sized> LlmClient for &T {
    fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        (**self).generate(request)
    }
}

impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        (**self).generate(request)
    }
}

/// Result of one drafting call.
///
/// On failure `text` is empty and `error` says why; the caller decides whether
/// to keep the previous narrative or show the empty draft, and must tell the
/// user either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOutcome {
    pub text: String,
    pub error: Option<DraftError>,
}

impl DraftOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn failure(error: DraftError) -> Self {
        Self {
            text: String::new(),
            error: Some(error),
        }
    }

    /// A success always carries non-blank text.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.text.trim().is_empty()
    }

    pub fn into_result(self) -> Result<String, DraftError> {
        match self.error {
            Some(err) => Err(err),
            None if self.text.trim().is_empty() => {
                Err(DraftError::from_backend("", BackendError::EmptyResponse))
            }
            None => Ok(self.text),
        }
    }
}
