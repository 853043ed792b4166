use super::client::ChatCompletionsClient;
use super::prompt::{build_section_prompt, SECTION_SYSTEM_PROMPT};
use super::types::{DraftOutcome, GenerationOptions, GenerationRequest, LlmClient};
use super::{BackendError, DraftError};
use crate::config::DraftingConfig;
use crate::record::{Record, SectionId};

/// Drafts section narratives through an [`LlmClient`].
///
/// Every call goes to the backend, including calls with empty notes. There are
/// no internal retries: a retry is the user pressing the button again.
pub struct SectionDrafter<C: LlmClient> {
    client: C,
    options: GenerationOptions,
}

impl<C: LlmClient> SectionDrafter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build the backend request for one section.
    pub fn request_for(&self, section_name: &str, notes: &str) -> GenerationRequest {
        GenerationRequest {
            system: SECTION_SYSTEM_PROMPT.to_string(),
            prompt: build_section_prompt(section_name, notes),
            options: self.options.clone(),
        }
    }

    /// Draft a narrative paragraph for `section_name` from `notes`.
    ///
    /// On success the text is trimmed and guaranteed non-empty. On failure the
    /// outcome text is empty and the error kind is set.
    pub fn draft(&self, section_name: &str, notes: &str) -> DraftOutcome {
        let request = self.request_for(section_name, notes);
        tracing::debug!(section = section_name, notes_len = notes.len(), "Drafting section");

        let result = self.client.generate(&request).and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                Err(BackendError::EmptyResponse)
            } else {
                Ok(text.to_string())
            }
        });

        match result {
            Ok(text) => {
                tracing::info!(section = section_name, chars = text.len(), "Section drafted");
                DraftOutcome::success(text)
            }
            Err(e) => {
                let err = DraftError::from_backend(section_name, e);
                tracing::warn!(section = section_name, kind = ?err.kind(), error = %err, "Section draft failed");
                DraftOutcome::failure(err)
            }
        }
    }

    /// Draft a record section from its stored notes and store the result.
    ///
    /// The narrative is only replaced on success; the returned outcome carries
    /// any error for the caller to surface.
    pub fn draft_section(&self, record: &mut Record, id: SectionId) -> DraftOutcome {
        let outcome = self.draft(id.title(), record.notes(id));
        record.apply_draft(id, &outcome);
        outcome
    }
}

impl SectionDrafter<ChatCompletionsClient> {
    /// HTTP-backed drafter whose requests use the configured sampling settings.
    pub fn from_config(config: &DraftingConfig) -> Result<Self, BackendError> {
        let client = ChatCompletionsClient::from_config(config)?;
        Ok(Self::new(client).with_options(GenerationOptions::from(config)))
    }
}
