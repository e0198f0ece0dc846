//! Conversation controller
//!
//! Owns the message thread, the draft being composed, and the submission
//! status. A submission is split at its one suspension point: `begin_submit`
//! validates and records the user message, the caller sends the returned
//! payload, and `finish_submit` applies the outcome. `submit` runs the whole
//! cycle inline.

use tracing::{debug, warn};

use crate::client::{AssistantClient, ClientError};
use crate::state::{ChatMessage, SubmitStatus};

/// Shown to the user whenever a submission fails, whatever the cause.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to connect to the assistant. Please try again.";

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    draft: String,
    status: SubmitStatus,
    last_error: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.status == SubmitStatus::Pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True when a submit right now would send a request.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.draft.trim().is_empty()
    }

    /// Start a submission.
    ///
    /// Returns the full conversation to send, or `None` (with no state
    /// change) when the draft is blank or a submission is already pending.
    pub fn begin_submit(&mut self) -> Option<Vec<ChatMessage>> {
        if !self.can_submit() {
            return None;
        }

        let content = std::mem::take(&mut self.draft);
        self.messages.push(ChatMessage::user(content));
        self.status = SubmitStatus::Pending;
        self.last_error = None;

        debug!(count = self.messages.len(), "submission started");
        Some(self.messages.clone())
    }

    /// Apply the outcome of the pending submission.
    ///
    /// The reply is appended exactly as the endpoint returned it. Outcomes
    /// that arrive while idle are dropped.
    pub fn finish_submit(&mut self, outcome: Result<ChatMessage, ClientError>) {
        if !self.is_submitting() {
            warn!("submission outcome arrived with nothing pending, ignoring");
            return;
        }

        match outcome {
            Ok(reply) => {
                debug!(role = reply.role.as_str(), "reply received");
                self.messages.push(reply);
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.last_error = Some(SUBMIT_FAILED_MESSAGE.to_string());
            }
        }
        self.status = SubmitStatus::Idle;
    }

    /// Run one full submission against `client`.
    ///
    /// Returns whether a request was sent.
    pub async fn submit(&mut self, client: &AssistantClient) -> bool {
        let Some(payload) = self.begin_submit() else {
            return false;
        };

        let outcome = client.send(&payload).await;
        self.finish_submit(outcome);
        true
    }
}
