//! Poll-to-completion translation operation.
//!
//! Models one remote translation job as an explicit state machine:
//!
//! ```text
//! Created -> MessageAdded -> Running -> Completed
//!                                    -> Failed | Cancelled | Expired | TimedOut
//! ```
//!
//! The poll loop sleeps between attempts (non-busy) and stops on the first
//! terminal status or once the wall-clock deadline elapses. State lives for
//! one call and is never persisted.

use std::time::Duration;

use tokio::time::Instant;

use super::client::{RunStatus, TranslationBackend};
use crate::error::TranslationError;

/// The single target language this operation supports.
pub const SUPPORTED_LANGUAGE: &str = "ru";

/// Status of a translation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// A conversation context has been opened.
    Created,
    /// The source text has been submitted.
    MessageAdded,
    /// A processing run is in flight.
    Running,
    /// The run finished and output was extracted.
    Completed,
    /// The run ended in remote failure.
    Failed,
    /// The run was cancelled remotely.
    Cancelled,
    /// The run expired remotely.
    Expired,
    /// The deadline elapsed before a terminal status was observed.
    TimedOut,
}

impl OperationStatus {
    /// Whether no further transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed
                | OperationStatus::Failed
                | OperationStatus::Cancelled
                | OperationStatus::Expired
                | OperationStatus::TimedOut
        )
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Created => write!(f, "created"),
            OperationStatus::MessageAdded => write!(f, "message_added"),
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Completed => write!(f, "completed"),
            OperationStatus::Failed => write!(f, "failed"),
            OperationStatus::Cancelled => write!(f, "cancelled"),
            OperationStatus::Expired => write!(f, "expired"),
            OperationStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// State of a single translation operation, allocated per call.
#[derive(Debug, Clone)]
pub struct OperationState {
    /// Conversation context id.
    pub thread_id: String,
    /// Run id, present once the run has started.
    pub run_id: Option<String>,
    /// Current status.
    pub status: OperationStatus,
}

/// Drives remote translation runs to completion or failure.
pub struct Translator {
    /// Remote conversation backend.
    backend: Box<dyn TranslationBackend>,
    /// Delay between run status polls.
    polling_interval: Duration,
    /// Wall-clock deadline, measured from run start.
    max_wait: Duration,
}

impl Translator {
    /// Creates a translator over the given backend.
    pub fn new(
        backend: Box<dyn TranslationBackend>,
        polling_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            backend,
            polling_interval,
            max_wait,
        }
    }

    /// Translates `text` into the target language.
    ///
    /// # Errors
    ///
    /// - `TranslationError::UnsupportedLanguage` if `language_code` is not
    ///   the single supported code (checked before any remote call).
    /// - `TranslationError::Remote` / `RequestFailed` if any remote call
    ///   fails (aborts immediately, no retry).
    /// - `TranslationError::RunFailed` on a terminal failure status.
    /// - `TranslationError::Timeout` if the deadline elapses first.
    /// - `TranslationError::EmptyResult` if the completed conversation
    ///   holds no usable text.
    pub async fn translate(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<String, TranslationError> {
        if language_code != SUPPORTED_LANGUAGE {
            return Err(TranslationError::UnsupportedLanguage(
                language_code.to_string(),
            ));
        }

        tracing::info!("Translating caption via remote assistant");

        let thread_id = self.backend.create_conversation().await?;
        let mut state = OperationState {
            thread_id,
            run_id: None,
            status: OperationStatus::Created,
        };

        self.backend.add_message(&state.thread_id, text).await?;
        state.status = OperationStatus::MessageAdded;

        let run_id = self.backend.start_run(&state.thread_id).await?;
        state.run_id = Some(run_id.clone());
        state.status = OperationStatus::Running;

        self.wait_for_completion(&mut state, &run_id).await?;

        let translated = self.extract_latest_text(&state.thread_id).await?;
        tracing::info!(thread_id = %state.thread_id, run_id = %run_id, "Translation completed");
        Ok(translated)
    }

    /// Polls the run until a terminal status or the deadline.
    async fn wait_for_completion(
        &self,
        state: &mut OperationState,
        run_id: &str,
    ) -> Result<(), TranslationError> {
        let started = Instant::now();

        loop {
            let status = self.backend.run_status(&state.thread_id, run_id).await?;

            match status {
                RunStatus::Completed => {
                    state.status = OperationStatus::Completed;
                    tracing::debug!(run_id, "Run completed");
                    return Ok(());
                }
                RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                    state.status = match &status {
                        RunStatus::Cancelled => OperationStatus::Cancelled,
                        RunStatus::Expired => OperationStatus::Expired,
                        _ => OperationStatus::Failed,
                    };
                    return Err(TranslationError::RunFailed {
                        run_id: run_id.to_string(),
                        status: status.as_str().to_string(),
                    });
                }
                RunStatus::Pending(ref wire_status) => {
                    tracing::trace!(run_id, status = %wire_status, "Run still pending");
                }
            }

            if started.elapsed() >= self.max_wait {
                state.status = OperationStatus::TimedOut;
                return Err(TranslationError::Timeout {
                    run_id: run_id.to_string(),
                    seconds: self.max_wait.as_secs(),
                });
            }

            tokio::time::sleep(self.polling_interval).await;
        }
    }

    /// Extracts the first text segment of the most recent message.
    async fn extract_latest_text(&self, thread_id: &str) -> Result<String, TranslationError> {
        let messages = self.backend.list_messages(thread_id).await?;

        let latest = messages.into_iter().next().ok_or_else(|| {
            TranslationError::EmptyResult("no messages in conversation".to_string())
        })?;

        latest.text_segments.into_iter().next().ok_or_else(|| {
            TranslationError::EmptyResult("no text content in latest message".to_string())
        })
    }
}
