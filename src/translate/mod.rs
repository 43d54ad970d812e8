//! Remote translation through the OpenAI Assistants API.
//!
//! `AssistantsClient` speaks the wire protocol (threads, messages, runs);
//! `Translator` drives a run to a terminal status with a bounded poll loop.

pub mod client;
pub mod operation;

pub use client::{AssistantsClient, ConversationMessage, RunStatus, TranslationBackend};
pub use operation::{OperationState, OperationStatus, Translator, SUPPORTED_LANGUAGE};
