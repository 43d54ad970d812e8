//! apod-bot: daily NASA APOD publisher for a Telegram channel.
//!
//! Fetches the Astronomy Picture of the Day, overlays a QR code linking to
//! the channel, translates the caption through the OpenAI Assistants API,
//! and publishes the result.

// Core modules
pub mod caption;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod fetch;
pub mod job;
pub mod publish;
pub mod scheduler;
pub mod translate;

// Re-export commonly used error types
pub use error::{ComposeError, FetchError, JobError, PublishError, TranslationError};
