//! Error types for apod-bot operations.
//!
//! Defines error types for each major subsystem:
//! - Image composition (QR overlay)
//! - Remote translation (OpenAI Assistants)
//! - Photo fetching (NASA APOD)
//! - Publishing (Telegram)
//! - Job orchestration

use thiserror::Error;

/// Errors that can occur during image composition.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Input to the composer was malformed before any image work started.
    #[error("Invalid composition input: {0}")]
    Validation(String),

    /// The source image could not be decoded.
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    /// The composited image could not be encoded.
    #[error("Failed to encode composed image: {0}")]
    Encode(String),

    /// QR code construction failed for the given payload.
    #[error("Failed to build QR code: {0}")]
    Qr(String),
}

/// Errors that can occur while driving a remote translation run.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The requested target language is not supported.
    #[error("Unsupported target language '{0}': only 'ru' is available")]
    UnsupportedLanguage(String),

    /// The HTTP request itself failed (connection, TLS, etc.).
    #[error("Translation request failed: {0}")]
    RequestFailed(String),

    /// The remote API answered with a non-success status code.
    #[error("Translation API error ({code}): {message}")]
    Remote { code: u16, message: String },

    /// The run reached a terminal failure status.
    #[error("Translation run '{run_id}' ended with status '{status}'")]
    RunFailed { run_id: String, status: String },

    /// The run completed but the conversation held no usable text.
    #[error("Translation run produced no content: {0}")]
    EmptyResult(String),

    /// The run did not reach a terminal status before the deadline.
    #[error("Translation run '{run_id}' did not complete within {seconds} seconds")]
    Timeout { run_id: String, seconds: u64 },

    /// A response body could not be parsed.
    #[error("Failed to parse translation API response: {0}")]
    Parse(String),
}

/// Errors that can occur while fetching the daily photo.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request failed.
    #[error("APOD request failed: {0}")]
    RequestFailed(String),

    /// The APOD API answered with a non-success status code.
    #[error("APOD API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// The APOD response carried no usable photo URL.
    #[error("No valid photo data in APOD response: {0}")]
    NoPhotoData(String),

    /// The response body could not be parsed.
    #[error("Failed to parse APOD response: {0}")]
    Parse(String),
}

/// Errors that can occur while publishing to the channel.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The HTTP request failed.
    #[error("Publish request failed: {0}")]
    RequestFailed(String),

    /// The Telegram API rejected the request.
    #[error("Telegram API error ({code}): {message}")]
    Api { code: u16, message: String },
}

/// Errors surfaced by a single pipeline run.
///
/// Translation failures never appear here: they are absorbed by the caption
/// preparer, which falls back to the untranslated text.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Fetch stage failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Compose stage failed: {0}")]
    Compose(#[from] ComposeError),

    #[error("Publish stage failed: {0}")]
    Publish(#[from] PublishError),
}
