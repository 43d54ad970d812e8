//! Daily photo job orchestration.
//!
//! One trigger runs one strictly sequential pipeline: fetch the photo,
//! compose the QR overlay, prepare the caption, publish. The first stage
//! error aborts the run and propagates to the caller; the scheduler owns
//! any retry policy.

use std::time::Instant;

use crate::caption::CaptionPreparer;
use crate::compose;
use crate::config::ComposeConfig;
use crate::error::JobError;
use crate::fetch::PhotoSource;
use crate::publish::PublishSink;

/// The daily photo posting job.
pub struct PhotoJob {
    source: Box<dyn PhotoSource>,
    sink: Box<dyn PublishSink>,
    caption_preparer: CaptionPreparer,
    compose_config: ComposeConfig,
    /// Link encoded into the QR overlay.
    link_payload: String,
}

impl PhotoJob {
    /// Wires a job from its collaborators.
    pub fn new(
        source: Box<dyn PhotoSource>,
        sink: Box<dyn PublishSink>,
        caption_preparer: CaptionPreparer,
        compose_config: ComposeConfig,
        link_payload: impl Into<String>,
    ) -> Self {
        Self {
            source,
            sink,
            caption_preparer,
            compose_config,
            link_payload: link_payload.into(),
        }
    }

    /// Executes one pipeline run.
    ///
    /// # Errors
    ///
    /// Returns the first stage error (fetch, compose, or publish).
    /// Translation errors never surface here; the caption preparer absorbs
    /// them by falling back to the untranslated text.
    pub async fn execute(&self) -> Result<(), JobError> {
        tracing::info!("Starting photo job execution");
        let started = Instant::now();

        let photo = self.source.fetch().await?;

        let composed = compose::compose(
            &photo.image_bytes,
            &self.link_payload,
            &self.compose_config,
        )?;

        let caption = self.caption_preparer.prepare(&photo).await;

        self.sink.publish(composed, &caption).await?;

        tracing::info!(
            duration_ms = started.elapsed().as_millis() as u64,
            "Photo job completed successfully"
        );
        Ok(())
    }
}
