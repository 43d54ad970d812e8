//! Caption preparation policy.
//!
//! Builds the post caption from the photo's title and explanation,
//! translating it when the remote operation succeeds. Translation failures
//! are absorbed here, exactly once: the untranslated text is published
//! verbatim instead. The length limit applies to the translated path only.

use crate::fetch::PhotoArtifact;
use crate::translate::Translator;

/// Telegram's hard limit for photo captions, in characters.
pub const CAPTION_LIMIT: usize = 1024;

/// Suffix appended when a translated caption is truncated.
pub const TRUNCATION_SUFFIX: &str = "...";

/// Prepares captions for publishing.
pub struct CaptionPreparer {
    translator: Translator,
    target_language: String,
}

impl CaptionPreparer {
    /// Creates a preparer targeting the given language.
    pub fn new(translator: Translator, target_language: impl Into<String>) -> Self {
        Self {
            translator,
            target_language: target_language.into(),
        }
    }

    /// Builds the caption for a photo.
    ///
    /// Never fails: any translation error falls back to the original text.
    pub async fn prepare(&self, photo: &PhotoArtifact) -> String {
        let original = format!("{}\n\n{}", photo.title, photo.explanation);

        match self
            .translator
            .translate(&original, &self.target_language)
            .await
        {
            Ok(translated) => enforce_limit(translated),
            Err(err) => {
                tracing::warn!(error = %err, "Caption translation failed, using original text");
                original
            }
        }
    }
}

/// Truncates a caption to [`CAPTION_LIMIT`] characters, ending with the
/// truncation suffix so the total is exactly the limit.
fn enforce_limit(caption: String) -> String {
    let length = caption.chars().count();
    if length <= CAPTION_LIMIT {
        return caption;
    }

    let keep = CAPTION_LIMIT - TRUNCATION_SUFFIX.chars().count();
    tracing::warn!(
        length,
        limit = CAPTION_LIMIT,
        kept = keep,
        "Translated caption over limit, truncating"
    );

    let mut truncated: String = caption.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}
