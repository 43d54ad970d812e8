//! Integration tests for the photo pipeline.
//!
//! The offline tests drive the full pipeline through the public API with
//! in-memory collaborators. The network tests make real API calls.
//! Run those with: NASA_API_KEY=DEMO_KEY cargo test --test pipeline_integration -- --ignored

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};

use apod_bot::caption::CaptionPreparer;
use apod_bot::config::ComposeConfig;
use apod_bot::error::{FetchError, PublishError, TranslationError};
use apod_bot::fetch::{ApodClient, PhotoArtifact, PhotoSource};
use apod_bot::job::PhotoJob;
use apod_bot::publish::PublishSink;
use apod_bot::translate::{
    ConversationMessage, RunStatus, TranslationBackend, Translator,
};

fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([70, 70, 70]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .expect("test image should encode");
    buf
}

struct StubSource {
    artifact: PhotoArtifact,
}

#[async_trait]
impl PhotoSource for StubSource {
    async fn fetch(&self) -> Result<PhotoArtifact, FetchError> {
        Ok(self.artifact.clone())
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    published: Arc<Mutex<Vec<(Vec<u8>, String)>>>,
}

#[async_trait]
impl PublishSink for RecordingSink {
    async fn publish(&self, image_bytes: Vec<u8>, caption: &str) -> Result<(), PublishError> {
        self.published
            .lock()
            .expect("lock")
            .push((image_bytes, caption.to_string()));
        Ok(())
    }
}

/// Backend that completes after a couple of pending polls and replies with
/// a fixed translation.
struct SlowBackend {
    polls_before_completion: Mutex<u32>,
    reply: String,
}

#[async_trait]
impl TranslationBackend for SlowBackend {
    async fn create_conversation(&self) -> Result<String, TranslationError> {
        Ok("thread_1".to_string())
    }

    async fn add_message(&self, _: &str, _: &str) -> Result<(), TranslationError> {
        Ok(())
    }

    async fn start_run(&self, _: &str) -> Result<String, TranslationError> {
        Ok("run_1".to_string())
    }

    async fn run_status(&self, _: &str, _: &str) -> Result<RunStatus, TranslationError> {
        let mut remaining = self.polls_before_completion.lock().expect("lock");
        if *remaining == 0 {
            Ok(RunStatus::Completed)
        } else {
            *remaining -= 1;
            Ok(RunStatus::Pending("in_progress".to_string()))
        }
    }

    async fn list_messages(&self, _: &str) -> Result<Vec<ConversationMessage>, TranslationError> {
        Ok(vec![ConversationMessage {
            text_segments: vec![self.reply.clone()],
        }])
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_pipeline_with_translated_caption() {
    let backend = SlowBackend {
        polls_before_completion: Mutex::new(2),
        reply: "Туманность Ориона\n\nОблако газа и пыли.".to_string(),
    };
    let translator = Translator::new(
        Box::new(backend),
        Duration::from_secs(1),
        Duration::from_secs(30),
    );

    let sink = RecordingSink::default();
    let job = PhotoJob::new(
        Box::new(StubSource {
            artifact: PhotoArtifact {
                url: "https://example.com/apod.jpg".to_string(),
                image_bytes: test_jpeg(640, 480),
                title: "Orion Nebula".to_string(),
                explanation: "A cloud of gas and dust.".to_string(),
            },
        }),
        Box::new(sink.clone()),
        CaptionPreparer::new(translator, "ru"),
        ComposeConfig::default(),
        "https://t.me/astro_daily",
    );

    job.execute().await.expect("pipeline should succeed");

    let published = sink.published.lock().expect("lock");
    assert_eq!(published.len(), 1);

    let (bytes, caption) = &published[0];
    assert_eq!(caption, "Туманность Ориона\n\nОблако газа и пыли.");

    let composed = image::load_from_memory(bytes).expect("published bytes should decode");
    assert_eq!((composed.width(), composed.height()), (640, 480));
}

#[tokio::test(start_paused = true)]
async fn test_full_pipeline_times_out_and_falls_back() {
    // Backend that never reaches a terminal status within the 3s deadline.
    let backend = SlowBackend {
        polls_before_completion: Mutex::new(u32::MAX),
        reply: "unused".to_string(),
    };
    let translator = Translator::new(
        Box::new(backend),
        Duration::from_secs(1),
        Duration::from_secs(3),
    );

    let sink = RecordingSink::default();
    let job = PhotoJob::new(
        Box::new(StubSource {
            artifact: PhotoArtifact {
                url: "https://example.com/apod.jpg".to_string(),
                image_bytes: test_jpeg(320, 240),
                title: "Orion Nebula".to_string(),
                explanation: "A cloud of gas and dust.".to_string(),
            },
        }),
        Box::new(sink.clone()),
        CaptionPreparer::new(translator, "ru"),
        ComposeConfig::default(),
        "https://t.me/astro_daily",
    );

    job.execute().await.expect("timeout must not abort the run");

    let published = sink.published.lock().expect("lock");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, "Orion Nebula\n\nA cloud of gas and dust.");
}

#[tokio::test]
#[ignore] // Run with: NASA_API_KEY=DEMO_KEY cargo test --test pipeline_integration -- --ignored
async fn test_apod_fetch_live() {
    let api_key = std::env::var("NASA_API_KEY").unwrap_or_else(|_| "DEMO_KEY".to_string());
    let client = ApodClient::new(
        "https://api.nasa.gov/planetary/apod".to_string(),
        api_key,
    );

    // Video days legitimately return NoPhotoData; everything else should
    // produce a decodable image.
    match client.fetch().await {
        Ok(photo) => {
            assert!(!photo.title.is_empty());
            assert!(!photo.image_bytes.is_empty());
            image::load_from_memory(&photo.image_bytes).expect("APOD image should decode");
        }
        Err(FetchError::NoPhotoData(_)) => {}
        Err(other) => panic!("unexpected fetch error: {other}"),
    }
}
