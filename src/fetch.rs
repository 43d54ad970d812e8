//! NASA APOD photo source.
//!
//! Fetches the Astronomy Picture of the Day metadata and downloads the
//! high-definition image. No retries here; failures propagate to the job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;

/// One day's photo with its metadata, consumed once per pipeline run.
#[derive(Debug, Clone)]
pub struct PhotoArtifact {
    /// URL the image was downloaded from.
    pub url: String,
    /// Raw image bytes.
    pub image_bytes: Vec<u8>,
    /// APOD title.
    pub title: String,
    /// APOD explanation text.
    pub explanation: String,
}

/// Capability to fetch the daily photo.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Fetches today's photo and its metadata.
    async fn fetch(&self) -> Result<PhotoArtifact, FetchError>;
}

/// Client for the NASA APOD API.
pub struct ApodClient {
    /// APOD endpoint URL.
    api_url: String,
    /// NASA API key.
    api_key: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl ApodClient {
    /// Creates a new APOD client.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            api_url,
            api_key,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

/// Internal APOD response structure.
#[derive(Debug, Deserialize)]
struct ApiApodResponse {
    #[serde(default)]
    hdurl: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    media_type: Option<String>,
}

#[async_trait]
impl PhotoSource for ApodClient {
    async fn fetch(&self) -> Result<PhotoArtifact, FetchError> {
        tracing::info!("Fetching NASA Astronomy Picture of the Day");

        let url = format!("{}?api_key={}", self.api_url, self.api_key);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(FetchError::Api {
                code: status.as_u16(),
                message: body,
            });
        }

        let apod: ApiApodResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        // Video days carry no hdurl; either way there is nothing to post.
        let hdurl = match apod.hdurl {
            Some(ref u) if !u.is_empty() => u.clone(),
            _ => {
                return Err(FetchError::NoPhotoData(format!(
                    "no hdurl in APOD response (media_type: {})",
                    apod.media_type.as_deref().unwrap_or("unknown")
                )))
            }
        };

        tracing::info!(url = %hdurl, title = %apod.title, "APOD metadata retrieved");

        let image_response = self
            .http_client
            .get(&hdurl)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        let status = image_response.status();
        if !status.is_success() {
            return Err(FetchError::Api {
                code: status.as_u16(),
                message: format!("image download from {hdurl} failed"),
            });
        }

        let image_bytes = image_response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?
            .to_vec();

        tracing::info!(size = image_bytes.len(), "APOD image downloaded");

        Ok(PhotoArtifact {
            url: hdurl,
            image_bytes,
            title: apod.title,
            explanation: apod.explanation,
        })
    }
}
