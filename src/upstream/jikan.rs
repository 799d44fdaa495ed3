//! # Jikan API Client
//!
//! HTTP client for `GET {base_url}/anime/{id}/full`.

use super::{classify_status, StatusClass, UpstreamError, UpstreamSource};
use crate::config::UpstreamConfig;
use crate::models::AnimeRecord;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

/// Envelope returned by the Jikan `full` endpoint
#[derive(Debug, Deserialize)]
struct JikanEnvelope {
    data: JikanAnime,
}

#[derive(Debug, Deserialize)]
struct JikanAnime {
    title: Option<String>,
    title_english: Option<String>,
    title_japanese: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JikanClient {
    client: Client,
    base_url: Url,
}

impl JikanClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, crate::error::AnimeCacheError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        // A trailing slash keeps `join` from dropping the last path segment
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            crate::error::AnimeCacheError::ConfigurationError(format!(
                "Invalid upstream base_url '{}': {e}",
                config.base_url
            ))
        })?;

        Ok(Self { client, base_url })
    }

    pub fn anime_url(&self, anime_id: i32) -> Result<Url, UpstreamError> {
        self.base_url
            .join(&format!("anime/{anime_id}/full"))
            .map_err(|e| UpstreamError::TransientFailure(format!("invalid request url: {e}")))
    }
}

#[async_trait]
impl UpstreamSource for JikanClient {
    async fn fetch(&self, anime_id: i32) -> Result<AnimeRecord, UpstreamError> {
        let url = self.anime_url(anime_id)?;
        debug!(anime_id, url = %url, "Fetching anime from Jikan");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(anime_id, error = %e, "Jikan request failed");
            UpstreamError::TransientFailure(e.to_string())
        })?;

        let status = response.status();
        match classify_status(status) {
            StatusClass::Success => {
                let envelope = response.json::<JikanEnvelope>().await.map_err(|e| {
                    warn!(anime_id, error = %e, "Malformed Jikan response body");
                    UpstreamError::TransientFailure(format!("malformed response: {e}"))
                })?;

                Ok(AnimeRecord::new(
                    anime_id,
                    envelope.data.title,
                    envelope.data.title_english,
                    envelope.data.title_japanese,
                ))
            }
            StatusClass::NotFound => {
                debug!(anime_id, "Anime not found upstream");
                Err(UpstreamError::NotFound)
            }
            StatusClass::RateLimited => {
                warn!(
                    anime_id,
                    status = status.as_u16(),
                    "Maximum number of requests per second reached"
                );
                Err(UpstreamError::RateLimited)
            }
            StatusClass::Failure => {
                warn!(anime_id, status = status.as_u16(), "Unexpected Jikan status");
                Err(UpstreamError::TransientFailure(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "jikan"
    }
}
