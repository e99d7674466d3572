use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed for {url}: {reason}")]
    Request { url: String, reason: String },
    #[error("non-success status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unable to read response body for {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Where raw response bodies come from. The list fetcher and the detail
/// resolver only ever need a GET returning text.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| FetchError::Request {
                url: config.base_url.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| FetchError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}
