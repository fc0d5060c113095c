use std::time::Duration;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use thiserror::Error;
use shared::types::Snapshot;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse list: {0}")]
    Parse(String),
}

/// Where list snapshots come from.
pub trait ListSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'static, Result<Snapshot, FetchError>>;
}

/// Fetches the list endpoint over HTTP.
pub struct HttpListSource {
    client: Client,
    url: String,
}

impl HttpListSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ListSource for HttpListSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Snapshot, FetchError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        async move {
            let body = client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;

            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
        }
        .boxed()
    }
}
