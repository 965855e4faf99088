use crate::error::{AppResult, ErrorReason};
use reqwest::Client;
use std::time::Duration;

/// Thin wrapper over the HTTP client. Every request is bounded by the
/// configured total-request timeout so a stalled vendor endpoint cannot
/// hang an audit run.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { client })
    }

    pub async fn get_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ErrorReason::HttpStatus {
                url: url.to_owned(),
                status,
            }
            .into());
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn get_text(&self, url: &str) -> AppResult<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ErrorReason::HttpStatus {
                url: url.to_owned(),
                status,
            }
            .into());
        }
        Ok(response.text().await?)
    }
}
