use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::core::FetchError;
use crate::listings::{FilterSet, RawListing};

/// The upstream service that actually talks to the marketplace. Everything
/// above this trait only sees raw listings coming back.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    async fn fetch_listings(&self, filters: &FilterSet) -> Result<Vec<RawListing>, FetchError>;
}

/// Response body of the fetch service: either a bare array of listings or
/// an `{ "ads": [...] }` envelope, depending on which scraper build answers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FetchPayload {
    Bare(Vec<RawListing>),
    Envelope { ads: Vec<RawListing> },
}

pub struct HttpListingFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpListingFetcher {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl ListingFetcher for HttpListingFetcher {
    async fn fetch_listings(&self, filters: &FilterSet) -> Result<Vec<RawListing>, FetchError> {
        let response = match self
            .client
            .get(&self.base_url)
            .query(filters)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(FetchError::Timeout(self.timeout)),
            Err(e) => return Err(FetchError::Transport(e)),
        };

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("❌ Fetch-Service antwortet mit {}: {}", status, body);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: FetchPayload = serde_json::from_str(&body)?;
        let listings = match payload {
            FetchPayload::Bare(listings) => listings,
            FetchPayload::Envelope { ads } => ads,
        };
        debug!("📥 {} Roh-Anzeigen vom Fetch-Service erhalten", listings.len());
        Ok(listings)
    }
}
