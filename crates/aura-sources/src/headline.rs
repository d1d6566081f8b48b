//! Headline generator client.

use async_trait::async_trait;
use aura_core::Result;
use aura_personality::{HeadlineRequest, FALLBACK_HEADLINE};
use serde::Deserialize;
use tracing::warn;

use crate::ProxyClient;

/// Produces a short display line from an aggregate listening profile.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headline(&self, request: &HeadlineRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct HeadlineResponse {
    headline: Option<String>,
}

/// Calls the proxy's headline endpoint.
pub struct HeadlineClient {
    client: ProxyClient,
}

impl HeadlineClient {
    pub const fn new(client: ProxyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HeadlineSource for HeadlineClient {
    async fn headline(&self, request: &HeadlineRequest) -> Result<String> {
        let response = self
            .client
            .post_json::<_, HeadlineResponse>("api/headline", request)
            .await?;
        response
            .body
            .headline
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| aura_core::Error::Parse("empty headline".to_string()))
    }
}

/// Ask for a headline, substituting the generic fallback on any failure.
pub async fn headline_or_fallback(
    source: &dyn HeadlineSource,
    request: &HeadlineRequest,
) -> String {
    match source.headline(request).await {
        Ok(headline) => headline,
        Err(e) => {
            warn!("Headline generation failed, using fallback: {e}");
            FALLBACK_HEADLINE.to_string()
        }
    }
}
