use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{GatewayError, Result};

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Supplies OAuth bearer tokens for providers that do not take a static key.
///
/// `Ok(None)` means the source answered but had no token to give; the gateway
/// treats that the same as a failed exchange.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;
}

/// A token supplied up front, e.g. from `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<Option<String>> {
        if self.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.token.clone()))
    }
}

/// Default service-account token from the GCE / Cloud Run metadata server.
#[derive(Clone)]
pub struct MetadataTokenSource {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: Option<String>,
}

impl MetadataTokenSource {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, METADATA_TOKEN_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn access_token(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                GatewayError::AuthenticationFailure(format!("metadata server unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::AuthenticationFailure(format!(
                "metadata server returned {}",
                response.status().as_u16()
            )));
        }

        let token: MetadataToken = response.json().await.map_err(|e| {
            GatewayError::AuthenticationFailure(format!("invalid metadata token response: {}", e))
        })?;

        Ok(token.access_token.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_source() {
        let source = StaticTokenSource::new("ya29.token");
        assert_eq!(source.access_token().await.unwrap().as_deref(), Some("ya29.token"));

        let blank = StaticTokenSource::new("  ");
        assert_eq!(blank.access_token().await.unwrap(), None);
    }
}
