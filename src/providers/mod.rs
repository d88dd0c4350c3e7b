pub mod gemini;
pub mod imagen;
pub mod vertex;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::{
    auth::{MetadataTokenSource, StaticTokenSource, TokenSource},
    config::{GatewayConfig, ProviderKind},
    error::{GatewayError, Result},
    models::{GeneratedImage, GenerationRequest, InlineData},
};

pub use gemini::GeminiProvider;
pub use imagen::ImagenProvider;
pub use vertex::VertexGeminiProvider;

/// How a request to the provider is authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Static key sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token sent as `Authorization: Bearer`.
    Bearer(String),
}

impl Credential {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Credential::Bearer(token) => request.bearer_auth(token),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(***)"),
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// One upstream image-generation integration.
///
/// The gateway drives every provider through the same sequence:
/// configuration check, request validation, instruction, payload,
/// authentication, one call to [`endpoint`](Self::endpoint), extraction.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails with `MissingConfiguration` when a required setting is absent.
    fn check_configuration(&self) -> Result<()>;

    fn validate(&self, request: &GenerationRequest) -> Result<()> {
        request.require_prompt()?;
        Ok(())
    }

    /// Natural-language instruction carrying the prompt and the rotation.
    fn instruction(&self, prompt: &str, rotation: &str) -> String;

    fn endpoint(&self) -> Result<String>;

    fn build_payload(&self, instruction: &str, images: &[InlineData]) -> Result<Value>;

    async fn authenticate(&self) -> Result<Credential>;

    /// Locates the generated image, `EmptyResult` if there is none.
    fn extract_image(&self, response: Value) -> Result<GeneratedImage>;
}

/// Builds the provider selected by `config.provider`.
pub fn from_config(config: &GatewayConfig, client: &Client) -> Arc<dyn ImageProvider> {
    match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(config.gemini.clone())),
        ProviderKind::VertexGemini => Arc::new(VertexGeminiProvider::new(
            config.vertex.clone(),
            token_source(config, client),
        )),
        ProviderKind::Imagen => Arc::new(ImagenProvider::new(
            config.vertex.clone(),
            token_source(config, client),
        )),
    }
}

fn token_source(config: &GatewayConfig, client: &Client) -> Arc<dyn TokenSource> {
    match &config.vertex.access_token {
        Some(token) => Arc::new(StaticTokenSource::new(token.clone())),
        None => Arc::new(MetadataTokenSource::new(client.clone())),
    }
}

pub(crate) fn model_instruction(prompt: &str, rotation: &str, convention: Option<&str>) -> String {
    let convention = convention.map(|c| format!(" {}", c)).unwrap_or_default();
    format!(
        "Generate a realistic photo of a model based on the following instructions:\n\n\
         Instructions: {}\n\n\
         Rotation: Rotate the model {} degrees{}.\n",
        prompt, rotation, convention
    )
}

pub(crate) async fn bearer_token(tokens: &dyn TokenSource) -> Result<Credential> {
    match tokens.access_token().await? {
        Some(token) => Ok(Credential::Bearer(token)),
        None => Err(GatewayError::AuthenticationFailure(
            "no access token was issued".into(),
        )),
    }
}

pub(crate) fn to_value<T: serde::Serialize>(payload: &T) -> Result<Value> {
    serde_json::to_value(payload)
        .map_err(|e| GatewayError::InternalError(format!("Payload serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, VertexConfig};

    #[test]
    fn test_model_instruction() {
        let text = model_instruction("red dress", "-45", None);
        assert!(text.contains("Instructions: red dress"));
        assert!(text.contains("Rotate the model -45 degrees."));

        let text = model_instruction("red dress", "10", Some("(positive = right)"));
        assert!(text.contains("Rotate the model 10 degrees (positive = right)."));
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let rendered = format!("{:?}", Credential::ApiKey("super-secret".into()));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_from_config_selects_provider() {
        let client = Client::new();
        let config = GatewayConfig::new().with_gemini(GeminiConfig::new().with_api_key("k"));
        assert_eq!(from_config(&config, &client).name(), "gemini");

        let config = GatewayConfig::new()
            .with_vertex(VertexConfig::new().with_project("p").with_access_token("t"))
            .with_provider(ProviderKind::Imagen);
        assert_eq!(from_config(&config, &client).name(), "imagen");

        let config = config.with_provider(ProviderKind::VertexGemini);
        assert_eq!(from_config(&config, &client).name(), "vertex-gemini");
    }

    #[tokio::test]
    async fn test_bearer_token_requires_a_token() {
        let err = bearer_token(&StaticTokenSource::new("")).await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailure(_)));

        let credential = bearer_token(&StaticTokenSource::new("abc")).await.unwrap();
        assert_eq!(credential, Credential::Bearer("abc".into()));
    }
}
