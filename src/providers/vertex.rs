use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    bearer_token, gemini::content_parts, gemini::extract_inline_image, model_instruction,
    to_value, Credential, ImageProvider,
};
use crate::{
    auth::TokenSource,
    config::VertexConfig,
    error::{GatewayError, Result},
    models::{
        gemini::{Content, GenerateContentRequest, GenerationConfig},
        GeneratedImage, InlineData,
    },
};

pub const DEFAULT_VERTEX_GEMINI_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Rotation sign convention stated to the Vertex models.
pub(crate) const ROTATION_CONVENTION: &str =
    "(positive values rotate to the right, negative values to the left)";

/// `{base}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:{method}`
pub(crate) fn model_url(config: &VertexConfig, model: &str, method: &str) -> Result<String> {
    let project = config.project_id.as_deref().ok_or_else(|| {
        GatewayError::MissingConfiguration("VERTEX_PROJECT_ID is not set.".into())
    })?;
    Ok(format!(
        "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
        config.endpoint_base(),
        project,
        config.location,
        model,
        method
    ))
}

pub(crate) fn require_project(config: &VertexConfig) -> Result<()> {
    match &config.project_id {
        Some(project) if !project.is_empty() => Ok(()),
        _ => Err(GatewayError::MissingConfiguration(
            "VERTEX_PROJECT_ID is not set.".into(),
        )),
    }
}

/// Gemini image generation through Vertex AI, authenticated with a bearer token.
pub struct VertexGeminiProvider {
    config: VertexConfig,
    tokens: Arc<dyn TokenSource>,
}

impl VertexGeminiProvider {
    pub fn new(config: VertexConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self { config, tokens }
    }

    fn model(&self) -> &str {
        self.config
            .model
            .as_deref()
            .unwrap_or(DEFAULT_VERTEX_GEMINI_MODEL)
    }
}

#[async_trait]
impl ImageProvider for VertexGeminiProvider {
    fn name(&self) -> &'static str {
        "vertex-gemini"
    }

    fn check_configuration(&self) -> Result<()> {
        require_project(&self.config)
    }

    fn instruction(&self, prompt: &str, rotation: &str) -> String {
        model_instruction(prompt, rotation, Some(ROTATION_CONVENTION))
    }

    fn endpoint(&self) -> Result<String> {
        model_url(&self.config, self.model(), "generateContent")
    }

    fn build_payload(&self, instruction: &str, images: &[InlineData]) -> Result<Value> {
        to_value(&GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: content_parts(instruction, images),
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        })
    }

    async fn authenticate(&self) -> Result<Credential> {
        bearer_token(self.tokens.as_ref()).await
    }

    fn extract_image(&self, response: Value) -> Result<GeneratedImage> {
        extract_inline_image(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use serde_json::json;

    fn provider(config: VertexConfig) -> VertexGeminiProvider {
        VertexGeminiProvider::new(config, Arc::new(StaticTokenSource::new("token")))
    }

    #[test]
    fn test_endpoint_uses_regional_host() {
        let provider = provider(VertexConfig::new().with_project("shop-42"));
        assert_eq!(
            provider.endpoint().unwrap(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/shop-42/locations/us-central1/publishers/google/models/gemini-2.0-flash-preview-image-generation:generateContent"
        );
    }

    #[test]
    fn test_missing_project() {
        let provider = provider(VertexConfig::new());
        assert!(matches!(
            provider.check_configuration(),
            Err(GatewayError::MissingConfiguration(_))
        ));
        assert!(provider.endpoint().is_err());
    }

    #[test]
    fn test_instruction_states_sign_convention() {
        let provider = provider(VertexConfig::new().with_project("p"));
        let text = provider.instruction("linen suit", "20");
        assert!(text.contains("linen suit"));
        assert!(text.contains("Rotate the model 20 degrees (positive values rotate to the right"));
    }

    #[test]
    fn test_payload_requests_image_modality() {
        let provider = provider(VertexConfig::new().with_project("p"));
        let payload = provider
            .build_payload("go", &[InlineData::new("image/png", "QQ==")])
            .unwrap();

        assert_eq!(payload["contents"][0]["role"], json!("user"));
        assert_eq!(payload["contents"][0]["parts"][0]["text"], json!("go"));
        assert_eq!(
            payload["contents"][0]["parts"][1]["inlineData"]["data"],
            json!("QQ==")
        );
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
    }

    #[tokio::test]
    async fn test_authenticate_uses_bearer_token() {
        let provider = provider(VertexConfig::new().with_project("p"));
        assert_eq!(
            provider.authenticate().await.unwrap(),
            Credential::Bearer("token".into())
        );
    }
}
