use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    bearer_token, model_instruction, to_value,
    vertex::{model_url, require_project, ROTATION_CONVENTION},
    Credential, ImageProvider,
};
use crate::{
    auth::TokenSource,
    config::VertexConfig,
    error::{GatewayError, Result},
    models::{
        imagen::{
            first_prediction, ImagenImage, ImagenInstance, ImagenParameters, PredictRequest,
        },
        GeneratedImage, GenerationRequest, InlineData,
    },
};

pub const DEFAULT_IMAGEN_MODEL: &str = "imagegeneration@006";

/// Imagen `predict` on Vertex AI.
///
/// Imagen accepts one prompt and at most one base image per instance, so only
/// the first reference image is sent; any further images are dropped.
pub struct ImagenProvider {
    config: VertexConfig,
    tokens: Arc<dyn TokenSource>,
}

impl ImagenProvider {
    pub fn new(config: VertexConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self { config, tokens }
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_IMAGEN_MODEL)
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    fn name(&self) -> &'static str {
        "imagen"
    }

    fn check_configuration(&self) -> Result<()> {
        require_project(&self.config)
    }

    fn validate(&self, request: &GenerationRequest) -> Result<()> {
        if request.require_prompt()?.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Prompt must not be empty.".into(),
            ));
        }
        Ok(())
    }

    fn instruction(&self, prompt: &str, rotation: &str) -> String {
        model_instruction(prompt, rotation, Some(ROTATION_CONVENTION))
    }

    fn endpoint(&self) -> Result<String> {
        model_url(&self.config, self.model(), "predict")
    }

    fn build_payload(&self, instruction: &str, images: &[InlineData]) -> Result<Value> {
        if images.len() > 1 {
            log::debug!(
                "Imagen takes a single base image; dropping {} extra image(s)",
                images.len() - 1
            );
        }

        let image = images.first().map(|image| ImagenImage {
            bytes_base64_encoded: image.data.clone(),
            mime_type: image.mime_type.clone(),
        });

        to_value(&PredictRequest {
            instances: vec![ImagenInstance {
                prompt: instruction.to_string(),
                image,
            }],
            parameters: ImagenParameters { sample_count: 1 },
        })
    }

    async fn authenticate(&self) -> Result<Credential> {
        bearer_token(self.tokens.as_ref()).await
    }

    fn extract_image(&self, response: Value) -> Result<GeneratedImage> {
        first_prediction(&response)
            .and_then(|prediction| {
                let mime_type = prediction.mime_type;
                prediction
                    .bytes_base64_encoded
                    .map(|data| GeneratedImage::new(data, mime_type))
            })
            .ok_or(GatewayError::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use serde_json::json;

    fn provider() -> ImagenProvider {
        ImagenProvider::new(
            VertexConfig::new()
                .with_project("shop-42")
                .with_location("europe-west4"),
            Arc::new(StaticTokenSource::new("token")),
        )
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            provider().endpoint().unwrap(),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/shop-42/locations/europe-west4/publishers/google/models/imagegeneration@006:predict"
        );
    }

    #[test]
    fn test_only_first_image_is_sent() {
        let images = vec![
            InlineData::new("image/png", "QQ=="),
            InlineData::new("image/jpeg", "Zg=="),
        ];
        let payload = provider().build_payload("turn left", &images).unwrap();

        assert_eq!(
            payload,
            json!({
                "instances": [{
                    "prompt": "turn left",
                    "image": { "bytesBase64Encoded": "QQ==", "mimeType": "image/png" }
                }],
                "parameters": { "sampleCount": 1 }
            })
        );
    }

    #[test]
    fn test_text_only_payload_has_no_image() {
        let payload = provider().build_payload("a hat", &[]).unwrap();
        assert!(payload["instances"][0].get("image").is_none());
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let request = GenerationRequest::from_slice(br#"{"prompt":"   "}"#).unwrap();
        assert!(matches!(
            provider().validate(&request),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_extract_first_prediction_with_bytes() {
        let response = json!({
            "predictions": [
                { "raiFilteredReason": "blocked" },
                { "bytesBase64Encoded": "Zg==", "mimeType": "image/png" }
            ]
        });
        let image = provider().extract_image(response).unwrap();
        assert_eq!(image, GeneratedImage::new("Zg==", Some("image/png".into())));

        assert!(matches!(
            provider().extract_image(json!({ "predictions": [] })),
            Err(GatewayError::EmptyResult)
        ));
    }

    #[test]
    fn test_extract_skips_malformed_predictions() {
        let response = json!({
            "predictions": [
                { "bytesBase64Encoded": 7 },
                { "bytesBase64Encoded": "" },
                { "bytesBase64Encoded": "QQ==" }
            ]
        });
        let image = provider().extract_image(response).unwrap();
        assert_eq!(image, GeneratedImage::new("QQ==", None));
    }
}
