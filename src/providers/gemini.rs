use async_trait::async_trait;
use serde_json::Value;

use super::{model_instruction, to_value, Credential, ImageProvider};
use crate::{
    config::GeminiConfig,
    error::{GatewayError, Result},
    models::{
        gemini::{self, Content, GenerateContentRequest, Part},
        GeneratedImage, InlineData,
    },
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` on the public Generative Language API, keyed by API key.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }
}

/// The instruction text first, then every reference image in caller order.
pub(crate) fn content_parts(instruction: &str, images: &[InlineData]) -> Vec<Part> {
    std::iter::once(Part::text(instruction))
        .chain(images.iter().cloned().map(Part::image))
        .collect()
}

pub(crate) fn extract_inline_image(response: Value) -> Result<GeneratedImage> {
    gemini::first_inline_image(&response)
        .map(GeneratedImage::from)
        .ok_or(GatewayError::EmptyResult)
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn check_configuration(&self) -> Result<()> {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(GatewayError::MissingConfiguration(
                "GEMINI_API_KEY is not set.".into(),
            )),
        }
    }

    fn instruction(&self, prompt: &str, rotation: &str) -> String {
        model_instruction(prompt, rotation, None)
    }

    fn endpoint(&self) -> Result<String> {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/');
        Ok(format!(
            "{}/v1beta/models/{}:generateContent",
            base, self.config.model
        ))
    }

    fn build_payload(&self, instruction: &str, images: &[InlineData]) -> Result<Value> {
        to_value(&GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: content_parts(instruction, images),
            }],
            generation_config: None,
        })
    }

    async fn authenticate(&self) -> Result<Credential> {
        self.check_configuration()?;
        Ok(Credential::ApiKey(
            self.config.api_key.clone().unwrap_or_default(),
        ))
    }

    fn extract_image(&self, response: Value) -> Result<GeneratedImage> {
        extract_inline_image(response)
    }
}
