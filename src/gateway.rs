use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::{GatewayConfig, ResponseFormat},
    error::{GatewayError, Result},
    logger,
    models::{GeneratedImage, GenerationRequest},
    providers::{self, ImageProvider},
};

/// Status and JSON body produced for one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Translates generation requests into exactly one provider call each.
///
/// Cloning is cheap; clones share the HTTP connection pool and the provider.
#[derive(Clone)]
pub struct ImageGateway {
    client: Client,
    provider: Arc<dyn ImageProvider>,
    response_format: ResponseFormat,
}

impl ImageGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = Client::new();
        let provider = providers::from_config(config, &client);
        Self {
            client,
            provider,
            response_format: config.response_format,
        }
    }

    pub fn with_provider(provider: Arc<dyn ImageProvider>, response_format: ResponseFormat) -> Self {
        Self {
            client: Client::new(),
            provider,
            response_format,
        }
    }

    pub fn provider(&self) -> &dyn ImageProvider {
        self.provider.as_ref()
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    /// Entry point for the HTTP layer. Never fails: every error becomes a response.
    pub async fn handle(&self, method: &str, body: &[u8]) -> GatewayResponse {
        let request_id = Uuid::new_v4().to_string();
        let _timer = logger::timer(&format!("{} request {}", self.provider.name(), request_id));

        match self.process(method, body).await {
            Ok(image) => {
                log::info!(
                    "[req:{}] Image generated by {} ({} base64 chars)",
                    request_id,
                    self.provider.name(),
                    image.data.len()
                );
                GatewayResponse {
                    status: 200,
                    body: image.to_body(self.response_format),
                }
            }
            Err(err) => {
                match &err {
                    GatewayError::MethodNotAllowed(_) | GatewayError::InvalidRequest(_) => {
                        log::warn!("[req:{}] Rejected request: {}", request_id, err)
                    }
                    _ => log::error!(
                        "[req:{}] Image generation failed ({:?}): {}",
                        request_id,
                        err.kind(),
                        err
                    ),
                }
                GatewayResponse {
                    status: err.status_code(),
                    body: serde_json::to_value(err.to_body()).unwrap_or(Value::Null),
                }
            }
        }
    }

    /// Method check, configuration check and body parsing, in that order.
    pub async fn process(&self, method: &str, body: &[u8]) -> Result<GeneratedImage> {
        if method != "POST" {
            return Err(GatewayError::MethodNotAllowed(method.to_string()));
        }
        self.provider.check_configuration()?;

        let request = GenerationRequest::from_slice(body)?;
        self.run(&request).await
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.provider.check_configuration()?;
        self.run(request).await
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.provider.validate(request)?;
        let prompt = request.require_prompt()?;
        let images = request.normalized_images()?;

        let instruction = self.provider.instruction(prompt, &request.rotation_text());
        let payload = self.provider.build_payload(&instruction, &images)?;
        let endpoint = self.provider.endpoint()?;
        let credential = self.provider.authenticate().await?;

        log::info!(
            "Generating image with provider: {} ({} reference image(s))",
            self.provider.name(),
            images.len()
        );
        log::debug!("Provider endpoint: {}", endpoint);

        let response = credential
            .apply(self.client.post(&endpoint).json(&payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            GatewayError::InternalError(format!(
                "Provider returned an unreadable response: {}",
                e.without_url()
            ))
        })?;

        self.provider.extract_image(body)
    }
}
