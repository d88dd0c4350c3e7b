use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";

/// Upstream integration the gateway forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    VertexGemini,
    Imagen,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::VertexGemini => "vertex-gemini",
            ProviderKind::Imagen => "imagen",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "vertex-gemini" | "vertex_gemini" | "vertex" => Ok(ProviderKind::VertexGemini),
            "imagen" => Ok(ProviderKind::Imagen),
            other => Err(GatewayError::MissingConfiguration(format!(
                "Unknown image provider: {}",
                other
            ))),
        }
    }
}

/// Shape of a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `{ "image": "<base64>" }`
    Base64,
    /// `{ "imageUrl": "data:<mime>;base64,<base64>" }`
    DataUrl,
}

impl FromStr for ResponseFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "base64" => Ok(ResponseFormat::Base64),
            "data-url" | "data_url" | "imageurl" => Ok(ResponseFormat::DataUrl),
            other => Err(GatewayError::MissingConfiguration(format!(
                "Unknown response format: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let base_url = env::var("GEMINI_BASE_URL").ok();

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct VertexConfig {
    pub project_id: Option<String>,
    pub location: String,
    pub model: Option<String>,
    pub access_token: Option<String>,
    pub base_url: Option<String>,
}

impl Default for VertexConfig {
    fn default() -> Self {
        VertexConfig {
            project_id: None,
            location: DEFAULT_VERTEX_LOCATION.to_string(),
            model: None,
            access_token: None,
            base_url: None,
        }
    }
}

impl VertexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let project_id = env::var("VERTEX_PROJECT_ID")
            .or_else(|_| env::var("GOOGLE_CLOUD_PROJECT"))
            .ok()
            .filter(|p| !p.is_empty());
        let location =
            env::var("VERTEX_LOCATION").unwrap_or_else(|_| DEFAULT_VERTEX_LOCATION.to_string());
        let model = env::var("VERTEX_MODEL").ok();
        let access_token = env::var("VERTEX_ACCESS_TOKEN").ok().filter(|t| !t.is_empty());
        let base_url = env::var("VERTEX_BASE_URL").ok();

        VertexConfig {
            project_id,
            location,
            model,
            access_token,
            base_url,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Regional endpoint root, unless overridden.
    pub fn endpoint_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: Option<u16>,
    pub provider: ProviderKind,
    pub response_format: ResponseFormat,
    pub gemini: GeminiConfig,
    pub vertex: VertexConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: None,
            provider: ProviderKind::Gemini,
            response_format: ResponseFormat::Base64,
            gemini: GeminiConfig::default(),
            vertex: VertexConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the whole configuration from the process environment.
    ///
    /// Missing credentials are not an error here: they surface as a 500 on the
    /// first request, so the server can still start and answer health checks.
    pub fn from_env() -> crate::error::Result<Self> {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let provider = match env::var("IMAGE_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ProviderKind::Gemini,
        };
        let response_format = match env::var("RESPONSE_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => ResponseFormat::Base64,
        };

        Ok(GatewayConfig {
            port,
            provider,
            response_format,
            gemini: GeminiConfig::from_env(),
            vertex: VertexConfig::from_env(),
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_vertex(mut self, config: VertexConfig) -> Self {
        self.vertex = config;
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(
            "Vertex-Gemini".parse::<ProviderKind>().unwrap(),
            ProviderKind::VertexGemini
        );
        assert_eq!(" imagen ".parse::<ProviderKind>().unwrap(), ProviderKind::Imagen);
        assert!("dalle".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_response_format_parsing() {
        assert_eq!("image".parse::<ResponseFormat>().unwrap(), ResponseFormat::Base64);
        assert_eq!(
            "data-url".parse::<ResponseFormat>().unwrap(),
            ResponseFormat::DataUrl
        );
        assert!("png".parse::<ResponseFormat>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = GatewayConfig::new()
            .with_gemini(GeminiConfig::new().with_api_key("secret"))
            .with_port(9000);

        assert_eq!(config.port(), 9000);
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(GatewayConfig::default().port(), DEFAULT_PORT);
    }

    #[test]
    fn test_provider_choice_ignores_builder_order() {
        let gemini = GeminiConfig::new().with_api_key("secret");

        let before = GatewayConfig::new()
            .with_provider(ProviderKind::Imagen)
            .with_gemini(gemini.clone());
        let after = GatewayConfig::new()
            .with_gemini(gemini)
            .with_provider(ProviderKind::Imagen);

        assert_eq!(before.provider, ProviderKind::Imagen);
        assert_eq!(after.provider, ProviderKind::Imagen);
        assert_eq!(before.gemini.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_vertex_endpoint_base() {
        let config = VertexConfig::new().with_location("europe-west4");
        assert_eq!(
            config.endpoint_base(),
            "https://europe-west4-aiplatform.googleapis.com"
        );

        let overridden = config.with_base_url("http://127.0.0.1:9999/");
        assert_eq!(overridden.endpoint_base(), "http://127.0.0.1:9999");
    }
}
