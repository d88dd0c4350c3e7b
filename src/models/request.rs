use serde::Deserialize;
use serde_json::Number;

use super::common::InlineData;
use crate::error::{GatewayError, Result};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    /// Degrees; the sign convention is part of each provider's instruction text.
    #[serde(default)]
    pub rotation: Option<Number>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// A reference image, either pre-split or as a `data:` URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Inline {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    DataUrl(String),
}

impl ImageRef {
    pub fn normalize(&self) -> Result<InlineData> {
        let image = match self {
            ImageRef::Inline { inline_data } => inline_data.clone(),
            ImageRef::DataUrl(url) => InlineData::from_data_url(url)?,
        };
        image.validate()?;
        Ok(image)
    }
}

impl GenerationRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            GatewayError::InvalidRequest(format!("Request body is not valid JSON: {}", e))
        })
    }

    pub fn require_prompt(&self) -> Result<&str> {
        self.prompt
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidRequest("Prompt is missing.".into()))
    }

    /// The rotation exactly as the caller wrote it, `0` when absent.
    pub fn rotation_text(&self) -> String {
        self.rotation
            .as_ref()
            .map(Number::to_string)
            .unwrap_or_else(|| "0".to_string())
    }

    pub fn normalized_images(&self) -> Result<Vec<InlineData>> {
        self.images.iter().map(ImageRef::normalize).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_pre_split_and_data_url_images() {
        let request = GenerationRequest::from_slice(
            br#"{
                "prompt": "studio shot",
                "rotation": -30,
                "images": [
                    { "inlineData": { "data": "QQ==", "mimeType": "image/png" } },
                    "data:image/jpeg;base64,Zg=="
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(request.require_prompt().unwrap(), "studio shot");
        assert_eq!(request.rotation_text(), "-30");

        let images = request.normalized_images().unwrap();
        assert_eq!(images[0], InlineData::new("image/png", "QQ=="));
        assert_eq!(images[1], InlineData::new("image/jpeg", "Zg=="));
    }

    #[test]
    fn test_rotation_keeps_literal_value() {
        let request = GenerationRequest::from_slice(br#"{"prompt":"p","rotation":12.5}"#).unwrap();
        assert_eq!(request.rotation_text(), "12.5");

        let request = GenerationRequest::from_slice(br#"{"prompt":"p"}"#).unwrap();
        assert_eq!(request.rotation_text(), "0");
        assert!(request.images.is_empty());
    }

    #[test]
    fn test_missing_prompt_is_invalid() {
        let request = GenerationRequest::from_slice(br#"{"rotation":5,"images":[]}"#).unwrap();
        assert!(matches!(
            request.require_prompt(),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_invalid() {
        assert!(matches!(
            GenerationRequest::from_slice(b"prompt=hello"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_bad_image_is_rejected() {
        let request = GenerationRequest::from_slice(
            br#"{"prompt":"p","images":["https://example.com/cat.png"]}"#,
        )
        .unwrap();
        assert!(request.normalized_images().is_err());
    }
}
