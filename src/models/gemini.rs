use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::InlineData;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "inlineData",
        alias = "inline_data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(image: InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(image),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

/// Inline data as it appears in responses, where the MIME type may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInlineData {
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    pub mime_type: Option<String>,
    pub data: String,
}

/// First part across all candidates that carries non-empty inline data.
///
/// Each candidate and part is inspected on its own, so a malformed entry is
/// skipped instead of hiding an image further along.
pub fn first_inline_image(response: &Value) -> Option<ResponseInlineData> {
    response
        .get("candidates")?
        .as_array()?
        .iter()
        .filter_map(|candidate| candidate.get("content")?.get("parts")?.as_array())
        .flatten()
        .filter_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
        .filter_map(|inline| ResponseInlineData::deserialize(inline).ok())
        .find(|inline| !inline.data.is_empty())
}
