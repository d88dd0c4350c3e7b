use serde_json::{json, Value};

use super::{common::InlineData, gemini::ResponseInlineData};
use crate::config::ResponseFormat;

const FALLBACK_MIME_TYPE: &str = "image/png";

/// Image located in a provider response, returned to the caller unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: String,
    pub mime_type: Option<String>,
}

impl GeneratedImage {
    pub fn new(data: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    pub fn to_data_url(&self) -> String {
        InlineData::new(
            self.mime_type.as_deref().unwrap_or(FALLBACK_MIME_TYPE),
            self.data.as_str(),
        )
        .to_data_url()
    }

    pub fn to_body(&self, format: ResponseFormat) -> Value {
        match format {
            ResponseFormat::Base64 => json!({ "image": self.data }),
            ResponseFormat::DataUrl => json!({ "imageUrl": self.to_data_url() }),
        }
    }
}

impl From<ResponseInlineData> for GeneratedImage {
    fn from(inline: ResponseInlineData) -> Self {
        let mime_type = inline.mime_type.filter(|m| !m.trim().is_empty());
        Self::new(inline.data, mime_type)
    }
}

impl From<InlineData> for GeneratedImage {
    fn from(inline: InlineData) -> Self {
        Self::new(inline.data, Some(inline.mime_type))
    }
}
