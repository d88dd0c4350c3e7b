use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Standard alphabet, padding optional. Used only to check images, which are forwarded as sent.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A base64 payload tagged with its MIME type, as exchanged with Gemini.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Splits `data:<mime>;base64,<data>` on the first `;` and the first `,` after it.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| GatewayError::InvalidRequest("Image is not a data URL.".into()))?;
        let (mime_type, rest) = rest.split_once(';').ok_or_else(|| {
            GatewayError::InvalidRequest("Image data URL is missing its MIME type.".into())
        })?;
        let (_, data) = rest.split_once(',').ok_or_else(|| {
            GatewayError::InvalidRequest("Image data URL is missing its payload.".into())
        })?;

        Ok(Self::new(mime_type, data))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Rejects images the provider could never accept.
    pub fn validate(&self) -> Result<()> {
        if self.mime_type.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Image MIME type must not be empty.".into(),
            ));
        }
        if self.data.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Image data must not be empty.".into(),
            ));
        }
        let compact: Vec<u8> = self
            .data
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        LENIENT.decode(compact).map_err(|e| {
            GatewayError::InvalidRequest(format!("Image data is not valid base64: {}", e))
        })?;
        Ok(())
    }
}
