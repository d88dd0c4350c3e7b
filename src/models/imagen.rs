use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<ImagenInstance>,
    pub parameters: ImagenParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagenInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagenImage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenParameters {
    pub sample_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prediction {
    #[serde(
        rename = "bytesBase64Encoded",
        alias = "bytes_base64_encoded",
        default
    )]
    pub bytes_base64_encoded: Option<String>,
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    pub mime_type: Option<String>,
}

/// First prediction carrying non-empty image bytes; malformed entries are skipped.
pub fn first_prediction(response: &Value) -> Option<Prediction> {
    response
        .get("predictions")?
        .as_array()?
        .iter()
        .filter_map(|prediction| Prediction::deserialize(prediction).ok())
        .find(|prediction| {
            prediction
                .bytes_base64_encoded
                .as_deref()
                .is_some_and(|data| !data.is_empty())
        })
}
