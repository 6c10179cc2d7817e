use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadRequest {
    /// `data:<mime>;base64,<data>`, as produced by a browser file reader
    pub data_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadResponse {
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub has_image: bool,
}
