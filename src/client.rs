use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::{
    config::ClientConfig,
    error::{DescribeError, Result, UNPARSEABLE_ERROR_BODY},
    image::ImageRecord,
};

/// Anything that can turn an image into a description.
///
/// [`crate::DescribeSession`] drives a `Describer`; [`OllamaClient`] is the
/// HTTP implementation.
pub trait Describer {
    /// Produces a description of the image, or a classified error.
    fn describe(&self, image: &ImageRecord) -> impl Future<Output = Result<String>> + Send;
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: Vec<&'a str>,
    pub stream: bool,
}

/// Body of a non-streaming `/api/generate` answer. Only `response` is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// One-shot client for a local Ollama server.
///
/// Each call issues exactly one HTTP request; nothing is retried.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl OllamaClient {
    /// Builds the HTTP client, applying the configured timeout if any.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(DescribeError::unknown)?;

        Ok(Self { http, config })
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Describes the image if there is one. A missing image is reported
    /// without touching the network.
    pub async fn describe_optional(&self, image: Option<&ImageRecord>) -> Result<String> {
        match image {
            Some(image) => self.generate(image).await,
            None => Err(DescribeError::validation("Please upload an image first")),
        }
    }

    /// Sends the image to `/api/generate` and returns the trimmed text.
    pub async fn generate(&self, image: &ImageRecord) -> Result<String> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt: &self.config.prompt,
            images: vec![image.payload()],
            stream: false,
        };

        log::debug!(
            "Sending {} image ({} bytes) to {}",
            image.content_type(),
            image.decoded_len(),
            self.config.generate_url()
        );

        let response = self
            .http
            .post(self.config.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(server_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(e))?;
        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(DescribeError::unknown)?;

        log::debug!("Generation completed (done: {:?})", parsed.done);

        match parsed.response.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => Ok(description.to_string()),
            _ => Err(DescribeError::EmptyResponse),
        }
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.config.tags_url())
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let tags: TagsResponse = response.json().await.map_err(DescribeError::unknown)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether the configured model is installed. `llava` matches `llava:latest`.
    pub async fn has_model(&self) -> Result<bool> {
        let model = self.config.model.as_str();
        Ok(self
            .list_models()
            .await?
            .iter()
            .any(|name| name == model || name.split(':').next() == Some(model)))
    }

    // a failure without any response object is a transport failure
    fn classify_transport(&self, err: reqwest::Error) -> DescribeError {
        if err.is_timeout() {
            log::warn!("Request to {} timed out: {err}", self.config.endpoint);
            DescribeError::Timeout(self.config.timeout.unwrap_or_default())
        } else if err.is_connect() || (err.is_request() && err.status().is_none()) {
            log::warn!("Could not reach {}: {err}", self.config.endpoint);
            DescribeError::connectivity(&self.config.endpoint)
        } else {
            DescribeError::unknown(err)
        }
    }
}

impl Describer for OllamaClient {
    fn describe(&self, image: &ImageRecord) -> impl Future<Output = Result<String>> + Send {
        self.generate(image)
    }
}

async fn server_error(response: reqwest::Response) -> DescribeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.as_str())
            .or(status.canonical_reason())
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => UNPARSEABLE_ERROR_BODY.to_string(),
    };

    log::error!("Ollama answered {status}: {body}");
    DescribeError::server(status.as_u16(), message)
}
