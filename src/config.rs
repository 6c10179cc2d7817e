use std::time::Duration;

// defaults for the inference server
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llava";

/// Instruction sent with every image.
pub const DESCRIBE_PROMPT: &str = "Describe this image in detail. Include information about \
     the objects, the setting, any actions taking place, and the overall mood of the scene.";

/// Environment variable Ollama itself reads to locate its server.
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";

/// Settings for [`crate::OllamaClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the inference server, without a trailing slash.
    pub endpoint: String,
    /// Model name as known to the server, e.g. `llava`.
    pub model: String,
    /// Instruction sent alongside every image.
    pub prompt: String,
    /// `None` waits for the server indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DESCRIBE_PROMPT.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the endpoint taken from `OLLAMA_HOST` when it is set.
    pub fn from_env() -> Self {
        match std::env::var(OLLAMA_HOST_VAR) {
            Ok(host) if !host.trim().is_empty() => Self::default().with_endpoint(host),
            _ => Self::default(),
        }
    }

    /// Accepts `host:port`, `http://host:port` or a URL with a trailing slash.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize_endpoint(&endpoint.into());
        self
    }

    /// Uses another installed model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the instruction sent with each image.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Gives up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }

    /// URL listing installed models.
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.endpoint)
    }
}

fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_llava() {
        let config = ClientConfig::default();
        assert_eq!(config.generate_url(), "http://localhost:11434/api/generate");
        assert_eq!(config.model, "llava");
        assert!(config.timeout.is_none());
        for topic in ["objects", "setting", "actions", "mood"] {
            assert!(config.prompt.contains(topic));
        }
    }

    #[test]
    fn endpoint_is_normalized() {
        let config = ClientConfig::default().with_endpoint("127.0.0.1:8080/");
        assert_eq!(config.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.tags_url(), "http://127.0.0.1:8080/api/tags");

        let config = ClientConfig::default().with_endpoint("https://gpu.local/");
        assert_eq!(config.endpoint, "https://gpu.local");
    }
}
