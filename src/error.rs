use std::time::Duration;
use thiserror::Error;

/// Command that relaxes the cross-origin policy of a local Ollama server.
pub const CORS_REMEDIATION_COMMAND: &str = "OLLAMA_ORIGINS=\"*\" ollama serve";

/// Placeholder used when an error response body is not valid JSON.
pub const UNPARSEABLE_ERROR_BODY: &str = "could not parse error response";

/// Every failure the describe workflow can surface to a user.
///
/// The `Display` text of each variant is the user-facing message. The
/// underlying failure, when there is one, is logged where the variant is
/// built and never carried into the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescribeError {
    /// The selected file could not be read or is not an image data URL.
    #[error("Could not read the image: {0}")]
    Decode(String),

    /// An action was attempted without the state it requires.
    #[error("{0}")]
    Validation(String),

    /// The inference server answered with a non-success status.
    #[error("Ollama API error: {status} - {message}")]
    Server { status: u16, message: String },

    /// The server answered successfully but produced no text.
    #[error("The model returned an empty description")]
    EmptyResponse,

    /// The request never reached the server.
    #[error(
        "Could not connect to Ollama at {endpoint}. Make sure the server is running \
         and that it accepts cross-origin requests. To allow them, restart it with: {command}",
        command = CORS_REMEDIATION_COMMAND
    )]
    Connectivity { endpoint: String },

    /// The configured request timeout elapsed.
    #[error("Ollama did not answer within {0:?}")]
    Timeout(Duration),

    /// Any other failure. The detail is logged, not shown.
    #[error("An unexpected error occurred while generating the description")]
    Unknown,
}

impl DescribeError {
    /// A file or data URL that could not be turned into an image.
    pub fn decode(msg: impl Into<String>) -> Self {
        DescribeError::Decode(msg.into())
    }

    /// An action refused because the session is not in a state to run it.
    pub fn validation(msg: impl Into<String>) -> Self {
        DescribeError::Validation(msg.into())
    }

    /// A non-success answer, with the server's own message when it sent one.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        DescribeError::Server {
            status,
            message: message.into(),
        }
    }

    /// The server at `endpoint` could not be reached.
    pub fn connectivity(endpoint: impl Into<String>) -> Self {
        DescribeError::Connectivity {
            endpoint: endpoint.into(),
        }
    }

    /// Wraps an unexpected failure, logging its detail first.
    pub fn unknown(detail: impl std::fmt::Display) -> Self {
        log::error!("Unexpected failure: {detail}");
        DescribeError::Unknown
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            DescribeError::Decode(_) => "decode",
            DescribeError::Validation(_) => "validation",
            DescribeError::Server { .. } => "server",
            DescribeError::EmptyResponse => "empty_response",
            DescribeError::Connectivity { .. } => "connectivity",
            DescribeError::Timeout(_) => "timeout",
            DescribeError::Unknown => "unknown",
        }
    }

    /// The single message shown to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, DescribeError>;
