//! Describe images with a multimodal model served by a local Ollama instance.
//!
//! An [`ImageRecord`] is built from a file or a data URL, handed to a
//! [`DescribeSession`], and described by an [`OllamaClient`] through a single
//! non-streaming `POST /api/generate` call.

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod session;

pub use client::{Describer, GenerateRequest, GenerateResponse, OllamaClient};
pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, DESCRIBE_PROMPT};
pub use error::{CORS_REMEDIATION_COMMAND, DescribeError, Result};
pub use image::{ImageRecord, decode_data_url, encode_data_url};
pub use session::{CANCELLED_MESSAGE, DescribeSession, SessionState};
