//! AI content generation.
//!
//! Content is produced by a text-generation inference API. The boundary is
//! [`ContentGenerator`], whose `generate` never fails: missing credentials,
//! timeouts and upstream errors all come back as a short inline message that
//! is shown to the user in place of the content. Requests are not retried.

pub mod client;
pub mod error;
pub mod prompts;
pub mod types;

use async_trait::async_trait;

pub use client::HfClient;
pub use error::GenerationError;

/// Produces text for a prompt.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate text for `prompt`, or an inline error message.
    async fn generate(&self, prompt: &str) -> String;
}
