//! Wire types for the Hugging Face text-generation inference API.

use serde::{Deserialize, Serialize};

/// Request body.
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters,
}

/// Generation parameters.
#[derive(Debug, Serialize)]
pub struct InferenceParameters {
    pub max_new_tokens: u32,
    /// Omit the prompt from the returned text.
    pub return_full_text: bool,
}

/// One generated completion.
#[derive(Debug, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Response body.
///
/// The API answers with a list for batched models and a bare object for
/// others. Anything unexpected is kept verbatim.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: String },
    Other(serde_json::Value),
}

impl InferenceResponse {
    /// The generated text, or an error message from the API.
    ///
    /// # Errors
    ///
    /// Returns the API's error message when the body is an error object.
    pub fn into_text(self) -> Result<String, String> {
        match self {
            Self::Batch(items) => Ok(items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .unwrap_or_default()),
            Self::Single(g) => Ok(g.generated_text),
            Self::Error { error } => Err(error),
            Self::Other(value) => Ok(value.to_string()),
        }
    }
}
