use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("API Key not set.")]
    MissingApiKey,

    #[error("{0}")]
    Network(String),

    #[error("HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Invalid response from API: {0}")]
    MalformedResponse(String),

    /// The provider answered but without the expected content. `details`
    /// carries the provider's own error message when it sent one.
    #[error("No summary returned from API.{}", details_suffix(.details))]
    NoSummary { details: Option<String> },
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_ref()
        .map(|d| format!(" Details: {}", d))
        .unwrap_or_default()
}

impl RelayError {
    /// Text shown to the user in place of a result.
    pub fn user_message(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Network(e.to_string())
    }
}
