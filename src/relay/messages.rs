use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Cross-component messages
// ============================================================================

/// Work the background relay performs on behalf of the popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayRequest {
    #[serde(rename = "summarize")]
    Summarize {
        text: String,
        #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },

    #[serde(rename = "elevenLabsTTS")]
    ElevenLabsTts { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayReply {
    /// Always sent for a summarize request; failures are embedded as text.
    #[serde(rename = "summary")]
    Summary { summary: String },

    /// Base64-encoded audio bytes.
    #[serde(rename = "elevenLabsAudio")]
    ElevenLabsAudio {
        #[serde(rename = "audioData")]
        audio_data: String,
    },

    #[serde(rename = "elevenLabsError")]
    ElevenLabsError { error: String },
}

/// Popup commands relayed to the active page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentAction {
    EnableAutoFill,
    EnableVoiceGuidance,
    EnableFieldHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    pub success: bool,
}

/// A message plus the token that ties a reply to its request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn new(body: T) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            body,
        }
    }

    /// Wrap `body` as the reply to `correlation_id`.
    pub fn reply_to(correlation_id: Uuid, body: T) -> Self {
        Self {
            correlation_id,
            body,
        }
    }
}
