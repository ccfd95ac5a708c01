use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::relay::error::RelayError;

pub const DEFAULT_ENDPOINT: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TtsRequest<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub voice_settings: VoiceSettings,
}

/// Speech-to-audio client. Authenticates with the `xi-api-key` header.
pub struct TtsClient {
    client: reqwest::blocking::Client,
    pub endpoint: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    api_key: Option<String>,
}

impl TtsClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            voice_settings: VoiceSettings::default(),
            api_key,
        }
    }

    pub fn with_voice(mut self, voice_id: &str, model_id: &str) -> Self {
        self.voice_id = voice_id.to_string();
        self.model_id = model_id.to_string();
        self
    }

    pub fn with_settings(mut self, settings: VoiceSettings) -> Self {
        self.voice_settings = settings;
        self
    }

    pub fn url(&self) -> String {
        format!("{}/text-to-speech/{}", self.endpoint, self.voice_id)
    }

    /// Returns the raw audio bytes on success.
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>, RelayError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(RelayError::MissingApiKey)?;

        let request = TtsRequest {
            text,
            model_id: &self.model_id,
            voice_settings: self.voice_settings,
        };
        debug!("tts: voice={}, chars={}", self.voice_id, text.len());

        let response = self
            .client
            .post(self.url())
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.bytes()?.to_vec())
    }
}
