use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::relay::{summarize, tts};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "gov-ease",
    version,
    about = "Form assistant for government-service pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: gov-ease.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the profile store (JSON)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Disable spoken announcements for this run
    #[arg(long, global = true)]
    pub mute: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect and describe the forms of a page snapshot
    Scan {
        /// Page snapshot (JSON)
        #[arg(long)]
        snapshot: String,

        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill a form from the profile
    Autofill {
        #[arg(long)]
        snapshot: String,

        /// 1-based form number, as shown on the form badge
        #[arg(long, default_value_t = 1)]
        form: usize,

        /// Write the filled snapshot here
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Read the instructions of a form aloud
    Instructions {
        #[arg(long)]
        snapshot: String,

        #[arg(long, default_value_t = 1)]
        form: usize,
    },

    /// Describe each field of a form
    FieldHelp {
        #[arg(long)]
        snapshot: String,

        #[arg(long, default_value_t = 1)]
        form: usize,
    },

    /// Summarize the text of a page snapshot
    Summarize {
        #[arg(long)]
        snapshot: String,

        /// Summarization API key (overrides config and stored key)
        #[arg(long)]
        api_key: Option<String>,

        /// Store the given API key for later runs
        #[arg(long)]
        save_key: bool,

        /// Seconds to wait for the reply
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// Convert text to speech audio
    Speak {
        #[arg(long)]
        text: String,

        /// Write the audio to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Play the audio with the configured player
        #[arg(long)]
        play: bool,

        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// Show or edit the stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Print the stored profile
    Show,

    /// Set one field, e.g. `firstName Ada` or `voiceEnabled false`
    Set { field: String, value: String },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `gov-ease.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizeConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_half")]
    pub stability: f32,

    #[serde(default = "default_half")]
    pub similarity_boost: f32,

    #[serde(default = "default_player")]
    pub player: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            stability: 0.5,
            similarity_boost: 0.5,
            player: default_player(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Speech synthesizer command; empty disables spoken announcements.
    #[serde(default = "default_speech_command")]
    pub command: String,

    #[serde(default = "default_wpm")]
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: default_speech_command(),
            words_per_minute: 175,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_voice_id() -> String { tts::DEFAULT_VOICE_ID.to_string() }
fn default_model_id() -> String { tts::DEFAULT_MODEL_ID.to_string() }
fn default_half() -> f32 { 0.5 }
fn default_player() -> String { "mpv".to_string() }
fn default_speech_command() -> String { "espeak".to_string() }
fn default_wpm() -> u32 { 175 }

pub const DEFAULT_PROFILE_PATH: &str = "gov-ease-profile.json";

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "gov-ease.yaml";

/// Read the YAML config. A missing file means defaults; a malformed one is
/// reported and also yields defaults.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    let Ok(content) = std::fs::read_to_string(config_path) else {
        debug!(path = config_path, "no config file, using defaults");
        return AppConfig::default();
    };
    serde_yaml::from_str(&content).unwrap_or_else(|e| {
        warn!(path = config_path, "ignoring malformed config: {}", e);
        AppConfig::default()
    })
}

// ============================================================================
// Setting resolution: CLI > config > env > defaults
// ============================================================================

pub fn resolve_profile_path(cli: Option<&str>, config: &AppConfig) -> String {
    cli.map(str::to_string)
        .or_else(|| config.profile.path.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string())
}

pub fn resolve_summarize_endpoint(config: &AppConfig) -> String {
    config
        .summarize
        .endpoint
        .clone()
        .unwrap_or_else(|| summarize::DEFAULT_ENDPOINT.to_string())
}

pub fn resolve_summarize_model(config: &AppConfig) -> String {
    config
        .summarize
        .model
        .clone()
        .unwrap_or_else(|| summarize::DEFAULT_MODEL.to_string())
}

/// `stored` is the key saved in the profile store, consulted after env.
pub fn resolve_summarize_key(
    cli: Option<&str>,
    config: &AppConfig,
    stored: Option<String>,
) -> Option<String> {
    cli.map(str::to_string)
        .or_else(|| config.summarize.api_key.clone())
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .or(stored)
        .filter(|k| !k.is_empty())
}

pub fn resolve_tts_endpoint(config: &AppConfig) -> String {
    config
        .tts
        .endpoint
        .clone()
        .unwrap_or_else(|| tts::DEFAULT_ENDPOINT.to_string())
}

pub fn resolve_tts_key(config: &AppConfig) -> Option<String> {
    config
        .tts
        .api_key
        .clone()
        .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
        .filter(|k| !k.is_empty())
}

/// `-v` count to a tracing filter directive.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
