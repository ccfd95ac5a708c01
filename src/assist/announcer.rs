use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

/// Speaking rate used for every announcement; slower than normal speech.
pub const ANNOUNCE_RATE: f32 = 0.8;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to start speech command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("audio output error: {0}")]
    Output(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            rate: ANNOUNCE_RATE,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

// ============================================================================
// Speech facilities
// ============================================================================

/// Something that can start speaking an utterance. `speak` must return
/// without waiting for playback to finish.
pub trait SpeechFacility: Send {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;
}

/// Speaks through an external synthesizer such as `espeak`.
///
/// The child process is not awaited by the caller; a detached thread reaps it.
pub struct CommandSpeech {
    pub program: String,
    /// Words per minute at rate 1.0.
    pub base_wpm: u32,
}

impl CommandSpeech {
    pub fn new(program: &str, base_wpm: u32) -> Self {
        Self {
            program: program.to_string(),
            base_wpm,
        }
    }

    /// Synthesizer arguments. The text always follows `--`, so page text
    /// starting with `-` is never read as an option.
    pub fn args(&self, utterance: &Utterance) -> Vec<String> {
        let wpm = (self.base_wpm as f32 * utterance.rate).round() as u32;
        let pitch = (utterance.pitch * 50.0).round().clamp(0.0, 99.0) as u32;
        let amplitude = (utterance.volume * 100.0).round().clamp(0.0, 200.0) as u32;
        vec![
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "--".to_string(),
            utterance.text.clone(),
        ]
    }
}

impl SpeechFacility for CommandSpeech {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.program)
            .args(self.args(utterance))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Keeps every utterance in memory; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    spoken: Arc<Mutex<Vec<Utterance>>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|u| u.text).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.spoken().pop().map(|u| u.text)
    }
}

impl SpeechFacility for RecordingSpeech {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.spoken
            .lock()
            .map_err(|e| SpeechError::Output(e.to_string()))?
            .push(utterance.clone());
        Ok(())
    }
}

// ============================================================================
// Announcer
// ============================================================================

/// Speaks status text when voice is enabled and a facility is present.
///
/// Fire-and-forget: failures are logged and never reach the caller.
pub struct Announcer {
    facility: Option<Box<dyn SpeechFacility>>,
}

impl Announcer {
    pub fn new(facility: Box<dyn SpeechFacility>) -> Self {
        Self {
            facility: Some(facility),
        }
    }

    pub fn silent() -> Self {
        Self { facility: None }
    }

    pub fn is_available(&self) -> bool {
        self.facility.is_some()
    }

    /// Returns whether the text was handed to the speech facility.
    pub fn announce(&self, text: &str, voice_enabled: bool) -> bool {
        if !voice_enabled {
            return false;
        }
        let Some(facility) = &self.facility else {
            return false;
        };

        debug!("announce: {}", text);
        match facility.speak(&Utterance::new(text)) {
            Ok(()) => true,
            Err(e) => {
                warn!("speech failed: {}", e);
                false
            }
        }
    }
}
