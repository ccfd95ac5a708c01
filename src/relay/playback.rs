use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::assist::announcer::SpeechError;

/// An audio stream that is currently playing.
pub trait Playback: Send {
    fn stop(&mut self);

    /// Block until the stream ends on its own.
    fn wait(&mut self) {}
}

/// Something that can start playing encoded audio.
pub trait AudioSink: Send {
    fn play(&mut self, audio: &[u8]) -> Result<Box<dyn Playback>, SpeechError>;
}

// ============================================================================
// PlaybackSlot: at most one playback, last request wins
// ============================================================================

#[derive(Default)]
pub struct PlaybackSlot {
    current: Option<Box<dyn Playback>>,
}

impl PlaybackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut playback) = self.current.take() {
            debug!("stopping previous playback");
            playback.stop();
        }
    }

    /// Block until the current playback finishes, then clear the slot.
    pub fn wait(&mut self) {
        if let Some(mut playback) = self.current.take() {
            playback.wait();
        }
    }

    /// Stop whatever is playing, then start `audio`. On failure the slot is
    /// left empty.
    pub fn start(&mut self, sink: &mut dyn AudioSink, audio: &[u8]) -> Result<(), SpeechError> {
        self.stop();
        match sink.play(audio) {
            Ok(playback) => {
                self.current = Some(playback);
                Ok(())
            }
            Err(e) => {
                warn!("audio playback failed: {}", e);
                Err(e)
            }
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Writes audio to a temp file and plays it with an external player.
pub struct CommandPlayer {
    pub program: String,
    pub dir: PathBuf,
}

impl CommandPlayer {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            dir: std::env::temp_dir(),
        }
    }
}

const REAP_INTERVAL: Duration = Duration::from_millis(100);

/// A running player process and the temp file it reads. The file is removed
/// once the player exits, whether it finishes or is stopped.
struct ChildPlayback {
    child: Arc<Mutex<Child>>,
    file: PathBuf,
}

/// `true` once the child has exited or can no longer be polled.
fn has_exited(child: &Mutex<Child>) -> bool {
    match child.lock() {
        Ok(mut child) => !matches!(child.try_wait(), Ok(None)),
        Err(_) => true,
    }
}

fn remove_audio_file(file: &Path) {
    if let Err(e) = std::fs::remove_file(file) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("could not remove audio file {}: {}", file.display(), e);
        }
    }
}

/// Remove the temp file once the player exits on its own.
fn spawn_reaper(child: Arc<Mutex<Child>>, file: PathBuf) {
    std::thread::spawn(move || {
        while !has_exited(&child) {
            std::thread::sleep(REAP_INTERVAL);
        }
        remove_audio_file(&file);
    });
}

impl Playback for ChildPlayback {
    fn stop(&mut self) {
        if let Ok(mut child) = self.child.lock() {
            let _ = child.kill();
            let _ = child.wait();
        }
        remove_audio_file(&self.file);
    }

    fn wait(&mut self) {
        while !has_exited(&self.child) {
            std::thread::sleep(REAP_INTERVAL);
        }
        remove_audio_file(&self.file);
    }
}

impl AudioSink for CommandPlayer {
    fn play(&mut self, audio: &[u8]) -> Result<Box<dyn Playback>, SpeechError> {
        let file = self.dir.join(format!("gov-ease-{}.mp3", Uuid::new_v4()));
        std::fs::write(&file, audio).map_err(|e| SpeechError::Output(e.to_string()))?;

        let spawned = Command::new(&self.program)
            .arg(&file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let child = match spawned {
            Ok(child) => Arc::new(Mutex::new(child)),
            Err(source) => {
                remove_audio_file(&file);
                return Err(SpeechError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        spawn_reaper(Arc::clone(&child), file.clone());
        Ok(Box::new(ChildPlayback { child, file }))
    }
}

/// In-memory sink recording starts and stops; clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<RecordingState>>,
    fail: bool,
}

#[derive(Debug, Default)]
struct RecordingState {
    played: Vec<Vec<u8>>,
    stopped: usize,
    waited: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every `play` fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .map(|s| s.played.clone())
            .unwrap_or_default()
    }

    pub fn stopped(&self) -> usize {
        self.state.lock().map(|s| s.stopped).unwrap_or_default()
    }

    pub fn waited(&self) -> usize {
        self.state.lock().map(|s| s.waited).unwrap_or_default()
    }
}

struct RecordingPlayback {
    state: Arc<Mutex<RecordingState>>,
}

impl Playback for RecordingPlayback {
    fn stop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.stopped += 1;
        }
    }

    fn wait(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.waited += 1;
        }
    }
}

impl AudioSink for RecordingSink {
    fn play(&mut self, audio: &[u8]) -> Result<Box<dyn Playback>, SpeechError> {
        if self.fail {
            return Err(SpeechError::Output("no audio device".to_string()));
        }
        self.state
            .lock()
            .map_err(|e| SpeechError::Output(e.to_string()))?
            .played
            .push(audio.to_vec());
        Ok(Box::new(RecordingPlayback {
            state: Arc::clone(&self.state),
        }))
    }
}
