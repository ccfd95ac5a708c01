use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::messages::{ActionAck, ContentAction, Envelope, RelayReply, RelayRequest};
use crate::relay::playback::{AudioSink, PlaybackSlot};
use crate::relay::summarize::{SummarizeClient, summary_message};
use crate::relay::tts::TtsClient;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// The page-side receiver of popup actions.
pub trait ContentHandler {
    fn handle_action(&mut self, action: ContentAction) -> ActionAck;
}

// ============================================================================
// RelayWorker: turns one request into one reply
// ============================================================================

pub struct RelayWorker {
    pub summarizer: SummarizeClient,
    pub tts: TtsClient,
    /// Used when a summarize request carries no key of its own.
    pub default_api_key: Option<String>,
}

impl RelayWorker {
    pub fn new(summarizer: SummarizeClient, tts: TtsClient, default_api_key: Option<String>) -> Self {
        Self {
            summarizer,
            tts,
            default_api_key,
        }
    }

    /// Never fails: every error becomes part of the reply.
    pub fn handle(&self, request: &RelayRequest) -> RelayReply {
        match request {
            RelayRequest::Summarize { text, api_key } => {
                let key = api_key
                    .as_deref()
                    .or(self.default_api_key.as_deref())
                    .unwrap_or_default();
                let result = self.summarizer.summarize(text, key);
                if let Err(e) = &result {
                    warn!("summarize failed: {}", e);
                }
                RelayReply::Summary {
                    summary: summary_message(&result),
                }
            }
            RelayRequest::ElevenLabsTts { text } => match self.tts.synthesize(text) {
                Ok(audio) => RelayReply::ElevenLabsAudio {
                    audio_data: STANDARD.encode(audio),
                },
                Err(e) => {
                    warn!("tts failed: {}", e);
                    RelayReply::ElevenLabsError {
                        error: e.to_string(),
                    }
                }
            },
        }
    }
}

// ============================================================================
// BackgroundRelay: fire-and-forget dispatch with correlated replies
// ============================================================================

/// Runs relay work off the caller's thread and delivers replies on a channel.
///
/// Starting a new request stops any audio still playing. Replies are
/// at-most-once; a caller waiting on one must use a timeout.
pub struct BackgroundRelay {
    worker: Arc<RelayWorker>,
    tx: Sender<Envelope<RelayReply>>,
    rx: Receiver<Envelope<RelayReply>>,
    pending: VecDeque<Envelope<RelayReply>>,
    playback: PlaybackSlot,
    sink: Option<Box<dyn AudioSink>>,
    tracer: Option<TraceLogger>,
    step: u64,
}

impl BackgroundRelay {
    pub fn new(worker: RelayWorker) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            worker: Arc::new(worker),
            tx,
            rx,
            pending: VecDeque::new(),
            playback: PlaybackSlot::new(),
            sink: None,
            tracer: None,
            step: 0,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    fn trace(&mut self, event: TraceEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&event);
        }
        self.step += 1;
    }

    fn trace_reply(&mut self, id: Uuid) {
        let event = TraceEvent::now(self.step, "relay_reply").with_correlation(id);
        self.trace(event);
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_active()
    }

    /// Start `request` on a worker thread and return its correlation id.
    pub fn dispatch(&mut self, request: RelayRequest) -> Uuid {
        self.playback.stop();

        let envelope = Envelope::new(request);
        let id = envelope.correlation_id;
        let worker = Arc::clone(&self.worker);
        let tx = self.tx.clone();

        debug!(correlation_id = %id, "dispatching {:?}", request_kind(&envelope.body));
        let event = TraceEvent::now(self.step, "relay_dispatch")
            .with_detail(request_kind(&envelope.body))
            .with_correlation(id);
        self.trace(event);

        std::thread::spawn(move || {
            let reply = worker.handle(&envelope.body);
            // The receiver may be gone; nobody is owed a reply.
            let _ = tx.send(Envelope::reply_to(envelope.correlation_id, reply));
        });

        id
    }

    /// Handle a request on the calling thread.
    pub fn handle_now(&mut self, request: &RelayRequest) -> RelayReply {
        self.playback.stop();
        self.worker.handle(request)
    }

    /// Next reply from any request, if one arrives within `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Envelope<RelayReply>> {
        if let Some(envelope) = self.pending.pop_front() {
            return Some(envelope);
        }
        self.rx.recv_timeout(timeout).ok()
    }

    /// Wait for the reply to `id`. Replies to other requests are kept for
    /// later calls.
    pub fn wait_for(&mut self, id: Uuid, timeout: Duration) -> Option<RelayReply> {
        if let Some(pos) = self.pending.iter().position(|e| e.correlation_id == id) {
            if let Some(envelope) = self.pending.remove(pos) {
                self.trace_reply(id);
                return Some(envelope.body);
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(envelope) if envelope.correlation_id == id => {
                    self.trace_reply(id);
                    return Some(envelope.body);
                }
                Ok(other) => self.pending.push_back(other),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    warn!(correlation_id = %id, "no reply before timeout");
                    return None;
                }
            }
        }
    }

    /// Play the audio of a TTS reply, replacing any current playback.
    ///
    /// Returns a transient status message for the user.
    pub fn play_reply(&mut self, reply: &RelayReply) -> String {
        match reply {
            RelayReply::ElevenLabsAudio { audio_data } => {
                let audio = match STANDARD.decode(audio_data) {
                    Ok(a) => a,
                    Err(e) => {
                        self.playback.stop();
                        return format!("Audio playback failed: {}", e);
                    }
                };
                let Some(sink) = self.sink.as_mut() else {
                    return "Audio received, but no audio output is configured.".to_string();
                };
                match self.playback.start(&mut **sink, &audio) {
                    Ok(()) => "Playing audio...".to_string(),
                    Err(e) => format!("Audio playback failed: {}", e),
                }
            }
            RelayReply::ElevenLabsError { error } => format!("Error: {}", error),
            RelayReply::Summary { summary } => summary.clone(),
        }
    }

    /// Block until the current audio finishes on its own.
    pub fn wait_for_playback(&mut self) {
        self.playback.wait();
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
    }

    /// Forward a popup action to the active page, if there is one.
    pub fn relay_action(
        &mut self,
        action: ContentAction,
        active: Option<&mut dyn ContentHandler>,
    ) -> Option<ActionAck> {
        let Some(handler) = active else {
            info!("no active page for {:?}", action);
            return None;
        };
        let event = TraceEvent::now(self.step, "relay_action").with_detail(format!("{:?}", action));
        self.trace(event);
        Some(handler.handle_action(action))
    }
}

fn request_kind(request: &RelayRequest) -> &'static str {
    match request {
        RelayRequest::Summarize { .. } => "summarize",
        RelayRequest::ElevenLabsTts { .. } => "elevenLabsTTS",
    }
}
