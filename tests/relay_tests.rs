use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gov_ease::relay::background::{BackgroundRelay, RelayWorker};
use gov_ease::relay::error::RelayError;
use gov_ease::relay::messages::{ActionAck, ContentAction, Envelope, RelayReply, RelayRequest};
use gov_ease::relay::playback::{CommandPlayer, PlaybackSlot, RecordingSink};
use gov_ease::relay::summarize::{SummarizeClient, build_prompt, extract_summary};
use gov_ease::relay::tts::TtsClient;
use gov_ease::trace::logger::TraceLogger;
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use crate::common::utils::{ada_profile, recording_session};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";
const TTS_PATH: &str = "/text-to-speech/21m00Tcm4TlvDq8ikWAM";

/// Start a mock server with `mocks` mounted. The blocking clients under test
/// must be called outside the runtime.
fn mock_server(rt: &Runtime, mocks: Vec<Mock>) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        for mock in mocks {
            mock.mount(&server).await;
        }
        server
    })
}

fn offline_worker() -> RelayWorker {
    RelayWorker::new(
        SummarizeClient::new("http://127.0.0.1:9", "gemini-2.5-flash"),
        TtsClient::new("http://127.0.0.1:9", None),
        None,
    )
}

// =========================================================================
// Summarize client
// =========================================================================

#[test]
fn summarize_returns_first_candidate_text() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(query_param("key", "k123"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [
                        { "content": { "parts": [ { "text": "• Apply online\n• Bring ID" } ] } }
                    ]
                }))),
        ],
    );

    let client = SummarizeClient::new(&server.uri(), "gemini-2.5-flash");
    let summary = client.summarize("Some page text", "k123").unwrap();
    assert_eq!(summary, "• Apply online\n• Bring ID");
}

#[test]
fn summarize_sends_bullet_prompt() {
    let rt = Runtime::new().unwrap();
    let prompt = build_prompt("Page body");
    let server = mock_server(
        &rt,
        vec![
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(body_partial_json(json!({
                    "contents": [ { "parts": [ { "text": prompt } ] } ]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [ { "content": { "parts": [ { "text": "ok" } ] } } ]
                }))),
        ],
    );

    let client = SummarizeClient::new(&server.uri(), "gemini-2.5-flash");
    assert_eq!(client.summarize("Page body", "k").unwrap(), "ok");
    assert!(prompt.contains("• symbol"));
}

#[test]
fn empty_candidates_become_no_summary() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] }))),
        ],
    );

    let worker = RelayWorker::new(
        SummarizeClient::new(&server.uri(), "gemini-2.5-flash"),
        TtsClient::new(&server.uri(), None),
        Some("k".into()),
    );
    let reply = worker.handle(&RelayRequest::Summarize {
        text: "hello".into(),
        api_key: None,
    });
    assert_eq!(
        reply,
        RelayReply::Summary {
            summary: "Error: No summary returned from API.".into()
        }
    );
}

#[test]
fn provider_error_message_is_appended() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![
            Mock::given(method("POST")).respond_with(ResponseTemplate::new(400).set_body_json(
                json!({ "error": { "code": 400, "message": "API key not valid." } }),
            )),
        ],
    );

    let client = SummarizeClient::new(&server.uri(), "gemini-2.5-flash");
    let err = client.summarize("hello", "bad").unwrap_err();
    assert_eq!(
        err.user_message(),
        "Error: No summary returned from API. Details: API key not valid."
    );
}

#[test]
fn non_json_body_is_malformed() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![Mock::given(method("POST")).respond_with(ResponseTemplate::new(502).set_body_string("<html>"))],
    );

    let client = SummarizeClient::new(&server.uri(), "gemini-2.5-flash");
    assert!(matches!(
        client.summarize("hello", "k"),
        Err(RelayError::MalformedResponse(_))
    ));
}

#[test]
fn missing_key_short_circuits() {
    let client = SummarizeClient::new("http://127.0.0.1:9", "gemini-2.5-flash");
    let err = client.summarize("hello", "").unwrap_err();
    assert!(matches!(err, RelayError::MissingApiKey));
    assert_eq!(err.user_message(), "Error: API Key not set.");
}

#[test]
fn extract_summary_ignores_other_shapes() {
    assert!(matches!(
        extract_summary(&json!({ "candidates": [ { "content": {} } ] })),
        Err(RelayError::NoSummary { details: None })
    ));
}

// =========================================================================
// TTS client
// =========================================================================

#[test]
fn tts_returns_audio_bytes_and_sends_key_header() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![
            Mock::given(method("POST"))
                .and(path(TTS_PATH))
                .and(header("xi-api-key", "el-key"))
                .and(body_partial_json(json!({
                    "text": "Hello",
                    "model_id": "eleven_monolingual_v1",
                    "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x49, 0x44, 0x33])),
        ],
    );

    let client = TtsClient::new(&server.uri(), Some("el-key".into()));
    assert_eq!(client.synthesize("Hello").unwrap(), vec![0x49, 0x44, 0x33]);
}

#[test]
fn tts_http_failure_becomes_error_reply() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![Mock::given(method("POST")).respond_with(ResponseTemplate::new(401))],
    );

    let worker = RelayWorker::new(
        SummarizeClient::new(&server.uri(), "gemini-2.5-flash"),
        TtsClient::new(&server.uri(), Some("el-key".into())),
        None,
    );
    let reply = worker.handle(&RelayRequest::ElevenLabsTts {
        text: "Hello".into(),
    });
    assert_eq!(
        reply,
        RelayReply::ElevenLabsError {
            error: "HTTP 401 Unauthorized".into()
        }
    );
}

#[test]
fn tts_success_is_base64_encoded() {
    let rt = Runtime::new().unwrap();
    let server = mock_server(
        &rt,
        vec![Mock::given(method("POST")).respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))],
    );

    let worker = RelayWorker::new(
        SummarizeClient::new(&server.uri(), "gemini-2.5-flash"),
        TtsClient::new(&server.uri(), Some("el-key".into())),
        None,
    );
    let reply = worker.handle(&RelayRequest::ElevenLabsTts { text: "x".into() });
    assert_eq!(
        reply,
        RelayReply::ElevenLabsAudio {
            audio_data: STANDARD.encode([1u8, 2, 3])
        }
    );
}

// =========================================================================
// Message shapes
// =========================================================================

#[test]
fn messages_use_wire_names() {
    let request = RelayRequest::Summarize {
        text: "t".into(),
        api_key: Some("k".into()),
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "type": "summarize", "text": "t", "apiKey": "k" })
    );

    let tts: RelayRequest =
        serde_json::from_value(json!({ "type": "elevenLabsTTS", "text": "hi" })).unwrap();
    assert_eq!(tts, RelayRequest::ElevenLabsTts { text: "hi".into() });

    let audio = RelayReply::ElevenLabsAudio {
        audio_data: "AAA=".into(),
    };
    assert_eq!(
        serde_json::to_value(&audio).unwrap(),
        json!({ "type": "elevenLabsAudio", "audioData": "AAA=" })
    );

    assert_eq!(
        serde_json::to_value(ContentAction::EnableFieldHelp).unwrap(),
        json!({ "action": "enableFieldHelp" })
    );
}

#[test]
fn envelope_flattens_body_with_correlation_id() {
    let envelope = Envelope::new(RelayReply::Summary {
        summary: "s".into(),
    });
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["type"], "summary");
    assert_eq!(value["correlationId"], envelope.correlation_id.to_string());

    let back: Envelope<RelayReply> = serde_json::from_value(value).unwrap();
    assert_eq!(back, envelope);
}

// =========================================================================
// Background relay
// =========================================================================

#[test]
fn replies_are_matched_by_correlation_id() {
    let mut relay = BackgroundRelay::new(offline_worker());

    let tts_id = relay.dispatch(RelayRequest::ElevenLabsTts { text: "a".into() });
    let summary_id = relay.dispatch(RelayRequest::Summarize {
        text: "b".into(),
        api_key: None,
    });
    assert_ne!(tts_id, summary_id);

    let timeout = Duration::from_secs(5);
    assert_eq!(
        relay.wait_for(summary_id, timeout),
        Some(RelayReply::Summary {
            summary: "Error: API Key not set.".into()
        })
    );
    assert_eq!(
        relay.wait_for(tts_id, timeout),
        Some(RelayReply::ElevenLabsError {
            error: "API Key not set.".into()
        })
    );
}

#[test]
fn wait_for_unknown_id_times_out() {
    let mut relay = BackgroundRelay::new(offline_worker());
    assert!(
        relay
            .wait_for(uuid::Uuid::new_v4(), Duration::from_millis(50))
            .is_none()
    );
}

#[test]
fn new_request_stops_current_playback() {
    let sink = RecordingSink::new();
    let mut relay = BackgroundRelay::new(offline_worker()).with_sink(Box::new(sink.clone()));

    let audio = RelayReply::ElevenLabsAudio {
        audio_data: STANDARD.encode(b"mp3"),
    };
    assert_eq!(relay.play_reply(&audio), "Playing audio...");
    assert!(relay.is_playing());
    assert_eq!(sink.played(), vec![b"mp3".to_vec()]);

    assert_eq!(relay.play_reply(&audio), "Playing audio...");
    assert_eq!(sink.stopped(), 1, "Second playback replaces the first");

    relay.dispatch(RelayRequest::ElevenLabsTts { text: "x".into() });
    assert!(!relay.is_playing());
    assert_eq!(sink.stopped(), 2);
}

#[test]
fn play_reply_status_messages() {
    let mut relay = BackgroundRelay::new(offline_worker());
    let audio = RelayReply::ElevenLabsAudio {
        audio_data: STANDARD.encode(b"mp3"),
    };
    assert_eq!(
        relay.play_reply(&audio),
        "Audio received, but no audio output is configured."
    );
    assert_eq!(
        relay.play_reply(&RelayReply::ElevenLabsError {
            error: "HTTP 500 Internal Server Error".into()
        }),
        "Error: HTTP 500 Internal Server Error"
    );

    let mut failing = BackgroundRelay::new(offline_worker()).with_sink(Box::new(RecordingSink::failing()));
    assert!(failing.play_reply(&audio).starts_with("Audio playback failed:"));
    assert!(!failing.is_playing());
}

#[test]
fn failed_start_leaves_slot_empty() {
    let mut slot = PlaybackSlot::new();
    let mut ok = RecordingSink::new();
    slot.start(&mut ok, b"one").unwrap();
    assert!(slot.is_active());

    let mut failing = RecordingSink::failing();
    assert!(slot.start(&mut failing, b"two").is_err());
    assert!(!slot.is_active());
    assert_eq!(ok.stopped(), 1, "Previous playback stopped before the attempt");
}

#[test]
fn stashed_replies_are_traced_too() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    let mut relay = BackgroundRelay::new(offline_worker())
        .with_tracer(TraceLogger::new(path.to_str().unwrap()));

    let first = relay.dispatch(RelayRequest::ElevenLabsTts { text: "a".into() });
    // Let the first reply land on the channel before the second request.
    std::thread::sleep(Duration::from_millis(200));
    let second = relay.dispatch(RelayRequest::ElevenLabsTts { text: "b".into() });

    let timeout = Duration::from_secs(5);
    assert!(relay.wait_for(second, timeout).is_some());
    assert!(relay.wait_for(first, timeout).is_some(), "Served from the stash");

    let replies: Vec<String> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .filter(|e| e["kind"] == "relay_reply")
        .map(|e| e["correlation_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(replies, vec![second.to_string(), first.to_string()]);
}

#[test]
fn waiting_for_playback_clears_the_slot() {
    let sink = RecordingSink::new();
    let mut relay = BackgroundRelay::new(offline_worker()).with_sink(Box::new(sink.clone()));

    let audio = RelayReply::ElevenLabsAudio {
        audio_data: STANDARD.encode(b"mp3"),
    };
    relay.play_reply(&audio);
    relay.wait_for_playback();

    assert_eq!(sink.waited(), 1);
    assert_eq!(sink.stopped(), 0);
    assert!(!relay.is_playing());
}

#[cfg(unix)]
fn player_in(dir: &std::path::Path) -> CommandPlayer {
    let mut player = CommandPlayer::new("true");
    player.dir = dir.to_path_buf();
    player
}

#[cfg(unix)]
fn audio_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[cfg(unix)]
#[test]
fn finished_player_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = player_in(dir.path());

    let mut slot = PlaybackSlot::new();
    slot.start(&mut player, b"mp3").unwrap();
    slot.wait();

    assert!(!slot.is_active());
    assert_eq!(audio_files(dir.path()), 0);
}

#[cfg(unix)]
#[test]
fn temp_file_reaped_without_a_later_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = player_in(dir.path());

    let mut slot = PlaybackSlot::new();
    slot.start(&mut player, b"mp3").unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while audio_files(dir.path()) > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(audio_files(dir.path()), 0, "Reaped once the player exits");
    assert!(slot.is_active(), "The slot still holds the playback handle");
}

#[cfg(unix)]
#[test]
fn missing_player_removes_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = CommandPlayer::new("gov-ease-no-such-player");
    player.dir = dir.path().to_path_buf();

    let mut slot = PlaybackSlot::new();
    assert!(slot.start(&mut player, b"mp3").is_err());
    assert_eq!(audio_files(dir.path()), 0);
}

#[test]
fn actions_need_an_active_page() {
    let mut relay = BackgroundRelay::new(offline_worker());
    assert_eq!(relay.relay_action(ContentAction::EnableFieldHelp, None), None);

    let (mut session, speech) = recording_session(ada_profile());
    let ack = relay.relay_action(ContentAction::EnableFieldHelp, Some(&mut session));
    assert_eq!(ack, Some(ActionAck { success: true }));
    assert!(session.field_help_enabled());
    assert_eq!(
        speech.last_text().unwrap(),
        "Field help enabled. Hover over form fields to hear explanations."
    );
}
