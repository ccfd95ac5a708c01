use std::time::Duration;

use tracing::info;

use crate::assist::announcer::{Announcer, CommandSpeech};
use crate::assist::session::AssistantSession;
use crate::cli::config::{
    AppConfig, ProfileAction, resolve_summarize_endpoint, resolve_summarize_key,
    resolve_summarize_model, resolve_tts_endpoint, resolve_tts_key,
};
use crate::dom::document::Document;
use crate::form::form_model::FormDescriptor;
use crate::profile::store::{
    JsonFileStore, load_api_key, load_profile, save_api_key, save_profile,
};
use crate::relay::background::{BackgroundRelay, RelayWorker};
use crate::relay::messages::{RelayReply, RelayRequest};
use crate::relay::playback::CommandPlayer;
use crate::relay::summarize::SummarizeClient;
use crate::relay::tts::{TtsClient, VoiceSettings};
use crate::trace::logger::TraceLogger;

/// Settings shared by every subcommand.
pub struct CommandContext {
    pub config: AppConfig,
    pub profile_path: String,
    pub mute: bool,
}

impl CommandContext {
    fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.profile_path)
    }

    fn announcer(&self) -> Announcer {
        let command = self.config.speech.command.trim();
        if self.mute || command.is_empty() {
            Announcer::silent()
        } else {
            Announcer::new(Box::new(CommandSpeech::new(
                command,
                self.config.speech.words_per_minute,
            )))
        }
    }

    fn tracer(&self) -> Option<TraceLogger> {
        self.config.trace.path.as_deref().map(TraceLogger::new)
    }

    fn session(&self, snapshot: &str) -> Result<AssistantSession, Box<dyn std::error::Error>> {
        let document = Document::load(snapshot)?;
        let session = AssistantSession::start(&self.store(), document, self.announcer());
        Ok(match self.tracer() {
            Some(tracer) => session.with_tracer(tracer),
            None => session,
        })
    }

    fn relay(&self) -> BackgroundRelay {
        let summarizer = SummarizeClient::new(
            &resolve_summarize_endpoint(&self.config),
            &resolve_summarize_model(&self.config),
        );
        let tts = TtsClient::new(&resolve_tts_endpoint(&self.config), resolve_tts_key(&self.config))
            .with_voice(&self.config.tts.voice_id, &self.config.tts.model_id)
            .with_settings(VoiceSettings {
                stability: self.config.tts.stability,
                similarity_boost: self.config.tts.similarity_boost,
            });

        let relay = BackgroundRelay::new(RelayWorker::new(summarizer, tts, None))
            .with_sink(Box::new(CommandPlayer::new(&self.config.tts.player)));
        match self.tracer() {
            Some(tracer) => relay.with_tracer(tracer),
            None => relay,
        }
    }
}

/// Select the 1-based form `number`, or explain why it can't be.
fn select_form(
    session: &mut AssistantSession,
    number: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = session.forms().len();
    if count == 0 {
        return Err("no forms detected on this page".into());
    }
    if number == 0 || number > count {
        return Err(format!("form {} not found (page has {} forms)", number, count).into());
    }
    session.activate_badge(number - 1);
    Ok(())
}

// ============================================================================
// scan subcommand
// ============================================================================

pub fn format_form_summary(number: usize, form: &FormDescriptor) -> String {
    let mut out = format!(
        "[{}] {} ({}, ~{} min, {} fields)\n",
        number,
        form.title,
        form.difficulty,
        form.estimated_minutes,
        form.fields.len()
    );
    if !form.description.is_empty() {
        out.push_str(&format!("    {}\n", form.description));
    }
    for field in &form.fields {
        let marker = if field.required { "*" } else { " " };
        let suggestion = field
            .top_suggestion()
            .map(|s| format!(" -> {}", s.value))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {} {} [{}]{}\n",
            marker, field.label, field.r#type, suggestion
        ));
    }
    out
}

pub fn cmd_scan(
    ctx: &CommandContext,
    snapshot: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session(snapshot)?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.forms())?);
        return Ok(());
    }

    println!("Detected {} forms", session.forms().len());
    for (index, form) in session.forms().iter().enumerate() {
        print!("{}", format_form_summary(index + 1, form));
    }
    Ok(())
}

// ============================================================================
// autofill / instructions / field-help subcommands
// ============================================================================

pub fn cmd_autofill(
    ctx: &CommandContext,
    snapshot: &str,
    form: usize,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ctx.session(snapshot)?;
    select_form(&mut session, form)?;

    let filled = session.autofill().unwrap_or_default();
    println!("Auto-filled {} fields with your information.", filled);
    if let Some(progress) = session.progress() {
        println!("{} ({:.0}%)", progress.display_text(), progress.percentage());
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&session.document().to_snapshot())?;
        std::fs::write(path, json)?;
        info!("filled snapshot written to {}", path);
    }
    Ok(())
}

pub fn cmd_instructions(
    ctx: &CommandContext,
    snapshot: &str,
    form: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ctx.session(snapshot)?;
    select_form(&mut session, form)?;
    if let Some(text) = session.read_form_instructions() {
        println!("{}", text);
    }
    Ok(())
}

pub fn cmd_field_help(
    ctx: &CommandContext,
    snapshot: &str,
    form: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ctx.session(snapshot)?;
    select_form(&mut session, form)?;
    if let Some(text) = session.show_field_help() {
        println!("{}", text);
    }
    Ok(())
}

// ============================================================================
// summarize / speak subcommands
// ============================================================================

pub fn cmd_summarize(
    ctx: &CommandContext,
    snapshot: &str,
    api_key: Option<&str>,
    save_key: bool,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.store();
    if save_key {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            save_api_key(&mut store, key)?;
            println!("API Key saved.");
        }
    }

    let key = resolve_summarize_key(api_key, &ctx.config, load_api_key(&store));
    let Some(key) = key else {
        println!("Error: API Key not set.");
        return Ok(());
    };

    let document = Document::load(snapshot)?;
    let text = document.body_text();
    if text.is_empty() {
        println!("Error: could not get page content.");
        return Ok(());
    }

    eprintln!("Summarizing...");
    let mut relay = ctx.relay();
    let id = relay.dispatch(RelayRequest::Summarize {
        text,
        api_key: Some(key),
    });

    match relay.wait_for(id, Duration::from_secs(timeout)) {
        Some(RelayReply::Summary { summary }) => println!("{}", summary),
        Some(other) => println!("{}", relay.play_reply(&other)),
        None => println!("Error: no reply from the summarization service."),
    }
    Ok(())
}

pub fn cmd_speak(
    ctx: &CommandContext,
    text: &str,
    output: Option<&str>,
    play: bool,
    timeout: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut relay = ctx.relay();
    let id = relay.dispatch(RelayRequest::ElevenLabsTts {
        text: text.to_string(),
    });

    let Some(reply) = relay.wait_for(id, Duration::from_secs(timeout)) else {
        println!("Error: no reply from the text-to-speech service.");
        return Ok(());
    };

    if let (RelayReply::ElevenLabsAudio { audio_data }, Some(path)) = (&reply, output) {
        use base64::Engine;
        let audio = base64::engine::general_purpose::STANDARD.decode(audio_data)?;
        std::fs::write(path, audio)?;
        println!("Audio written to {}", path);
    }

    match &reply {
        RelayReply::ElevenLabsAudio { .. } if !play => {
            if output.is_none() {
                println!("Audio received; use --output or --play.");
            }
        }
        _ => println!("{}", relay.play_reply(&reply)),
    }

    // The player's temp file is cleaned up when playback ends; stay until then.
    if relay.is_playing() {
        relay.wait_for_playback();
    }
    Ok(())
}

// ============================================================================
// profile subcommand
// ============================================================================

pub fn cmd_profile(
    ctx: &CommandContext,
    action: &ProfileAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.store();
    let mut profile = load_profile(&store);

    match action {
        ProfileAction::Show => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Set { field, value } => {
            profile.set_field(field, value)?;
            save_profile(&mut store, &profile)?;
            println!("Saved {}.", field);
        }
    }
    Ok(())
}
