use serde::Serialize;
use tracing::{debug, info};

use crate::assist::announcer::Announcer;
use crate::assist::autofill::autofill_form;
use crate::assist::progress::{Progress, ProgressTracker};
use crate::assist::registry::{Badge, FormRegistry};
use crate::dom::document::{Document, DomEvent, NodeId};
use crate::form::form_model::{FieldDescriptor, FormDescriptor};
use crate::profile::profile_model::Profile;
use crate::profile::store::{ProfileStore, load_profile};
use crate::relay::background::ContentHandler;
use crate::relay::messages::{ActionAck, ContentAction};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Assistance panel shown for the selected form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistancePanel {
    pub form_id: String,
    pub title: String,
    pub estimated_minutes: u32,
    pub difficulty: String,
    pub progress: Progress,
}

impl AssistancePanel {
    fn for_form(form: &FormDescriptor) -> Self {
        Self {
            form_id: form.id.clone(),
            title: form.title.clone(),
            estimated_minutes: form.estimated_minutes,
            difficulty: form.difficulty.to_string(),
            progress: Progress {
                completed: 0,
                total: form.fields.len(),
            },
        }
    }
}

// ============================================================================
// AssistantSession: everything the page-side assistant does
// ============================================================================

/// Owns the page, the profile and the detected forms for one page view.
///
/// The current form lives in the registry; progress and the panel follow it.
pub struct AssistantSession {
    profile: Profile,
    document: Document,
    registry: FormRegistry,
    progress: ProgressTracker,
    announcer: Announcer,
    panel: Option<AssistancePanel>,
    highlighted: Vec<NodeId>,
    enhanced_voice: bool,
    field_help: bool,
    tracer: Option<TraceLogger>,
    step: u64,
}

impl AssistantSession {
    pub fn new(profile: Profile, document: Document, announcer: Announcer) -> Self {
        Self {
            profile,
            document,
            registry: FormRegistry::new(),
            progress: ProgressTracker::new(),
            announcer,
            panel: None,
            highlighted: Vec::new(),
            enhanced_voice: false,
            field_help: false,
            tracer: None,
            step: 0,
        }
    }

    /// Load the profile from `store` and scan the page.
    pub fn start(store: &dyn ProfileStore, document: Document, announcer: Announcer) -> Self {
        let profile = load_profile(store);
        let mut session = Self::new(profile, document, announcer);
        session.scan();
        session
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

    fn speak(&mut self, text: &str) -> bool {
        let spoken = self
            .announcer
            .announce(text, self.profile.preferences.voice_enabled);
        let event = TraceEvent::now(self.step, "announce").with_detail(text);
        self.trace(event);
        spoken
    }

    /// Speak arbitrary status text, subject to the voice preference.
    pub fn announce(&mut self, text: &str) -> bool {
        self.speak(text)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Replace the profile after an explicit user edit and re-derive
    /// suggestions.
    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
        self.scan();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn forms(&self) -> &[FormDescriptor] {
        self.registry.forms()
    }

    pub fn badges(&self) -> &[Badge] {
        self.registry.badges()
    }

    pub fn current_form(&self) -> Option<&FormDescriptor> {
        self.registry.current()
    }

    pub fn panel(&self) -> Option<&AssistancePanel> {
        self.panel.as_ref()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress.last()
    }

    pub fn highlighted_fields(&self) -> &[NodeId] {
        &self.highlighted
    }

    pub fn enhanced_voice(&self) -> bool {
        self.enhanced_voice
    }

    pub fn field_help_enabled(&self) -> bool {
        self.field_help
    }

    // ------------------------------------------------------------------------
    // Detection and selection
    // ------------------------------------------------------------------------

    /// Re-analyze all forms. Drops the selection, panel and highlights.
    pub fn scan(&mut self) -> usize {
        let count = self.registry.scan(&self.document, &self.profile);
        self.panel = None;
        self.highlighted.clear();
        self.progress.clear();

        let event = TraceEvent::now(self.step, "forms_detected").with_count(count);
        self.trace(event);
        count
    }

    /// Badge click: select the form, show its panel and announce it.
    pub fn activate_badge(&mut self, index: usize) -> Option<&AssistancePanel> {
        let form = self.registry.select(index)?.clone();
        info!(form_id = %form.id, "form selected");

        self.progress.reset(&form);
        self.panel = Some(AssistancePanel::for_form(&form));

        let announcement = format!(
            "Form detected: {}. Difficulty level: {}. Estimated completion time: {} minutes.",
            form.title, form.difficulty, form.estimated_minutes
        );
        let event = TraceEvent::now(self.step, "form_selected").with_form(&form.id);
        self.trace(event);
        self.speak(&announcement);

        self.panel.as_ref()
    }

    pub fn close_panel(&mut self) {
        self.panel = None;
    }

    // ------------------------------------------------------------------------
    // Form actions
    // ------------------------------------------------------------------------

    /// Fill the current form from the profile. `None` when no form is selected.
    pub fn autofill(&mut self) -> Option<usize> {
        let form = self.registry.current()?.clone();
        let filled = autofill_form(&form, &mut self.document);
        self.pump_events();

        let event = TraceEvent::now(self.step, "autofill")
            .with_form(&form.id)
            .with_count(filled);
        self.trace(event);
        self.speak(&format!(
            "Auto-filled {} fields with your information.",
            filled
        ));
        Some(filled)
    }

    pub fn read_form_instructions(&mut self) -> Option<String> {
        let form = self.registry.current()?;
        let text = format!(
            "{}. {}. This form has {} fields and should take about {} minutes to complete.",
            form.title,
            form.description,
            form.fields.len(),
            form.estimated_minutes
        );
        self.speak(&text);
        Some(text)
    }

    pub fn show_field_help(&mut self) -> Option<String> {
        let form = self.registry.current()?;
        let help = form
            .fields
            .iter()
            .map(|f| {
                format!(
                    "{}: {}",
                    f.label,
                    if f.required { "Required" } else { "Optional" }
                )
            })
            .collect::<Vec<_>>()
            .join(". ");
        let text = format!("Field help: {}", help);
        self.speak(&text);
        Some(text)
    }

    // ------------------------------------------------------------------------
    // Page events
    // ------------------------------------------------------------------------

    /// User typing into a control: set the value and process the notification.
    pub fn type_into(&mut self, element: NodeId, value: &str) -> Option<Progress> {
        if !self.document.input_value(element, value) {
            return None;
        }
        self.pump_events()
    }

    /// Process queued input notifications; returns the latest progress
    /// reported for the current form, if any event concerned it.
    pub fn pump_events(&mut self) -> Option<Progress> {
        let mut latest = None;
        for event in self.document.drain_events() {
            let DomEvent::Input { target } = event;
            if let Some(progress) = self.handle_input(target) {
                latest = Some(progress);
            }
        }
        latest
    }

    pub fn handle_input(&mut self, target: NodeId) -> Option<Progress> {
        let form = self.registry.current()?;
        let progress = self.progress.on_input(target, form, &self.document)?;
        if let Some(panel) = &mut self.panel {
            panel.progress = progress;
        }
        debug!("{}", progress.display_text());
        Some(progress)
    }

    // ------------------------------------------------------------------------
    // Popup-driven modes
    // ------------------------------------------------------------------------

    /// Highlight every field on the page that has a suggestion.
    pub fn enable_auto_fill_mode(&mut self) -> &[NodeId] {
        self.speak(
            "Auto-fill mode enabled. I will automatically suggest your information for form fields.",
        );
        self.highlighted = self
            .registry
            .forms()
            .iter()
            .flat_map(|form| form.fields.iter())
            .filter(|f| !f.suggestions.is_empty())
            .map(|f| f.element)
            .collect();
        &self.highlighted
    }

    pub fn enable_voice_guidance(&mut self) {
        self.speak(
            "Voice guidance enabled. I will read form instructions and provide audio feedback.",
        );
        self.enhanced_voice = true;
    }

    pub fn enable_field_help(&mut self) {
        self.speak("Field help enabled. Hover over form fields to hear explanations.");
        self.field_help = true;
    }

    /// Pointer entering a control. Announces help once field help is on.
    pub fn hover(&mut self, element: NodeId) -> Option<String> {
        if !self.field_help || !self.profile.preferences.voice_enabled {
            return None;
        }
        let field = self.find_field(element)?;
        let text = format!(
            "{}. {}",
            field.label,
            if field.required {
                "This field is required."
            } else {
                "This field is optional."
            }
        );
        self.speak(&text);
        Some(text)
    }

    fn find_field(&self, element: NodeId) -> Option<&FieldDescriptor> {
        self.registry
            .forms()
            .iter()
            .find_map(|form| form.field_for(element))
    }
}

impl ContentHandler for AssistantSession {
    fn handle_action(&mut self, action: ContentAction) -> ActionAck {
        match action {
            ContentAction::EnableAutoFill => {
                self.enable_auto_fill_mode();
            }
            ContentAction::EnableVoiceGuidance => self.enable_voice_guidance(),
            ContentAction::EnableFieldHelp => self.enable_field_help(),
        }
        ActionAck { success: true }
    }
}
