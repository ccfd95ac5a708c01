#![allow(dead_code)]

use gov_ease::assist::announcer::{Announcer, RecordingSpeech};
use gov_ease::assist::session::AssistantSession;
use gov_ease::dom::document::Document;
use gov_ease::profile::profile_model::Profile;

pub fn fixture(name: &str) -> std::path::PathBuf {
    let base = std::env::current_dir().unwrap();
    base.join("tests").join("fixtures").join(name)
}

pub fn benefits_page() -> Document {
    Document::load(fixture("benefits_page.json")).unwrap()
}

pub fn ada_profile() -> Profile {
    let mut profile = Profile::default();
    profile.personal_info.first_name = "Ada".into();
    profile.personal_info.last_name = "Lovelace".into();
    profile.personal_info.ssn = "123-45-6789".into();
    profile.personal_info.email = "ada@example.com".into();
    profile.personal_info.city = "London".into();
    profile
}

/// Session over the benefits page whose announcements are recorded.
pub fn recording_session(profile: Profile) -> (AssistantSession, RecordingSpeech) {
    let speech = RecordingSpeech::new();
    let mut session = AssistantSession::new(
        profile,
        benefits_page(),
        Announcer::new(Box::new(speech.clone())),
    );
    session.scan();
    (session, speech)
}
