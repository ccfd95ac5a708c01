pub mod background;
pub mod error;
pub mod messages;
pub mod playback;
pub mod summarize;
pub mod tts;
