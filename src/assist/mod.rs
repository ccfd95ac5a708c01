pub mod announcer;
pub mod autofill;
pub mod progress;
pub mod registry;
pub mod session;
