pub mod assist;
pub mod cli;
pub mod dom;
pub mod form;
pub mod profile;
pub mod relay;
pub mod trace;
