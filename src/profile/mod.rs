pub mod profile_model;
pub mod store;
