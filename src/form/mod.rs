pub mod analyzer;
pub mod form_model;
pub mod labeler;
pub mod suggest;
