pub mod auth;
pub mod clean_file;
pub mod cleaning_pipeline;
