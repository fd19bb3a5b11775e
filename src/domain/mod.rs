pub mod csv;
pub mod error;
pub mod history;
pub mod user;
