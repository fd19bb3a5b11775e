pub mod bootstrap;
pub mod config;
pub mod csv;
pub mod db;
pub mod security;
pub mod session_store;
