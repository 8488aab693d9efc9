pub mod alerts;
pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod health;
pub mod keychain;
pub mod profile;
