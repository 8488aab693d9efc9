pub mod alerts;
pub mod diagnostic_tests;
pub mod forgot_password;
pub mod health;
pub mod login;
pub mod profile;
pub mod register;
pub mod settings;
