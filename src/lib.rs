//! Form controllers for the user and map administration screens, plus the
//! operator console that drives them from a terminal.

pub mod config;
pub mod console;
pub mod context;
pub mod errors;
pub mod fixtures;
pub mod forms;
pub mod lang;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod services;
pub mod session;
pub mod validation;

rust_i18n::i18n!("locales", fallback = "en");
