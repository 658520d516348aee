//! Engine settings persistence (TOML on disk).

mod service;

pub use service::{SettingsService, CONFIG_ENV_VAR};
