use crate::models::settings::EngineSettings;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV_VAR: &str = "VISIT_CALENDAR_CONFIG";

pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings service at the resolved default location.
    pub fn from_default_location() -> Self {
        Self::new(Self::resolve_path())
    }

    /// `$VISIT_CALENDAR_CONFIG`, else the platform config dir, else the
    /// working directory.
    pub fn resolve_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        if let Some(dirs) = ProjectDirs::from("com", "VisitCalendar", "visit-calendar") {
            dirs.config_dir().join("settings.toml")
        } else {
            log::warn!("Unable to resolve project directory; using current dir for settings");
            PathBuf::from("visit-calendar.toml")
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields defaults; a malformed one is an error.
    pub fn load(&self) -> Result<EngineSettings> {
        if !self.path.exists() {
            log::info!(
                "No settings file at {}, using defaults",
                self.path.display()
            );
            return Ok(EngineSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let settings: EngineSettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))?;
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error.
    pub fn load_or_default(&self) -> EngineSettings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings: {:#}, using defaults", e);
                EngineSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &EngineSettings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }
}
