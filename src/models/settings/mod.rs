// Settings module
// Engine configuration loaded from settings.toml

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest number of years allowed on either side of the current year.
pub const MAX_YEAR_WINDOW: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Base URL of the patient lookup service.
    pub patient_api_url: String,
    /// Base URL of the visit persistence service.
    pub visit_api_url: String,
    pub search_timeout_ms: u64,
    pub visit_timeout_ms: u64,
    /// Years offered before the current one in the year selector.
    pub years_before: u32,
    /// Years offered after the current one in the year selector.
    pub years_after: u32,
    /// Reload the active patient's visits whenever the displayed year changes.
    pub refetch_visits_on_year_change: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            patient_api_url: "http://localhost:5000/api/patients".to_string(),
            visit_api_url: "http://localhost:3000/api/v1/visit".to_string(),
            search_timeout_ms: 10_000,
            visit_timeout_ms: 10_000,
            years_before: 10,
            years_after: 4,
            refetch_visits_on_year_change: true,
        }
    }
}

impl EngineSettings {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms.max(1))
    }

    pub fn visit_timeout(&self) -> Duration {
        Duration::from_millis(self.visit_timeout_ms.max(1))
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("patient_api_url", &self.patient_api_url),
            ("visit_api_url", &self.visit_api_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{} must be an http(s) URL", name));
            }
        }
        for (name, years) in [
            ("years_before", self.years_before),
            ("years_after", self.years_after),
        ] {
            if years > MAX_YEAR_WINDOW {
                return Err(format!("{} must be at most {}", name, MAX_YEAR_WINDOW));
            }
        }
        Ok(())
    }
}
