// Test fixtures - reusable test data
// Provides consistent patients, visits and engines across test files

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use visit_calendar::models::biomarker::BiomarkerCategory;
use visit_calendar::models::patient::{PatientId, PatientSummary};
use visit_calendar::models::settings::EngineSettings;
use visit_calendar::models::visit::{Visit, VisitId};
use visit_calendar::services::backend::{InMemoryPatientDirectory, InMemoryVisitStore};
use visit_calendar::CalendarEngine;

/// Sample patients
pub mod patients {
    use super::*;

    /// The directory used by most scenarios: PD10001..PD10030.
    pub fn directory() -> InMemoryPatientDirectory {
        InMemoryPatientDirectory::with_sample_patients(30)
    }

    /// Two patients whose numbers both contain `PD100`.
    pub fn ambiguous() -> InMemoryPatientDirectory {
        InMemoryPatientDirectory::new(vec![
            PatientSummary::new(7, "Ada", "Lovelace", "PD1005"),
            PatientSummary::new(8, "Alan", "Turing", "PD100"),
        ])
    }
}

/// Sample visits
pub mod visits {
    use super::*;

    pub fn visit(id: i64, patient: i64, date: NaiveDate, category: BiomarkerCategory, value: f64) -> Visit {
        Visit {
            id: VisitId(id),
            patient_id: PatientId(patient),
            date,
            reason: format!("{} value {}", category, value),
            category: Some(category),
            value: Some(value),
        }
    }

    /// Visits for patient 1 spread over 2024 and 2025.
    pub fn history() -> Vec<Visit> {
        vec![
            visit(1, 1, date(2024, 2, 10), BiomarkerCategory::Hba1c, 6.1),
            visit(2, 1, date(2024, 11, 28), BiomarkerCategory::Glucose, 101.0),
            visit(3, 1, date(2025, 4, 3), BiomarkerCategory::Diastolic, 80.0),
            visit(4, 2, date(2025, 4, 3), BiomarkerCategory::Systolic, 130.0),
        ]
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Settings with short timeouts so failing tests finish quickly.
pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        search_timeout_ms: 500,
        visit_timeout_ms: 500,
        ..EngineSettings::default()
    }
}

pub fn engine(
    lookup: Arc<InMemoryPatientDirectory>,
    store: Arc<InMemoryVisitStore>,
    year: i32,
) -> CalendarEngine {
    CalendarEngine::new(fast_settings(), lookup, store, year)
}

pub const SLOW: Duration = Duration::from_millis(150);
