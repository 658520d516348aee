// Patient module
// Lookup results, the active patient and search criteria

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i64);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upper-case a patient number and strip every whitespace character.
///
/// Applied to the input field on every keystroke and to candidate numbers
/// before they are compared.
///
/// # Examples
/// ```
/// use visit_calendar::models::patient::normalize_patient_number;
///
/// assert_eq!(normalize_patient_number("  pd 10001 "), "PD10001");
/// ```
pub fn normalize_patient_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// One candidate returned by the patient lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: PatientId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub patient_number: String,
    /// The record exactly as the service returned it.
    #[serde(skip)]
    pub raw: Value,
}

impl PatientSummary {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        patient_number: impl Into<String>,
    ) -> Self {
        let mut summary = Self {
            id: PatientId(id),
            first_name: first_name.into(),
            last_name: last_name.into(),
            patient_number: patient_number.into(),
            raw: Value::Null,
        };
        summary.raw = serde_json::to_value(&summary).unwrap_or(Value::Null);
        summary
    }

    /// Parse a service record, keeping the original JSON alongside.
    pub fn from_record(record: Value) -> Result<Self, serde_json::Error> {
        let mut summary: PatientSummary = serde_json::from_value(record.clone())?;
        summary.raw = record;
        Ok(summary)
    }

    pub fn normalized_number(&self) -> String {
        normalize_patient_number(&self.patient_number)
    }
}

/// The single patient calendar operations currently apply to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: PatientId,
    pub display_name: String,
    pub patient_number: String,
    pub raw_record: Value,
}

impl Patient {
    pub fn from_summary(summary: PatientSummary) -> Self {
        let first = summary.first_name.trim();
        let last = summary.last_name.trim();
        let display_name = match (first.is_empty(), last.is_empty()) {
            (false, false) => format!("{}, {}", last, first),
            (true, false) => last.to_string(),
            (false, true) => first.to_string(),
            (true, true) if !summary.patient_number.trim().is_empty() => {
                summary.normalized_number()
            }
            (true, true) => format!("Patient {}", summary.id),
        };

        Self {
            id: summary.id,
            display_name,
            patient_number: summary.normalized_number(),
            raw_record: summary.raw,
        }
    }
}

/// Fields of the patient search form. Empty fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patient_number: Option<String>,
}

impl SearchCriteria {
    pub fn by_patient_number(number: impl Into<String>) -> Self {
        Self {
            patient_number: Some(number.into()),
            ..Self::default()
        }
    }

    pub fn by_name(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            patient_number: None,
        }
    }

    /// Trim names, normalize the patient number and drop empty fields.
    pub fn normalized(&self) -> Self {
        fn non_empty(value: String) -> Option<String> {
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        }

        Self {
            first_name: self
                .first_name
                .as_deref()
                .and_then(|name| non_empty(name.trim().to_string())),
            last_name: self
                .last_name
                .as_deref()
                .and_then(|name| non_empty(name.trim().to_string())),
            patient_number: self
                .patient_number
                .as_deref()
                .and_then(|number| non_empty(normalize_patient_number(number))),
        }
    }

    pub fn is_empty(&self) -> bool {
        let normalized = self.normalized();
        normalized.first_name.is_none()
            && normalized.last_name.is_none()
            && normalized.patient_number.is_none()
    }

    /// Query parameters for the lookup service, present fields only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(first) = &self.first_name {
            pairs.push(("firstName", first.clone()));
        }
        if let Some(last) = &self.last_name {
            pairs.push(("lastName", last.clone()));
        }
        if let Some(number) = &self.patient_number {
            pairs.push(("patientNumber", number.clone()));
        }
        pairs
    }
}
