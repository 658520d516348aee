// Visit module
// Persisted clinical encounters and the creation request built from a drop

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::biomarker::{BiomarkerCategory, BiomarkerPayload};
use crate::models::patient::PatientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(pub i64);

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visit creation request sent to the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub reason: String,
    pub category: Option<BiomarkerCategory>,
    pub value: Option<f64>,
}

impl NewVisit {
    /// Build the request for a biomarker dropped on a week slot.
    pub fn from_payload(patient_id: PatientId, date: NaiveDate, payload: &BiomarkerPayload) -> Self {
        Self {
            patient_id,
            date,
            reason: payload.reason(),
            category: Some(payload.category),
            value: Some(payload.value),
        }
    }
}

/// A visit acknowledged by the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: VisitId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub category: Option<BiomarkerCategory>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl Visit {
    pub fn from_request(id: VisitId, request: &NewVisit) -> Self {
        Self {
            id,
            patient_id: request.patient_id,
            date: request.date,
            reason: request.reason.clone(),
            category: request.category,
            value: request.value,
        }
    }
}
