//! Collaborator services consumed by the engine.
//!
//! The engine only sees these two traits. HTTP clients talk to the clinic
//! backend; the in-memory versions back tests and the headless driver.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::patient::{PatientId, PatientSummary, SearchCriteria};
use crate::models::visit::{NewVisit, Visit};

pub mod http;
pub mod memory;

pub use http::{HttpPatientLookup, HttpVisitStore};
pub use memory::{InMemoryPatientDirectory, InMemoryVisitStore};

/// Resolves search criteria to candidate patients.
///
/// Service and network errors must surface as `Err`, never as an empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientLookup: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PatientSummary>>;
}

/// Persists visits and lists them back per patient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn create(&self, visit: &NewVisit) -> Result<Visit>;

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Visit>>;
}
