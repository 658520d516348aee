use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{PatientLookup, VisitStore};
use crate::models::patient::{normalize_patient_number, PatientId, PatientSummary, SearchCriteria};
use crate::models::visit::{NewVisit, Visit, VisitId};

/// Patient directory held in memory.
///
/// Names match case-insensitively by substring; the patient number matches
/// when the normalized candidate number contains the normalized query, so a
/// partial number can return several candidates.
#[derive(Debug, Default)]
pub struct InMemoryPatientDirectory {
    patients: Vec<PatientSummary>,
    latency: Option<Duration>,
    failing: AtomicBool,
}

impl InMemoryPatientDirectory {
    pub fn new(patients: Vec<PatientSummary>) -> Self {
        Self {
            patients,
            latency: None,
            failing: AtomicBool::new(false),
        }
    }

    /// `count` patients numbered `PD10001` upwards, with ids starting at 1.
    pub fn with_sample_patients(count: usize) -> Self {
        let patients = (1..=count as i64)
            .map(|i| {
                PatientSummary::new(
                    i,
                    format!("Patient{}", i),
                    format!("Lastname{}", i),
                    format!("PD{}", 10000 + i),
                )
            })
            .collect();
        Self::new(patients)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn patients(&self) -> &[PatientSummary] {
        &self.patients
    }

    fn matches(patient: &PatientSummary, criteria: &SearchCriteria) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        criteria
            .first_name
            .as_deref()
            .map_or(true, |first| contains_ci(&patient.first_name, first))
            && criteria
                .last_name
                .as_deref()
                .map_or(true, |last| contains_ci(&patient.last_name, last))
            && criteria.patient_number.as_deref().map_or(true, |number| {
                patient
                    .normalized_number()
                    .contains(&normalize_patient_number(number))
            })
    }
}

#[async_trait]
impl PatientLookup for InMemoryPatientDirectory {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PatientSummary>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("Patient directory is unavailable"));
        }

        let criteria = criteria.normalized();
        Ok(self
            .patients
            .iter()
            .filter(|patient| Self::matches(patient, &criteria))
            .cloned()
            .collect())
    }
}

/// Visit store held in memory, with a switchable failure mode.
#[derive(Debug)]
pub struct InMemoryVisitStore {
    visits: Mutex<Vec<Visit>>,
    next_id: AtomicI64,
    failing: AtomicBool,
    create_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl Default for InMemoryVisitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVisitStore {
    pub fn new() -> Self {
        Self {
            visits: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Store pre-seeded with existing visits; new ids continue after the largest.
    pub fn with_visits(visits: Vec<Visit>) -> Self {
        let next_id = visits.iter().map(|v| v.id.0).max().unwrap_or(0) + 1;
        Self {
            visits: Mutex::new(visits),
            next_id: AtomicI64::new(next_id),
            ..Self::new()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `create` calls received, failed ones included.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits
            .lock()
            .map(|visits| visits.clone())
            .unwrap_or_default()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl VisitStore for InMemoryVisitStore {
    async fn create(&self, visit: &NewVisit) -> Result<Visit> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("Visit store rejected the request"));
        }

        let id = VisitId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = Visit::from_request(id, visit);
        self.visits
            .lock()
            .map_err(|_| anyhow!("Visit store lock poisoned"))?
            .push(created.clone());
        Ok(created)
    }

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Visit>> {
        self.simulate_latency().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("Visit store is unavailable"));
        }

        let visits = self
            .visits
            .lock()
            .map_err(|_| anyhow!("Visit store lock poisoned"))?;
        Ok(visits
            .iter()
            .filter(|visit| visit.patient_id == patient_id)
            .cloned()
            .collect())
    }
}
