//! Patient context resolver.
//!
//! Owns the active patient. Every search gets a generation number when it
//! starts; a response is applied only if it belongs to the most recently
//! started search, so a slow early request cannot overwrite a later one.

use std::time::Duration;

use crate::models::patient::{Patient, SearchCriteria};
use crate::models::status::StatusMessage;
use crate::services::backend::PatientLookup;
use crate::services::error::{
    CalendarError, ValidationError, NO_MATCH_MESSAGE, SEARCH_FAILED_MESSAGE,
};

pub mod tie_break;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    PatientFound(Patient),
    NoMatch,
    SearchFailed(String),
}

impl SearchOutcome {
    /// The selected patient, if any. A failed lookup is an error.
    pub fn into_patient(self) -> Result<Option<Patient>, CalendarError> {
        match self {
            SearchOutcome::PatientFound(patient) => Ok(Some(patient)),
            SearchOutcome::NoMatch => Ok(None),
            SearchOutcome::SearchFailed(cause) => Err(CalendarError::Lookup(cause)),
        }
    }
}

/// A started search, ready to be sent to the lookup service.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    generation: u64,
    criteria: SearchCriteria,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Normalized criteria as they will be sent.
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub generation: u64,
    pub outcome: SearchOutcome,
}

#[derive(Debug, Default)]
pub struct PatientContextResolver {
    active: Option<Patient>,
    latest_generation: u64,
}

impl PatientContextResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_patient(&self) -> Option<&Patient> {
        self.active.as_ref()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest_generation
    }

    /// Start a search: clears the active patient and supersedes any search
    /// still in flight.
    pub fn begin(&mut self, criteria: &SearchCriteria) -> Result<SearchTicket, ValidationError> {
        let criteria = criteria.normalized();
        if criteria.is_empty() {
            return Err(ValidationError::EmptySearchCriteria);
        }

        self.latest_generation += 1;
        self.active = None;
        log::debug!(
            "Starting patient search #{} with {:?}",
            self.latest_generation,
            criteria
        );

        Ok(SearchTicket {
            generation: self.latest_generation,
            criteria,
        })
    }

    /// Query the lookup service for a ticket. Does not touch resolver state,
    /// so several lookups may be outstanding at once.
    pub async fn lookup(
        ticket: SearchTicket,
        service: &dyn PatientLookup,
        timeout: Duration,
    ) -> SearchResponse {
        let outcome = match tokio::time::timeout(timeout, service.search(&ticket.criteria)).await {
            Err(_) => {
                log::warn!(
                    "Patient search #{} timed out after {:?}",
                    ticket.generation,
                    timeout
                );
                SearchOutcome::SearchFailed(format!("timed out after {:?}", timeout))
            }
            Ok(Err(err)) => {
                log::warn!("Patient search #{} failed: {:#}", ticket.generation, err);
                SearchOutcome::SearchFailed(format!("{:#}", err))
            }
            Ok(Ok(candidates)) => {
                log::debug!(
                    "Patient search #{} returned {} candidate(s)",
                    ticket.generation,
                    candidates.len()
                );
                match tie_break::select_best(&candidates, ticket.criteria.patient_number.as_deref()) {
                    Some(best) => SearchOutcome::PatientFound(Patient::from_summary(best.clone())),
                    None => SearchOutcome::NoMatch,
                }
            }
        };

        SearchResponse {
            generation: ticket.generation,
            outcome,
        }
    }

    /// Apply a lookup response. Returns `None` for a stale response, which
    /// changes nothing; otherwise the status message to show.
    pub fn apply(&mut self, response: SearchResponse) -> Option<StatusMessage> {
        if !self.is_current(response.generation) {
            log::debug!(
                "Discarding stale patient search #{} (latest is #{})",
                response.generation,
                self.latest_generation
            );
            return None;
        }

        let status = match response.outcome {
            SearchOutcome::PatientFound(patient) => {
                log::info!("Active patient set to {} ({})", patient.id, patient.patient_number);
                let status = StatusMessage::success(format!(
                    "Selected patient {} ({})",
                    patient.display_name, patient.patient_number
                ));
                self.active = Some(patient);
                status
            }
            SearchOutcome::NoMatch => {
                self.active = None;
                StatusMessage::info(NO_MATCH_MESSAGE)
            }
            SearchOutcome::SearchFailed(_) => {
                self.active = None;
                StatusMessage::error(SEARCH_FAILED_MESSAGE)
            }
        };

        Some(status)
    }

    /// Begin, look up and apply in one step.
    pub async fn search(
        &mut self,
        criteria: &SearchCriteria,
        service: &dyn PatientLookup,
        timeout: Duration,
    ) -> Result<(SearchOutcome, Option<StatusMessage>), ValidationError> {
        let ticket = self.begin(criteria)?;
        let response = Self::lookup(ticket, service, timeout).await;
        let outcome = response.outcome.clone();
        let status = self.apply(response);
        Ok((outcome, status))
    }

    /// Explicit deselection. Also invalidates any search still in flight.
    pub fn deselect(&mut self) {
        self.latest_generation += 1;
        if let Some(patient) = self.active.take() {
            log::info!("Deselected patient {}", patient.id);
        }
    }
}
