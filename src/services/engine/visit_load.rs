use std::time::Duration;

use crate::models::patient::PatientId;
use crate::models::visit::Visit;
use crate::services::backend::VisitStore;

/// A pending reload of the active patient's visits for the displayed year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitLoadTicket {
    pub(super) generation: u64,
    pub patient_id: PatientId,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisitLoadResponse {
    pub(super) generation: u64,
    pub patient_id: PatientId,
    pub year: i32,
    pub result: Result<Vec<Visit>, String>,
}

/// Fetch visits for a ticket without borrowing the engine.
pub async fn load_visits(
    ticket: VisitLoadTicket,
    store: &dyn VisitStore,
    timeout: Duration,
) -> VisitLoadResponse {
    let result = match tokio::time::timeout(timeout, store.list_for_patient(ticket.patient_id)).await {
        Ok(Ok(visits)) => {
            log::debug!(
                "Loaded {} visit(s) for patient {}",
                visits.len(),
                ticket.patient_id
            );
            Ok(visits)
        }
        Ok(Err(err)) => {
            log::warn!(
                "Loading visits for patient {} failed: {:#}",
                ticket.patient_id,
                err
            );
            Err(format!("{:#}", err))
        }
        Err(_) => {
            log::warn!(
                "Loading visits for patient {} timed out after {:?}",
                ticket.patient_id,
                timeout
            );
            Err(format!("timed out after {:?}", timeout))
        }
    };

    VisitLoadResponse {
        generation: ticket.generation,
        patient_id: ticket.patient_id,
        year: ticket.year,
        result,
    }
}
