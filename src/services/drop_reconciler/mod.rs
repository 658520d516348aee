//! Drop reconciliation.
//!
//! Turns a biomarker dropped on a week slot into a persisted visit for the
//! active patient. Local checks run first and never touch the network; the
//! grid changes only after the persistence service acknowledges the write.

use std::time::Duration;

use thiserror::Error;

use crate::models::calendar::YearGrid;
use crate::models::patient::{Patient, PatientId};
use crate::models::status::StatusMessage;
use crate::models::visit::{NewVisit, Visit};
use crate::services::backend::VisitStore;
use crate::services::drag_payload::{DecodeFailure, DragPayloadCodec};
use crate::services::error::{
    CalendarError, ValidationError, SELECT_PATIENT_MESSAGE, VISIT_FAILED_MESSAGE,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("drag token could not be decoded: {0}")]
    Decode(#[from] DecodeFailure),
    #[error("no active patient is selected")]
    NoActivePatient,
    #[error("no week slot at month {month_index}, week {week_index}")]
    SlotOutOfRange {
        month_index: usize,
        week_index: usize,
    },
    #[error("visit service rejected the request: {0}")]
    Persistence(String),
    #[error("visit service did not answer within {0:?}")]
    Timeout(Duration),
}

impl ReconcileError {
    /// Decode failures are aborted gestures and stay invisible to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ReconcileError::Decode(_))
    }

    /// The status line for this error, if it has one. Raw service errors are
    /// never included.
    pub fn status(&self) -> Option<StatusMessage> {
        match self {
            ReconcileError::Decode(_) => None,
            ReconcileError::NoActivePatient => Some(StatusMessage::error(SELECT_PATIENT_MESSAGE)),
            ReconcileError::SlotOutOfRange { .. } => {
                Some(StatusMessage::error("That calendar slot is not available."))
            }
            ReconcileError::Persistence(_) | ReconcileError::Timeout(_) => {
                Some(StatusMessage::error(VISIT_FAILED_MESSAGE))
            }
        }
    }
}

impl From<ReconcileError> for CalendarError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Decode(_) => ValidationError::MalformedToken.into(),
            ReconcileError::NoActivePatient => ValidationError::NoActivePatient.into(),
            ReconcileError::SlotOutOfRange {
                month_index,
                week_index,
            } => ValidationError::SlotOutOfRange {
                month_index,
                week_index,
            }
            .into(),
            ReconcileError::Persistence(cause) => CalendarError::Persistence(cause),
            ReconcileError::Timeout(after) => {
                CalendarError::Persistence(format!("timed out after {:?}", after))
            }
        }
    }
}

/// A drop that passed every local check and is ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDrop {
    pub month_index: usize,
    pub week_index: usize,
    /// Year of the grid the drop landed on.
    pub year: i32,
    pub request: NewVisit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropResponse {
    pub prepared: PreparedDrop,
    pub result: Result<Visit, ReconcileError>,
}

pub struct DropReconciler;

impl DropReconciler {
    /// Steps 1 to 4: decode, require a patient, resolve the slot date and
    /// build the creation request. No I/O.
    pub fn prepare(
        grid: &YearGrid,
        month_index: usize,
        week_index: usize,
        token: &str,
        active_patient: Option<&Patient>,
    ) -> Result<PreparedDrop, ReconcileError> {
        let payload = DragPayloadCodec::decode(token)?;
        let patient = active_patient.ok_or(ReconcileError::NoActivePatient)?;

        let slot_out_of_range = ReconcileError::SlotOutOfRange {
            month_index,
            week_index,
        };
        let week = grid
            .week(month_index, week_index)
            .ok_or_else(|| slot_out_of_range.clone())?;
        let date = week.start_date.to_naive_date().ok_or(slot_out_of_range)?;

        Ok(PreparedDrop {
            month_index,
            week_index,
            year: grid.year(),
            request: NewVisit::from_payload(patient.id, date, &payload),
        })
    }

    /// Step 5: one write to the persistence service, bounded by `timeout`.
    pub async fn submit(
        prepared: PreparedDrop,
        store: &dyn VisitStore,
        timeout: Duration,
    ) -> DropResponse {
        let result = match tokio::time::timeout(timeout, store.create(&prepared.request)).await {
            Ok(Ok(visit)) => Ok(visit),
            Ok(Err(err)) => {
                log::warn!(
                    "Visit creation failed for patient {} on {}: {:#}",
                    prepared.request.patient_id,
                    prepared.request.date,
                    err
                );
                Err(ReconcileError::Persistence(format!("{:#}", err)))
            }
            Err(_) => {
                log::warn!(
                    "Visit creation for patient {} timed out after {:?}",
                    prepared.request.patient_id,
                    timeout
                );
                Err(ReconcileError::Timeout(timeout))
            }
        };

        DropResponse { prepared, result }
    }

    /// Steps 6 and 7: fold the response into the grid.
    ///
    /// The visit is inserted only if the grid still shows the year and
    /// patient the drop was made for; otherwise it stays persisted but is
    /// not displayed here.
    pub fn apply(
        grid: &mut YearGrid,
        active_patient: Option<PatientId>,
        response: DropResponse,
    ) -> (Result<Visit, ReconcileError>, Option<StatusMessage>) {
        let DropResponse { prepared, result } = response;

        let visit = match result {
            Ok(visit) => visit,
            Err(err) => {
                let status = err.status();
                return (Err(err), status);
            }
        };

        let same_view = grid.year() == prepared.year
            && active_patient == Some(prepared.request.patient_id);
        if same_view {
            if let Some(week) = grid.week_mut(prepared.month_index, prepared.week_index) {
                week.insert_visit(visit.clone());
            }
        } else {
            log::info!(
                "Visit {} recorded for a view no longer shown (year {}, patient {})",
                visit.id,
                prepared.year,
                prepared.request.patient_id
            );
        }

        let status = StatusMessage::success(format!(
            "Recorded visit for patient {}: {}",
            visit.patient_id, visit.reason
        ));
        (Ok(visit), Some(status))
    }

    /// The whole drop in one call. Returns the outcome and the status to show.
    pub async fn reconcile(
        grid: &mut YearGrid,
        month_index: usize,
        week_index: usize,
        token: &str,
        active_patient: Option<&Patient>,
        store: &dyn VisitStore,
        timeout: Duration,
    ) -> (Result<Visit, ReconcileError>, Option<StatusMessage>) {
        let prepared = match Self::prepare(grid, month_index, week_index, token, active_patient) {
            Ok(prepared) => prepared,
            Err(err) => {
                if err.is_silent() {
                    log::debug!("Ignoring drop: {}", err);
                }
                let status = err.status();
                return (Err(err), status);
            }
        };

        let response = Self::submit(prepared, store, timeout).await;
        Self::apply(grid, active_patient.map(|p| p.id), response)
    }
}
