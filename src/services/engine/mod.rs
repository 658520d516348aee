//! Calendar engine: the single owner of the year grid, the active patient,
//! the status line and the interaction state.
//!
//! Presentation code calls the `on_*` handlers. Each async handler also comes
//! in a split form (`begin_*`, a free-standing async step that borrows only
//! a service, then `finish_*`) so that responses can be applied in whatever
//! order they arrive while the engine keeps handling other events.

use std::sync::Arc;

use serde::Serialize;

use crate::models::biomarker::{BiomarkerCategory, BiomarkerPayload};
use crate::models::calendar::YearGrid;
use crate::models::patient::{normalize_patient_number, Patient, SearchCriteria};
use crate::models::settings::{EngineSettings, MAX_YEAR_WINDOW};
use crate::models::status::StatusMessage;
use crate::models::visit::Visit;
use crate::services::backend::{PatientLookup, VisitStore};
use crate::services::calendar_grid;
use crate::services::drag_payload::{DragPayloadCodec, DragToken};
use crate::services::drop_reconciler::{DropReconciler, DropResponse, PreparedDrop, ReconcileError};
use crate::services::error::{ValidationError, EMPTY_SEARCH_MESSAGE, SELECT_PATIENT_MESSAGE, VISIT_LOAD_FAILED_MESSAGE};
use crate::services::interaction::{InteractionMachine, InteractionState, RowId};
use crate::services::patient_context::{
    PatientContextResolver, SearchOutcome, SearchResponse, SearchTicket,
};
use crate::utils::date;

mod visit_load;

pub use visit_load::{load_visits, VisitLoadResponse, VisitLoadTicket};

/// Read-only snapshot for rendering.
#[derive(Debug, Serialize)]
pub struct EngineView<'a> {
    pub grid: &'a YearGrid,
    pub active_patient: Option<&'a Patient>,
    pub status: Option<&'a StatusMessage>,
    pub interaction: InteractionState,
    pub search_enabled: bool,
}

pub struct CalendarEngine {
    settings: EngineSettings,
    lookup: Arc<dyn PatientLookup>,
    store: Arc<dyn VisitStore>,
    grid: YearGrid,
    resolver: PatientContextResolver,
    interaction: InteractionMachine,
    status: Option<StatusMessage>,
    load_generation: u64,
    anchor_year: i32,
}

impl CalendarEngine {
    pub fn new(
        settings: EngineSettings,
        lookup: Arc<dyn PatientLookup>,
        store: Arc<dyn VisitStore>,
        year: i32,
    ) -> Self {
        Self {
            settings,
            lookup,
            store,
            grid: calendar_grid::build(year),
            resolver: PatientContextResolver::new(),
            interaction: InteractionMachine::new(),
            status: None,
            load_generation: 0,
            anchor_year: date::current_year(),
        }
    }

    /// Engine showing the current year.
    pub fn for_current_year(
        settings: EngineSettings,
        lookup: Arc<dyn PatientLookup>,
        store: Arc<dyn VisitStore>,
    ) -> Self {
        Self::new(settings, lookup, store, date::current_year())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn lookup(&self) -> Arc<dyn PatientLookup> {
        Arc::clone(&self.lookup)
    }

    pub fn store(&self) -> Arc<dyn VisitStore> {
        Arc::clone(&self.store)
    }

    pub fn grid(&self) -> &YearGrid {
        &self.grid
    }

    pub fn year(&self) -> i32 {
        self.grid.year()
    }

    pub fn active_patient(&self) -> Option<&Patient> {
        self.resolver.active_patient()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.interaction.is_dragging()
    }

    pub fn is_searching(&self) -> bool {
        self.interaction.is_searching()
    }

    pub fn can_submit_search(&self) -> bool {
        self.interaction.can_submit_search()
    }

    pub fn dragged_payload(&self) -> Option<&BiomarkerPayload> {
        self.interaction.dragged_payload()
    }

    pub fn expanded_row(&self) -> Option<RowId> {
        self.interaction.expanded_row()
    }

    pub fn year_options(&self) -> Vec<i32> {
        date::year_window(
            self.anchor_year,
            self.settings.years_before.min(MAX_YEAR_WINDOW),
            self.settings.years_after.min(MAX_YEAR_WINDOW),
        )
    }

    pub fn month_name(&self, month_number: u32) -> Option<&'static str> {
        date::month_name(month_number)
    }

    pub fn view(&self) -> EngineView<'_> {
        EngineView {
            grid: &self.grid,
            active_patient: self.active_patient(),
            status: self.status(),
            interaction: self.interaction_state(),
            search_enabled: self.can_submit_search(),
        }
    }

    fn post(&mut self, status: Option<StatusMessage>) {
        if let Some(status) = status {
            log::debug!("Status [{:?}] {}", status.kind, status.text);
            self.status = Some(status);
        }
    }

    /// Rebuild the grid for `year`, dropping cached visits and invalidating
    /// any visit load still in flight.
    fn reset_grid(&mut self, year: i32) {
        self.grid = calendar_grid::build(year);
        self.load_generation += 1;
    }

    // ----- year selection ---------------------------------------------------

    /// Switch the displayed year. Returns a visit load to run when a patient
    /// is active and refetching is enabled.
    pub fn on_year_change(&mut self, year: i32) -> Option<VisitLoadTicket> {
        log::debug!("Year changed from {} to {}", self.grid.year(), year);
        self.reset_grid(year);
        self.begin_visit_load()
    }

    pub async fn on_year_change_and_refresh(&mut self, year: i32) {
        if let Some(ticket) = self.on_year_change(year) {
            self.run_visit_load(ticket).await;
        }
    }

    // ----- visit loading ----------------------------------------------------

    pub fn begin_visit_load(&mut self) -> Option<VisitLoadTicket> {
        if !self.settings.refetch_visits_on_year_change {
            return None;
        }
        let patient_id = self.active_patient()?.id;
        self.load_generation += 1;
        Some(VisitLoadTicket {
            generation: self.load_generation,
            patient_id,
            year: self.grid.year(),
        })
    }

    /// Apply a visit load. Returns the number of visits placed, or `None`
    /// if the response was stale or failed.
    pub fn finish_visit_load(&mut self, response: VisitLoadResponse) -> Option<usize> {
        if response.generation != self.load_generation {
            log::debug!(
                "Discarding stale visit load for patient {} / {}",
                response.patient_id,
                response.year
            );
            return None;
        }

        match response.result {
            Ok(visits) => {
                let patient_id = response.patient_id;
                let placed = calendar_grid::place_visits(
                    &mut self.grid,
                    visits.into_iter().filter(|v| v.patient_id == patient_id),
                );
                log::info!(
                    "Placed {} visit(s) for patient {} in {}",
                    placed,
                    patient_id,
                    self.grid.year()
                );
                Some(placed)
            }
            Err(_) => {
                self.post(Some(StatusMessage::error(VISIT_LOAD_FAILED_MESSAGE)));
                None
            }
        }
    }

    async fn run_visit_load(&mut self, ticket: VisitLoadTicket) -> Option<usize> {
        let store = self.store();
        let response = load_visits(ticket, store.as_ref(), self.settings.visit_timeout()).await;
        self.finish_visit_load(response)
    }

    // ----- patient search ---------------------------------------------------

    /// Continuous normalization for the patient-number input field.
    pub fn on_patient_number_input(&self, raw: &str) -> String {
        normalize_patient_number(raw)
    }

    /// Start a search. Returns `None` when the submit is ignored (a search
    /// is already running, or a drag is in progress) or rejected locally.
    pub fn begin_search(&mut self, criteria: &SearchCriteria) -> Option<SearchTicket> {
        if !self.interaction.begin_search() {
            let err = ValidationError::InvalidState("search", self.interaction.state().as_str());
            log::debug!("Search submit ignored: {}", err);
            return None;
        }

        match self.resolver.begin(criteria) {
            Ok(ticket) => {
                let year = self.grid.year();
                self.reset_grid(year);
                Some(ticket)
            }
            Err(err) => {
                log::debug!("Search rejected: {}", err);
                self.interaction.finish_search();
                self.post(Some(StatusMessage::info(EMPTY_SEARCH_MESSAGE)));
                None
            }
        }
    }

    /// Apply a search response. Stale responses change nothing. Returns the
    /// visit load to run for a newly selected patient.
    pub fn finish_search(&mut self, response: SearchResponse) -> Option<VisitLoadTicket> {
        if !self.resolver.is_current(response.generation) {
            self.resolver.apply(response);
            return None;
        }

        self.interaction.finish_search();
        let status = self.resolver.apply(response);
        self.post(status);
        self.begin_visit_load()
    }

    pub async fn on_search_submit(&mut self, criteria: &SearchCriteria) -> Option<SearchOutcome> {
        let ticket = self.begin_search(criteria)?;
        let lookup = self.lookup();
        let response =
            PatientContextResolver::lookup(ticket, lookup.as_ref(), self.settings.search_timeout())
                .await;
        let outcome = response.outcome.clone();

        if let Some(load) = self.finish_search(response) {
            self.run_visit_load(load).await;
        }
        Some(outcome)
    }

    /// Clear the active patient and discard anything still in flight for it.
    pub fn deselect_patient(&mut self) {
        self.resolver.deselect();
        self.interaction.finish_search();
        let year = self.grid.year();
        self.reset_grid(year);
        self.post(Some(StatusMessage::info("No patient selected.")));
    }

    // ----- drag and drop ----------------------------------------------------

    /// Start dragging a biomarker. Returns the token to place on the transfer
    /// channel, or `None` if the drag is rejected at the source.
    pub fn on_drag_start(&mut self, value: f64, category: BiomarkerCategory) -> Option<DragToken> {
        if self.resolver.active_patient().is_none() {
            self.post(Some(StatusMessage::error(SELECT_PATIENT_MESSAGE)));
            return None;
        }
        if self.interaction.state() != InteractionState::Idle {
            let err = ValidationError::InvalidState("drag", self.interaction.state().as_str());
            log::debug!("Drag start ignored: {}", err);
            return None;
        }

        let payload = match BiomarkerPayload::new(value, category) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Rejecting drag: {}", err);
                return None;
            }
        };

        match DragPayloadCodec::encode(&payload, self.resolver.active_patient()) {
            Ok(token) => {
                self.interaction.begin_drag(payload);
                Some(token)
            }
            Err(ValidationError::NoActivePatient) => {
                self.post(Some(StatusMessage::error(SELECT_PATIENT_MESSAGE)));
                None
            }
            Err(err) => {
                log::warn!("Rejecting drag: {}", err);
                None
            }
        }
    }

    /// Drag cancelled without a drop.
    pub fn on_drag_end(&mut self) {
        self.interaction.end_drag();
    }

    /// Local half of a drop. The dragging state is cleared whatever happens.
    pub fn begin_drop(
        &mut self,
        month_index: usize,
        week_index: usize,
        token: &str,
    ) -> Result<PreparedDrop, ReconcileError> {
        self.interaction.end_drag();

        DropReconciler::prepare(
            &self.grid,
            month_index,
            week_index,
            token,
            self.resolver.active_patient(),
        )
        .map_err(|err| {
            if err.is_silent() {
                log::debug!("Ignoring drop: {}", err);
            }
            self.post(err.status());
            err
        })
    }

    pub fn finish_drop(&mut self, response: DropResponse) -> Result<Visit, ReconcileError> {
        let active = self.resolver.active_patient().map(|p| p.id);
        let (result, status) = DropReconciler::apply(&mut self.grid, active, response);
        self.post(status);
        result
    }

    pub async fn on_drop(
        &mut self,
        month_index: usize,
        week_index: usize,
        token: &str,
    ) -> Result<Visit, ReconcileError> {
        let prepared = self.begin_drop(month_index, week_index, token)?;
        let store = self.store();
        let response =
            DropReconciler::submit(prepared, store.as_ref(), self.settings.visit_timeout()).await;
        self.finish_drop(response)
    }

    // ----- results list -----------------------------------------------------

    pub fn on_row_toggle(&mut self, row_id: RowId) -> Option<RowId> {
        self.interaction.toggle_row(row_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::{PatientId, PatientSummary};
    use crate::models::status::StatusKind;
    use crate::models::visit::VisitId;
    use crate::services::backend::{InMemoryPatientDirectory, InMemoryVisitStore, MockVisitStore};
    use chrono::NaiveDate;

    fn engine_with(store: Arc<dyn VisitStore>) -> CalendarEngine {
        CalendarEngine::new(
            EngineSettings::default(),
            Arc::new(InMemoryPatientDirectory::with_sample_patients(30)),
            store,
            2025,
        )
    }

    #[tokio::test]
    async fn test_search_then_drop_records_visit() {
        let store = Arc::new(InMemoryVisitStore::new());
        let mut engine = engine_with(store.clone());

        engine
            .on_search_submit(&SearchCriteria::by_patient_number("pd 10001"))
            .await;
        assert_eq!(engine.active_patient().map(|p| p.id), Some(PatientId(1)));
        assert!(!engine.is_searching());

        let token = engine.on_drag_start(120.0, BiomarkerCategory::Systolic).unwrap();
        assert!(engine.is_dragging());

        let visit = engine.on_drop(3, 0, token.as_str()).await.unwrap();
        assert!(!engine.is_dragging());
        assert_eq!(visit.date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(engine.grid().week(3, 0).unwrap().visits().len(), 1);
        assert_eq!(engine.status().unwrap().kind, StatusKind::Success);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_drag_without_patient_is_rejected_at_source() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));

        assert!(engine.on_drag_start(90.0, BiomarkerCategory::Systolic).is_none());
        assert!(!engine.is_dragging());
        assert_eq!(engine.status().unwrap().text, SELECT_PATIENT_MESSAGE);
    }

    #[tokio::test]
    async fn test_drop_clears_dragging_even_on_failure() {
        let mut store = MockVisitStore::new();
        store
            .expect_list_for_patient()
            .returning(|_| Ok(Vec::new()));
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("503")));
        let mut engine = engine_with(Arc::new(store));

        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10002"))
            .await;
        let token = engine.on_drag_start(3.0, BiomarkerCategory::Hba1c).unwrap();
        let result = engine.on_drop(0, 0, token.as_str()).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert!(!engine.is_dragging());
        assert_eq!(engine.grid().visit_count(), 0);
        assert!(engine.status().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_silent_drop_keeps_previous_status() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10001"))
            .await;
        let before = engine.status().cloned();

        let result = engine.on_drop(0, 0, "").await;
        assert!(matches!(result, Err(ReconcileError::Decode(_))));
        assert_eq!(engine.status().cloned(), before);
    }

    #[test]
    fn test_duplicate_search_submit_is_ignored() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        let first = engine.begin_search(&SearchCriteria::by_patient_number("PD10001"));
        assert!(first.is_some());
        assert!(!engine.can_submit_search());
        assert!(engine
            .begin_search(&SearchCriteria::by_patient_number("PD10002"))
            .is_none());
    }

    #[test]
    fn test_empty_search_is_rejected_locally() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        assert!(engine.begin_search(&SearchCriteria::default()).is_none());
        assert!(engine.can_submit_search());
        assert_eq!(engine.status(), Some(&StatusMessage::info(EMPTY_SEARCH_MESSAGE)));
    }

    #[tokio::test]
    async fn test_year_change_refetches_visits_for_new_year() {
        let existing = vec![
            Visit {
                id: VisitId(1),
                patient_id: PatientId(1),
                date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                reason: "hba1c value 6".to_string(),
                category: Some(BiomarkerCategory::Hba1c),
                value: Some(6.0),
            },
            Visit {
                id: VisitId(2),
                patient_id: PatientId(1),
                date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                reason: "systolic value 120".to_string(),
                category: Some(BiomarkerCategory::Systolic),
                value: Some(120.0),
            },
        ];
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::with_visits(existing)));

        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10001"))
            .await;
        assert_eq!(engine.grid().visit_count(), 1);
        assert_eq!(engine.grid().week(3, 0).unwrap().visits()[0].id, VisitId(2));

        engine.on_year_change_and_refresh(2024).await;
        assert_eq!(engine.year(), 2024);
        assert_eq!(engine.grid().visit_count(), 1);
        assert_eq!(engine.grid().week(1, 1).unwrap().visits()[0].id, VisitId(1));
    }

    #[tokio::test]
    async fn test_stale_visit_load_is_discarded() {
        let store = Arc::new(InMemoryVisitStore::new());
        let mut engine = engine_with(store.clone());
        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10001"))
            .await;

        let old_ticket = engine.on_year_change(2023).unwrap();
        let _new_ticket = engine.on_year_change(2024).unwrap();
        let response = load_visits(old_ticket, store.as_ref(), engine.settings().visit_timeout()).await;
        assert_eq!(engine.finish_visit_load(response), None);
    }

    #[test]
    fn test_year_change_without_patient_has_nothing_to_load() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        assert!(engine.on_year_change(2030).is_none());
        assert_eq!(engine.year(), 2030);
        assert_eq!(engine.grid().months().len(), 12);
    }

    #[tokio::test]
    async fn test_deselect_clears_patient_and_grid() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10001"))
            .await;
        let token = engine.on_drag_start(120.0, BiomarkerCategory::Systolic).unwrap();
        engine.on_drop(0, 0, token.as_str()).await.unwrap();

        engine.deselect_patient();
        assert!(engine.active_patient().is_none());
        assert_eq!(engine.grid().visit_count(), 0);
    }

    #[test]
    fn test_patient_number_input_and_rows() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        assert_eq!(engine.on_patient_number_input("  pd 10001 "), "PD10001");

        assert_eq!(engine.on_row_toggle(RowId(4)), Some(RowId(4)));
        assert_eq!(engine.on_row_toggle(RowId(4)), None);
    }

    #[test]
    fn test_view_serializes() {
        let engine = CalendarEngine::new(
            EngineSettings::default(),
            Arc::new(InMemoryPatientDirectory::new(vec![PatientSummary::new(1, "A", "B", "PD1")])),
            Arc::new(InMemoryVisitStore::new()),
            2025,
        );
        let json = serde_json::to_value(engine.view()).unwrap();
        assert_eq!(json["grid"]["year"], 2025);
        assert_eq!(json["interaction"], "Idle");
        assert_eq!(json["search_enabled"], true);
        assert_eq!(engine.month_name(4), Some("April"));
        assert_eq!(engine.year_options().len(), 15);
    }

    #[tokio::test]
    async fn test_failed_visit_load_keeps_patient_and_empty_grid() {
        let store = Arc::new(InMemoryVisitStore::new());
        let mut engine = engine_with(store.clone());
        engine
            .on_search_submit(&SearchCriteria::by_patient_number("PD10001"))
            .await;
        let token = engine.on_drag_start(120.0, BiomarkerCategory::Systolic).unwrap();
        engine.on_drop(3, 0, token.as_str()).await.unwrap();

        store.set_failing(true);
        engine.on_year_change_and_refresh(2025).await;

        assert_eq!(engine.status(), Some(&StatusMessage::error(VISIT_LOAD_FAILED_MESSAGE)));
        assert_eq!(engine.grid().visit_count(), 0);
        assert_eq!(engine.active_patient().map(|p| p.id), Some(PatientId(1)));
    }

    #[test]
    fn test_drag_while_searching_asks_for_patient() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        engine
            .begin_search(&SearchCriteria::by_patient_number("PD10001"))
            .unwrap();

        assert!(engine.on_drag_start(120.0, BiomarkerCategory::Systolic).is_none());
        assert!(engine.is_searching());
        assert_eq!(engine.status(), Some(&StatusMessage::error(SELECT_PATIENT_MESSAGE)));
    }

    #[test]
    fn test_year_options_are_capped() {
        let settings = EngineSettings {
            years_before: u32::MAX,
            years_after: 0,
            ..EngineSettings::default()
        };
        let engine = CalendarEngine::new(
            settings,
            Arc::new(InMemoryPatientDirectory::with_sample_patients(1)),
            Arc::new(InMemoryVisitStore::new()),
            2025,
        );
        assert_eq!(engine.year_options().len(), MAX_YEAR_WINDOW as usize + 1);
    }

    #[test]
    fn test_new_search_keeps_expanded_row() {
        let mut engine = engine_with(Arc::new(InMemoryVisitStore::new()));
        engine.on_row_toggle(RowId(2));
        engine
            .begin_search(&SearchCriteria::by_patient_number("PD10001"))
            .unwrap();
        assert_eq!(engine.expanded_row(), Some(RowId(2)));
    }
}
