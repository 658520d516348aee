//! Transient interaction state.
//!
//! `Idle`, `Dragging` and `Searching` are mutually exclusive and gate which
//! handlers may run. Row expansion in the results list is tracked separately
//! and does not interact with them.

use serde::Serialize;
use std::fmt;

use crate::models::biomarker::BiomarkerPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging,
    Searching,
}

impl InteractionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Dragging => "dragging",
            InteractionState::Searching => "searching",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowId(pub i64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct InteractionMachine {
    state: InteractionState,
    dragged: Option<BiomarkerPayload>,
    expanded_row: Option<RowId>,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == InteractionState::Dragging
    }

    pub fn is_searching(&self) -> bool {
        self.state == InteractionState::Searching
    }

    /// Payload of the drag in progress, for drop-target hints.
    pub fn dragged_payload(&self) -> Option<&BiomarkerPayload> {
        self.dragged.as_ref()
    }

    /// `Idle -> Dragging`. Returns `false` if a drag cannot start now.
    pub fn begin_drag(&mut self, payload: BiomarkerPayload) -> bool {
        if self.state != InteractionState::Idle {
            log::debug!("Ignoring drag start while {}", self.state.as_str());
            return false;
        }
        self.state = InteractionState::Dragging;
        self.dragged = Some(payload);
        true
    }

    /// `Dragging -> Idle` on drag end or drop, whatever the drop's outcome.
    pub fn end_drag(&mut self) -> bool {
        self.dragged = None;
        if self.state != InteractionState::Dragging {
            return false;
        }
        self.state = InteractionState::Idle;
        true
    }

    /// `Idle -> Searching`. A submit while already searching is ignored.
    pub fn begin_search(&mut self) -> bool {
        if self.state != InteractionState::Idle {
            log::debug!("Ignoring search submit while {}", self.state.as_str());
            return false;
        }
        self.state = InteractionState::Searching;
        true
    }

    /// `Searching -> Idle`.
    pub fn finish_search(&mut self) -> bool {
        if self.state != InteractionState::Searching {
            return false;
        }
        self.state = InteractionState::Idle;
        true
    }

    /// Whether the search submit control should be enabled.
    pub fn can_submit_search(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn expanded_row(&self) -> Option<RowId> {
        self.expanded_row
    }

    /// Expand `row_id`, collapsing any other row; clicking the expanded row
    /// again collapses it. Returns the row expanded afterwards.
    pub fn toggle_row(&mut self, row_id: RowId) -> Option<RowId> {
        self.expanded_row = if self.expanded_row == Some(row_id) {
            None
        } else {
            Some(row_id)
        };
        self.expanded_row
    }

    pub fn collapse_rows(&mut self) {
        self.expanded_row = None;
    }
}
