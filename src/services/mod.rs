// Service module exports

pub mod backend;
pub mod calendar_grid;
pub mod drag_payload;
pub mod drop_reconciler;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod patient_context;
pub mod settings;
