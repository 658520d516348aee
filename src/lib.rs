// Visit Calendar Library
// Yearly visit grid engine with patient search and biomarker drag-and-drop

pub mod models;
pub mod services;
pub mod utils;

pub use services::engine::CalendarEngine;
