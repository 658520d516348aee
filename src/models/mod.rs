// Module exports for models

pub mod biomarker;
pub mod calendar;
pub mod patient;
pub mod settings;
pub mod status;
pub mod visit;
