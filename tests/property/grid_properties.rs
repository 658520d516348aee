// Property-based tests for grid construction and patient-number normalization

use chrono::Datelike;
use proptest::prelude::*;
use visit_calendar::models::calendar::{SlotDate, MONTHS_PER_YEAR, WEEKS_PER_MONTH};
use visit_calendar::models::patient::normalize_patient_number;
use visit_calendar::services::calendar_grid;

proptest! {
    /// Property: every year yields 12 months of 4 slots starting on day w*7+1
    #[test]
    fn prop_grid_shape_holds_for_any_year(year in any::<i32>()) {
        let grid = calendar_grid::build(year);

        prop_assert_eq!(grid.year(), year);
        prop_assert_eq!(grid.months().len(), MONTHS_PER_YEAR);
        for (month_index, month) in grid.months().iter().enumerate() {
            prop_assert_eq!(month.month_number as usize, month_index + 1);
            prop_assert_eq!(month.weeks.len(), WEEKS_PER_MONTH);
            for (week_index, week) in month.weeks.iter().enumerate() {
                prop_assert_eq!(week.start_date.year, year);
                prop_assert_eq!(week.start_date.month, month.month_number);
                prop_assert_eq!(week.start_date.day as usize, week_index * 7 + 1);
                prop_assert!(week.visits().is_empty());
            }
        }
    }

    /// Property: a slot's own start date maps back to the same slot
    #[test]
    fn prop_slot_start_maps_back_to_slot(
        year in 1900..2200i32,
        month_index in 0..12usize,
        week_index in 0..4usize,
    ) {
        let start = SlotDate::for_slot(year, month_index as u32 + 1, week_index);
        let date = start.to_naive_date().unwrap();

        prop_assert_eq!(date.day() as usize, week_index * 7 + 1);
        prop_assert_eq!(calendar_grid::slot_for_date(date), (month_index, week_index));
    }

    /// Property: normalized numbers are uppercase with no whitespace
    #[test]
    fn prop_normalized_number_is_uppercase_without_whitespace(raw in "[a-zA-Z0-9 \t]{0,20}") {
        let normalized = normalize_patient_number(&raw);

        prop_assert!(!normalized.chars().any(char::is_whitespace));
        prop_assert_eq!(normalized.clone(), normalized.to_uppercase());
        prop_assert_eq!(normalize_patient_number(&normalized), normalized);
    }
}

#[test]
fn test_documented_normalization_example() {
    assert_eq!(normalize_patient_number("  pd 10001 "), "PD10001");
}
