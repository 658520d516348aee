//! Year grid construction.
//!
//! Every month gets exactly four week slots starting on days 1, 8, 15 and
//! 22. The slots do not tile the month; days 29 to 31 belong to the last slot
//! when visits are placed.

use chrono::{Datelike, NaiveDate};

use crate::models::calendar::{
    Month, SlotDate, Week, YearGrid, DAYS_PER_SLOT, MONTHS_PER_YEAR, WEEKS_PER_MONTH,
};
use crate::models::visit::Visit;

/// Build an empty grid for `year`. Pure and total.
pub fn build(year: i32) -> YearGrid {
    let months = (1..=MONTHS_PER_YEAR as u32)
        .map(|month_number| Month {
            month_number,
            weeks: (0..WEEKS_PER_MONTH)
                .map(|week_index| Week::new(SlotDate::for_slot(year, month_number, week_index)))
                .collect(),
        })
        .collect();

    YearGrid::new(year, months)
}

/// 0-based `(month_index, week_index)` of the slot containing `date`.
pub fn slot_for_date(date: NaiveDate) -> (usize, usize) {
    let month_index = date.month0() as usize;
    let week_index = ((date.day() - 1) / DAYS_PER_SLOT) as usize;
    (month_index, week_index.min(WEEKS_PER_MONTH - 1))
}

/// Place visits that fall in the grid's year into their slots.
/// Returns how many visits were added.
pub fn place_visits(grid: &mut YearGrid, visits: impl IntoIterator<Item = Visit>) -> usize {
    let year = grid.year();
    let mut placed = 0;

    for visit in visits {
        if visit.date.year() != year {
            continue;
        }
        let (month_index, week_index) = slot_for_date(visit.date);
        if let Some(week) = grid.week_mut(month_index, week_index) {
            if week.insert_visit(visit) {
                placed += 1;
            }
        }
    }

    placed
}
