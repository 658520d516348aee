// Calendar grid module
// A year of months, each split into four fixed week slots

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::models::biomarker::{format_value, BiomarkerCategory};
use crate::models::visit::{Visit, VisitId};

pub const MONTHS_PER_YEAR: usize = 12;
pub const WEEKS_PER_MONTH: usize = 4;
pub const DAYS_PER_SLOT: u32 = 7;

/// Placeholder shown in a summary cell with no recorded value.
pub const NOT_RECORDED: &str = "--";

/// First day of a week slot.
///
/// Slot days are 1, 8, 15 and 22, which exist in every month of every year,
/// so a slot date can be represented even for years chrono cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl SlotDate {
    /// Slot date for `(year, month_number, week_index)`: day `week_index * 7 + 1`.
    pub fn for_slot(year: i32, month_number: u32, week_index: usize) -> Self {
        Self {
            year,
            month: month_number,
            day: week_index as u32 * DAYS_PER_SLOT + 1,
        }
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Short `M/D` label used on week cells.
    pub fn label(&self) -> String {
        format!("{}/{}", self.month, self.day)
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// One week slot and the visits known to fall in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Week {
    pub start_date: SlotDate,
    visits: Vec<Visit>,
}

impl Week {
    pub fn new(start_date: SlotDate) -> Self {
        Self {
            start_date,
            visits: Vec::new(),
        }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn contains_visit(&self, id: VisitId) -> bool {
        self.visits.iter().any(|visit| visit.id == id)
    }

    /// Insert a visit as the most recent entry, replacing any existing entry
    /// with the same id. Returns `true` if the week gained a visit.
    pub(crate) fn insert_visit(&mut self, visit: Visit) -> bool {
        let before = self.visits.len();
        self.visits.retain(|v| v.id != visit.id);
        let added = self.visits.len() == before;
        self.visits.push(visit);
        added
    }

    /// Latest value per category in display order, `--` when absent.
    pub fn summary(&self) -> Vec<(BiomarkerCategory, String)> {
        BiomarkerCategory::ALL
            .into_iter()
            .map(|category| {
                let value = self
                    .visits
                    .iter()
                    .rev()
                    .filter(|visit| visit.category == Some(category))
                    .find_map(|visit| visit.value)
                    .map(format_value)
                    .unwrap_or_else(|| NOT_RECORDED.to_string());
                (category, value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Month {
    /// 1-based calendar month.
    pub month_number: u32,
    pub weeks: Vec<Week>,
}

/// The render-ready grid for one year.
///
/// Its shape never changes after it is built; only the cached visit lists
/// inside weeks are updated, and only from within the crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGrid {
    year: i32,
    months: Vec<Month>,
}

impl YearGrid {
    pub(crate) fn new(year: i32, months: Vec<Month>) -> Self {
        Self { year, months }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    /// Month by 0-based index.
    pub fn month(&self, month_index: usize) -> Option<&Month> {
        self.months.get(month_index)
    }

    /// Week by 0-based month and week indices.
    pub fn week(&self, month_index: usize, week_index: usize) -> Option<&Week> {
        self.months.get(month_index)?.weeks.get(week_index)
    }

    pub(crate) fn week_mut(&mut self, month_index: usize, week_index: usize) -> Option<&mut Week> {
        self.months.get_mut(month_index)?.weeks.get_mut(week_index)
    }

    pub fn weeks(&self) -> impl Iterator<Item = &Week> {
        self.months.iter().flat_map(|month| month.weeks.iter())
    }

    pub fn visit_count(&self) -> usize {
        self.weeks().map(|week| week.visits.len()).sum()
    }
}
