// Date utility functions

use chrono::{Datelike, Local, Month};

pub fn current_year() -> i32 {
    Local::now().year()
}

/// English name of a 1-based month number.
pub fn month_name(month_number: u32) -> Option<&'static str> {
    u8::try_from(month_number)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|month| month.name())
}

/// Years offered by the year selector, oldest first.
pub fn year_window(center: i32, before: u32, after: u32) -> Vec<i32> {
    let first = center.saturating_sub(i32::try_from(before).unwrap_or(i32::MAX));
    let last = center.saturating_add(i32::try_from(after).unwrap_or(i32::MAX));
    (first..=last).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(4), Some("April"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(month_name(300), None);
    }

    #[test]
    fn test_year_window() {
        let years = year_window(2025, 10, 4);
        assert_eq!(years.len(), 15);
        assert_eq!(years.first(), Some(&2015));
        assert_eq!(years.last(), Some(&2029));
        assert_eq!(year_window(2025, 0, 0), vec![2025]);
    }
}
