//! Choosing one patient from several lookup candidates.
//!
//! Candidates are ordered by `(rank, service position)`: an exact
//! patient-number match beats everything else, and ties keep the order the
//! lookup service returned.

use std::cmp::Ordering;

use crate::models::patient::{normalize_patient_number, PatientSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    ExactPatientNumber,
    ServiceOrder,
}

pub fn rank(candidate: &PatientSummary, wanted_number: Option<&str>) -> MatchRank {
    match wanted_number.map(normalize_patient_number) {
        Some(wanted) if !wanted.is_empty() && candidate.normalized_number() == wanted => {
            MatchRank::ExactPatientNumber
        }
        _ => MatchRank::ServiceOrder,
    }
}

/// Total order over `(position, candidate)` pairs.
pub fn compare(
    a: (usize, &PatientSummary),
    b: (usize, &PatientSummary),
    wanted_number: Option<&str>,
) -> Ordering {
    rank(a.1, wanted_number)
        .cmp(&rank(b.1, wanted_number))
        .then(a.0.cmp(&b.0))
}

pub fn select_best<'a>(
    candidates: &'a [PatientSummary],
    wanted_number: Option<&str>,
) -> Option<&'a PatientSummary> {
    candidates
        .iter()
        .enumerate()
        .min_by(|a, b| compare(*a, *b, wanted_number))
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::PatientId;
    use test_case::test_case;

    fn candidates(numbers: &[&str]) -> Vec<PatientSummary> {
        numbers
            .iter()
            .enumerate()
            .map(|(i, number)| PatientSummary::new(i as i64 + 1, "First", "Last", *number))
            .collect()
    }

    #[test_case(&["PD10001"], Some("PD10001"), Some(1); "single exact")]
    #[test_case(&["PD10010", "PD10001"], Some("PD10001"), Some(2); "exact beats earlier partial")]
    #[test_case(&["PD10010", "PD10011"], Some("PD1001"), Some(1); "no exact takes first")]
    #[test_case(&["pd 10001", "PD10001"], Some("PD10001"), Some(1); "candidate number normalized")]
    #[test_case(&["PD10002", "PD10003"], None, Some(1); "name search takes first")]
    #[test_case(&["PD10001", "PD10001"], Some("pd10001"), Some(1); "duplicate exact keeps service order")]
    #[test_case(&[], Some("PD10001"), None; "no candidates")]
    fn test_select_best(numbers: &[&str], wanted: Option<&str>, expected_id: Option<i64>) {
        let list = candidates(numbers);
        let best = select_best(&list, wanted).map(|p| p.id);
        assert_eq!(best, expected_id.map(PatientId));
    }

    #[test]
    fn test_rank_ignores_empty_wanted_number() {
        let list = candidates(&[""]);
        assert_eq!(rank(&list[0], Some("  ")), MatchRank::ServiceOrder);
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let list = candidates(&["PD1", "PD2", "PD3"]);
        for i in 0..list.len() {
            for j in 0..list.len() {
                let forward = compare((i, &list[i]), (j, &list[j]), Some("PD2"));
                let backward = compare((j, &list[j]), (i, &list[i]), Some("PD2"));
                assert_eq!(forward, backward.reverse());
            }
        }
    }
}
