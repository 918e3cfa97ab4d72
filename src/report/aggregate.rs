//! Latest-snapshot grouping and per-state totals.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::{DataPoint, StateTotal};

/// Reduce `points` to one record per (state, county): the record with the
/// most recent date. When several rows share the maximum date the last one
/// in file order wins, so the result is deterministic for a given input.
///
/// The result is sorted by cases descending, then state, then county — a
/// fixed total order with no unstable ties.
pub fn latest_snapshot(points: &[DataPoint]) -> Vec<DataPoint> {
    let mut latest: HashMap<(String, String), DataPoint> = HashMap::new();

    for p in points {
        match latest.entry((p.state.clone(), p.county.clone())) {
            Entry::Occupied(mut held) => {
                if p.date >= held.get().date {
                    held.insert(p.clone());
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(p.clone());
            }
        }
    }

    let mut out: Vec<DataPoint> = latest.into_values().collect();
    out.sort_by(|a, b| {
        b.cases
            .cmp(&a.cases)
            .then_with(|| a.state.cmp(&b.state))
            .then_with(|| a.county.cmp(&b.county))
    });
    out
}

/// Sum the latest-snapshot view per state. One `StateTotal` per distinct
/// state, sorted by total cases descending (ties broken by state name).
pub fn state_totals(snapshot: &[DataPoint]) -> Vec<StateTotal> {
    let mut sums: HashMap<&str, (u64, u64)> = HashMap::new();

    for p in snapshot {
        let entry = sums.entry(p.state.as_str()).or_insert((0, 0));
        entry.0 += u64::from(p.cases);
        entry.1 += u64::from(p.deaths);
    }

    let mut out: Vec<StateTotal> = sums
        .into_iter()
        .map(|(state, (total_cases, total_deaths))| StateTotal {
            state: state.to_string(),
            total_cases,
            total_deaths,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_cases
            .cmp(&a.total_cases)
            .then_with(|| a.state.cmp(&b.state))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(date: (i32, u32, u32), county: &str, state: &str, cases: u32, deaths: u32) -> DataPoint {
        DataPoint {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            county: county.to_string(),
            state: state.to_string(),
            id: 0,
            cases,
            deaths,
        }
    }

    #[test]
    fn snapshot_keeps_latest_record_per_county() {
        // The worked example: Johnson advances a day, Sedgwick has one row.
        let points = vec![
            point((2021, 1, 1), "Johnson", "Kansas", 100, 2),
            point((2021, 1, 2), "Johnson", "Kansas", 150, 3),
            point((2021, 1, 1), "Sedgwick", "Kansas", 50, 1),
        ];

        let snapshot = latest_snapshot(&points);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].county, "Johnson");
        assert_eq!((snapshot[0].cases, snapshot[0].deaths), (150, 3));
        assert_eq!(snapshot[1].county, "Sedgwick");
        assert_eq!((snapshot[1].cases, snapshot[1].deaths), (50, 1));

        let totals = state_totals(&snapshot);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].state, "Kansas");
        assert_eq!(totals[0].total_cases, 200);
        assert_eq!(totals[0].total_deaths, 4);
    }

    #[test]
    fn max_date_tie_takes_last_row_in_file_order() {
        let points = vec![
            point((2021, 1, 2), "Johnson", "Kansas", 140, 3),
            point((2021, 1, 2), "Johnson", "Kansas", 150, 3),
        ];
        let snapshot = latest_snapshot(&points);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].cases, 150);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let points = vec![
            point((2021, 1, 1), "Johnson", "Kansas", 100, 2),
            point((2021, 1, 2), "Johnson", "Kansas", 150, 3),
            point((2021, 1, 1), "Clay", "Missouri", 80, 1),
            point((2021, 1, 3), "Clay", "Missouri", 90, 2),
        ];
        let first = latest_snapshot(&points);
        let second = latest_snapshot(&points);
        assert_eq!(first, second);
        assert_eq!(state_totals(&first), state_totals(&second));
    }

    #[test]
    fn snapshot_sorted_by_cases_then_state_then_county() {
        let points = vec![
            point((2021, 1, 1), "Clay", "Missouri", 50, 1),
            point((2021, 1, 1), "Johnson", "Kansas", 150, 3),
            point((2021, 1, 1), "Adair", "Missouri", 50, 0),
            point((2021, 1, 1), "Sedgwick", "Kansas", 50, 1),
        ];
        let snapshot = latest_snapshot(&points);
        let order: Vec<(&str, &str)> = snapshot
            .iter()
            .map(|p| (p.state.as_str(), p.county.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Kansas", "Johnson"),
                ("Kansas", "Sedgwick"),
                ("Missouri", "Adair"),
                ("Missouri", "Clay"),
            ]
        );
    }

    #[test]
    fn totals_ranked_by_cases_descending() {
        let snapshot = vec![
            point((2021, 1, 1), "Johnson", "Kansas", 100, 2),
            point((2021, 1, 1), "Clay", "Missouri", 300, 5),
            point((2021, 1, 1), "Sedgwick", "Kansas", 50, 1),
        ];
        let totals = state_totals(&snapshot);
        assert_eq!(totals[0].state, "Missouri");
        assert_eq!(totals[1].state, "Kansas");
        assert_eq!(totals[1].total_cases, 150);
        assert_eq!(totals[1].total_deaths, 3);
    }
}
