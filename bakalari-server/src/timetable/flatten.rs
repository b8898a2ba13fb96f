//! Flattening of the actual-timetable payload into display rows.
//!
//! The payload is a star schema: scheduled slots reference hours, groups,
//! subjects, teachers and rooms by id. Flattening joins each slot against
//! those dimension tables and emits one flat row per slot, preserving the
//! payload's day-major, slot-minor order. The join is deliberately
//! lenient: the backend occasionally keeps references to records it no
//! longer sends, and a stale reference should blank one column, not sink
//! the whole render.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use crate::bakalari::Timetable;

/// Error for structurally invalid timetable data.
///
/// Reserved for contract violations that cannot be rendered truthfully;
/// unresolved dimension references are tolerated instead (lenient join).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// `DayOfWeek` outside 1 (Monday) … 7 (Sunday)
    #[error("day of week out of range: {0}")]
    DayOfWeekOutOfRange(i64),

    /// Day date that does not start with an ISO `YYYY-MM-DD`
    #[error("invalid day date: {0}")]
    InvalidDate(String),
}

/// One display-ready timetable row. All columns are plain strings;
/// unresolved references are already blanked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub date: String,
    pub day: String,
    pub hour: String,
    pub begin_time: String,
    pub end_time: String,
    pub group: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
    pub theme: String,
}

/// Join the timetable's scheduled slots against its dimension tables.
///
/// Pure: the same payload always yields the same ordered rows.
pub fn flatten(timetable: &Timetable) -> Result<Vec<FlatRow>, FormatError> {
    let hours = index_by(&timetable.hours, |h| h.id);
    let groups = index_by(&timetable.groups, |g| g.id.as_str());
    let subjects = index_by(&timetable.subjects, |s| s.id.as_str());
    let teachers = index_by(&timetable.teachers, |t| t.id.as_str());
    let rooms = index_by(&timetable.rooms, |r| r.id.as_str());

    let mut rows = Vec::new();

    for day in &timetable.days {
        let day_name = day_name(day.day_of_week)?;
        let date = day_date(&day.date)?;

        for atom in &day.atoms {
            let hour = hours.get(&atom.hour_id).copied();

            // Unresolved group ids contribute nothing to the join, not
            // an empty placeholder.
            let group = atom
                .group_ids
                .iter()
                .filter_map(|id| groups.get(id.as_str()))
                .filter_map(|g| g.name.as_deref())
                .collect::<Vec<_>>()
                .join(", ");

            rows.push(FlatRow {
                date: date.clone(),
                day: day_name.to_string(),
                hour: field(hour, |h| h.caption.as_deref()),
                begin_time: field(hour, |h| h.begin_time.as_deref()),
                end_time: field(hour, |h| h.end_time.as_deref()),
                group,
                subject: resolve(&subjects, atom.subject_id.as_deref(), |s| {
                    s.name.as_deref()
                }),
                teacher: resolve(&teachers, atom.teacher_id.as_deref(), |t| {
                    t.name.as_deref()
                }),
                room: resolve(&rooms, atom.room_id.as_deref(), |r| r.abbrev.as_deref()),
                theme: atom.theme.clone().unwrap_or_default(),
            });
        }
    }

    Ok(rows)
}

/// Build an id → record lookup, keeping the first occurrence when the
/// backend sends a duplicate id (it promises not to, but the join must
/// not depend on that).
fn index_by<'a, K, T>(items: &'a [T], key: impl Fn(&'a T) -> K) -> HashMap<K, &'a T>
where
    K: Eq + Hash,
{
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(key(item)).or_insert(item);
    }
    map
}

/// Lenient-join lookup: a missing key or a record without the display
/// field becomes an empty string.
fn resolve<'a, T>(
    lookup: &HashMap<&str, &'a T>,
    id: Option<&str>,
    display: impl Fn(&'a T) -> Option<&'a str>,
) -> String {
    id.and_then(|id| lookup.get(id).copied())
        .and_then(display)
        .unwrap_or_default()
        .to_string()
}

fn field<'a, T>(record: Option<&'a T>, display: impl Fn(&'a T) -> Option<&'a str>) -> String {
    record.and_then(display).unwrap_or_default().to_string()
}

/// 1 = Monday … 7 = Sunday; anything else is a data contract violation.
fn day_name(day_of_week: i64) -> Result<&'static str, FormatError> {
    match day_of_week {
        1 => Ok("Monday"),
        2 => Ok("Tuesday"),
        3 => Ok("Wednesday"),
        4 => Ok("Thursday"),
        5 => Ok("Friday"),
        6 => Ok("Saturday"),
        7 => Ok("Sunday"),
        other => Err(FormatError::DayOfWeekOutOfRange(other)),
    }
}

/// The backend sends full ISO datetimes; the view only wants the date.
fn day_date(raw: &str) -> Result<String, FormatError> {
    let prefix = raw
        .get(..10)
        .ok_or_else(|| FormatError::InvalidDate(raw.to_string()))?;
    let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| FormatError::InvalidDate(raw.to_string()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::bakalari::{Atom, Day};
    use proptest::prelude::*;

    fn arb_timetable() -> impl Strategy<Value = Timetable> {
        let arb_day = (1i64..=7, proptest::collection::vec(any::<i64>(), 0..5));
        proptest::collection::vec(arb_day, 0..6).prop_map(|days| Timetable {
            days: days
                .into_iter()
                .map(|(day_of_week, hour_ids)| Day {
                    date: "2024-01-08T00:00:00+01:00".to_string(),
                    day_of_week,
                    atoms: hour_ids
                        .into_iter()
                        .map(|hour_id| Atom {
                            hour_id,
                            group_ids: vec![],
                            subject_id: None,
                            teacher_id: None,
                            room_id: None,
                            theme: None,
                        })
                        .collect(),
                })
                .collect(),
            ..Timetable::default()
        })
    }

    proptest! {
        #[test]
        fn row_count_matches_slot_count(timetable in arb_timetable()) {
            let rows = flatten(&timetable).unwrap();
            let slots: usize = timetable.days.iter().map(|d| d.atoms.len()).sum();
            prop_assert_eq!(rows.len(), slots);
        }

        #[test]
        fn flatten_is_deterministic(timetable in arb_timetable()) {
            prop_assert_eq!(flatten(&timetable).unwrap(), flatten(&timetable).unwrap());
        }

        #[test]
        fn valid_days_of_week_always_name(dow in 1i64..=7) {
            prop_assert!(super::day_name(dow).is_ok());
        }
    }
}
