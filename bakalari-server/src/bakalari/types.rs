//! Bakaláři API response DTOs.
//!
//! Only the token exchange and the actual timetable are decoded into typed
//! structs; every other endpoint is passed through as raw `serde_json::Value`.
//! The timetable types use `Option` liberally because the backend omits or
//! nulls fields for free periods and stale records.

use serde::Deserialize;

/// Response from the `/api/login` token exchange.
///
/// Both fields are optional so that an incomplete response can be turned
/// into a precise error instead of a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Response from `/api/3/timetable/actual`.
///
/// A star schema: `days` holds the scheduled slots (facts), the remaining
/// arrays are dimension tables referenced by id from each [`Atom`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timetable {
    /// Lesson hour definitions (caption and begin/end times).
    #[serde(default)]
    pub hours: Vec<Hour>,

    /// Scheduled days, in backend order.
    #[serde(default)]
    pub days: Vec<Day>,

    /// Class group dimension.
    #[serde(default)]
    pub groups: Vec<Group>,

    /// Subject dimension.
    #[serde(default)]
    pub subjects: Vec<Subject>,

    /// Teacher dimension.
    #[serde(default)]
    pub teachers: Vec<Teacher>,

    /// Room dimension.
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// One school day with its scheduled slots.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Day {
    /// ISO datetime string, e.g. "2024-01-08T00:00:00+01:00".
    pub date: String,

    /// 1 = Monday … 7 = Sunday.
    pub day_of_week: i64,

    /// Scheduled slots for this day, in backend order.
    #[serde(default)]
    pub atoms: Vec<Atom>,
}

/// One scheduled slot. References the dimension tables by id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Atom {
    /// Lesson hour this slot occupies.
    pub hour_id: i64,

    /// Groups attending the slot. May reference ids the payload omits.
    #[serde(default)]
    pub group_ids: Vec<String>,

    /// Subject taught, if any (free periods have none).
    pub subject_id: Option<String>,

    /// Teacher, if any.
    pub teacher_id: Option<String>,

    /// Room, if any.
    pub room_id: Option<String>,

    /// Lesson theme as entered in the class book.
    pub theme: Option<String>,
}

/// Lesson hour definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hour {
    pub id: i64,
    pub caption: Option<String>,
    pub begin_time: Option<String>,
    pub end_time: Option<String>,
}

/// Class group record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub id: String,
    pub name: Option<String>,
}

/// Subject record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subject {
    pub id: String,
    pub name: Option<String>,
}

/// Teacher record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Teacher {
    pub id: String,
    pub name: Option<String>,
}

/// Room record. Display uses the abbreviation, not the full name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Room {
    pub id: String,
    pub abbrev: Option<String>,
}
