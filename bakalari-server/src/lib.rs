//! Bakaláři tool server.
//!
//! An authenticated client for the Bakaláři school information system,
//! exposing its endpoints as named tools over a small HTTP interface.

pub mod bakalari;
pub mod timetable;
pub mod tools;
pub mod web;
