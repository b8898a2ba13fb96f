//! Actual-timetable view building.
//!
//! Turns the nested fact/dimension payload from `/api/3/timetable/actual`
//! into a flat sequence of display rows and renders those as a text table.

mod flatten;
mod table;

pub use flatten::{FlatRow, FormatError, flatten};
pub use table::{current_time_line, render_table};
