//! Output generation.
//!
//! - [`json`]: writes the [`ScheduleReport`](crate::models::ScheduleReport)
//!   to `programtv_schedule.json` (or the path given on the command line)

pub mod json;
