//! Report formatters for similarity groups.
//!
//! - JSON, keyed by media kind, for automation
//! - CSV, one row per group member, for spreadsheets
//!
//! Both write duplicate groups only; singletons are left out.

pub mod csv;
pub mod json;

pub use csv::CsvOutput;
pub use json::JsonOutput;
