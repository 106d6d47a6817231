//! Notice tracking core: officer and template records, guided notice composition,
//! and sent-notice reporting.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
