//! lockhound diagnostics — reports, sinks and output formatting.

pub mod diagnostic;
pub mod human;
pub mod rules;
