//! Job application intake: validate a submission, persist it, then confirm it to the applicant.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;
