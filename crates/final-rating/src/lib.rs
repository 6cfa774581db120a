//! Final rating calculation engine.
//!
//! Combines task ratings, stakeholder ratings, help-request participation and
//! ticket resolution into a single capped percentage per user, with a
//! breakdown that lets an auditor re-derive every number from the traces alone.

pub mod config;
pub mod error;
pub mod rating;
pub mod telemetry;
