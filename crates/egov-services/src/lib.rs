//! Core library for the government service application tracker.
//!
//! The interesting logic lives in [`workflows::applications`]: the lifecycle
//! engine that owns application status transitions, the audit trail written
//! alongside every transition, and the reference/schedule generator used at
//! submission time. Storage, notification delivery, and profile lookup are
//! collaborators behind narrow traits so deployments can swap the backing
//! technology without touching the engine.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
