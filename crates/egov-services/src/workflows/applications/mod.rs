//! Application lifecycle engine for citizen service requests.
//!
//! An application moves through a closed status set (In Progress, Under
//! Review, Pending Payment, Completed, Rejected). Every transition appends
//! an immutable status-history row, admin-initiated transitions additionally
//! append an admin-action row, and the affected user is notified through a
//! decoupled dispatcher whose failures never affect the transition itself.

pub mod audit;
pub mod domain;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;

#[cfg(test)]
mod tests;

pub use audit::{AdminActionKind, AdminActionRecord, StatusHistoryEntry, TransitionAudit};
pub use domain::{
    AdminApplicationView, ApplicantProfile, Application, ApplicationDocument, ApplicationId,
    ApplicationStatus, ApplicationView, DocumentId, NewDocument, Notification, StatusCounts,
    UserId, ValidationError,
};
pub use repository::{
    ApplicationStore, DispatchError, NotificationDispatcher, ProfileDirectory, RepositoryError,
};
pub use router::application_router;
pub use service::{ApplicationLifecycleService, ApplicationServiceError};
