use super::audit::{StatusHistoryEntry, TransitionAudit};
use super::domain::{
    ApplicantProfile, Application, ApplicationDocument, ApplicationId, ApplicationStatus,
    Notification, UserId,
};

/// Storage abstraction so the lifecycle service can be exercised in
/// isolation. One implementation backs all four collections because a
/// transition must mutate the entity and append its audit rows atomically.
pub trait ApplicationStore: Send + Sync {
    /// Insert a new application. Fails with [`RepositoryError::Conflict`]
    /// when the reference number is already taken.
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;

    fn find(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;

    fn find_by_reference(&self, reference: &str) -> Result<Option<Application>, RepositoryError>;

    /// All applications for a user, newest first.
    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError>;

    /// Applications for a user whose status is in the given set, newest
    /// first. The union contains no duplicates.
    fn list_by_user_in(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError>;

    /// Apply a transition as one atomic unit: replace the stored entity and
    /// append both audit rows. If any part fails, none is applied.
    fn record_transition(
        &self,
        application: Application,
        audit: TransitionAudit,
    ) -> Result<Application, RepositoryError>;

    /// Status history for an application, `changed_at` descending.
    fn history_for(&self, id: &ApplicationId)
        -> Result<Vec<StatusHistoryEntry>, RepositoryError>;

    /// Append a document row. Existence of the parent application is not
    /// checked here; referential enforcement belongs to the backing store.
    fn add_document(
        &self,
        document: ApplicationDocument,
    ) -> Result<ApplicationDocument, RepositoryError>;

    fn documents_for(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<ApplicationDocument>, RepositoryError>;

    /// Delete the application and cascade its documents. History and
    /// admin-action rows are retained. Deleting an unknown id is not an
    /// error.
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;

    fn count_all(&self) -> Result<u64, RepositoryError>;

    fn count_by_status(&self, status: ApplicationStatus) -> Result<u64, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook. Dispatch is best-effort: the service calls it
/// after a transition commits and logs (never propagates) failures.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Read-only applicant lookup used to enrich admin views. Absence of a
/// profile yields placeholder values, never an error.
pub trait ProfileDirectory: Send + Sync {
    fn find_profile(&self, user_id: &UserId)
        -> Result<Option<ApplicantProfile>, RepositoryError>;
}
