use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use super::audit::{AdminActionKind, StatusHistoryEntry, TransitionAudit};
use super::domain::{
    AdminApplicationView, Application, ApplicationDocument, ApplicationId, ApplicationStatus,
    ApplicationView, DocumentId, NewDocument, Notification, StatusCounts, UserId, ValidationError,
};
use super::repository::{
    ApplicationStore, NotificationDispatcher, ProfileDirectory, RepositoryError,
};
use super::schedule;

/// How often submission regenerates a reference number after a uniqueness
/// conflict before giving up.
const MAX_REFERENCE_ATTEMPTS: u32 = 5;

/// The lifecycle engine: the only place that mutates an application's
/// `status`, `current_step`, and `completed_at`.
///
/// Transitions are not guarded against repetition. Approving an already
/// approved application re-stamps `completed_at` and appends fresh audit
/// rows; callers that need idempotence must check the current status first.
pub struct ApplicationLifecycleService<S, N, P> {
    store: Arc<S>,
    notifications: Arc<N>,
    profiles: Arc<P>,
}

impl<S, N, P> ApplicationLifecycleService<S, N, P>
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>, profiles: Arc<P>) -> Self {
        Self {
            store,
            notifications,
            profiles,
        }
    }

    /// Create a new application. Derived fields (reference number, initial
    /// step, expected completion date) come from the schedule generator.
    /// History begins at the first transition; creation writes no audit row.
    pub fn submit(
        &self,
        user_id: UserId,
        service_type: &str,
        application_data: Value,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let service_type = service_type.trim();
        if service_type.is_empty() {
            return Err(ValidationError::EmptyServiceType.into());
        }

        let now = Utc::now();
        let mut application = Application {
            id: ApplicationId::new(),
            user_id,
            service_type: service_type.to_string(),
            reference_number: schedule::generate_reference_number(service_type),
            status: ApplicationStatus::InProgress,
            current_step: Some(schedule::initial_step(service_type).to_string()),
            application_data,
            submitted_at: now,
            expected_completion_date: schedule::expected_completion(service_type, now),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        let stored = loop {
            match self.store.insert(application.clone()) {
                Ok(stored) => break stored,
                Err(RepositoryError::Conflict) if attempt < MAX_REFERENCE_ATTEMPTS => {
                    attempt += 1;
                    application.reference_number =
                        schedule::generate_reference_number(service_type);
                }
                Err(RepositoryError::Conflict) => {
                    return Err(RepositoryError::Unavailable(format!(
                        "reference number still colliding after {MAX_REFERENCE_ATTEMPTS} attempts"
                    ))
                    .into());
                }
                Err(err) => return Err(err.into()),
            }
        };

        self.assemble(stored)
    }

    /// Approve an application: terminal Completed state, "Approved" step,
    /// APPROVE audit row, approval notification.
    pub fn approve(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        self.conclude(id, notes, AdminActionKind::Approve)
    }

    /// Reject an application: terminal Rejected state, "Rejected" step,
    /// REJECT audit row, rejection notification.
    pub fn reject(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        self.conclude(id, notes, AdminActionKind::Reject)
    }

    fn conclude(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
        kind: AdminActionKind,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let mut application = self.fetch(id)?;
        let old_status = application.status;
        let now = Utc::now();

        let (status, step, verb) = match kind {
            AdminActionKind::Approve => (ApplicationStatus::Completed, "Approved", "approved"),
            AdminActionKind::Reject => (ApplicationStatus::Rejected, "Rejected", "rejected"),
            AdminActionKind::UpdateStatus => unreachable!("generic updates use update_status"),
        };

        application.status = status;
        application.current_step = Some(step.to_string());
        application.completed_at = Some(now);
        application.updated_at = now;

        let details = format!("Application {verb}: {}", application.reference_number);
        let audit = TransitionAudit::new(&application, old_status, notes, kind, details, now);

        let description = match kind {
            AdminActionKind::Approve => format!(
                "Your {} application {} has been approved and is now complete.",
                application.service_type, application.reference_number
            ),
            _ => format!(
                "Your {} application {} has been rejected. Please contact support for more information.",
                application.service_type, application.reference_number
            ),
        };
        let title = match kind {
            AdminActionKind::Approve => "Application Approved",
            _ => "Application Rejected",
        };
        let notification = status_notification(&application, title, description);

        let stored = self.store.record_transition(application, audit)?;
        self.dispatch(notification);
        self.assemble(stored)
    }

    /// Generic transition to any status in the closed domain. Unknown status
    /// strings are rejected; moving out of a terminal status is permitted.
    /// `completed_at` is stamped whenever the target is terminal and left
    /// untouched otherwise.
    pub fn update_status(
        &self,
        id: &ApplicationId,
        status: &str,
        current_step: Option<String>,
        notes: Option<String>,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let new_status = ApplicationStatus::parse(status)
            .ok_or_else(|| ValidationError::UnknownStatus(status.to_string()))?;

        let mut application = self.fetch(id)?;
        let old_status = application.status;
        let now = Utc::now();

        application.status = new_status;
        if let Some(step) = current_step {
            application.current_step = Some(step);
        }
        if new_status.is_terminal() {
            application.completed_at = Some(now);
        }
        application.updated_at = now;

        let details = format!("Status changed from {old_status} to {new_status}");
        let audit = TransitionAudit::new(
            &application,
            old_status,
            notes,
            AdminActionKind::UpdateStatus,
            details,
            now,
        );

        let notification = status_notification(
            &application,
            "Application Status Updated",
            format!(
                "Your {} application {} status has been updated to: {}",
                application.service_type, application.reference_number, new_status
            ),
        );

        let stored = self.store.record_transition(application, audit)?;
        self.dispatch(notification);
        self.assemble(stored)
    }

    /// Delete an application together with its documents. The audit trail
    /// survives; an unknown id is silently ignored.
    pub fn delete_application(&self, id: &ApplicationId) -> Result<(), ApplicationServiceError> {
        self.store.delete(id)?;
        Ok(())
    }

    /// Attach a document. The application's existence is deliberately not
    /// checked here; that is the storage layer's concern.
    pub fn add_document(
        &self,
        id: &ApplicationId,
        meta: NewDocument,
    ) -> Result<ApplicationDocument, ApplicationServiceError> {
        let document = ApplicationDocument {
            id: DocumentId::new(),
            application_id: *id,
            document_type: meta.document_type,
            file_name: meta.file_name,
            file_url: meta.file_url,
            file_size: meta.file_size,
            uploaded_at: Utc::now(),
        };
        Ok(self.store.add_document(document)?)
    }

    pub fn documents(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<ApplicationDocument>, ApplicationServiceError> {
        Ok(self.store.documents_for(id)?)
    }

    /// Status history for an application, newest change first.
    pub fn history(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, ApplicationServiceError> {
        Ok(self.store.history_for(id)?)
    }

    pub fn application_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let application = self.fetch(id)?;
        self.assemble(application)
    }

    pub fn application_by_reference(
        &self,
        reference: &str,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let application = self
            .store
            .find_by_reference(reference)?
            .ok_or(RepositoryError::NotFound)?;
        self.assemble(application)
    }

    /// All applications for a user, newest first. An unknown user yields an
    /// empty list, not an error.
    pub fn applications_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        let applications = self.store.list_by_user(user_id)?;
        self.assemble_all(applications)
    }

    pub fn applications_for_user_by_status(
        &self,
        user_id: &UserId,
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        self.applications_for_user_by_statuses(user_id, &[status])
    }

    /// Union of applications matching any status in the set, de-duplicated
    /// by construction since each application holds a single status.
    pub fn applications_for_user_by_statuses(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        let applications = self.store.list_by_user_in(user_id, statuses)?;
        self.assemble_all(applications)
    }

    /// Admin projection with applicant details. A failed or empty profile
    /// lookup degrades to placeholder values rather than failing the read.
    pub fn admin_view(
        &self,
        id: &ApplicationId,
    ) -> Result<AdminApplicationView, ApplicationServiceError> {
        let application = self.fetch(id)?;
        let documents = self.store.documents_for(&application.id)?;
        let profile = match self.profiles.find_profile(&application.user_id) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(user_id = %application.user_id, error = %err, "profile lookup failed; using placeholders");
                None
            }
        };
        Ok(AdminApplicationView::assemble(
            application,
            documents,
            profile,
        ))
    }

    /// Dashboard counters across all users.
    pub fn statistics(&self) -> Result<StatusCounts, ApplicationServiceError> {
        Ok(StatusCounts {
            total: self.store.count_all()?,
            in_progress: self.store.count_by_status(ApplicationStatus::InProgress)?,
            under_review: self.store.count_by_status(ApplicationStatus::UnderReview)?,
            pending_payment: self
                .store
                .count_by_status(ApplicationStatus::PendingPayment)?,
            completed: self.store.count_by_status(ApplicationStatus::Completed)?,
            rejected: self.store.count_by_status(ApplicationStatus::Rejected)?,
        })
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Application, ApplicationServiceError> {
        Ok(self.store.find(id)?.ok_or(RepositoryError::NotFound)?)
    }

    fn assemble(
        &self,
        application: Application,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let documents = self.store.documents_for(&application.id)?;
        Ok(ApplicationView::assemble(application, documents))
    }

    fn assemble_all(
        &self,
        applications: Vec<Application>,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        applications
            .into_iter()
            .map(|application| self.assemble(application))
            .collect()
    }

    /// Best-effort side effect performed after the transition committed. A
    /// delivery failure must not fail or partially roll back the transition.
    fn dispatch(&self, notification: Notification) {
        if let Err(err) = self.notifications.notify(notification) {
            warn!(error = %err, "notification dispatch failed");
        }
    }
}

fn status_notification(
    application: &Application,
    title: &str,
    description: String,
) -> Notification {
    Notification {
        user_id: application.user_id,
        title: title.to_string(),
        description,
        notification_type: "application_status".to_string(),
        related_id: application.id,
    }
}

/// Error raised by the lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
