use chrono::{DateTime, Utc};
use egov_services::workflows::applications::{
    AdminActionRecord, ApplicantProfile, Application, ApplicationDocument, ApplicationId,
    ApplicationStatus, ApplicationStore, DispatchError, Notification, NotificationDispatcher,
    ProfileDirectory, RepositoryError, StatusHistoryEntry, TransitionAudit, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoreInner {
    applications: HashMap<ApplicationId, Application>,
    documents: Vec<ApplicationDocument>,
    history: Vec<StatusHistoryEntry>,
    actions: Vec<AdminActionRecord>,
}

/// In-memory backing store. One mutex guards all four collections so a
/// transition (entity mutation plus both audit rows) and a cascading delete
/// each apply atomically.
#[derive(Default)]
pub(crate) struct InMemoryGovStore {
    inner: Mutex<StoreInner>,
}

impl ApplicationStore for InMemoryGovStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner
            .applications
            .values()
            .any(|existing| existing.reference_number == application.reference_number)
        {
            return Err(RepositoryError::Conflict);
        }
        inner.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn find(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.applications.get(id).cloned())
    }

    fn find_by_reference(&self, reference: &str) -> Result<Option<Application>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .applications
            .values()
            .find(|application| application.reference_number == reference)
            .cloned())
    }

    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut matches: Vec<Application> = inner
            .applications
            .values()
            .filter(|application| &application.user_id == user_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    fn list_by_user_in(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .filter(|application| statuses.contains(&application.status))
            .collect())
    }

    fn record_transition(
        &self,
        application: Application,
        audit: TransitionAudit,
    ) -> Result<Application, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.applications.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        inner.applications.insert(application.id, application.clone());
        inner.history.push(audit.history);
        inner.actions.push(audit.action);
        Ok(application)
    }

    fn history_for(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut rows: Vec<StatusHistoryEntry> = inner
            .history
            .iter()
            .rev()
            .filter(|row| &row.application_id == id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(rows)
    }

    fn add_document(
        &self,
        document: ApplicationDocument,
    ) -> Result<ApplicationDocument, RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.documents.push(document.clone());
        Ok(document)
    }

    fn documents_for(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<ApplicationDocument>, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .documents
            .iter()
            .filter(|document| &document.application_id == id)
            .cloned()
            .collect())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.applications.remove(id);
        inner.documents.retain(|document| &document.application_id != id);
        Ok(())
    }

    fn count_all(&self) -> Result<u64, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.applications.len() as u64)
    }

    fn count_by_status(&self, status: ApplicationStatus) -> Result<u64, RepositoryError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .applications
            .values()
            .filter(|application| application.status == status)
            .count() as u64)
    }
}

/// A dispatched notification retained in the in-process inbox.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StoredNotification {
    pub(crate) id: Uuid,
    pub(crate) user_id: UserId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) notification_type: String,
    pub(crate) related_id: ApplicationId,
    pub(crate) read: bool,
    pub(crate) created_at: DateTime<Utc>,
}

/// In-memory notification sink doubling as the user-facing inbox. The
/// lifecycle engine only hands it dispatch requests; read/unread state is
/// this adapter's own concern.
#[derive(Default)]
pub(crate) struct InMemoryNotificationHub {
    inbox: Mutex<Vec<StoredNotification>>,
}

impl InMemoryNotificationHub {
    pub(crate) fn notifications_for(&self, user_id: &UserId) -> Vec<StoredNotification> {
        let inbox = self.inbox.lock().expect("inbox mutex poisoned");
        let mut rows: Vec<StoredNotification> = inbox
            .iter()
            .rev()
            .filter(|notification| &notification.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub(crate) fn unread_count(&self, user_id: &UserId) -> u64 {
        let inbox = self.inbox.lock().expect("inbox mutex poisoned");
        inbox
            .iter()
            .filter(|notification| &notification.user_id == user_id && !notification.read)
            .count() as u64
    }

    /// Returns false when the notification does not exist for that user.
    pub(crate) fn mark_read(&self, user_id: &UserId, notification_id: &Uuid) -> bool {
        let mut inbox = self.inbox.lock().expect("inbox mutex poisoned");
        match inbox
            .iter_mut()
            .find(|notification| &notification.id == notification_id && &notification.user_id == user_id)
        {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_all_read(&self, user_id: &UserId) -> u64 {
        let mut inbox = self.inbox.lock().expect("inbox mutex poisoned");
        let mut marked = 0;
        for notification in inbox
            .iter_mut()
            .filter(|notification| &notification.user_id == user_id && !notification.read)
        {
            notification.read = true;
            marked += 1;
        }
        marked
    }
}

impl NotificationDispatcher for InMemoryNotificationHub {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError> {
        let mut inbox = self.inbox.lock().expect("inbox mutex poisoned");
        inbox.push(StoredNotification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            description: notification.description,
            notification_type: notification.notification_type,
            related_id: notification.related_id,
            read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

/// Seedable profile directory; lookups for unseeded users return `None` so
/// the admin view exercises its placeholder path.
#[derive(Default)]
pub(crate) struct InMemoryProfileDirectory {
    profiles: Mutex<HashMap<UserId, ApplicantProfile>>,
}

impl InMemoryProfileDirectory {
    pub(crate) fn seed(&self, user_id: UserId, profile: ApplicantProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(user_id, profile);
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn find_profile(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ApplicantProfile>, RepositoryError> {
        let profiles = self.profiles.lock().expect("profile mutex poisoned");
        Ok(profiles.get(user_id).cloned())
    }
}
