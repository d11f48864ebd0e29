use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::workflows::applications::audit::{AdminActionRecord, StatusHistoryEntry, TransitionAudit};
use crate::workflows::applications::domain::{
    ApplicantProfile, Application, ApplicationDocument, ApplicationId, ApplicationStatus,
    NewDocument, Notification, UserId,
};
use crate::workflows::applications::repository::{
    ApplicationStore, DispatchError, NotificationDispatcher, ProfileDirectory, RepositoryError,
};
use crate::workflows::applications::ApplicationLifecycleService;

#[derive(Default)]
struct MemoryStoreInner {
    applications: HashMap<ApplicationId, Application>,
    documents: Vec<ApplicationDocument>,
    history: Vec<StatusHistoryEntry>,
    actions: Vec<AdminActionRecord>,
}

/// In-memory store used by the unit tests; a single mutex keeps
/// `record_transition` and `delete` atomic.
#[derive(Default)]
pub(super) struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub(super) fn actions(&self) -> Vec<AdminActionRecord> {
        self.inner.lock().expect("store mutex poisoned").actions.clone()
    }

    pub(super) fn history_rows(&self) -> Vec<StatusHistoryEntry> {
        self.inner.lock().expect("store mutex poisoned").history.clone()
    }
}

impl ApplicationStore for MemoryStore {
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
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut matches: Vec<Application> = inner
            .applications
            .values()
            .filter(|application| {
                &application.user_id == user_id && statuses.contains(&application.status)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
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
        // Reverse insertion order first so equal timestamps still come back
        // newest-first after the stable sort.
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

/// Store whose inserts fail with `Conflict` a fixed number of times before
/// delegating, for exercising the reference-number retry loop.
pub(super) struct ConflictingStore {
    inner: MemoryStore,
    remaining_conflicts: AtomicU32,
}

impl ConflictingStore {
    pub(super) fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryStore::default(),
            remaining_conflicts: AtomicU32::new(conflicts),
        }
    }
}

impl ApplicationStore for ConflictingStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let remaining = self.remaining_conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Conflict);
        }
        self.inner.insert(application)
    }

    fn find(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.find(id)
    }

    fn find_by_reference(&self, reference: &str) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_by_reference(reference)
    }

    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list_by_user(user_id)
    }

    fn list_by_user_in(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list_by_user_in(user_id, statuses)
    }

    fn record_transition(
        &self,
        application: Application,
        audit: TransitionAudit,
    ) -> Result<Application, RepositoryError> {
        self.inner.record_transition(application, audit)
    }

    fn history_for(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        self.inner.history_for(id)
    }

    fn add_document(
        &self,
        document: ApplicationDocument,
    ) -> Result<ApplicationDocument, RepositoryError> {
        self.inner.add_document(document)
    }

    fn documents_for(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<ApplicationDocument>, RepositoryError> {
        self.inner.documents_for(id)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn count_all(&self) -> Result<u64, RepositoryError> {
        self.inner.count_all()
    }

    fn count_by_status(&self, status: ApplicationStatus) -> Result<u64, RepositoryError> {
        self.inner.count_by_status(status)
    }
}

/// Store that refuses every operation, for internal-error paths.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(unavailable())
    }

    fn find(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(unavailable())
    }

    fn find_by_reference(&self, _reference: &str) -> Result<Option<Application>, RepositoryError> {
        Err(unavailable())
    }

    fn list_by_user(&self, _user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Err(unavailable())
    }

    fn list_by_user_in(
        &self,
        _user_id: &UserId,
        _statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(unavailable())
    }

    fn record_transition(
        &self,
        _application: Application,
        _audit: TransitionAudit,
    ) -> Result<Application, RepositoryError> {
        Err(unavailable())
    }

    fn history_for(
        &self,
        _id: &ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        Err(unavailable())
    }

    fn add_document(
        &self,
        _document: ApplicationDocument,
    ) -> Result<ApplicationDocument, RepositoryError> {
        Err(unavailable())
    }

    fn documents_for(
        &self,
        _id: &ApplicationId,
    ) -> Result<Vec<ApplicationDocument>, RepositoryError> {
        Err(unavailable())
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    fn count_all(&self) -> Result<u64, RepositoryError> {
        Err(unavailable())
    }

    fn count_by_status(&self, _status: ApplicationStatus) -> Result<u64, RepositoryError> {
        Err(unavailable())
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("store offline".to_string())
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationDispatcher for MemoryNotifications {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Dispatcher whose transport always fails; transitions must still commit.
pub(super) struct FailingNotifications;

impl NotificationDispatcher for FailingNotifications {
    fn notify(&self, _notification: Notification) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("queue unreachable".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: Mutex<HashMap<UserId, ApplicantProfile>>,
}

impl MemoryProfiles {
    pub(super) fn insert(&self, user_id: UserId, profile: ApplicantProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(user_id, profile);
    }
}

impl ProfileDirectory for MemoryProfiles {
    fn find_profile(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ApplicantProfile>, RepositoryError> {
        let profiles = self.profiles.lock().expect("profile mutex poisoned");
        Ok(profiles.get(user_id).cloned())
    }
}

/// Directory that errors on every lookup; admin views must degrade to
/// placeholders instead of failing.
pub(super) struct FailingProfiles;

impl ProfileDirectory for FailingProfiles {
    fn find_profile(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<ApplicantProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }
}

pub(super) type TestService =
    ApplicationLifecycleService<MemoryStore, MemoryNotifications, MemoryProfiles>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryStore>,
    Arc<MemoryNotifications>,
    Arc<MemoryProfiles>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let profiles = Arc::new(MemoryProfiles::default());
    let service = Arc::new(ApplicationLifecycleService::new(
        store.clone(),
        notifications.clone(),
        profiles.clone(),
    ));
    (service, store, notifications, profiles)
}

pub(super) fn citizen() -> UserId {
    UserId(Uuid::new_v4())
}

pub(super) fn passport_data() -> Value {
    json!({ "travel_reason": "work", "pages": 48 })
}

pub(super) fn sample_document() -> NewDocument {
    NewDocument {
        document_type: "photo".to_string(),
        file_name: "id-photo.jpg".to_string(),
        file_url: "https://files.egov.example/id-photo.jpg".to_string(),
        file_size: Some(204_800),
    }
}

pub(super) fn sample_profile() -> ApplicantProfile {
    ApplicantProfile {
        full_name: "Thandi Mokoena".to_string(),
        email: "thandi@example.org".to_string(),
        phone: "+27 82 555 0100".to_string(),
        id_number: "8001015009087".to_string(),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}
