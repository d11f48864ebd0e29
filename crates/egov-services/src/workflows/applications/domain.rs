use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identifier wrapper for tracked applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the owning citizen. Resolved by an external profile store;
/// the engine never validates it for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier wrapper for uploaded application documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed status domain for an application's lifecycle.
///
/// Completed and Rejected are terminal by convention only: the generic
/// status-update operation may move an application back out of either, which
/// callers must account for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Pending Payment")]
    PendingPayment,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::InProgress,
        ApplicationStatus::UnderReview,
        ApplicationStatus::PendingPayment,
        ApplicationStatus::Completed,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::InProgress => "In Progress",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::PendingPayment => "Pending Payment",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Case-insensitive parse of the human-facing label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in progress" => Some(ApplicationStatus::InProgress),
            "under review" => Some(ApplicationStatus::UnderReview),
            "pending payment" => Some(ApplicationStatus::PendingPayment),
            "completed" => Some(ApplicationStatus::Completed),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The central entity: one citizen request for a government service.
///
/// `reference_number` is assigned once at creation and never changes.
/// `completed_at` is non-null exactly when `status` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub service_type: String,
    pub reference_number: String,
    pub status: ApplicationStatus,
    pub current_step: Option<String>,
    /// Opaque structured payload supplied by the caller; the engine never
    /// inspects it.
    pub application_data: Value,
    pub submitted_at: DateTime<Utc>,
    pub expected_completion_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document uploaded under an application. Deleted in cascade with its
/// parent application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocument {
    pub id: DocumentId,
    pub application_id: ApplicationId,
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

/// Caller-supplied metadata for attaching a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// Applicant details sourced from the external profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
}

/// Outbound notification request handed to the dispatcher. Delivery is a
/// collaborator concern; the engine only describes what should be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub notification_type: String,
    pub related_id: ApplicationId,
}

/// An application assembled with its current documents for external
/// consumption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<ApplicationDocument>,
}

impl ApplicationView {
    pub fn assemble(application: Application, documents: Vec<ApplicationDocument>) -> Self {
        Self {
            application,
            documents,
        }
    }
}

/// Admin-facing projection enriched with applicant details. Missing or
/// unreachable profiles degrade to placeholders, never to an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminApplicationView {
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub applicant_id_number: String,
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<ApplicationDocument>,
}

impl AdminApplicationView {
    pub fn assemble(
        application: Application,
        documents: Vec<ApplicationDocument>,
        profile: Option<ApplicantProfile>,
    ) -> Self {
        let (applicant_name, applicant_email, applicant_phone, applicant_id_number) = match profile
        {
            Some(profile) => (
                profile.full_name,
                profile.email,
                profile.phone,
                profile.id_number,
            ),
            None => (
                "Unknown".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ),
        };

        Self {
            applicant_name,
            applicant_email,
            applicant_phone,
            applicant_id_number,
            application,
            documents,
        }
    }
}

/// Dashboard counters grouped by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub in_progress: u64,
    pub under_review: u64,
    pub pending_payment: u64,
    pub completed: u64,
    pub rejected: u64,
}

/// Input rejected at the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("service type must not be empty")]
    EmptyServiceType,
    #[error("unknown application status '{0}'")]
    UnknownStatus(String),
}
