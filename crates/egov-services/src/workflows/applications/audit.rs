//! Immutable audit rows written alongside every status transition.
//!
//! History entries and admin-action records are append-only: the store trait
//! exposes no update or delete for them, and they survive deletion of the
//! application they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{Application, ApplicationId, ApplicationStatus, UserId};

/// One row per status transition, ordered newest-first for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub application_id: ApplicationId,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Category of administrator-initiated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminActionKind {
    Approve,
    Reject,
    UpdateStatus,
}

impl AdminActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            AdminActionKind::Approve => "APPROVE",
            AdminActionKind::Reject => "REJECT",
            AdminActionKind::UpdateStatus => "UPDATE_STATUS",
        }
    }
}

/// One row per administrator-initiated operation. Purely observational; the
/// engine writes these but never reads them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionRecord {
    pub id: Uuid,
    pub kind: AdminActionKind,
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// The pair of audit rows accompanying an admin-initiated transition. The
/// store persists both inside the same unit of work as the entity mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionAudit {
    pub history: StatusHistoryEntry,
    pub action: AdminActionRecord,
}

impl TransitionAudit {
    pub fn new(
        application: &Application,
        old_status: ApplicationStatus,
        notes: Option<String>,
        kind: AdminActionKind,
        details: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            history: StatusHistoryEntry {
                id: Uuid::new_v4(),
                application_id: application.id,
                old_status,
                new_status: application.status,
                notes,
                changed_at: at,
            },
            action: AdminActionRecord {
                id: Uuid::new_v4(),
                kind,
                application_id: application.id,
                user_id: application.user_id,
                details,
                timestamp: at,
            },
        }
    }
}
