use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::OrderStatus;
use crate::statemachine::OrderStateMachine;

/// In-person handoff details on a deposit order. Single current value;
/// reschedules overwrite, and the audit trail of changes lives in the
/// order timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub location: Option<String>,
    pub address: Option<String>,
    pub time: Option<DateTime<Utc>>,
    /// True until an admin confirms.
    pub is_suggestion: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn suggestion() -> Self {
        Self {
            location: None,
            address: None,
            time: None,
            is_suggestion: true,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update; fields present overwrite, absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingPatch {
    pub time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<String>,
}

impl MeetingPatch {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.location.is_none() && self.address.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("meeting update contains no fields")]
    EmptyMeetingUpdate,

    #[error("order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("order is not a deposit order")]
    WrongKind,

    #[error("meeting can only be scheduled on a DEPOSIT_CONFIRMED order, current status {0}")]
    NotSchedulable(OrderStatus),
}

/// Admin-only component: attaches or updates meeting metadata on
/// deposit-confirmed orders and emits the notification hook.
pub struct MeetingScheduler {
    engine: Arc<OrderStateMachine>,
}

impl MeetingScheduler {
    pub fn new(engine: Arc<OrderStateMachine>) -> Self {
        Self { engine }
    }

    /// Schedule or reschedule the meeting. Prior values not present in
    /// the patch are preserved; the result is never a suggestion.
    pub async fn schedule(
        &self,
        order_id: Uuid,
        admin_id: Uuid,
        patch: MeetingPatch,
    ) -> Result<Meeting, MeetingError> {
        if patch.is_empty() {
            return Err(MeetingError::EmptyMeetingUpdate);
        }
        self.engine.apply_meeting_update(order_id, admin_id, patch).await
    }
}
