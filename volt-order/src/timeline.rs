use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;
use volt_shared::Actor;

use crate::models::OrderStatus;

/// One accepted status transition. Appended, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub order_id: Uuid,
    /// `None` for the creation entry.
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub actor: Actor,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// Append-only audit log explaining why each order is in its state.
#[derive(Default)]
pub struct OrderTimeline {
    entries: RwLock<HashMap<Uuid, Vec<TimelineEntry>>>,
}

impl OrderTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &self,
        order_id: Uuid,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        actor: Actor,
        description: impl Into<String>,
    ) {
        let entry = TimelineEntry {
            order_id,
            from_status,
            to_status,
            actor,
            description: description.into(),
            at: Utc::now(),
        };
        self.entries
            .write()
            .unwrap()
            .entry(order_id)
            .or_default()
            .push(entry);
    }

    /// Chronological sequence, oldest first.
    pub fn list_for(&self, order_id: Uuid) -> Vec<TimelineEntry> {
        self.entries
            .read()
            .unwrap()
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
    }
}
