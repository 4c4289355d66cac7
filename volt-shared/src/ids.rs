use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Human-readable order number, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNo(pub String);

impl OrderNo {
    /// Format: VM-{YYYYMMDD}-{6 upper hex}
    pub fn generate() -> Self {
        let date = Utc::now().format("%Y%m%d");
        let short = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
        OrderNo(format!("VM-{}-{}", date, short))
    }
}

impl std::fmt::Display for OrderNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who performed a state-changing action. Recorded on every timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "id")]
pub enum Actor {
    User(Uuid),
    Admin(Uuid),
    System,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{}", id),
            Actor::Admin(id) => write!(f, "admin:{}", id),
            Actor::System => write!(f, "system"),
        }
    }
}
