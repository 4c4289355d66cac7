pub mod contract;
pub mod meeting;
pub mod models;
pub mod reconciler;
pub mod statemachine;
pub mod timeline;
pub mod wallet;

pub use contract::{ContractCoordinator, ContractParty};
pub use meeting::{Meeting, MeetingPatch, MeetingScheduler};
pub use models::{Order, OrderKind, OrderStatus, PaymentMethod, PaymentStatus};
pub use reconciler::PaymentReconciler;
pub use statemachine::{
    can_transition, ConfirmOutcome, CreateOrder, EngineConfig, NewOrderKind, OrderError,
    OrderStateMachine, PaymentOutcome,
};
pub use timeline::{OrderTimeline, TimelineEntry};
pub use wallet::{LedgerBucket, LedgerEntry, WalletLedger};
