pub mod events;
pub mod ids;

pub use events::NotificationEvent;
pub use ids::{Actor, OrderNo};
