use std::sync::Arc;
use volt_order::{MeetingScheduler, OrderStateMachine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<OrderStateMachine>,
    pub scheduler: Arc<MeetingScheduler>,
}

impl AppState {
    pub fn new(engine: Arc<OrderStateMachine>) -> Self {
        let scheduler = Arc::new(MeetingScheduler::new(engine.clone()));
        Self { engine, scheduler }
    }
}
