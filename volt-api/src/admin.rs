use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use volt_order::meeting::{Meeting, MeetingPatch};
use volt_order::models::Order;
use volt_order::statemachine::ConfirmOutcome;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orders/{id}/meeting", post(schedule_meeting))
        .route("/api/admin/orders/{id}/confirm", post(confirm_payment))
}

#[derive(Debug, Deserialize)]
struct MeetingBody {
    admin_id: Uuid,
    time: Option<DateTime<Utc>>,
    location: Option<String>,
    address: Option<String>,
}

/// Schedule or reschedule the in-person meeting on a deposit order.
async fn schedule_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MeetingBody>,
) -> Result<Json<Meeting>, AppError> {
    let meeting = state
        .scheduler
        .schedule(
            id,
            body.admin_id,
            MeetingPatch {
                time: body.time,
                location: body.location,
                address: body.address,
            },
        )
        .await?;
    Ok(Json(meeting))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "outcome")]
enum ConfirmBody {
    Success { transaction_id: Option<String> },
    Fail { reason: String },
}

/// Manual settlement for COD / bank-transfer orders.
async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<Order>, AppError> {
    let outcome = match body {
        ConfirmBody::Success { transaction_id } => ConfirmOutcome::Success { transaction_id },
        ConfirmBody::Fail { reason } => ConfirmOutcome::Fail { reason },
    };
    Ok(Json(state.engine.confirm_payment(id, outcome).await?))
}
