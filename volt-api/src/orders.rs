use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use volt_core::shipping::Address;
use volt_order::models::{Order, PaymentMethod};
use volt_order::statemachine::{CreateOrder, NewOrderKind, PaymentOutcome};
use volt_order::timeline::TimelineEntry;
use volt_shared::Actor;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/timeline", get(get_timeline))
        .route("/api/orders/{id}/pay", post(request_payment))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/orders/{id}/shipping", post(advance_shipping))
        .route("/api/orders/{id}/delivered", post(mark_delivered))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
enum NewOrderKindBody {
    Shippable { origin: Address, destination: Address },
    Deposit { deposit_amount: i64 },
}

#[derive(Debug, Deserialize)]
struct CreateOrderBody {
    buyer_id: Uuid,
    product_id: Uuid,
    #[serde(default = "default_quantity")]
    quantity: i64,
    method: PaymentMethod,
    #[serde(flatten)]
    kind: NewOrderKindBody,
}

fn default_quantity() -> i64 {
    1
}

async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<Json<Order>, AppError> {
    let kind = match body.kind {
        NewOrderKindBody::Shippable { origin, destination } => {
            NewOrderKind::Shippable { origin, destination }
        }
        NewOrderKindBody::Deposit { deposit_amount } => NewOrderKind::Deposit { deposit_amount },
    };
    let order = state
        .engine
        .create_order(CreateOrder {
            buyer_id: body.buyer_id,
            product_id: body.product_id,
            quantity: body.quantity,
            kind,
            method: body.method,
        })
        .await?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.engine.get_order(id).await?))
}

async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEntry>>, AppError> {
    // Surface NotFound rather than an empty log for unknown orders.
    state.engine.get_order(id).await?;
    Ok(Json(state.engine.timeline().list_for(id)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "status")]
enum PaymentOutcomeBody {
    Settled {
        order: Box<Order>,
    },
    AwaitingGateway {
        gateway_order_id: String,
        redirect_ref: String,
    },
    AwaitingConfirmation,
}

async fn request_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentOutcomeBody>, AppError> {
    let outcome = match state.engine.request_payment(id).await? {
        PaymentOutcome::Settled(order) => PaymentOutcomeBody::Settled { order: Box::new(order) },
        PaymentOutcome::AwaitingGateway {
            gateway_order_id,
            redirect_ref,
        } => PaymentOutcomeBody::AwaitingGateway {
            gateway_order_id,
            redirect_ref,
        },
        PaymentOutcome::AwaitingConfirmation => PaymentOutcomeBody::AwaitingConfirmation,
    };
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct CancelBody {
    actor: Actor,
    reason: String,
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelBody>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.engine.cancel(id, body.actor, &body.reason).await?))
}

#[derive(Debug, Deserialize)]
struct ShippingBody {
    tracking_number: String,
}

async fn advance_shipping(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ShippingBody>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(
        state
            .engine
            .advance_shipping(id, &body.tracking_number)
            .await?,
    ))
}

async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.engine.mark_delivered(id).await?))
}
