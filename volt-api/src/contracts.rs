use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use volt_order::contract::{ContractParty, ContractState};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/contracts/{product_id}", get(get_contract))
        .route("/api/contracts/{product_id}/sign", post(sign))
}

async fn get_contract(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ContractState>, AppError> {
    state
        .engine
        .contracts()
        .get(product_id)
        .map(Json)
        .ok_or_else(|| volt_order::contract::ContractError::NotFound(product_id).into())
}

#[derive(Debug, Deserialize)]
struct SignBody {
    party: ContractParty,
    signer_id: Uuid,
    image_ref: String,
}

async fn sign(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<SignBody>,
) -> Result<Json<ContractState>, AppError> {
    let contract = state.engine.contracts().attach_signature(
        product_id,
        body.party,
        body.signer_id,
        &body.image_ref,
    )?;
    Ok(Json(contract))
}
