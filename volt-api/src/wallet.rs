use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use volt_order::wallet::{LedgerEntry, WalletAccount};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallet/{account_id}", get(get_account))
        .route("/api/wallet/{account_id}/entries", get(get_entries))
        .route("/api/wallet/{account_id}/topup", post(top_up))
}

#[derive(Debug, Serialize)]
struct AccountBody {
    #[serde(flatten)]
    account: WalletAccount,
    /// Stored balance equals the running entry sum.
    consistent: bool,
}

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountBody>, AppError> {
    let account = state.engine.wallet().account(account_id).await;
    let consistent = state.engine.wallet().audit(account_id).await;
    Ok(Json(AccountBody { account, consistent }))
}

async fn get_entries(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    Ok(Json(state.engine.wallet().entries_for(account_id).await))
}

#[derive(Debug, Deserialize)]
struct TopUpBody {
    amount: i64,
}

async fn top_up(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(body): Json<TopUpBody>,
) -> Result<Json<LedgerEntry>, AppError> {
    let entry = state
        .engine
        .wallet()
        .credit(account_id, body.amount, None, "Wallet top-up")
        .await
        .map_err(volt_order::statemachine::OrderError::from)?;
    Ok(Json(entry))
}
