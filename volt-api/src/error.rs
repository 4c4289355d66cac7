use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use volt_order::meeting::MeetingError;
use volt_order::statemachine::OrderError;
use volt_order::contract::ContractError;

#[derive(Debug)]
pub enum AppError {
    Order(OrderError),
    Meeting(MeetingError),
    Contract(ContractError),
    Internal(anyhow::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::Order(err)
    }
}

impl From<MeetingError> for AppError {
    fn from(err: MeetingError) -> Self {
        AppError::Meeting(err)
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        AppError::Contract(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match &self {
            AppError::Order(err) => {
                let status = match err {
                    OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                    OrderError::InvalidAmount(_) | OrderError::InvalidAddress(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    OrderError::InvalidTransition { .. }
                    | OrderError::ContractNotSigned(_)
                    | OrderError::WrongKind
                    | OrderError::LedgerConflict(_) => StatusCode::CONFLICT,
                    OrderError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
                    OrderError::ProductUnavailable(_) => StatusCode::CONFLICT,
                    OrderError::QuoteUnavailable(_)
                    | OrderError::GatewayUnavailable(_)
                    | OrderError::RendererUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, err.to_string(), err.is_retryable())
            }
            AppError::Meeting(err) => {
                let status = match err {
                    MeetingError::EmptyMeetingUpdate => StatusCode::BAD_REQUEST,
                    MeetingError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                    MeetingError::WrongKind | MeetingError::NotSchedulable(_) => {
                        StatusCode::CONFLICT
                    }
                };
                (status, err.to_string(), false)
            }
            AppError::Contract(err) => {
                let status = match err {
                    ContractError::NotFound(_) => StatusCode::NOT_FOUND,
                    ContractError::RenderFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, err.to_string(), false)
            }
            AppError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    false,
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "retryable": retryable,
        }));
        (status, body).into_response()
    }
}
