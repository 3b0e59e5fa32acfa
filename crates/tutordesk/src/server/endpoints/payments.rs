//! API endpoints for payment orders, verification, and transactions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::payments::PaymentError;
use crate::server::middleware::identity::Identity;
use crate::server::types::ApiErrorType;
use crate::server::util::{non_empty, store_error_response};
use crate::store::TransactionRecord;
use crate::types::AppState;

/// GET /payments/get-payment-key
///
/// The publishable key id checkout clients embed in the widget.
pub async fn get_payment_key(State(s): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(json!({ "key": s.payments.key_id() }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct MakePaymentRequest {
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub notes: Option<serde_json::Value>,
}

/// POST /payments/make-payment
///
/// Opens an order with the gateway. `amount` arrives in major currency
/// units and is converted to minor units for the gateway.
pub async fn post_make_payment(
    State(s): State<Arc<AppState>>,
    Json(req): Json<MakePaymentRequest>,
) -> Response {
    let amount = req.amount.unwrap_or(0);
    if amount <= 0 {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "Valid amount is required"))
            .into_response();
    }

    let currency = non_empty(req.currency).unwrap_or_else(|| "INR".to_string());
    let receipt =
        non_empty(req.receipt).unwrap_or_else(|| format!("receipt_{}", Uuid::new_v4()));
    let notes = req.notes.unwrap_or_else(|| json!({}));

    info!(amount = amount, currency = %currency, "POST /payments/make-payment");

    match s
        .payments
        .create_order(amount * 100, &currency, &receipt, &notes)
        .await
    {
        Ok(order) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "order": {
                    "id": order.order_id,
                    "amount": order.amount,
                    "currency": order.currency,
                    "receipt": order.receipt,
                },
            })),
        )
            .into_response(),
        Err(e) => payment_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// POST /payments/verify-payments
///
/// Checks the checkout callback signature. Verification is local; nothing
/// is sent to the gateway.
pub async fn post_verify_payment(
    State(s): State<Arc<AppState>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Response {
    let (Some(order_id), Some(payment_id), Some(signature)) = (
        non_empty(req.order_id),
        non_empty(req.payment_id),
        non_empty(req.signature),
    ) else {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Missing payment verification parameters",
        ))
        .into_response();
    };

    if s.payments.verify_signature(&order_id, &payment_id, &signature) {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Payment verified successfully",
                "orderId": order_id,
                "paymentId": payment_id,
            })),
        )
            .into_response()
    } else {
        warn!(order_id = %order_id, "Payment signature mismatch");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Invalid payment signature",
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddTransactionRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

/// POST /payments/add-transaction
///
/// Appends a transaction for the authenticated student.
pub async fn post_add_transaction(
    State(s): State<Arc<AppState>>,
    Extension(Identity(student_id)): Extension<Identity>,
    Json(req): Json<AddTransactionRequest>,
) -> Response {
    let Some(transaction_id) = non_empty(req.transaction_id) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "transaction_id is required"))
            .into_response();
    };
    let Some(amount) = req.amount.filter(|a| *a > 0) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "Valid amount is required"))
            .into_response();
    };

    info!(student = %student_id, transaction = %transaction_id, "POST /payments/add-transaction");

    let record = TransactionRecord {
        transaction_id,
        student_id,
        amount,
        created_at: Utc::now(),
    };

    match s.store.put_transaction(&record) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Transaction recorded" })),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}

/// GET /payments/fetch-transactions
pub async fn get_transactions(
    State(s): State<Arc<AppState>>,
    Extension(Identity(student_id)): Extension<Identity>,
) -> Response {
    info!(student = %student_id, "GET /payments/fetch-transactions");

    match s.store.scan_transactions_for_student(&student_id) {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

/// Converts a payment gateway failure to an API response.
fn payment_error_response(error: PaymentError) -> Response {
    let (status, message) = match &error {
        PaymentError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "Gateway rejected the order"),
        PaymentError::Config { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment gateway misconfigured",
        ),
        _ => (StatusCode::BAD_GATEWAY, "Payment gateway request failed"),
    };

    error!(error = %error, "Payment gateway failure");
    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}
