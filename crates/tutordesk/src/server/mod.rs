use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{middleware as mw, Router};

use crate::server::endpoints::{assignments, meetings, payments, status};
use crate::server::middleware::identity;
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Router whose endpoints require the verified caller identity
    let identity_router = Router::new()
        .route(
            "/meetings/fetch-teachers-meetings",
            get(meetings::get_teachers_meetings),
        )
        .route("/meetings/fetch-aggregates", get(meetings::get_aggregates))
        .route(
            "/meeting/fetch-historical-meetings",
            get(meetings::get_historical_meetings),
        )
        .route(
            "/meeting/fetch-student-meetings",
            get(meetings::get_student_meetings),
        )
        .route(
            "/payments/add-transaction",
            post(payments::post_add_transaction),
        )
        .route(
            "/payments/fetch-transactions",
            get(payments::get_transactions),
        )
        .layer(mw::from_fn(identity::require_identity));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/meeting/create-meeting", post(meetings::post_create_meeting))
        .route("/meeting/list-meetings", get(meetings::get_list_meetings))
        .route("/meeting/get-meeting-stats", get(meetings::get_meeting_stats))
        .route("/meeting/delete-meeting", delete(meetings::delete_meeting))
        .route("/meeting/get-recording", get(meetings::get_recording))
        .route("/meeting/reassign-owner", post(meetings::post_reassign_owner))
        .route("/payments/get-payment-key", get(payments::get_payment_key))
        .route("/payments/make-payment", post(payments::post_make_payment))
        .route("/payments/verify-payments", post(payments::post_verify_payment))
        .route(
            "/assignment/create-assignment",
            post(assignments::post_create_assignment),
        )
        .merge(identity_router)
        .with_state(app_state)
}
