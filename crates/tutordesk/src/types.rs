/// Shared application state

use crate::conferencing::ConferencingClient;
use crate::config::AppConfig;
use crate::payments::PaymentsClient;
use crate::store::RecordStore;

/// Everything a request handler needs, built once at startup and passed
/// around behind an `Arc`. Read-only after construction apart from the
/// store's internal connection lock.
pub struct AppState {
    pub config: AppConfig,
    pub store: RecordStore,
    pub conferencing: ConferencingClient,
    pub payments: PaymentsClient,
}
