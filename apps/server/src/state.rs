//! Shared application state.

use std::sync::Arc;

use tindera_core::ShippingFeeTable;
use tindera_db::Database;

/// State handed to every handler. Cloning is cheap: the database is a pool
/// handle and the fee table is shared.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub shipping: Arc<ShippingFeeTable>,
}

impl AppState {
    pub fn new(db: Database, shipping: ShippingFeeTable) -> Self {
        AppState {
            db,
            shipping: Arc::new(shipping),
        }
    }
}
