use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::User;
use crate::services::payment::PaymentGateway;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub payment: Box<dyn PaymentGateway>,
    /// Users fetched from the static users resource at startup. Scanned
    /// before the stored list during authentication.
    pub preloaded_users: Vec<User>,
}
