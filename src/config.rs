use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub stations_url: String,
    pub trains_url: String,
    pub users_url: String,
    pub payment_delay_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "railbook.db".to_string()),
            stations_url: env::var("STATIONS_URL")
                .unwrap_or_else(|_| "http://localhost:8080/data/stations.json".to_string()),
            trains_url: env::var("TRAINS_URL")
                .unwrap_or_else(|_| "http://localhost:8080/data/trains.json".to_string()),
            users_url: env::var("USERS_URL")
                .unwrap_or_else(|_| "http://localhost:8080/data/users.json".to_string()),
            payment_delay_ms: env::var("PAYMENT_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        }
    }
}
