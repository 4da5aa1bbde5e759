use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::models::station::default_stations;
use crate::models::{Station, Train, User};

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> anyhow::Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> anyhow::Result<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub stations: Vec<Station>,
    pub trains: Vec<Train>,
}

/// Fetch the station and train resources together. Only if both fetches
/// succeed and parse are the lists cached and returned fresh; on any failure
/// both fall back together, to the cached copies if present, else to the
/// embedded station list and an empty train list. No retry, no partial
/// success.
pub async fn load(
    fetcher: &dyn ResourceFetcher,
    db: &Mutex<Connection>,
    config: &AppConfig,
) -> ReferenceData {
    let (stations_body, trains_body) = tokio::join!(
        fetcher.get_text(&config.stations_url),
        fetcher.get_text(&config.trains_url)
    );

    let fetched = match (stations_body, trains_body) {
        (Ok(stations_json), Ok(trains_json)) => {
            match (
                serde_json::from_str::<Vec<Station>>(&stations_json),
                serde_json::from_str::<Vec<Train>>(&trains_json),
            ) {
                (Ok(stations), Ok(trains)) => Some((stations, trains)),
                (stations, trains) => {
                    if let Err(e) = stations {
                        tracing::warn!(error = %e, "stations resource is malformed");
                    }
                    if let Err(e) = trains {
                        tracing::warn!(error = %e, "trains resource is malformed");
                    }
                    None
                }
            }
        }
        (stations, trains) => {
            if let Err(e) = stations {
                tracing::warn!(error = %e, "failed to fetch stations resource");
            }
            if let Err(e) = trains {
                tracing::warn!(error = %e, "failed to fetch trains resource");
            }
            None
        }
    };

    if let Some((stations, trains)) = fetched {
        let conn = db.lock().unwrap();
        if let Err(e) = queries::save_stations(&conn, &stations)
            .and_then(|_| queries::save_trains(&conn, &trains))
        {
            tracing::warn!(error = %e, "failed to cache reference data");
        }
        tracing::info!(
            stations = stations.len(),
            trains = trains.len(),
            "loaded fresh reference data"
        );
        return ReferenceData { stations, trains };
    }

    let conn = db.lock().unwrap();
    let stations = queries::get_stations(&conn).ok().flatten();
    let trains = queries::get_trains(&conn).ok().flatten().unwrap_or_default();

    match stations {
        Some(stations) => {
            tracing::warn!("using cached reference data");
            ReferenceData { stations, trains }
        }
        None => {
            tracing::warn!("no cached reference data, using built-in station list");
            ReferenceData {
                stations: default_stations(),
                trains,
            }
        }
    }
}

/// Preloaded user list for authentication. Never cached; empty on any
/// failure.
pub async fn load_users(fetcher: &dyn ResourceFetcher, url: &str) -> Vec<User> {
    match fetcher.get_text(url).await {
        Ok(body) => match serde_json::from_str::<Vec<User>>(&body) {
            Ok(users) => {
                tracing::info!(count = users.len(), "loaded preloaded users");
                users
            }
            Err(e) => {
                tracing::warn!(error = %e, "users resource is malformed");
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch users resource");
            Vec::new()
        }
    }
}
