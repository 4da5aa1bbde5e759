use std::sync::{Arc, Mutex};

use chrono::{Duration, Local};
use tracing_subscriber::EnvFilter;

use railbook::config::AppConfig;
use railbook::db::{self, queries};
use railbook::errors::AppError;
use railbook::models::{
    BerthPreference, BookingSession, Contact, FareClass, Gender, Passenger, PaymentMethod, Train,
};
use railbook::services::auth::{self, SignupInput};
use railbook::services::booking::{process_command, BookingCommand};
use railbook::services::payment::mock::SimulatedGateway;
use railbook::services::reference::{self, HttpFetcher};
use railbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let fetcher = HttpFetcher::new();
    let reference = reference::load(&fetcher, &db, &config).await;
    tracing::info!(
        stations = reference.stations.len(),
        trains = reference.trains.len(),
        "reference data ready"
    );
    let preloaded_users = reference::load_users(&fetcher, &config.users_url).await;

    if reference.trains.is_empty() {
        tracing::warn!("no train data available, seeding demo trains");
        let conn = db.lock().unwrap();
        queries::save_trains(&conn, &demo_trains())?;
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        payment: Box::new(SimulatedGateway::new(config.payment_delay_ms)),
        preloaded_users,
    });

    run_demo_booking(&state).await?;

    Ok(())
}

/// Walk one booking end to end: login, search NDLS -> BCT for tomorrow,
/// pick the first train and class, one passenger, skip food, pay by UPI.
async fn run_demo_booking(state: &Arc<AppState>) -> anyhow::Result<()> {
    match auth::signup(
        state,
        SignupInput {
            name: "Demo User".into(),
            email: "demo@example.com".into(),
            mobile: "9876543210".into(),
            password: "demo-pass".into(),
        },
    ) {
        Ok(_) | Err(AppError::UserExists) => {}
        Err(e) => return Err(e.into()),
    }
    auth::login(state, "demo@example.com", "demo-pass", false)?;

    let session = process_command(
        state,
        BookingCommand::Search {
            from: "NDLS".into(),
            to: "BCT".into(),
            date: Local::now().date_naive() + Duration::days(1),
            quota: "General".into(),
        },
    )
    .await?;

    let Some(BookingSession::Selecting { matches, .. }) = session else {
        anyhow::bail!("search did not reach the selecting stage");
    };
    let train = &matches[0];
    let class = &train.classes[0];
    tracing::info!(
        train = %train.train_number,
        class = %class.code,
        options = matches.len(),
        "selecting first matched train"
    );

    process_command(
        state,
        BookingCommand::SelectTrain {
            train_number: train.train_number.clone(),
            class_code: class.code.clone(),
        },
    )
    .await?;

    process_command(
        state,
        BookingCommand::AddPassengers {
            passengers: vec![Passenger {
                name: "A Kumar".into(),
                age: 45,
                gender: Gender::Male,
                berth: BerthPreference::Lower,
                concession: false,
            }],
            contact: Contact {
                mobile: "9876543210".into(),
                email: "a@b.com".into(),
            },
        },
    )
    .await?;

    process_command(state, BookingCommand::SkipFood).await?;

    let issued = process_command(
        state,
        BookingCommand::Pay {
            method: PaymentMethod::Upi,
            info: "demo@upi".into(),
        },
    )
    .await?;

    let Some(BookingSession::Issued(ticket)) = issued else {
        anyhow::bail!("payment did not issue a ticket");
    };
    println!("{ticket}");

    Ok(())
}

fn demo_trains() -> Vec<Train> {
    vec![
        Train {
            train_number: "12951".into(),
            train_name: "Mumbai Rajdhani".into(),
            train_type: "Rajdhani".into(),
            from: "NDLS".into(),
            to: "BCT".into(),
            departure_time: "16:25".into(),
            arrival_time: "08:15".into(),
            duration: "15h 50m".into(),
            distance: "1384 km".into(),
            days: vec!["Daily".into()],
            classes: vec![
                FareClass {
                    code: "1A".into(),
                    name: "AC First Class".into(),
                    fare: 4755,
                    available: 12,
                },
                FareClass {
                    code: "2A".into(),
                    name: "AC 2 Tier".into(),
                    fare: 2935,
                    available: 36,
                },
                FareClass {
                    code: "3A".into(),
                    name: "AC 3 Tier".into(),
                    fare: 2310,
                    available: 64,
                },
            ],
        },
        Train {
            train_number: "12953".into(),
            train_name: "August Kranti Rajdhani".into(),
            train_type: "Rajdhani".into(),
            from: "NDLS".into(),
            to: "BCT".into(),
            departure_time: "17:15".into(),
            arrival_time: "09:45".into(),
            duration: "16h 30m".into(),
            distance: "1377 km".into(),
            days: vec!["Daily".into()],
            classes: vec![FareClass {
                code: "3A".into(),
                name: "AC 3 Tier".into(),
                fare: 2280,
                available: 48,
            }],
        },
    ]
}
