use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

use railbook::config::AppConfig;
use railbook::db::{self, queries};
use railbook::errors::AppError;
use railbook::models::{
    BerthPreference, BookingSession, Contact, FareClass, Gender, Passenger, PaymentMethod,
    Station, Train,
};
use railbook::services::auth::{self, SignupInput};
use railbook::services::booking::{process_command, BookingCommand};
use railbook::services::payment::{PaymentGateway, PaymentReceipt};
use railbook::services::reference::{self, ResourceFetcher};
use railbook::state::AppState;

// ── Mock Providers ──

struct InstantGateway {
    charges: Arc<Mutex<Vec<(String, u32)>>>,
}

#[async_trait]
impl PaymentGateway for InstantGateway {
    async fn charge(
        &self,
        method: PaymentMethod,
        _info: &str,
        amount: u32,
    ) -> anyhow::Result<PaymentReceipt> {
        self.charges
            .lock()
            .unwrap()
            .push((method.as_str().to_string(), amount));
        Ok(PaymentReceipt {
            transaction_id: "txn-test".to_string(),
            amount,
        })
    }
}

struct MapFetcher {
    responses: HashMap<String, String>,
}

#[async_trait]
impl ResourceFetcher for MapFetcher {
    async fn get_text(&self, url: &str) -> anyhow::Result<String> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }
}

struct FailingFetcher;

#[async_trait]
impl ResourceFetcher for FailingFetcher {
    async fn get_text(&self, url: &str) -> anyhow::Result<String> {
        anyhow::bail!("connection refused fetching {url}")
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        database_url: ":memory:".to_string(),
        stations_url: "mock://stations".to_string(),
        trains_url: "mock://trains".to_string(),
        users_url: "mock://users".to_string(),
        payment_delay_ms: 0,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, u32)>>>) {
    let charges = Arc::new(Mutex::new(vec![]));
    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        payment: Box::new(InstantGateway {
            charges: Arc::clone(&charges),
        }),
        preloaded_users: vec![],
    });
    (state, charges)
}

fn train(number: &str, from: &str, to: &str, days: &[&str], fare: u32) -> Train {
    Train {
        train_number: number.to_string(),
        train_name: format!("Express {number}"),
        train_type: "Express".to_string(),
        from: from.to_string(),
        to: to.to_string(),
        departure_time: "16:25".to_string(),
        arrival_time: "08:15".to_string(),
        duration: "15h 50m".to_string(),
        distance: "1384 km".to_string(),
        days: days.iter().map(|d| d.to_string()).collect(),
        classes: vec![FareClass {
            code: "3A".to_string(),
            name: "AC 3 Tier".to_string(),
            fare,
            available: 64,
        }],
    }
}

fn seed_trains(state: &Arc<AppState>, trains: &[Train]) {
    let conn = state.db.lock().unwrap();
    queries::save_trains(&conn, trains).unwrap();
}

fn next_friday() -> NaiveDate {
    let mut date = Local::now().date_naive() + Duration::days(1);
    while date.weekday() != Weekday::Fri {
        date = date + Duration::days(1);
    }
    date
}

fn one_passenger() -> (Vec<Passenger>, Contact) {
    (
        vec![Passenger {
            name: "A Kumar".to_string(),
            age: 45,
            gender: Gender::Male,
            berth: BerthPreference::Lower,
            concession: false,
        }],
        Contact {
            mobile: "9876543210".to_string(),
            email: "a@b.com".to_string(),
        },
    )
}

async fn drive_to_food_stage(state: &Arc<AppState>) {
    seed_trains(state, &[train("12951", "NDLS", "BCT", &["Daily"], 2310)]);
    process_command(
        state,
        BookingCommand::Search {
            from: "NDLS".to_string(),
            to: "BCT".to_string(),
            date: next_friday(),
            quota: "General".to_string(),
        },
    )
    .await
    .unwrap();
    process_command(
        state,
        BookingCommand::SelectTrain {
            train_number: "12951".to_string(),
            class_code: "3A".to_string(),
        },
    )
    .await
    .unwrap();
    let (passengers, contact) = one_passenger();
    process_command(state, BookingCommand::AddPassengers { passengers, contact })
        .await
        .unwrap();
}

// ── Authentication ──

#[tokio::test]
async fn signup_makes_user_exist_for_both_fields() {
    let (state, _) = test_state();

    {
        let conn = state.db.lock().unwrap();
        let stored = queries::get_users(&conn).unwrap();
        assert!(!auth::user_exists(&[], &stored, "a@b.com", "9876543210"));
    }

    auth::signup(
        &state,
        SignupInput {
            name: "A Kumar".to_string(),
            email: "a@b.com".to_string(),
            mobile: "9876543210".to_string(),
            password: "secret-1".to_string(),
        },
    )
    .unwrap();

    let conn = state.db.lock().unwrap();
    let stored = queries::get_users(&conn).unwrap();
    // Either field alone collides.
    assert!(auth::user_exists(&[], &stored, "a@b.com", "9000000000"));
    assert!(auth::user_exists(&[], &stored, "x@y.com", "9876543210"));
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let (state, _) = test_state();
    let input = || SignupInput {
        name: "A Kumar".to_string(),
        email: "a@b.com".to_string(),
        mobile: "9876543210".to_string(),
        password: "secret-1".to_string(),
    };

    auth::signup(&state, input()).unwrap();
    assert!(matches!(
        auth::signup(&state, input()),
        Err(AppError::UserExists)
    ));
}

#[tokio::test]
async fn login_requires_exact_credentials() {
    let (state, _) = test_state();
    auth::signup(
        &state,
        SignupInput {
            name: "A Kumar".to_string(),
            email: "a@b.com".to_string(),
            mobile: "9876543210".to_string(),
            password: "secret-1".to_string(),
        },
    )
    .unwrap();

    // One character off collapses into the generic credential failure.
    assert!(matches!(
        auth::login(&state, "a@b.com", "secret-2", false),
        Err(AppError::InvalidCredentials)
    ));
    assert!(matches!(
        auth::login(&state, "b@b.com", "secret-1", false),
        Err(AppError::InvalidCredentials)
    ));

    // Both the email and the mobile work as the identifier.
    assert!(auth::login(&state, "a@b.com", "secret-1", false).is_ok());
    assert!(auth::login(&state, "9876543210", "secret-1", false).is_ok());
}

#[tokio::test]
async fn remember_me_controls_scope_and_remembered_email() {
    let (state, _) = test_state();
    auth::signup(
        &state,
        SignupInput {
            name: "A Kumar".to_string(),
            email: "a@b.com".to_string(),
            mobile: "9876543210".to_string(),
            password: "secret-1".to_string(),
        },
    )
    .unwrap();

    auth::login(&state, "a@b.com", "secret-1", true).unwrap();
    {
        let conn = state.db.lock().unwrap();
        assert!(auth::current_user(&conn).unwrap().is_some());
        assert_eq!(
            queries::get_remembered_email(&conn).unwrap().as_deref(),
            Some("a@b.com")
        );

        auth::end_session(&conn).unwrap();
        assert!(auth::current_user(&conn).unwrap().is_none());
    }

    auth::login(&state, "a@b.com", "secret-1", false).unwrap();
    let conn = state.db.lock().unwrap();
    assert!(auth::current_user(&conn).unwrap().is_some());
    assert!(queries::get_remembered_email(&conn).unwrap().is_none());
}

// ── Stage order ──

#[tokio::test]
async fn commands_out_of_order_are_rejected() {
    let (state, _) = test_state();
    let (passengers, contact) = one_passenger();

    let err = process_command(&state, BookingCommand::AddPassengers { passengers, contact })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WrongStage("entering_passengers")));

    let err = process_command(
        &state,
        BookingCommand::SelectTrain {
            train_number: "12951".to_string(),
            class_code: "3A".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::WrongStage("selecting")));

    let err = process_command(
        &state,
        BookingCommand::Pay {
            method: PaymentMethod::Upi,
            info: "test@upi".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::WrongStage("paying")));

    // Nothing was persisted along the way.
    let conn = state.db.lock().unwrap();
    assert!(queries::get_booking(&conn).unwrap().is_none());
}

#[tokio::test]
async fn failed_validation_leaves_the_record_untouched() {
    let (state, _) = test_state();
    drive_to_food_stage(&state).await;

    let before = {
        let conn = state.db.lock().unwrap();
        queries::get_booking(&conn).unwrap().unwrap()
    };

    let err = process_command(
        &state,
        BookingCommand::AddFood {
            item_id: "no-such-item".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let conn = state.db.lock().unwrap();
    assert_eq!(queries::get_booking(&conn).unwrap().unwrap(), before);
}

#[tokio::test]
async fn zero_match_search_persists_nothing() {
    let (state, _) = test_state();
    seed_trains(&state, &[train("12951", "NDLS", "BCT", &["Mon"], 2310)]);

    let err = process_command(
        &state,
        BookingCommand::Search {
            from: "NDLS".to_string(),
            to: "BCT".to_string(),
            date: next_friday(),
            quota: "General".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NoTrainsFound));

    let conn = state.db.lock().unwrap();
    assert!(queries::get_booking(&conn).unwrap().is_none());
}

// ── Food basket ──

#[tokio::test]
async fn food_basket_counts_and_drops_at_zero() {
    let (state, _) = test_state();
    drive_to_food_stage(&state).await;

    process_command(&state, BookingCommand::AddFood { item_id: "bvg-1".to_string() })
        .await
        .unwrap();
    process_command(&state, BookingCommand::AddFood { item_id: "bvg-1".to_string() })
        .await
        .unwrap();
    let session = process_command(&state, BookingCommand::AddFood { item_id: "mls-1".to_string() })
        .await
        .unwrap()
        .unwrap();

    let BookingSession::SelectingFood { food, .. } = &session else {
        panic!("expected the food stage, got {}", session.stage_name());
    };
    assert_eq!(food.len(), 2);
    assert_eq!(food[0].quantity, 2);

    // Decrementing to zero removes the line entirely.
    let session = process_command(&state, BookingCommand::RemoveFood { item_id: "mls-1".to_string() })
        .await
        .unwrap()
        .unwrap();
    let BookingSession::SelectingFood { food, .. } = &session else {
        panic!("expected the food stage");
    };
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].id, "bvg-1");
}

#[tokio::test]
async fn record_round_trips_between_food_and_payment_stages() {
    let (state, _) = test_state();
    drive_to_food_stage(&state).await;

    process_command(&state, BookingCommand::AddFood { item_id: "bvg-1".to_string() })
        .await
        .unwrap();
    let returned = process_command(&state, BookingCommand::ProceedToPayment)
        .await
        .unwrap()
        .unwrap();

    // Re-loading from storage reproduces the record exactly.
    let reloaded = {
        let conn = state.db.lock().unwrap();
        queries::get_booking(&conn).unwrap().unwrap()
    };
    assert_eq!(reloaded, returned);

    let BookingSession::Paying { journey, choice, manifest, food } = reloaded else {
        panic!("expected the paying stage");
    };
    assert_eq!(journey.from, "NDLS");
    assert_eq!(journey.to, "BCT");
    assert_eq!(choice.train.train_number, "12951");
    assert_eq!(manifest.passengers.len(), 1);
    assert_eq!(manifest.passengers[0].name, "A Kumar");
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].id, "bvg-1");
}

// ── End to end ──

#[tokio::test]
async fn full_friday_booking_scenario() {
    let (state, charges) = test_state();

    auth::signup(
        &state,
        SignupInput {
            name: "A Kumar".to_string(),
            email: "a@b.com".to_string(),
            mobile: "9876543210".to_string(),
            password: "secret-1".to_string(),
        },
    )
    .unwrap();
    auth::login(&state, "a@b.com", "secret-1", false).unwrap();

    seed_trains(
        &state,
        &[
            train("22221", "NDLS", "BCT", &["Fri"], 2310),
            train("12951", "NDLS", "BCT", &["Daily"], 2935),
            train("11111", "NDLS", "BCT", &["Mon", "Wed"], 1800),
            train("12301", "NDLS", "HWH", &["Daily"], 2100),
        ],
    );

    let session = process_command(
        &state,
        BookingCommand::Search {
            from: "NDLS".to_string(),
            to: "BCT".to_string(),
            date: next_friday(),
            quota: "General".to_string(),
        },
    )
    .await
    .unwrap()
    .unwrap();

    let BookingSession::Selecting { matches, .. } = &session else {
        panic!("expected the selecting stage");
    };
    let numbers: Vec<&str> = matches.iter().map(|t| t.train_number.as_str()).collect();
    assert_eq!(numbers, vec!["22221", "12951"]);

    process_command(
        &state,
        BookingCommand::SelectTrain {
            train_number: "22221".to_string(),
            class_code: "3A".to_string(),
        },
    )
    .await
    .unwrap();

    let (passengers, contact) = one_passenger();
    process_command(&state, BookingCommand::AddPassengers { passengers, contact })
        .await
        .unwrap();
    process_command(&state, BookingCommand::SkipFood).await.unwrap();

    let issued = process_command(
        &state,
        BookingCommand::Pay {
            method: PaymentMethod::Upi,
            info: "test@upi".to_string(),
        },
    )
    .await
    .unwrap()
    .unwrap();

    let BookingSession::Issued(ticket) = issued else {
        panic!("expected an issued ticket");
    };
    assert_eq!(ticket.pnr.len(), 10);
    assert!(ticket
        .pnr
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(ticket.ticket_total(), 2310);
    assert_eq!(ticket.grand_total(), 2310);
    assert_eq!(ticket.payment.method, PaymentMethod::Upi);
    assert_eq!(ticket.payment.info, "test@upi");

    assert_eq!(
        charges.lock().unwrap().as_slice(),
        &[("UPI".to_string(), 2310)]
    );

    // The PNR lands on the logged-in user's stored booking list.
    let conn = state.db.lock().unwrap();
    let stored = queries::get_users(&conn).unwrap();
    assert_eq!(stored[0].bookings, vec![ticket.pnr.clone()]);

    // The issued record is what later loads see.
    let reloaded = queries::get_booking(&conn).unwrap().unwrap();
    assert_eq!(reloaded, BookingSession::Issued(ticket));
}

#[tokio::test]
async fn reset_deletes_the_record_and_a_new_search_starts_over() {
    let (state, _) = test_state();
    drive_to_food_stage(&state).await;

    let result = process_command(&state, BookingCommand::Reset).await.unwrap();
    assert!(result.is_none());
    {
        let conn = state.db.lock().unwrap();
        assert!(queries::get_booking(&conn).unwrap().is_none());
    }

    // Searching again from scratch works.
    let session = process_command(
        &state,
        BookingCommand::Search {
            from: "NDLS".to_string(),
            to: "BCT".to_string(),
            date: next_friday(),
            quota: "General".to_string(),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(session, BookingSession::Selecting { .. }));
}

// ── Reference loader ──

#[tokio::test]
async fn loader_falls_back_to_builtin_data_when_nothing_is_cached() {
    let conn = db::init_db(":memory:").unwrap();
    let db = Mutex::new(conn);

    let data = reference::load(&FailingFetcher, &db, &test_config()).await;
    assert_eq!(data.stations.len(), 25);
    assert!(data.trains.is_empty());

    // Fallback data is not written back to the cache.
    let conn = db.lock().unwrap();
    assert!(queries::get_stations(&conn).unwrap().is_none());
}

#[tokio::test]
async fn loader_falls_back_to_cache_when_fetch_fails() {
    let conn = db::init_db(":memory:").unwrap();
    {
        queries::save_stations(
            &conn,
            &[Station {
                code: "NDLS".to_string(),
                name: "New Delhi".to_string(),
                city: "Delhi".to_string(),
                state: "Delhi".to_string(),
            }],
        )
        .unwrap();
        queries::save_trains(&conn, &[train("12951", "NDLS", "BCT", &["Daily"], 2310)]).unwrap();
    }
    let db = Mutex::new(conn);

    let data = reference::load(&FailingFetcher, &db, &test_config()).await;
    assert_eq!(data.stations.len(), 1);
    assert_eq!(data.trains.len(), 1);
}

#[tokio::test]
async fn partial_fetch_failure_falls_back_for_both_lists() {
    let conn = db::init_db(":memory:").unwrap();
    queries::save_trains(&conn, &[train("12951", "NDLS", "BCT", &["Daily"], 2310)]).unwrap();
    let db = Mutex::new(conn);

    // Stations fetch succeeds, trains fetch does not; the fresh station list
    // must be discarded along with it.
    let fresh_station = Station {
        code: "XXXX".to_string(),
        name: "Fresh Only".to_string(),
        city: "Nowhere".to_string(),
        state: "Nowhere".to_string(),
    };
    let fetcher = MapFetcher {
        responses: HashMap::from([(
            "mock://stations".to_string(),
            serde_json::to_string(&[fresh_station]).unwrap(),
        )]),
    };

    let data = reference::load(&fetcher, &db, &test_config()).await;
    assert!(data.stations.iter().all(|s| s.code != "XXXX"));
    assert_eq!(data.trains.len(), 1);
}

#[tokio::test]
async fn successful_fetch_refreshes_the_cache() {
    let conn = db::init_db(":memory:").unwrap();
    let db = Mutex::new(conn);

    let stations = vec![Station {
        code: "NDLS".to_string(),
        name: "New Delhi".to_string(),
        city: "Delhi".to_string(),
        state: "Delhi".to_string(),
    }];
    let trains = vec![train("12951", "NDLS", "BCT", &["Daily"], 2310)];
    let fetcher = MapFetcher {
        responses: HashMap::from([
            ("mock://stations".to_string(), serde_json::to_string(&stations).unwrap()),
            ("mock://trains".to_string(), serde_json::to_string(&trains).unwrap()),
        ]),
    };

    let data = reference::load(&fetcher, &db, &test_config()).await;
    assert_eq!(data.stations, stations);
    assert_eq!(data.trains, trains);

    let conn = db.lock().unwrap();
    assert_eq!(queries::get_stations(&conn).unwrap().unwrap(), stations);
    assert_eq!(queries::get_trains(&conn).unwrap().unwrap(), trains);
}

#[tokio::test]
async fn malformed_resource_falls_back() {
    let conn = db::init_db(":memory:").unwrap();
    let db = Mutex::new(conn);

    let fetcher = MapFetcher {
        responses: HashMap::from([
            ("mock://stations".to_string(), "not json".to_string()),
            ("mock://trains".to_string(), "[]".to_string()),
        ]),
    };

    let data = reference::load(&fetcher, &db, &test_config()).await;
    assert_eq!(data.stations.len(), 25);
    assert!(data.trains.is_empty());
}

#[tokio::test]
async fn preloaded_users_shadow_stored_users_at_login() {
    let (mut state_inner, _) = {
        let charges = Arc::new(Mutex::new(vec![]));
        let conn = db::init_db(":memory:").unwrap();
        (
            AppState {
                db: Arc::new(Mutex::new(conn)),
                config: test_config(),
                payment: Box::new(InstantGateway {
                    charges: Arc::clone(&charges),
                }),
                preloaded_users: vec![],
            },
            charges,
        )
    };
    state_inner.preloaded_users =
        vec![auth::create_user("Preloaded", "a@b.com", "9876543210", "pre-pass")];
    let state = Arc::new(state_inner);

    // The stored user shares the identifier but has a different password;
    // the preload list is scanned first.
    {
        let conn = state.db.lock().unwrap();
        let stored = vec![auth::create_user("Stored", "a@b.com", "9876543210", "stored-pass")];
        queries::save_users(&conn, &stored).unwrap();
    }

    let session = auth::login(&state, "a@b.com", "pre-pass", false).unwrap();
    assert_eq!(session.name, "Preloaded");
    let session = auth::login(&state, "a@b.com", "stored-pass", false).unwrap();
    assert_eq!(session.name, "Stored");
}
