use std::sync::Arc;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate, Utc};
use rand::Rng;
use regex::Regex;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::food::food_menu;
use crate::models::station::default_stations;
use crate::models::{
    BookingSession, Contact, FoodItem, Journey, Manifest, Passenger, Payment, PaymentMethod,
    Ticket, TrainChoice,
};
use crate::services::matching;
use crate::services::auth::is_valid_email;
use crate::state::AppState;

static CONTACT_MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));

/// One user-initiated event against the in-progress booking. The original's
/// per-page form handlers map onto these commands one to one.
#[derive(Debug, Clone)]
pub enum BookingCommand {
    Search {
        from: String,
        to: String,
        date: NaiveDate,
        quota: String,
    },
    SelectTrain {
        train_number: String,
        class_code: String,
    },
    AddPassengers {
        passengers: Vec<Passenger>,
        contact: Contact,
    },
    AddFood {
        item_id: String,
    },
    RemoveFood {
        item_id: String,
    },
    SkipFood,
    ProceedToPayment,
    Pay {
        method: PaymentMethod,
        info: String,
    },
    Reset,
}

/// Load the persisted record, apply one transition, persist the whole record.
/// Validation failures leave the record untouched; a command arriving at the
/// wrong stage is a `WrongStage` error (the caller's cue to go back to the
/// landing stage). `Reset` deletes the record and returns `None`.
pub async fn process_command(
    state: &Arc<AppState>,
    command: BookingCommand,
) -> Result<Option<BookingSession>, AppError> {
    let current = {
        let conn = state.db.lock().unwrap();
        queries::get_booking(&conn)?
    };

    tracing::info!(
        stage = current.as_ref().map_or("searching", |s| s.stage_name()),
        command = command_name(&command),
        "processing booking command"
    );

    match (current, command) {
        // A new search always starts a fresh record, discarding any previous
        // booking in progress.
        (_, BookingCommand::Search { from, to, date, quota }) => {
            let next = start_search(state, from, to, date, quota)?;
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::Selecting { journey, matches }),
            BookingCommand::SelectTrain { train_number, class_code },
        ) => {
            let train = matches
                .iter()
                .find(|t| t.train_number == train_number)
                .ok_or_else(|| {
                    AppError::validation("Selected train is not in the search results")
                })?;
            let class = train.class(&class_code).ok_or_else(|| {
                AppError::validation("Selected class is not available on this train")
            })?;

            let next = BookingSession::EnteringPassengers {
                journey,
                choice: TrainChoice {
                    train: train.clone(),
                    class: class.clone(),
                },
            };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::EnteringPassengers { journey, choice }),
            BookingCommand::AddPassengers { passengers, contact },
        ) => {
            validate_passengers(&passengers)?;
            validate_contact(&contact)?;

            let next = BookingSession::SelectingFood {
                journey,
                choice,
                manifest: Manifest { passengers, contact },
                food: Vec::new(),
            };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::SelectingFood { journey, choice, manifest, mut food }),
            BookingCommand::AddFood { item_id },
        ) => {
            let menu = food_menu();
            let menu_item = menu
                .iter()
                .find(|item| item.id == item_id)
                .ok_or_else(|| AppError::validation("Unknown food item"))?;

            match food.iter_mut().find(|item| item.id == item_id) {
                Some(item) => item.quantity += 1,
                None => food.push(FoodItem::from(menu_item)),
            }

            let next = BookingSession::SelectingFood { journey, choice, manifest, food };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::SelectingFood { journey, choice, manifest, mut food }),
            BookingCommand::RemoveFood { item_id },
        ) => {
            if let Some(item) = food.iter_mut().find(|item| item.id == item_id) {
                item.quantity -= 1;
            }
            food.retain(|item| item.quantity > 0);

            let next = BookingSession::SelectingFood { journey, choice, manifest, food };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::SelectingFood { journey, choice, manifest, .. }),
            BookingCommand::SkipFood,
        ) => {
            let next = BookingSession::Paying {
                journey,
                choice,
                manifest,
                food: Vec::new(),
            };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::SelectingFood { journey, choice, manifest, food }),
            BookingCommand::ProceedToPayment,
        ) => {
            let next = BookingSession::Paying { journey, choice, manifest, food };
            persist(state, &next)?;
            Ok(Some(next))
        }

        (
            Some(BookingSession::Paying { journey, choice, manifest, food }),
            BookingCommand::Pay { method, info },
        ) => {
            if info.trim().is_empty() {
                return Err(AppError::validation("Please enter payment information"));
            }

            let amount = choice.class.fare * manifest.passengers.len() as u32
                + food.iter().map(FoodItem::line_total).sum::<u32>();

            // The record stays at the paying stage until the gateway
            // answers; abandoning the future abandons the transition.
            let receipt = state
                .payment
                .charge(method, &info, amount)
                .await
                .map_err(|e| AppError::Payment(e.to_string()))?;

            let pnr = generate_pnr();
            tracing::info!(
                pnr = %pnr,
                amount = receipt.amount,
                transaction_id = %receipt.transaction_id,
                "ticket issued"
            );

            let ticket = Ticket {
                journey,
                choice,
                manifest,
                food,
                payment: Payment { method, info },
                pnr: pnr.clone(),
                booked_at: Utc::now().naive_utc(),
            };

            let conn = state.db.lock().unwrap();
            record_user_booking(&conn, &pnr)?;
            let next = BookingSession::Issued(ticket);
            queries::save_booking(&conn, &next)?;
            Ok(Some(next))
        }

        (_, BookingCommand::Reset) => {
            let conn = state.db.lock().unwrap();
            queries::clear_booking(&conn)?;
            Ok(None)
        }

        (_, BookingCommand::SelectTrain { .. }) => Err(AppError::WrongStage("selecting")),
        (_, BookingCommand::AddPassengers { .. }) => {
            Err(AppError::WrongStage("entering_passengers"))
        }
        (
            _,
            BookingCommand::AddFood { .. }
            | BookingCommand::RemoveFood { .. }
            | BookingCommand::SkipFood
            | BookingCommand::ProceedToPayment,
        ) => Err(AppError::WrongStage("selecting_food")),
        (_, BookingCommand::Pay { .. }) => Err(AppError::WrongStage("paying")),
    }
}

fn start_search(
    state: &Arc<AppState>,
    from: String,
    to: String,
    date: NaiveDate,
    quota: String,
) -> Result<BookingSession, AppError> {
    let conn = state.db.lock().unwrap();
    let stations = queries::get_stations(&conn)?.unwrap_or_else(default_stations);

    if !stations.iter().any(|s| s.code == from) {
        return Err(AppError::validation(
            "Please select a valid \"From\" station",
        ));
    }
    if !stations.iter().any(|s| s.code == to) {
        return Err(AppError::validation("Please select a valid \"To\" station"));
    }
    if from == to {
        return Err(AppError::validation(
            "\"From\" and \"To\" stations cannot be the same",
        ));
    }
    if date < Local::now().date_naive() {
        return Err(AppError::validation("Please select a future date"));
    }
    if quota.trim().is_empty() {
        return Err(AppError::validation("Please select a quota"));
    }

    let trains = queries::get_trains(&conn)?.unwrap_or_default();
    let matches = matching::find_trains(&trains, &from, &to, date);
    if matches.is_empty() {
        return Err(AppError::NoTrainsFound);
    }

    Ok(BookingSession::Selecting {
        journey: Journey { from, to, date, quota },
        matches,
    })
}

fn validate_passengers(passengers: &[Passenger]) -> Result<(), AppError> {
    if passengers.is_empty() {
        return Err(AppError::validation("Please add at least one passenger"));
    }
    for passenger in passengers {
        if passenger.name.trim().is_empty() {
            return Err(AppError::validation("Please fill in all passenger details"));
        }
        if passenger.age == 0 || passenger.age > 120 {
            return Err(AppError::validation(
                "Passenger age must be between 1 and 120",
            ));
        }
        // Below the threshold the flag is rejected outright rather than
        // silently cleared.
        if passenger.concession && passenger.age < 60 {
            return Err(AppError::validation(
                "Concession requires passenger age 60 or above",
            ));
        }
    }
    Ok(())
}

fn validate_contact(contact: &Contact) -> Result<(), AppError> {
    if !CONTACT_MOBILE_RE.is_match(&contact.mobile) {
        return Err(AppError::validation(
            "Please enter a valid 10-digit mobile number",
        ));
    }
    if !is_valid_email(&contact.email) {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    Ok(())
}

fn persist(state: &Arc<AppState>, session: &BookingSession) -> Result<(), AppError> {
    let conn = state.db.lock().unwrap();
    queries::save_booking(&conn, session)
}

/// Append the issued PNR to the logged-in user's stored booking list, if a
/// session user exists. Anonymous bookings still issue a ticket.
fn record_user_booking(conn: &rusqlite::Connection, pnr: &str) -> Result<(), AppError> {
    let Some(session_user) = queries::get_current_user(conn)? else {
        return Ok(());
    };
    let mut users = queries::get_users(conn)?;
    if let Some(user) = users.iter_mut().find(|u| u.id == session_user.id) {
        user.bookings.push(pnr.to_string());
        queries::save_users(conn, &users)?;
    }
    Ok(())
}

pub fn generate_pnr() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..10)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

fn command_name(command: &BookingCommand) -> &'static str {
    match command {
        BookingCommand::Search { .. } => "search",
        BookingCommand::SelectTrain { .. } => "select_train",
        BookingCommand::AddPassengers { .. } => "add_passengers",
        BookingCommand::AddFood { .. } => "add_food",
        BookingCommand::RemoveFood { .. } => "remove_food",
        BookingCommand::SkipFood => "skip_food",
        BookingCommand::ProceedToPayment => "proceed_to_payment",
        BookingCommand::Pay { .. } => "pay",
        BookingCommand::Reset => "reset",
    }
}
