use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Scope;
use crate::errors::AppError;
use crate::models::{BookingSession, SessionUser, Station, Train, User};

const KEY_USERS: &str = "users";
const KEY_STATIONS: &str = "stations";
const KEY_TRAINS: &str = "trains";
const KEY_CURRENT_USER: &str = "current_user";
const KEY_REMEMBERED_EMAIL: &str = "remembered_email";
const KEY_BOOKING: &str = "booking";

// ── Generic blob access ──

fn get_blob<T: DeserializeOwned>(
    conn: &Connection,
    scope: Scope,
    key: &str,
) -> Result<Option<T>, AppError> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM kv WHERE scope = ?1 AND key = ?2",
            params![scope.as_str(), key],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn set_blob<T: Serialize>(
    conn: &Connection,
    scope: Scope,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO kv (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(scope, key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![scope.as_str(), key, json, now],
    )?;
    Ok(())
}

fn remove_blob(conn: &Connection, scope: Scope, key: &str) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM kv WHERE scope = ?1 AND key = ?2",
        params![scope.as_str(), key],
    )?;
    Ok(())
}

// ── Users ──

pub fn get_users(conn: &Connection) -> Result<Vec<User>, AppError> {
    Ok(get_blob(conn, Scope::Persistent, KEY_USERS)?.unwrap_or_default())
}

pub fn save_users(conn: &Connection, users: &[User]) -> Result<(), AppError> {
    set_blob(conn, Scope::Persistent, KEY_USERS, &users)
}

// ── Reference data cache ──

pub fn get_stations(conn: &Connection) -> Result<Option<Vec<Station>>, AppError> {
    get_blob(conn, Scope::Persistent, KEY_STATIONS)
}

pub fn save_stations(conn: &Connection, stations: &[Station]) -> Result<(), AppError> {
    set_blob(conn, Scope::Persistent, KEY_STATIONS, &stations)
}

pub fn get_trains(conn: &Connection) -> Result<Option<Vec<Train>>, AppError> {
    get_blob(conn, Scope::Persistent, KEY_TRAINS)
}

pub fn save_trains(conn: &Connection, trains: &[Train]) -> Result<(), AppError> {
    set_blob(conn, Scope::Persistent, KEY_TRAINS, &trains)
}

// ── Session user ──

pub fn save_current_user(
    conn: &Connection,
    user: &SessionUser,
    persist: bool,
) -> Result<(), AppError> {
    let scope = if persist { Scope::Persistent } else { Scope::Session };
    set_blob(conn, scope, KEY_CURRENT_USER, user)
}

/// Persistent scope shadows session scope, matching the original's
/// local-then-session lookup order.
pub fn get_current_user(conn: &Connection) -> Result<Option<SessionUser>, AppError> {
    if let Some(user) = get_blob(conn, Scope::Persistent, KEY_CURRENT_USER)? {
        return Ok(Some(user));
    }
    get_blob(conn, Scope::Session, KEY_CURRENT_USER)
}

pub fn clear_current_user(conn: &Connection) -> Result<(), AppError> {
    remove_blob(conn, Scope::Persistent, KEY_CURRENT_USER)?;
    remove_blob(conn, Scope::Session, KEY_CURRENT_USER)
}

// ── Remembered login email ──

pub fn get_remembered_email(conn: &Connection) -> Result<Option<String>, AppError> {
    get_blob(conn, Scope::Persistent, KEY_REMEMBERED_EMAIL)
}

pub fn save_remembered_email(conn: &Connection, email: &str) -> Result<(), AppError> {
    set_blob(conn, Scope::Persistent, KEY_REMEMBERED_EMAIL, &email)
}

pub fn clear_remembered_email(conn: &Connection) -> Result<(), AppError> {
    remove_blob(conn, Scope::Persistent, KEY_REMEMBERED_EMAIL)
}

// ── Booking record ──

pub fn get_booking(conn: &Connection) -> Result<Option<BookingSession>, AppError> {
    get_blob(conn, Scope::Persistent, KEY_BOOKING)
}

pub fn save_booking(conn: &Connection, session: &BookingSession) -> Result<(), AppError> {
    set_blob(conn, Scope::Persistent, KEY_BOOKING, session)
}

pub fn clear_booking(conn: &Connection) -> Result<(), AppError> {
    remove_blob(conn, Scope::Persistent, KEY_BOOKING)
}
