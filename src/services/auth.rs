use std::sync::LazyLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{SessionUser, User};
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

// Signup requires an Indian mobile number; booking contact numbers are looser.
static SIGNUP_MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("valid regex"));

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Scan the union of preloaded and stored users for an exact identifier plus
/// password match. The identifier may be either the email or the mobile.
/// First match wins, preloaded users first, so a preloaded duplicate shadows
/// a stored one.
pub fn find_user<'a>(
    preloaded: &'a [User],
    stored: &'a [User],
    identifier: &str,
    password: &str,
) -> Option<&'a User> {
    preloaded
        .iter()
        .chain(stored.iter())
        .find(|user| {
            (user.email == identifier || user.mobile == identifier) && user.password == password
        })
}

/// True if any known user already holds this email OR this mobile; either
/// collision alone blocks a signup.
pub fn user_exists(preloaded: &[User], stored: &[User], email: &str, mobile: &str) -> bool {
    preloaded
        .iter()
        .chain(stored.iter())
        .any(|user| user.email == email || user.mobile == mobile)
}

/// Identifier is current millis plus a random base-36 suffix; collisions are
/// treated as negligible and not checked.
pub fn create_user(name: &str, email: &str, mobile: &str, password: &str) -> User {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    User {
        id: format!("user_{}_{}", Utc::now().timestamp_millis(), suffix),
        name: name.to_string(),
        email: email.to_string(),
        mobile: mobile.to_string(),
        password: password.to_string(),
        created_at: Utc::now().naive_utc(),
        bookings: Vec::new(),
    }
}

/// Write the session marker, stripped of the password, to the persistent
/// scope when `persist` is set, else to the session scope. The other scope is
/// left alone; a stale copy there is cleared only by an explicit logout.
pub fn start_session(
    conn: &Connection,
    user: &User,
    persist: bool,
) -> Result<SessionUser, AppError> {
    let session = SessionUser::from(user);
    queries::save_current_user(conn, &session, persist)?;
    Ok(session)
}

pub fn current_user(conn: &Connection) -> Result<Option<SessionUser>, AppError> {
    queries::get_current_user(conn)
}

/// Clears both scopes. Returning to the landing stage is the caller's
/// concern.
pub fn end_session(conn: &Connection) -> Result<(), AppError> {
    queries::clear_current_user(conn)
}

pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

pub fn signup(state: &AppState, input: SignupInput) -> Result<User, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Please enter your full name"));
    }
    if name.len() < 2 {
        return Err(AppError::validation("Name must be at least 2 characters"));
    }
    if input.email.is_empty() {
        return Err(AppError::validation("Please enter email address"));
    }
    if !is_valid_email(&input.email) {
        return Err(AppError::validation(
            "Please enter a valid email address (e.g., user@example.com)",
        ));
    }
    if input.mobile.is_empty() {
        return Err(AppError::validation("Please enter mobile number"));
    }
    if !SIGNUP_MOBILE_RE.is_match(&input.mobile) {
        return Err(AppError::validation(
            "Please enter a valid 10-digit mobile number",
        ));
    }
    if input.password.len() < 6 {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let conn = state.db.lock().unwrap();
    let mut stored = queries::get_users(&conn)?;

    if user_exists(&state.preloaded_users, &stored, &input.email, &input.mobile) {
        return Err(AppError::UserExists);
    }

    let user = create_user(name, &input.email, &input.mobile, &input.password);
    tracing::info!(user_id = %user.id, "created user");
    stored.push(user.clone());
    queries::save_users(&conn, &stored)?;
    Ok(user)
}

/// Credential check plus session start. `remember` selects the persistent
/// scope and keeps the entered identifier under the remembered-email key.
/// "User not found" and "wrong password" collapse into one failure.
pub fn login(
    state: &AppState,
    identifier: &str,
    password: &str,
    remember: bool,
) -> Result<SessionUser, AppError> {
    if identifier.is_empty() {
        return Err(AppError::validation("Please enter email or mobile number"));
    }
    if password.is_empty() {
        return Err(AppError::validation("Please enter password"));
    }
    if password.len() < 6 {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let conn = state.db.lock().unwrap();
    let stored = queries::get_users(&conn)?;

    let user = find_user(&state.preloaded_users, &stored, identifier, password)
        .ok_or(AppError::InvalidCredentials)?
        .clone();

    if remember {
        queries::save_remembered_email(&conn, identifier)?;
    } else {
        queries::clear_remembered_email(&conn)?;
    }

    let session = start_session(&conn, &user, remember)?;
    tracing::info!(user_id = %user.id, persist = remember, "session started");
    Ok(session)
}
