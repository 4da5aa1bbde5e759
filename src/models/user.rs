use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub bookings: Vec<String>,
}

/// The session marker written to storage. The password is stripped before
/// the record leaves the user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub created_at: NaiveDateTime,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            mobile: user.mobile.clone(),
            created_at: user.created_at,
        }
    }
}
