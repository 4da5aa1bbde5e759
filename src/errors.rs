#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("invalid email/mobile or password")]
    InvalidCredentials,

    #[error("a user with this email or mobile number already exists")]
    UserExists,

    #[error("no trains available for this route on the selected date")]
    NoTrainsFound,

    #[error("no booking in progress at the {0} stage")]
    WrongStage(&'static str),

    #[error("payment failed: {0}")]
    Payment(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}
