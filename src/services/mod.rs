pub mod auth;
pub mod booking;
pub mod matching;
pub mod payment;
pub mod reference;
