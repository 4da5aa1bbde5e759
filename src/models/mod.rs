pub mod booking;
pub mod food;
pub mod station;
pub mod train;
pub mod user;

pub use booking::{
    BerthPreference, BookingSession, Contact, Gender, Journey, Manifest, Passenger, Payment,
    PaymentMethod, Ticket, TrainChoice,
};
pub use food::{FoodItem, FoodMenuItem};
pub use station::Station;
pub use train::{FareClass, Train};
pub use user::{SessionUser, User};
