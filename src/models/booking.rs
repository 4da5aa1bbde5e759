use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::food::FoodItem;
use super::train::{FareClass, Train};

/// The single in-progress booking record, persisted as a whole after every
/// stage transition. The `stage` tag makes the stage order structural: no
/// variant carries a later stage's fields without all earlier ones, and a
/// partial or hand-edited record fails to deserialize instead of passing
/// through. "Searching" is simply the absence of a persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum BookingSession {
    Selecting {
        journey: Journey,
        matches: Vec<Train>,
    },
    EnteringPassengers {
        journey: Journey,
        choice: TrainChoice,
    },
    SelectingFood {
        journey: Journey,
        choice: TrainChoice,
        manifest: Manifest,
        food: Vec<FoodItem>,
    },
    Paying {
        journey: Journey,
        choice: TrainChoice,
        manifest: Manifest,
        food: Vec<FoodItem>,
    },
    Issued(Ticket),
}

impl BookingSession {
    pub fn stage_name(&self) -> &'static str {
        match self {
            BookingSession::Selecting { .. } => "selecting",
            BookingSession::EnteringPassengers { .. } => "entering_passengers",
            BookingSession::SelectingFood { .. } => "selecting_food",
            BookingSession::Paying { .. } => "paying",
            BookingSession::Issued(_) => "issued",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub quota: String,
}

/// The train and fare class picked on the selection stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainChoice {
    pub train: Train,
    pub class: FareClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub passengers: Vec<Passenger>,
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub berth: BerthPreference,
    /// Fare discount flag, eligible when age >= 60. Never applied to the
    /// fare amount itself.
    #[serde(default)]
    pub concession: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub mobile: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BerthPreference {
    Lower,
    Middle,
    Upper,
    #[serde(rename = "Side Lower")]
    SideLower,
    #[serde(rename = "Side Upper")]
    SideUpper,
    #[serde(rename = "No Preference")]
    NoPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Card,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Net Banking")]
    NetBanking,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "Net Banking",
            PaymentMethod::Wallet => "Wallet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    /// Opaque payment-info string (card / UPI handle). Not validated for
    /// real-world correctness.
    pub info: String,
}

/// The terminal record: everything accumulated across the stages plus the
/// issued PNR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub journey: Journey,
    pub choice: TrainChoice,
    pub manifest: Manifest,
    pub food: Vec<FoodItem>,
    pub payment: Payment,
    pub pnr: String,
    pub booked_at: NaiveDateTime,
}

impl Ticket {
    /// Per-class fare times passenger count. Concession flags never change
    /// the amount.
    pub fn ticket_total(&self) -> u32 {
        self.choice.class.fare * self.manifest.passengers.len() as u32
    }

    pub fn food_total(&self) -> u32 {
        self.food.iter().map(FoodItem::line_total).sum()
    }

    pub fn grand_total(&self) -> u32 {
        self.ticket_total() + self.food_total()
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PNR: {}", self.pnr)?;
        writeln!(
            f,
            "{} -> {} on {} ({} quota)",
            self.journey.from, self.journey.to, self.journey.date, self.journey.quota
        )?;
        writeln!(
            f,
            "{} ({}) {} dep {} arr {}",
            self.choice.train.train_name,
            self.choice.train.train_number,
            self.choice.class.name,
            self.choice.train.departure_time,
            self.choice.train.arrival_time,
        )?;
        for p in &self.manifest.passengers {
            writeln!(
                f,
                "  {} ({}, {:?}, {:?}{})",
                p.name,
                p.age,
                p.gender,
                p.berth,
                if p.concession { ", concession" } else { "" }
            )?;
        }
        for item in &self.food {
            writeln!(f, "  {} x{} = {}", item.name, item.quantity, item.line_total())?;
        }
        write!(
            f,
            "Total: {} (paid by {})",
            self.grand_total(),
            self.payment.method.as_str()
        )
    }
}
