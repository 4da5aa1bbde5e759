use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::Train;

/// Three-letter weekday code used in train day-sets. Dates carry naive local
/// semantics, as in the original.
pub fn day_abbrev(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Trains running `from` -> `to` on the given date. A train qualifies when
/// both station codes match exactly and its day-set is empty (treated as
/// running daily), contains "Daily", or contains the date's weekday code.
pub fn find_trains(trains: &[Train], from: &str, to: &str, date: NaiveDate) -> Vec<Train> {
    let day = day_abbrev(date);
    trains
        .iter()
        .filter(|train| train.from == from && train.to == to && runs_on(train, day))
        .cloned()
        .collect()
}

fn runs_on(train: &Train, day: &str) -> bool {
    train.days.is_empty()
        || train.days.iter().any(|d| d == "Daily")
        || train.days.iter().any(|d| d == day)
}
