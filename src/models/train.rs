use serde::{Deserialize, Serialize};

/// One train record from the trains resource. Field names follow the
/// published JSON (`trainNumber`, `departureTime`, ...). Reference data is
/// immutable; seat counts are never decremented by a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub train_number: String,
    pub train_name: String,
    #[serde(rename = "type")]
    pub train_type: String,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub distance: String,
    /// Service days as three-letter abbreviations (`Mon`..`Sun`), or the
    /// literal `"Daily"`. An empty list is treated as running daily.
    pub days: Vec<String>,
    pub classes: Vec<FareClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareClass {
    #[serde(rename = "class")]
    pub code: String,
    pub name: String,
    pub fare: u32,
    pub available: u32,
}

impl Train {
    pub fn class(&self, code: &str) -> Option<&FareClass> {
        self.classes.iter().find(|c| c.code == code)
    }
}
