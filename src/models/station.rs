use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: String,
}

impl Station {
    fn new(code: &str, name: &str, city: &str, state: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }
}

/// Built-in station list, used when the stations resource cannot be fetched
/// and no cached copy exists.
pub fn default_stations() -> Vec<Station> {
    vec![
        Station::new("NDLS", "New Delhi", "Delhi", "Delhi"),
        Station::new("BCT", "Mumbai Central", "Mumbai", "Maharashtra"),
        Station::new("HWH", "Howrah Junction", "Kolkata", "West Bengal"),
        Station::new("MAS", "Chennai Central", "Chennai", "Tamil Nadu"),
        Station::new("SBC", "KSR Bengaluru", "Bengaluru", "Karnataka"),
        Station::new("ADI", "Ahmedabad Junction", "Ahmedabad", "Gujarat"),
        Station::new("GHY", "Guwahati", "Guwahati", "Assam"),
        Station::new("PNBE", "Patna Junction", "Patna", "Bihar"),
        Station::new("JAT", "Jammu Tawi", "Jammu", "Jammu & Kashmir"),
        Station::new("DBRG", "Dibrugarh", "Dibrugarh", "Assam"),
        Station::new("JP", "Jaipur Junction", "Jaipur", "Rajasthan"),
        Station::new("LKO", "Lucknow", "Lucknow", "Uttar Pradesh"),
        Station::new("HYB", "Hyderabad", "Hyderabad", "Telangana"),
        Station::new("MMCT", "Mumbai Central", "Mumbai", "Maharashtra"),
        Station::new("VSKP", "Visakhapatnam", "Visakhapatnam", "Andhra Pradesh"),
        Station::new("CDG", "Chandigarh", "Chandigarh", "Chandigarh"),
        Station::new("BGP", "Bhagalpur", "Bhagalpur", "Bihar"),
        Station::new("RNC", "Ranchi", "Ranchi", "Jharkhand"),
        Station::new("BBS", "Bhubaneswar", "Bhubaneswar", "Odisha"),
        Station::new("ALD", "Allahabad", "Prayagraj", "Uttar Pradesh"),
        Station::new("PUNE", "Pune Junction", "Pune", "Maharashtra"),
        Station::new("KOAA", "Kolkata", "Kolkata", "West Bengal"),
        Station::new("CBE", "Coimbatore", "Coimbatore", "Tamil Nadu"),
        Station::new("MYS", "Mysuru Junction", "Mysuru", "Karnataka"),
        Station::new("AMD", "Ahmedabad", "Ahmedabad", "Gujarat"),
    ]
}
