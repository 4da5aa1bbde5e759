use serde::{Deserialize, Serialize};

/// An entry on the onboard catering menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMenuItem {
    pub id: String,
    pub name: String,
    pub price: u32,
    pub category: String,
    pub dietary: String,
}

/// A menu item plus quantity inside a booking. Items with quantity zero are
/// dropped from the basket rather than kept around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub price: u32,
    pub quantity: u32,
}

impl FoodItem {
    pub fn line_total(&self) -> u32 {
        self.price * self.quantity
    }
}

impl From<&FoodMenuItem> for FoodItem {
    fn from(item: &FoodMenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
        }
    }
}

fn item(id: &str, name: &str, price: u32, category: &str, dietary: &str) -> FoodMenuItem {
    FoodMenuItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        category: category.to_string(),
        dietary: dietary.to_string(),
    }
}

/// Built-in catering menu, offered on the food-selection stage.
pub fn food_menu() -> Vec<FoodMenuItem> {
    vec![
        item("brk-1", "Masala Omelette with Bread", 80, "Breakfast", "non-veg"),
        item("brk-2", "Poha with Sev", 50, "Breakfast", "veg"),
        item("brk-3", "Idli Sambar", 60, "Breakfast", "veg"),
        item("mls-1", "Veg Thali", 150, "Meals", "veg"),
        item("mls-2", "Chicken Biryani", 180, "Meals", "non-veg"),
        item("mls-3", "Dal Khichdi", 110, "Meals", "veg"),
        item("snk-1", "Samosa (2 pcs)", 30, "Snacks", "veg"),
        item("snk-2", "Veg Cutlet Sandwich", 45, "Snacks", "veg"),
        item("bvg-1", "Masala Chai", 15, "Beverages", "veg"),
        item("bvg-2", "Filter Coffee", 20, "Beverages", "veg"),
    ]
}
