use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Body of the add-item request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl NewItem {
    /// Checks the fields a custom item needs before it is submitted.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("item name is required".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("item category is required".to_string());
        }
        if self.unit_price <= Decimal::ZERO {
            return Err("unit price must be greater than zero".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewItem {
        NewItem {
            name: "Caipirinha".to_string(),
            category: "drinks".to_string(),
            unit_price: Decimal::new(1850, 2),
            quantity: 2,
        }
    }

    #[test]
    fn complete_draft_is_valid() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let blank_name = NewItem { name: "   ".to_string(), ..draft() };
        assert_eq!(blank_name.validate().unwrap_err(), "item name is required");

        let no_category = NewItem { category: String::new(), ..draft() };
        assert!(no_category.validate().is_err());

        let free = NewItem { unit_price: Decimal::ZERO, ..draft() };
        assert!(free.validate().is_err());

        let none = NewItem { quantity: 0, ..draft() };
        assert!(none.validate().is_err());
    }

    #[test]
    fn subtotal_multiplies_price_by_quantity() {
        let item = LineItem {
            id: 1,
            name: "Pastel".to_string(),
            category: "food".to_string(),
            unit_price: Decimal::new(725, 2),
            quantity: 3,
        };
        assert_eq!(item.subtotal(), Decimal::new(2175, 2));
    }
}
