use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::calc::list_query::{Listable, SortValue};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "name": "Milk cans 40L",
        "unit": "pcs",
        "quantity": 35.0,
        "reorder_level": 50.0,
        "unit_price": 8500.0,
        "supplier": "Lanka Steel Works"
    })
)]
pub struct RawMaterial {
    pub id: u64,
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub reorder_level: f64,
    pub unit_price: f64,
    #[schema(nullable = true)]
    pub supplier: Option<String>,
}

impl RawMaterial {
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn stock_value(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

impl Listable for RawMaterial {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.unit.as_str()];
        if let Some(supplier) = &self.supplier {
            fields.push(supplier.as_str());
        }
        fields
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "name" => Some(SortValue::Text(self.name.clone())),
            "quantity" => Some(SortValue::Number(self.quantity)),
            "reorder_level" => Some(SortValue::Number(self.reorder_level)),
            "unit_price" => Some(SortValue::Number(self.unit_price)),
            "stock_value" => Some(SortValue::Number(self.stock_value())),
            "supplier" => self.supplier.clone().map(SortValue::Text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(quantity: f64, reorder_level: f64) -> RawMaterial {
        RawMaterial {
            id: 1,
            name: "Rennet".to_string(),
            unit: "kg".to_string(),
            quantity,
            reorder_level,
            unit_price: 1200.0,
            supplier: None,
        }
    }

    #[test]
    fn reorder_threshold_is_inclusive() {
        assert!(material(10.0, 10.0).needs_reorder());
        assert!(material(9.5, 10.0).needs_reorder());
        assert!(!material(10.5, 10.0).needs_reorder());
    }

    #[test]
    fn stock_value_and_supplier_search() {
        let mut m = material(2.5, 1.0);
        assert_eq!(m.stock_value(), 3000.0);
        assert_eq!(m.search_fields(), ["Rennet", "kg"]);
        m.supplier = Some("Hayleys".to_string());
        assert_eq!(m.search_fields().len(), 3);
        assert!(m.sort_value("supplier").is_some());
    }
}
