//! Receipt data returned by the scanning services.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Decimal;

/// Largest tolerated gap between `subtotal + tax + tip` and `total`.
pub const TOTAL_TOLERANCE: &str = "0.01";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price.
    pub price: Decimal,
    /// Line total.
    pub total: Decimal,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub tip: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

impl ReceiptData {
    /// Make `total` agree with `subtotal + tax + tip`.
    ///
    /// Returns true when the total was corrected.
    pub fn reconcile_totals(&mut self) -> bool {
        let tolerance = Decimal::from_str_canonical(TOTAL_TOLERANCE).unwrap_or_default();
        let computed = self.subtotal + self.tax + self.tip;
        if (computed - self.total).abs() > tolerance {
            warn!(
                "Receipt total mismatch for {}: computed {} vs reported {}, using computed",
                self.merchant, computed, self.total
            );
            self.total = computed;
            return true;
        }
        false
    }

    /// Static receipt served when every scanner failed.
    pub fn demo(date: String) -> Self {
        let d = |s: &str| Decimal::from_str_canonical(s).unwrap_or_default();
        ReceiptData {
            merchant: "Demo Restaurant".to_string(),
            date,
            items: vec![
                ReceiptItem {
                    name: "Classic Burger".to_string(),
                    quantity: 1,
                    price: d("12.99"),
                    total: d("12.99"),
                },
                ReceiptItem {
                    name: "French Fries".to_string(),
                    quantity: 2,
                    price: d("3.99"),
                    total: d("7.98"),
                },
                ReceiptItem {
                    name: "Soft Drink".to_string(),
                    quantity: 2,
                    price: d("2.49"),
                    total: d("4.98"),
                },
                ReceiptItem {
                    name: "Garden Salad".to_string(),
                    quantity: 1,
                    price: d("8.99"),
                    total: d("8.99"),
                },
            ],
            subtotal: d("34.94"),
            tax: d("3.15"),
            tip: d("5.00"),
            total: d("43.09"),
        }
    }
}
