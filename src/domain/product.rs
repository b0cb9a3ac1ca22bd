//! Product facts supplied by the hosting page

use serde::{Deserialize, Serialize};

/// What the host knows about a product when the booking view opens.
///
/// The booking core never fetches product metadata itself; the hosting
/// page passes these in and owns keeping them current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Marketplace product ID.
    pub id: i64,
    /// Total units the marketplace holds. `None` means the listing did
    /// not report a stock figure.
    pub stock: Option<i64>,
    /// Rental price per unit per day, in minor units (e.g. cents).
    pub unit_price_minor: i64,
    /// ISO 4217 currency code, display only.
    pub currency: String,
}

impl ProductSnapshot {
    pub fn new(id: i64, stock: i64, unit_price_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            id,
            stock: Some(stock),
            unit_price_minor,
            currency: currency.into(),
        }
    }

    /// Stock figure used for availability math.
    ///
    /// Unknown or negative stock counts as zero so the calendar shows
    /// nothing bookable instead of guessing.
    pub fn effective_stock(&self) -> i64 {
        self.stock.map_or(0, |s| s.max(0))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_stock_passes_through_known_stock() {
        let p = ProductSnapshot::new(7, 5, 1500, "EUR");
        assert_eq!(p.effective_stock(), 5);
    }

    #[test]
    fn missing_stock_counts_as_zero() {
        let p = ProductSnapshot {
            id: 7,
            stock: None,
            unit_price_minor: 1500,
            currency: "EUR".into(),
        };
        assert_eq!(p.effective_stock(), 0);
    }

    #[test]
    fn negative_stock_counts_as_zero() {
        let p = ProductSnapshot::new(7, -3, 1500, "EUR");
        assert_eq!(p.effective_stock(), 0);
    }
}
