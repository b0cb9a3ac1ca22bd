//! Rental price calculation

use crate::domain::date_range::DateRange;
use crate::domain::product::ProductSnapshot;

/// Price breakdown for a selected range.
///
/// All amounts are in the smallest currency unit (e.g. cents); the
/// backend receives exactly the integer the user saw quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Billed days, counting both endpoints. Zero while the selection
    /// is still partial.
    pub duration_days: i64,
    pub quantity: i64,
    /// Price per unit per day (smallest currency unit).
    pub unit_price_minor: i64,
    /// `unit_price * quantity * duration_days` (smallest currency unit).
    pub subtotal_minor: i64,
    /// Currency code (ISO 4217)
    pub currency: String,
}

impl Quote {
    /// Quote a selection as it stands.
    ///
    /// A partial selection (no completed range yet) yields a zero quote
    /// rather than an error: prices are read reactively while the user
    /// is still clicking.
    pub fn for_selection(
        selection: Option<DateRange>,
        product: &ProductSnapshot,
        quantity: i64,
    ) -> Self {
        match selection {
            Some(range) => {
                let duration_days = range.num_days();
                Self {
                    duration_days,
                    quantity,
                    unit_price_minor: product.unit_price_minor,
                    subtotal_minor: product.unit_price_minor * quantity * duration_days,
                    currency: product.currency.clone(),
                }
            }
            None => Self {
                duration_days: 0,
                quantity,
                unit_price_minor: product.unit_price_minor,
                subtotal_minor: 0,
                currency: product.currency.clone(),
            },
        }
    }

    /// Format the subtotal as a human-readable string
    pub fn format_subtotal(&self) -> String {
        format_amount(self.subtotal_minor, &self.currency)
    }
}

/// Format a minor-unit amount as `major.minor CUR`.
pub fn format_amount(amount_minor: i64, currency: &str) -> String {
    let major = amount_minor / 100;
    let minor = amount_minor % 100;
    format!("{}.{:02} {}", major, minor, currency)
}

// ── Tests ──────────────────────────────────────────────────────
