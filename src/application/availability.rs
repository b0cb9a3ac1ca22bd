//! Per-day remaining-stock index

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};

use crate::domain::date_range::DateRange;
use crate::domain::product::ProductSnapshot;
use crate::domain::reservation::Reservation;

/// Months covered by the index when the caller does not choose.
pub const DEFAULT_WINDOW_MONTHS: u32 = 6;

/// Bookable window starting at `start`, `months` whole months long.
pub fn booking_window(start: NaiveDate, months: u32) -> DateRange {
    let end = start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX);
    DateRange { start, end }
}

/// Dense per-day availability over a bookable window.
///
/// Rebuilt wholesale every time the reservation list changes; never
/// patched incrementally, so there is no partial state to reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityIndex {
    window: DateRange,
    remaining: BTreeMap<NaiveDate, i64>,
}

impl AvailabilityIndex {
    /// Fold the reservation list into a date → remaining map.
    ///
    /// Every window day starts at `stock`; each reservation subtracts its
    /// quantity from the in-window days it covers. Values are allowed to
    /// go negative: reservations exceeding stock signal an upstream data
    /// inconsistency, and clamping would hide it from tests and logs.
    pub fn build(stock: i64, reservations: &[Reservation], window: DateRange) -> Self {
        let mut remaining: BTreeMap<NaiveDate, i64> =
            window.days().map(|day| (day, stock)).collect();

        for reservation in reservations {
            let Some(covered) = reservation.period.intersect(&window) else {
                continue;
            };
            for day in covered.days() {
                if let Some(entry) = remaining.get_mut(&day) {
                    *entry -= reservation.quantity;
                }
            }
        }

        Self { window, remaining }
    }

    /// Build for a product as the booking view sees it.
    ///
    /// Applies the two policies the raw fold leaves to its callers:
    /// unknown stock counts as zero, and only stock-holding reservations
    /// (pending or confirmed) reduce availability.
    pub fn for_product(
        product: &ProductSnapshot,
        reservations: &[Reservation],
        today: NaiveDate,
        window_months: u32,
    ) -> Self {
        let holding: Vec<Reservation> = reservations
            .iter()
            .filter(|r| r.holds_stock())
            .cloned()
            .collect();
        Self::build(
            product.effective_stock(),
            &holding,
            booking_window(today, window_months),
        )
    }

    pub fn window(&self) -> DateRange {
        self.window
    }

    /// Remaining units on `day`, or `None` outside the window.
    pub fn remaining(&self, day: NaiveDate) -> Option<i64> {
        self.remaining.get(&day).copied()
    }

    /// Whether `day` can absorb `quantity` more units.
    pub fn can_accommodate(&self, day: NaiveDate, quantity: i64) -> bool {
        self.remaining(day).is_some_and(|left| left >= quantity)
    }

    /// First day in `range` that cannot absorb `quantity`, with what is
    /// left there. Days without an index entry count as zero remaining.
    pub fn first_shortfall(&self, range: DateRange, quantity: i64) -> Option<(NaiveDate, i64)> {
        range.days().find_map(|day| {
            let left = self.remaining(day).unwrap_or(0);
            (left < quantity).then_some((day, left))
        })
    }

    /// Whether every day in `range` can absorb `quantity` more units.
    pub fn range_available(&self, range: DateRange, quantity: i64) -> bool {
        self.first_shortfall(range, quantity).is_none()
    }

    /// All window days with their remaining units, in calendar order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, i64)> + '_ {
        self.remaining.iter().map(|(day, left)| (*day, *left))
    }
}

// ── Tests ──────────────────────────────────────────────────────
