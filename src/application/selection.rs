//! Two-click date range selection

use chrono::NaiveDate;

use super::availability::AvailabilityIndex;
use crate::domain::date_range::DateRange;
use crate::domain::error::SelectionError;

/// Which click the selector expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    AwaitingStart,
    AwaitingEnd,
}

/// What a successful click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Start day chosen; the selector now waits for the end day.
    StartSet(NaiveDate),
    /// Range completed; the next click begins a fresh selection.
    RangeCompleted(DateRange),
}

/// The end day only exists inside a completed range, so a half-open
/// selection cannot carry one by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingStart { completed: Option<DateRange> },
    AwaitingEnd { start: NaiveDate },
}

/// Builds a date range from two day clicks, validated live against an
/// availability index.
///
/// Rejected clicks never change state. A completed range is kept until
/// the next start click, a quantity change, or an explicit reset, so
/// the caller can keep rendering and pricing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelector {
    quantity: i64,
    state: State,
}

impl RangeSelector {
    pub fn new(quantity: i64) -> Self {
        Self {
            quantity,
            state: State::AwaitingStart { completed: None },
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        match self.state {
            State::AwaitingStart { .. } => SelectionPhase::AwaitingStart,
            State::AwaitingEnd { .. } => SelectionPhase::AwaitingEnd,
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn start(&self) -> Option<NaiveDate> {
        match self.state {
            State::AwaitingStart { completed } => completed.map(|r| r.start),
            State::AwaitingEnd { start } => Some(start),
        }
    }

    pub fn end(&self) -> Option<NaiveDate> {
        match self.state {
            State::AwaitingStart { completed } => completed.map(|r| r.end),
            State::AwaitingEnd { .. } => None,
        }
    }

    /// The selected range once both clicks landed.
    pub fn completed_range(&self) -> Option<DateRange> {
        match self.state {
            State::AwaitingStart { completed } => completed,
            State::AwaitingEnd { .. } => None,
        }
    }

    /// Clear any selection and wait for a start click.
    pub fn reset(&mut self) {
        self.state = State::AwaitingStart { completed: None };
    }

    /// Change the desired quantity.
    ///
    /// A different value clears the selection, since days that absorbed
    /// the old quantity may not absorb the new one. Returns whether a
    /// selection was discarded.
    pub fn set_quantity(&mut self, quantity: i64) -> bool {
        if quantity == self.quantity {
            return false;
        }
        self.quantity = quantity;
        let had_selection = self.start().is_some();
        self.reset();
        had_selection
    }

    /// Whether `day` would be accepted as a start click right now.
    ///
    /// Mirrors the click validation without mutating, for calendars that
    /// gray out unavailable days.
    pub fn can_start_at(&self, day: NaiveDate, index: &AvailabilityIndex) -> bool {
        self.validate_day(day, index).is_ok()
    }

    /// Feed one day click into the selector.
    pub fn click(
        &mut self,
        day: NaiveDate,
        index: &AvailabilityIndex,
    ) -> Result<ClickOutcome, SelectionError> {
        match self.state {
            State::AwaitingStart { .. } => {
                self.validate_day(day, index)?;
                self.state = State::AwaitingEnd { start: day };
                Ok(ClickOutcome::StartSet(day))
            }
            State::AwaitingEnd { start } => {
                let Some(range) = DateRange::new(start, day) else {
                    return Err(SelectionError::EndBeforeStart { start, end: day });
                };
                if let Some((date, remaining)) = index.first_shortfall(range, self.quantity) {
                    return Err(SelectionError::RangeUnavailable {
                        date,
                        remaining,
                        requested: self.quantity,
                    });
                }
                self.state = State::AwaitingStart {
                    completed: Some(range),
                };
                Ok(ClickOutcome::RangeCompleted(range))
            }
        }
    }

    fn validate_day(&self, day: NaiveDate, index: &AvailabilityIndex) -> Result<(), SelectionError> {
        let window = index.window();
        if day < window.start {
            return Err(SelectionError::DayInPast(day));
        }
        let Some(remaining) = index.remaining(day) else {
            return Err(SelectionError::OutsideWindow(day));
        };
        if remaining < self.quantity {
            return Err(SelectionError::DayUnavailable {
                date: day,
                remaining,
                requested: self.quantity,
            });
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────
