//! Period-boundary calculator for recurring benefits.

use jiff::civil::Date;

use crate::date_math::{date_with_day_clamped, days_between};
use crate::model::{Frequency, ResetType};

/// A derived view over a recurring benefit's cycle fields. Answers "when
/// does the current period end" and "has it already ended" for an
/// injected reference date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiryCycle {
    frequency: Frequency,
    reset_type: ResetType,
    last_reset: Date,
    anniversary: Date,
}

impl ExpiryCycle {
    pub fn new(frequency: Frequency, reset_type: ResetType, last_reset: Date, anniversary: Date) -> Self {
        Self {
            frequency,
            reset_type,
            last_reset,
            anniversary,
        }
    }

    /// The period boundary governing `reference`.
    ///
    /// Starts at the first boundary strictly after `last_reset`, then
    /// catches up across skipped periods: while the boundary after the
    /// current one is still on/before `reference`, advance to it. The
    /// result is the most recent elapsed boundary once any boundary has
    /// passed, else the first upcoming boundary. Idempotent for a fixed
    /// `last_reset`, monotonic non-decreasing in `reference`, and
    /// O(periods skipped).
    pub fn next_reset_date(&self, reference: Date) -> Date {
        let mut boundary = self.boundary_after(self.last_reset);
        loop {
            let following = self.boundary_after(boundary);
            if following > reference {
                return boundary;
            }
            boundary = following;
        }
    }

    /// True once a period boundary has passed without a reset.
    pub fn is_expired(&self, reference: Date) -> bool {
        self.next_reset_date(reference) <= reference
    }

    /// Days from `reference` to the governing boundary. Zero or negative
    /// once expired.
    pub fn days_until_reset(&self, reference: Date) -> i32 {
        days_between(reference, self.next_reset_date(reference))
    }

    /// True when the boundary is strictly after `reference` and within
    /// `days` of it. Used for "expiring soon" surfacing.
    pub fn resets_within(&self, reference: Date, days: i32) -> bool {
        let boundary = self.next_reset_date(reference);
        boundary > reference && days_between(reference, boundary) <= days
    }

    /// The first boundary strictly after `after`.
    fn boundary_after(&self, after: Date) -> Date {
        match self.reset_type {
            ResetType::Calendar => self.calendar_boundary_after(after),
            ResetType::Anniversary => self.anniversary_boundary_after(after),
        }
    }

    /// Calendar buckets: the first day of the next monthly/quarterly/
    /// biannual/annual bucket; the 4-year cadence jumps to Jan 1 four
    /// years on.
    fn calendar_boundary_after(&self, after: Date) -> Date {
        match self.frequency.period_months() {
            Some(period) => {
                let index = after.year() as i32 * 12 + after.month() as i32 - 1;
                let next = (index.div_euclid(period) + 1) * period;
                jiff::civil::date(next.div_euclid(12) as i16, (next.rem_euclid(12) + 1) as i8, 1)
            }
            None => jiff::civil::date(after.year() + 4, 1, 1),
        }
    }

    /// Anniversary stepping: dates sharing the anniversary's month/day
    /// (day clamped to the target month), advanced by the period length
    /// until strictly after `after`. The strict comparison doubles as the
    /// clamp-forward rule: a clamped candidate landing on `after` is
    /// skipped rather than returned, so a day-31 anniversary in a 30-day
    /// month can never produce a boundary equal to the last reset.
    fn anniversary_boundary_after(&self, after: Date) -> Date {
        let ann = self.anniversary;
        match self.frequency.period_months() {
            Some(period) => {
                // Walk the anniversary month grid from a year before
                // `after`; 12 is a multiple of every period length, so the
                // grid alignment is preserved.
                let mut index = (after.year() as i32 - 1) * 12 + ann.month() as i32 - 1;
                loop {
                    let year = index.div_euclid(12) as i16;
                    let month = (index.rem_euclid(12) + 1) as i8;
                    let candidate = date_with_day_clamped(year, month, ann.day());
                    if candidate > after {
                        return candidate;
                    }
                    index += period;
                }
            }
            None => {
                let mut candidate = date_with_day_clamped(after.year(), ann.month(), ann.day());
                while candidate <= after {
                    candidate = date_with_day_clamped(candidate.year() + 4, ann.month(), ann.day());
                }
                candidate
            }
        }
    }
}
