//! Deadline and period calculator for minimum-spend requirements.

use jiff::civil::Date;

use crate::date_math::{date_with_day_clamped, days_between};
use crate::model::{ResetType, SpendCadence};

/// A derived view over a spend requirement's cadence fields.
#[derive(Debug, Clone, Copy)]
pub struct MinSpendCycle<'a> {
    cadence: &'a SpendCadence,
    anniversary: Date,
}

impl<'a> MinSpendCycle<'a> {
    pub fn new(cadence: &'a SpendCadence, anniversary: Date) -> Self {
        Self { cadence, anniversary }
    }

    /// The start of the period containing `date`. `None` for one-time
    /// requirements, which have no period.
    pub fn current_period_start(&self, date: Date) -> Option<Date> {
        match self.cadence {
            SpendCadence::OneTime { .. } => None,
            SpendCadence::Recurring {
                frequency,
                reset_type,
                ..
            } => {
                let period = frequency.period_months();
                Some(match reset_type {
                    ResetType::Calendar => {
                        let index = date.year() as i32 * 12 + date.month() as i32 - 1;
                        let start = index.div_euclid(period) * period;
                        jiff::civil::date(
                            start.div_euclid(12) as i16,
                            (start.rem_euclid(12) + 1) as i8,
                            1,
                        )
                    }
                    ResetType::Anniversary => self.latest_anniversary_on_or_before(date, period),
                })
            }
        }
    }

    /// The deadline governing `date`: the fixed one-time deadline, or the
    /// day before the next period boundary for recurring requirements.
    pub fn deadline(&self, date: Date) -> Option<Date> {
        match self.cadence {
            SpendCadence::OneTime { deadline } => *deadline,
            SpendCadence::Recurring { .. } => self
                .current_period_end(date)
                .map(|boundary| crate::date_math::add_days(boundary, -1)),
        }
    }

    /// The first period boundary strictly after `date` (the start of the
    /// next period).
    pub fn current_period_end(&self, date: Date) -> Option<Date> {
        match self.cadence {
            SpendCadence::OneTime { .. } => None,
            SpendCadence::Recurring {
                frequency,
                reset_type,
                ..
            } => {
                let period = frequency.period_months();
                Some(match reset_type {
                    ResetType::Calendar => {
                        let index = date.year() as i32 * 12 + date.month() as i32 - 1;
                        let next = (index.div_euclid(period) + 1) * period;
                        jiff::civil::date(
                            next.div_euclid(12) as i16,
                            (next.rem_euclid(12) + 1) as i8,
                            1,
                        )
                    }
                    ResetType::Anniversary => {
                        let start = self.latest_anniversary_on_or_before(date, period);
                        self.anniversary_step(start, period)
                    }
                })
            }
        }
    }

    /// True once the period containing `date` started after the stored
    /// reset stamp, signaling the engine to zero progress for the new
    /// period.
    pub fn should_reset(&self, date: Date) -> bool {
        match self.cadence {
            SpendCadence::OneTime { .. } => false,
            SpendCadence::Recurring { last_reset, .. } => self
                .current_period_start(date)
                .is_some_and(|start| start > *last_reset),
        }
    }

    /// One-time window lapsed while the requirement was unmet. Only
    /// meaningful while unmet; recurring requirements roll instead of
    /// expiring.
    pub fn is_expired(&self, date: Date) -> bool {
        match self.cadence {
            SpendCadence::OneTime { deadline } => deadline.is_some_and(|d| date > d),
            SpendCadence::Recurring { .. } => false,
        }
    }

    pub fn days_until_deadline(&self, date: Date) -> Option<i32> {
        self.deadline(date).map(|d| days_between(date, d))
    }

    /// Latest anniversary-grid date on or before `date` for a period of
    /// `period` months, anchored to the card anniversary's month/day.
    fn latest_anniversary_on_or_before(&self, date: Date, period: i32) -> Date {
        let ann = self.anniversary;
        let mut index = (date.year() as i32 - 2) * 12 + ann.month() as i32 - 1;
        let mut latest = date_with_day_clamped(
            index.div_euclid(12) as i16,
            (index.rem_euclid(12) + 1) as i8,
            ann.day(),
        );
        loop {
            index += period;
            let candidate = date_with_day_clamped(
                index.div_euclid(12) as i16,
                (index.rem_euclid(12) + 1) as i8,
                ann.day(),
            );
            if candidate > date {
                return latest;
            }
            latest = candidate;
        }
    }

    /// The grid date `period` months after `start`, re-anchored to the
    /// anniversary day so repeated clamping never drifts.
    fn anniversary_step(&self, start: Date, period: i32) -> Date {
        let index = start.year() as i32 * 12 + start.month() as i32 - 1 + period;
        date_with_day_clamped(
            index.div_euclid(12) as i16,
            (index.rem_euclid(12) + 1) as i8,
            self.anniversary.day(),
        )
    }
}
