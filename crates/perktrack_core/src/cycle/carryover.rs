//! Carryover instance calculator.
//!
//! An instance may be earned at most once per calendar year, and an
//! instance earned in year X is usable through December 31 of X+1. This
//! is strictly calendar-year based; the card anniversary plays no part.

use jiff::civil::Date;

use crate::date_math::days_between;
use crate::model::EarnedInstance;

/// A derived view over a carryover benefit's earned instances. Instances
/// are never removed on expiry; the raw list is the audit history and
/// only the active filter hides expired entries.
#[derive(Debug, Clone, Copy)]
pub struct CarryoverCycle<'a> {
    instances: &'a [EarnedInstance],
}

impl<'a> CarryoverCycle<'a> {
    pub fn new(instances: &'a [EarnedInstance]) -> Self {
        Self { instances }
    }

    /// Dec 31 of the year after the earn year.
    pub fn expiry_of(instance: &EarnedInstance) -> Date {
        jiff::civil::date(instance.earned_date.year() + 1, 12, 31)
    }

    /// Instances still usable at `date`.
    pub fn active_instances(&self, date: Date) -> impl Iterator<Item = &'a EarnedInstance> {
        self.instances
            .iter()
            .filter(move |i| Self::expiry_of(i) >= date)
    }

    pub fn has_active_instances(&self, date: Date) -> bool {
        self.active_instances(date).next().is_some()
    }

    /// Aggregate remaining value: Σ over active instances of
    /// `max(0, per_instance_total − used)`.
    pub fn total_remaining(&self, per_instance_total: f64, date: Date) -> f64 {
        self.active_instances(date)
            .map(|i| (per_instance_total - i.used_amount).max(0.0))
            .sum()
    }

    /// True iff no instance has been earned in `date`'s calendar year.
    pub fn can_earn_in_year(&self, date: Date) -> bool {
        !self
            .instances
            .iter()
            .any(|i| i.earned_date.year() == date.year())
    }

    /// Dec 31 of the year the next earn opportunity lapses, or `None`
    /// once this year's instance exists.
    pub fn earn_deadline(&self, date: Date) -> Option<Date> {
        self.can_earn_in_year(date)
            .then(|| jiff::civil::date(date.year(), 12, 31))
    }

    /// Earliest expiry among instances still active at `date`.
    pub fn earliest_expiry(&self, date: Date) -> Option<Date> {
        self.active_instances(date).map(Self::expiry_of).min()
    }

    pub fn days_until_earliest_expiry(&self, date: Date) -> Option<i32> {
        self.earliest_expiry(date).map(|e| days_between(date, e))
    }

    /// Instances whose expiry is strictly after `date` and within
    /// `window_days` of it.
    pub fn expiring_instances(&self, date: Date, window_days: i32) -> Vec<&'a EarnedInstance> {
        self.instances
            .iter()
            .filter(|i| {
                let expiry = Self::expiry_of(i);
                expiry > date && days_between(date, expiry) <= window_days
            })
            .collect()
    }

    pub fn has_expiring_instances(&self, date: Date, window_days: i32) -> bool {
        !self.expiring_instances(date, window_days).is_empty()
    }
}
