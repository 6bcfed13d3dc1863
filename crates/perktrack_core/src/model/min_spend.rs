//! Minimum-spend requirements
//!
//! A spend threshold with a deadline or recurring period. Meeting one can
//! unlock benefits that reference it; dropping back below the target
//! re-locks them.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::benefit::ResetType;
use super::ids::MinimumSpendId;
use crate::cycle::MinSpendCycle;

/// How often a recurring spend requirement's period rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendFrequency {
    Monthly,
    Quarterly,
    Biannual,
    #[serde(alias = "annual")]
    Yearly,
}

impl SpendFrequency {
    pub fn period_months(&self) -> i32 {
        match self {
            SpendFrequency::Monthly => 1,
            SpendFrequency::Quarterly => 3,
            SpendFrequency::Biannual => 6,
            SpendFrequency::Yearly => 12,
        }
    }
}

/// One-time window or recurring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SpendCadence {
    #[serde(rename_all = "camelCase")]
    OneTime { deadline: Option<Date> },
    #[serde(rename_all = "camelCase")]
    Recurring {
        frequency: SpendFrequency,
        reset_type: ResetType,
        last_reset: Date,
    },
}

/// A spend threshold, optionally gating benefits until met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimumSpend {
    pub id: MinimumSpendId,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub cadence: SpendCadence,
    /// Derived from the amounts but stored, so the record keeps the
    /// met/unmet transition visible to other writers.
    pub is_met: bool,
    pub met_date: Option<Date>,
    pub ignored: bool,
    pub ignored_end_date: Option<Date>,
}

impl MinimumSpend {
    pub fn new(
        id: MinimumSpendId,
        description: impl Into<String>,
        target_amount: f64,
        cadence: SpendCadence,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            target_amount,
            current_amount: 0.0,
            cadence,
            is_met: false,
            met_date: None,
            ignored: false,
            ignored_end_date: None,
        }
    }

    /// Derive the cycle view from current fields.
    pub fn cycle(&self, card_anniversary: Date) -> MinSpendCycle<'_> {
        MinSpendCycle::new(&self.cadence, card_anniversary)
    }

    /// Write the progress amount (NaN/negative coerced to 0) and keep
    /// `is_met` consistent in both directions: crossing the target stamps
    /// `met_date`, dropping back below clears it and re-locks any benefit
    /// gated on this requirement.
    pub fn set_progress(&mut self, amount: f64, date: Date) {
        self.current_amount = if amount.is_nan() || amount < 0.0 { 0.0 } else { amount };
        if self.current_amount >= self.target_amount {
            if !self.is_met {
                self.is_met = true;
                self.met_date = Some(date);
            }
        } else if self.is_met {
            self.is_met = false;
            self.met_date = None;
        }
    }

    pub fn add_progress(&mut self, delta: f64, date: Date) {
        let delta = if delta.is_nan() { 0.0 } else { delta };
        self.set_progress(self.current_amount + delta, date);
    }

    /// Zero progress for a new period and stamp the period start.
    pub fn reset_period(&mut self, date: Date) {
        self.current_amount = 0.0;
        self.is_met = false;
        self.met_date = None;
        if let SpendCadence::Recurring { last_reset, .. } = &mut self.cadence {
            *last_reset = date;
        }
    }

    pub fn is_ignored_active(&self, date: Date) -> bool {
        self.ignored && self.ignored_end_date.is_none_or(|end| end >= date)
    }

    pub fn set_ignored(&mut self, enabled: bool, end_date: Option<Date>) {
        self.ignored = enabled;
        self.ignored_end_date = if enabled { end_date } else { None };
    }

    pub fn remaining_amount(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}
