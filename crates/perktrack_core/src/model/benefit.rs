//! Benefit definitions
//!
//! A benefit is the unit of mutation: a pot of value attached to a card,
//! governed by exactly one cycle flavor. Recurring benefits reset on a
//! period boundary, one-time benefits optionally expire, and carryover
//! benefits accumulate independently-expiring earned instances.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{BenefitId, JustificationId, MinimumSpendId};
use crate::cycle::{CarryoverCycle, ExpiryCycle};

/// How often a recurring benefit's period rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Biannual,
    Annual,
    #[serde(rename = "every-4-years")]
    EveryFourYears,
}

impl Frequency {
    /// Period length in months, or `None` for the 4-year cadence.
    pub fn period_months(&self) -> Option<i32> {
        match self {
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::Biannual => Some(6),
            Frequency::Annual => Some(12),
            Frequency::EveryFourYears => None,
        }
    }
}

/// Which calendar the period boundaries follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetType {
    /// Boundaries at the start of calendar buckets (months 1/4/7/10 for
    /// quarterly, 1/7 for biannual, Jan 1 for annual).
    Calendar,
    /// Boundaries on the card anniversary's month/day, stepped by the
    /// period length.
    Anniversary,
}

/// One yearly earn event of a carryover benefit, with its own usage and
/// expiry. Never deleted once created; expiry only hides it from the
/// active filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedInstance {
    pub earned_date: Date,
    pub used_amount: f64,
    #[serde(default)]
    pub justifications: Vec<UsageJustification>,
}

impl EarnedInstance {
    pub fn new(earned_date: Date) -> Self {
        Self {
            earned_date,
            used_amount: 0.0,
            justifications: Vec::new(),
        }
    }
}

/// The cycle flavor a benefit is governed by. Exactly one per benefit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BenefitKind {
    /// Resets every period; the only kind the reset engine acts on.
    #[serde(rename_all = "camelCase")]
    Recurring {
        frequency: Frequency,
        reset_type: ResetType,
        last_reset: Date,
    },
    /// Never resets; optionally carries a hard expiry date.
    #[serde(rename_all = "camelCase")]
    OneTime { expiry_date: Option<Date> },
    /// Earnable at most once per calendar year; each earned instance
    /// expires independently at the end of the following year.
    #[serde(rename_all = "camelCase")]
    Carryover { instances: Vec<EarnedInstance> },
}

/// A free-form ledger entry explaining how part of a benefit was used.
/// Totals are informational; nothing enforces that they match
/// `used_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageJustification {
    pub id: JustificationId,
    pub amount: f64,
    pub note: String,
    pub reminder_date: Option<Date>,
    pub charge_date: Option<Date>,
    pub confirmed: bool,
}

/// Period-boundary policy flags. Auto-claim and ignore are mutually
/// exclusive; every mutation goes through [`ClaimPolicy::set_auto_claim`]
/// or [`ClaimPolicy::set_ignored`], which clear the opposite flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPolicy {
    pub auto_claim: bool,
    pub auto_claim_end_date: Option<Date>,
    pub ignored: bool,
    pub ignored_end_date: Option<Date>,
}

impl ClaimPolicy {
    /// Enable or disable auto-claim. Enabling clears the ignore flag.
    pub fn set_auto_claim(&mut self, enabled: bool, end_date: Option<Date>) {
        self.auto_claim = enabled;
        self.auto_claim_end_date = if enabled { end_date } else { None };
        if enabled {
            self.ignored = false;
            self.ignored_end_date = None;
        }
    }

    /// Enable or disable ignore (silent roll). Enabling clears auto-claim.
    pub fn set_ignored(&mut self, enabled: bool, end_date: Option<Date>) {
        self.ignored = enabled;
        self.ignored_end_date = if enabled { end_date } else { None };
        if enabled {
            self.auto_claim = false;
            self.auto_claim_end_date = None;
        }
    }

    fn auto_claim_active(&self, date: Date) -> bool {
        self.auto_claim && self.auto_claim_end_date.is_none_or(|end| end >= date)
    }

    fn ignored_active(&self, date: Date) -> bool {
        self.ignored && self.ignored_end_date.is_none_or(|end| end >= date)
    }
}

/// A monetary benefit attached to a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benefit {
    pub id: BenefitId,
    pub description: String,
    pub total_amount: f64,
    pub used_amount: f64,
    pub kind: BenefitKind,
    #[serde(flatten)]
    pub claim_policy: ClaimPolicy,
    pub required_minimum_spend: Option<MinimumSpendId>,
    #[serde(default)]
    pub justifications: Vec<UsageJustification>,
}

impl Benefit {
    pub fn new(id: BenefitId, description: impl Into<String>, total_amount: f64, kind: BenefitKind) -> Self {
        Self {
            id,
            description: description.into(),
            total_amount: sanitize_amount(total_amount, f64::MAX),
            used_amount: 0.0,
            kind,
            claim_policy: ClaimPolicy::default(),
            required_minimum_spend: None,
            justifications: Vec::new(),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, BenefitKind::Recurring { .. })
    }

    pub fn is_carryover(&self) -> bool {
        matches!(self.kind, BenefitKind::Carryover { .. })
    }

    /// Derive the expiry cycle view from current fields. Recurring only;
    /// rebuilt on every query so it can never go stale after a field edit.
    pub fn expiry_cycle(&self, card_anniversary: Date) -> Option<ExpiryCycle> {
        match &self.kind {
            BenefitKind::Recurring {
                frequency,
                reset_type,
                last_reset,
            } => Some(ExpiryCycle::new(
                *frequency,
                *reset_type,
                *last_reset,
                card_anniversary,
            )),
            BenefitKind::OneTime { .. } | BenefitKind::Carryover { .. } => None,
        }
    }

    /// Derive the carryover cycle view from current fields.
    pub fn carryover_cycle(&self) -> Option<CarryoverCycle<'_>> {
        match &self.kind {
            BenefitKind::Carryover { instances } => Some(CarryoverCycle::new(instances)),
            _ => None,
        }
    }

    /// Auto-claim is only meaningful for recurring benefits.
    pub fn is_auto_claim_active(&self, date: Date) -> bool {
        self.is_recurring() && self.claim_policy.auto_claim_active(date)
    }

    /// Ignore (silent roll) is only meaningful for recurring benefits.
    pub fn is_ignored_active(&self, date: Date) -> bool {
        self.is_recurring() && self.claim_policy.ignored_active(date)
    }

    pub fn is_fully_used(&self, date: Date) -> bool {
        match &self.kind {
            BenefitKind::Carryover { instances } => {
                CarryoverCycle::new(instances).total_remaining(self.total_amount, date) <= 0.0
            }
            _ => self.total_amount - self.used_amount <= 0.0,
        }
    }

    /// Remaining value at `date`: aggregate over active instances for
    /// carryover, the single pot otherwise.
    pub fn remaining_value(&self, date: Date) -> f64 {
        match &self.kind {
            BenefitKind::Carryover { instances } => {
                CarryoverCycle::new(instances).total_remaining(self.total_amount, date)
            }
            _ => (self.total_amount - self.used_amount).max(0.0),
        }
    }

    /// Write the used amount, clamped to `[0, total_amount]`. NaN and
    /// negative inputs coerce to 0 rather than erroring, matching the
    /// tolerant-editing contract.
    pub fn set_used_amount(&mut self, amount: f64) {
        self.used_amount = sanitize_amount(amount, self.total_amount);
    }

    /// Zero usage and stamp a new period start. The only path that
    /// advances `last_reset`; the engine decides when to call it.
    pub fn reset(&mut self, date: Date) {
        self.used_amount = 0.0;
        if let BenefitKind::Recurring { last_reset, .. } = &mut self.kind {
            *last_reset = date;
        }
    }

    /// Whether a new carryover instance may be earned at `date`. False
    /// for non-carryover kinds, when this year's instance already exists,
    /// or while a required minimum spend is unmet (`min_spend_met` is the
    /// caller-resolved gate state).
    pub fn can_earn_instance(&self, date: Date, min_spend_met: bool) -> bool {
        match &self.kind {
            BenefitKind::Carryover { instances } => {
                CarryoverCycle::new(instances).can_earn_in_year(date)
                    && (self.required_minimum_spend.is_none() || min_spend_met)
            }
            _ => false,
        }
    }

    /// Append a fresh earned instance for `date`'s year. Existing
    /// instances are never touched.
    pub fn earn_instance(&mut self, date: Date) -> bool {
        let eligible = matches!(&self.kind, BenefitKind::Carryover { instances }
            if CarryoverCycle::new(instances).can_earn_in_year(date));
        if !eligible {
            return false;
        }
        if let BenefitKind::Carryover { instances } = &mut self.kind {
            instances.push(EarnedInstance::new(date));
        }
        true
    }

    /// Write one instance's used amount, clamped like `set_used_amount`.
    pub fn set_instance_used_amount(&mut self, index: usize, amount: f64) -> bool {
        let total = self.total_amount;
        if let BenefitKind::Carryover { instances } = &mut self.kind
            && let Some(instance) = instances.get_mut(index)
        {
            instance.used_amount = sanitize_amount(amount, total);
            return true;
        }
        false
    }

    /// One-time benefits only: the hard expiry date has passed.
    pub fn is_one_time_expired(&self, date: Date) -> bool {
        matches!(&self.kind, BenefitKind::OneTime { expiry_date: Some(e) } if date > *e)
    }

    /// One-time benefits only: unexpired, with the expiry inside the
    /// window.
    pub fn one_time_expires_within(&self, date: Date, days: i32) -> bool {
        match &self.kind {
            BenefitKind::OneTime { expiry_date: Some(e) } => {
                *e >= date && crate::date_math::days_between(date, *e) <= days
            }
            _ => false,
        }
    }

    pub fn has_required_minimum_spend(&self) -> bool {
        self.required_minimum_spend.is_some()
    }

    pub fn add_justification(&mut self, entry: UsageJustification) {
        self.justifications.push(entry);
    }

    pub fn remove_justification(&mut self, id: &JustificationId) -> bool {
        let before = self.justifications.len();
        self.justifications.retain(|j| &j.id != id);
        self.justifications.len() != before
    }

    pub fn confirm_justification(&mut self, id: &JustificationId, confirmed: bool) -> bool {
        match self.justifications.iter_mut().find(|j| &j.id == id) {
            Some(entry) => {
                entry.confirmed = confirmed;
                true
            }
            None => false,
        }
    }

    /// Sum of justified amounts. Informational only.
    pub fn justified_total(&self) -> f64 {
        self.justifications.iter().map(|j| j.amount).sum()
    }

    /// Unconfirmed justifications whose reminder date has arrived.
    pub fn due_reminders(&self, date: Date) -> impl Iterator<Item = &UsageJustification> {
        self.justifications
            .iter()
            .filter(move |j| !j.confirmed && j.reminder_date.is_some_and(|r| r <= date))
    }
}

/// Clamp an amount to `[0, max]`, coercing NaN and negatives to 0.
fn sanitize_amount(amount: f64, max: f64) -> f64 {
    if amount.is_nan() || amount < 0.0 {
        0.0
    } else {
        amount.min(max)
    }
}
