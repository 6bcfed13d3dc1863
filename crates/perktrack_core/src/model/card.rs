//! Card aggregate
//!
//! A card owns an ordered collection of benefits and minimum spends that
//! all share its anniversary date. Anniversary-based cycles are derived
//! from that date at query time, so editing it re-derives every child's
//! cycle with no separate invalidation step.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::benefit::Benefit;
use super::ids::{BenefitId, CardId, MinimumSpendId};
use super::min_spend::MinimumSpend;
use crate::cycle::CarryoverCycle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// Month/day are significant; the year is ignored by anniversary math.
    pub anniversary_date: Date,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
    #[serde(default)]
    pub minimum_spends: Vec<MinimumSpend>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<String>, anniversary_date: Date) -> Self {
        Self {
            id,
            name: name.into(),
            anniversary_date,
            benefits: Vec::new(),
            minimum_spends: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn benefit(&self, id: &BenefitId) -> Option<&Benefit> {
        self.benefits.iter().find(|b| &b.id == id)
    }

    pub fn benefit_mut(&mut self, id: &BenefitId) -> Option<&mut Benefit> {
        self.benefits.iter_mut().find(|b| &b.id == id)
    }

    pub fn minimum_spend(&self, id: &MinimumSpendId) -> Option<&MinimumSpend> {
        self.minimum_spends.iter().find(|m| &m.id == id)
    }

    pub fn minimum_spend_mut(&mut self, id: &MinimumSpendId) -> Option<&mut MinimumSpend> {
        self.minimum_spends.iter_mut().find(|m| &m.id == id)
    }

    // ------------------------------------------------------------------
    // Queries used by the reset engine and status surfacing.
    // None of these mutate anything.
    // ------------------------------------------------------------------

    /// Recurring benefits whose period boundary has passed. The
    /// authoritative "is action required" query.
    pub fn benefits_needing_reset(&self, date: Date) -> Vec<&Benefit> {
        self.benefits
            .iter()
            .filter(|b| {
                b.expiry_cycle(self.anniversary_date)
                    .is_some_and(|cycle| cycle.is_expired(date))
            })
            .collect()
    }

    /// Benefits with value at risk inside the window: recurring benefits
    /// whose boundary falls within it, carryover benefits with an
    /// instance expiring within it, and one-time benefits whose hard
    /// expiry lands in it.
    pub fn benefits_expiring_within(&self, date: Date, days: i32) -> Vec<&Benefit> {
        self.benefits
            .iter()
            .filter(|b| {
                if let Some(cycle) = b.expiry_cycle(self.anniversary_date) {
                    return cycle.resets_within(date, days);
                }
                if let Some(cycle) = b.carryover_cycle() {
                    return cycle.has_expiring_instances(date, days);
                }
                b.one_time_expires_within(date, days) && !b.is_fully_used(date)
            })
            .collect()
    }

    /// Benefits gated on `min_spend_id` that are currently unlocked by it.
    /// Empty while the requirement is unmet or unknown.
    pub fn unlocked_benefits(&self, min_spend_id: &MinimumSpendId) -> Vec<&Benefit> {
        let met = self
            .minimum_spend(min_spend_id)
            .is_some_and(|spend| spend.is_met);
        if !met {
            return Vec::new();
        }
        self.benefits
            .iter()
            .filter(|b| b.required_minimum_spend.as_ref() == Some(min_spend_id))
            .collect()
    }

    /// Whether a benefit's gate (if any) is open. A dangling reference
    /// counts as locked rather than silently unlocked.
    pub fn is_benefit_unlocked(&self, benefit: &Benefit) -> bool {
        match &benefit.required_minimum_spend {
            None => true,
            Some(id) => self.minimum_spend(id).is_some_and(|spend| spend.is_met),
        }
    }

    /// Recurring minimum spends whose period has rolled past the stored
    /// reset stamp.
    pub fn min_spends_needing_reset(&self, date: Date) -> Vec<&MinimumSpend> {
        self.minimum_spends
            .iter()
            .filter(|m| m.cycle(self.anniversary_date).should_reset(date))
            .collect()
    }

    /// Remaining value across unlocked benefits, for status surfacing.
    pub fn total_remaining_value(&self, date: Date) -> f64 {
        self.benefits
            .iter()
            .filter(|b| self.is_benefit_unlocked(b))
            .map(|b| b.remaining_value(date))
            .sum()
    }

    // ------------------------------------------------------------------
    // Child mutation
    // ------------------------------------------------------------------

    pub fn add_benefit(&mut self, benefit: Benefit) {
        self.benefits.push(benefit);
    }

    /// Remove a benefit. Returns the removed entry so the caller can
    /// offer undo.
    pub fn remove_benefit(&mut self, id: &BenefitId) -> Option<Benefit> {
        let index = self.benefits.iter().position(|b| &b.id == id)?;
        Some(self.benefits.remove(index))
    }

    pub fn add_minimum_spend(&mut self, spend: MinimumSpend) {
        self.minimum_spends.push(spend);
    }

    /// Remove a minimum spend and clear any benefit links to it, so no
    /// benefit is left gated on a requirement that no longer exists.
    pub fn remove_minimum_spend(&mut self, id: &MinimumSpendId) -> Option<MinimumSpend> {
        let index = self.minimum_spends.iter().position(|m| &m.id == id)?;
        let removed = self.minimum_spends.remove(index);
        for benefit in &mut self.benefits {
            if benefit.required_minimum_spend.as_ref() == Some(id) {
                benefit.required_minimum_spend = None;
            }
        }
        Some(removed)
    }

    /// Move a benefit to a new position in the display order.
    pub fn reorder_benefit(&mut self, id: &BenefitId, new_index: usize) -> bool {
        let Some(index) = self.benefits.iter().position(|b| &b.id == id) else {
            return false;
        };
        let benefit = self.benefits.remove(index);
        let new_index = new_index.min(self.benefits.len());
        self.benefits.insert(new_index, benefit);
        true
    }

    /// Edit the anniversary. Cycles are always derived from this field at
    /// query time, so every anniversary-based child picks up the change
    /// on its next query.
    pub fn set_anniversary(&mut self, date: Date) {
        self.anniversary_date = date;
    }

    /// Carryover instances across all benefits expiring within the
    /// window, for proactive surfacing.
    pub fn expiring_instance_count(&self, date: Date, days: i32) -> usize {
        self.benefits
            .iter()
            .filter_map(|b| b.carryover_cycle())
            .map(|cycle: CarryoverCycle<'_>| cycle.expiring_instances(date, days).len())
            .sum()
    }
}
