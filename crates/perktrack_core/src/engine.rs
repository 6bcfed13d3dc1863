//! Reset detection and application
//!
//! Walks every card once per load with an injected reference date,
//! classifies each benefit, applies the policy-driven outcomes, and
//! returns the pending manual decisions. The full classification is
//! computed from an immutable snapshot before any mutation is applied,
//! so pending classification never observes partially-mutated state from
//! earlier in the same pass.

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::error::LookupError;
use crate::model::{Benefit, BenefitId, Card, CardId, MinimumSpendId};

/// Classification of one benefit against the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenefitState {
    /// No action required.
    Current,
    /// Not due, but auto-claim is active and the pot is not fully used:
    /// usage is forced to the total immediately, independent of the
    /// period boundary.
    AutoClaimed,
    /// Due, auto-claim active: stamp a new period and force usage to the
    /// total.
    AutoReset,
    /// Due, ignore active: stamp a new period with usage zeroed, without
    /// surfacing anything.
    SilentRoll,
    /// Due, no policy: queued for an explicit user accept/decline. Data
    /// is left untouched until the user decides; declining leaves the
    /// benefit in this state indefinitely.
    PendingManual,
}

/// One overdue benefit awaiting a user decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReset {
    pub card_id: CardId,
    pub benefit_id: BenefitId,
    pub description: String,
    /// Value that lapses if the reset is accepted.
    pub unclaimed_amount: f64,
    /// The elapsed period boundary that made the benefit due.
    pub boundary: Date,
}

/// What a reset pass did, plus the decisions it could not make.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetPassOutcome {
    pub auto_claimed: Vec<BenefitId>,
    pub auto_reset: Vec<BenefitId>,
    pub silently_rolled: Vec<BenefitId>,
    pub min_spends_reset: Vec<MinimumSpendId>,
    pub pending: Vec<PendingReset>,
}

impl ResetPassOutcome {
    pub fn mutated_anything(&self) -> bool {
        !(self.auto_claimed.is_empty()
            && self.auto_reset.is_empty()
            && self.silently_rolled.is_empty()
            && self.min_spends_reset.is_empty())
    }
}

/// Classify a single benefit. Pure; one-time and carryover benefits are
/// never due.
pub fn classify_benefit(card: &Card, benefit: &Benefit, today: Date) -> BenefitState {
    let due = benefit
        .expiry_cycle(card.anniversary_date)
        .is_some_and(|cycle| cycle.is_expired(today));

    if due {
        if benefit.is_auto_claim_active(today) {
            BenefitState::AutoReset
        } else if benefit.is_ignored_active(today) {
            BenefitState::SilentRoll
        } else {
            BenefitState::PendingManual
        }
    } else if benefit.is_auto_claim_active(today) && !benefit.is_fully_used(today) {
        BenefitState::AutoClaimed
    } else {
        BenefitState::Current
    }
}

/// Detect without mutating: the classification snapshot a pass would act
/// on.
pub fn detect(cards: &[Card], today: Date) -> Vec<(CardId, BenefitId, BenefitState)> {
    let mut out = Vec::new();
    for card in cards {
        for benefit in &card.benefits {
            let state = classify_benefit(card, benefit, today);
            if state != BenefitState::Current {
                out.push((card.id.clone(), benefit.id.clone(), state));
            }
        }
    }
    out
}

/// Run one reset pass: classify everything from a consistent snapshot,
/// then apply auto-claims, auto-resets, silent rolls, and minimum-spend
/// period resets. Pending manual items are returned untouched.
pub fn run_reset_pass(cards: &mut [Card], today: Date) -> ResetPassOutcome {
    // Snapshot first. Mutations below must not feed back into
    // classification within the same pass.
    let plan: Vec<(usize, BenefitId, BenefitState)> = cards
        .iter()
        .enumerate()
        .flat_map(|(index, card)| {
            card.benefits.iter().map(move |benefit| {
                (index, benefit.id.clone(), classify_benefit(card, benefit, today))
            })
        })
        .filter(|(_, _, state)| *state != BenefitState::Current)
        .collect();

    let spend_plan: Vec<(usize, MinimumSpendId)> = cards
        .iter()
        .enumerate()
        .flat_map(|(index, card)| {
            card.min_spends_needing_reset(today)
                .into_iter()
                .map(move |spend| (index, spend.id.clone()))
        })
        .collect();

    let mut outcome = ResetPassOutcome::default();

    for (card_index, benefit_id, state) in plan {
        let card = &mut cards[card_index];
        match state {
            BenefitState::AutoClaimed => {
                if let Some(benefit) = card.benefit_mut(&benefit_id) {
                    let total = benefit.total_amount;
                    benefit.set_used_amount(total);
                    outcome.auto_claimed.push(benefit_id);
                }
            }
            BenefitState::AutoReset => {
                if let Some(benefit) = card.benefit_mut(&benefit_id) {
                    let total = benefit.total_amount;
                    benefit.reset(today);
                    benefit.set_used_amount(total);
                    outcome.auto_reset.push(benefit_id);
                }
            }
            BenefitState::SilentRoll => {
                if let Some(benefit) = card.benefit_mut(&benefit_id) {
                    benefit.reset(today);
                    outcome.silently_rolled.push(benefit_id);
                }
            }
            BenefitState::PendingManual => {
                let anniversary = card.anniversary_date;
                if let Some(benefit) = card.benefit(&benefit_id) {
                    let boundary = benefit
                        .expiry_cycle(anniversary)
                        .map(|cycle| cycle.next_reset_date(today))
                        .unwrap_or(today);
                    outcome.pending.push(PendingReset {
                        card_id: card.id.clone(),
                        benefit_id,
                        description: benefit.description.clone(),
                        unclaimed_amount: benefit.remaining_value(today),
                        boundary,
                    });
                }
            }
            BenefitState::Current => {}
        }
    }

    for (card_index, spend_id) in spend_plan {
        if let Some(spend) = cards[card_index].minimum_spend_mut(&spend_id) {
            spend.reset_period(today);
            outcome.min_spends_reset.push(spend_id);
        }
    }

    outcome
}

/// Apply an accepted batch of pending manual resets.
///
/// Every (card, benefit) pair is resolved before anything mutates, so an
/// unknown id rejects the whole batch with no partial application.
/// Durability is still the caller's problem: persist after this returns
/// and restore a pre-call snapshot if persistence fails. Declined items
/// are simply not passed in; declining mutates nothing.
pub fn apply_pending(
    cards: &mut [Card],
    accepted: &[(CardId, BenefitId)],
    today: Date,
) -> Result<usize, LookupError> {
    let card_index: FxHashMap<CardId, usize> = cards
        .iter()
        .enumerate()
        .map(|(index, card)| (card.id.clone(), index))
        .collect();

    let mut targets = Vec::with_capacity(accepted.len());
    for (card_id, benefit_id) in accepted {
        let index = *card_index
            .get(card_id)
            .ok_or_else(|| LookupError::CardNotFound(card_id.clone()))?;
        if cards[index].benefit(benefit_id).is_none() {
            return Err(LookupError::BenefitNotFound(benefit_id.clone()));
        }
        targets.push((index, benefit_id.clone()));
    }

    for (index, benefit_id) in &targets {
        if let Some(benefit) = cards[*index].benefit_mut(benefit_id) {
            benefit.reset(today);
        }
    }

    Ok(targets.len())
}
