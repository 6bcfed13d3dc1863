//! Application state and mutation entry points
//!
//! Owns the loaded card set and exposes the named mutations the CLI (or
//! any other front end) drives. The core engine never persists; every
//! mutation here is expected to be followed by a [`App::save`] call by
//! the caller. The one exception is [`App::accept_pending`], which wraps
//! the batch in snapshot/restore so a persistence failure leaves the
//! in-memory state matching what is actually durable.

use std::fmt;

use jiff::civil::Date;
use perktrack_core::engine::{self, PendingReset};
use perktrack_core::error::LookupError;
use perktrack_core::model::{
    Benefit, BenefitId, BenefitKind, Card, CardId, JustificationId, MinimumSpend, MinimumSpendId,
    SpendCadence, UsageJustification,
};
use uuid::Uuid;

use crate::data::{DataConfig, DataDirectory, StorageError};

#[derive(Debug)]
pub enum AppError {
    Storage(StorageError),
    Lookup(LookupError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(e) => write!(f, "{e}"),
            AppError::Lookup(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Storage(e) => Some(e),
            AppError::Lookup(e) => Some(e),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        AppError::Lookup(e)
    }
}

pub struct App {
    storage: DataDirectory,
    pub config: DataConfig,
    pub cards: Vec<Card>,
    /// Overdue benefits awaiting an explicit user decision, captured by
    /// the load-time reset pass.
    pub pending: Vec<PendingReset>,
}

impl App {
    /// Load records, run the reset pass against `today`, and persist any
    /// policy-driven mutations it applied. Pending manual decisions are
    /// kept for the user; their data is untouched.
    pub fn load(storage: DataDirectory, today: Date) -> Result<Self, AppError> {
        storage.init()?;
        let config = storage.load_config()?;
        let mut cards = storage.load_cards()?;

        let outcome = engine::run_reset_pass(&mut cards, today);
        if outcome.mutated_anything() {
            tracing::info!(
                auto_claimed = outcome.auto_claimed.len(),
                auto_reset = outcome.auto_reset.len(),
                silently_rolled = outcome.silently_rolled.len(),
                min_spends_reset = outcome.min_spends_reset.len(),
                "reset pass applied policy outcomes"
            );
            storage.save_cards(&cards)?;
        }
        if !outcome.pending.is_empty() {
            tracing::info!(count = outcome.pending.len(), "manual resets pending");
        }

        Ok(Self {
            storage,
            config,
            cards,
            pending: outcome.pending,
        })
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.storage.save_cards(&self.cards)?;
        Ok(())
    }

    fn mint_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn card(&self, id: &CardId) -> Result<&Card, AppError> {
        self.cards
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| LookupError::CardNotFound(id.clone()).into())
    }

    fn card_mut(&mut self, id: &CardId) -> Result<&mut Card, AppError> {
        self.cards
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| LookupError::CardNotFound(id.clone()).into())
    }

    fn benefit_mut<'a>(card: &'a mut Card, id: &BenefitId) -> Result<&'a mut Benefit, AppError> {
        card.benefit_mut(id)
            .ok_or_else(|| LookupError::BenefitNotFound(id.clone()).into())
    }

    /// Find a card by id prefix or exact name, for CLI ergonomics.
    pub fn resolve_card(&self, needle: &str) -> Option<&Card> {
        self.cards
            .iter()
            .find(|c| c.id.as_str() == needle || c.name == needle)
            .or_else(|| self.cards.iter().find(|c| c.id.as_str().starts_with(needle)))
    }

    // ------------------------------------------------------------------
    // Card mutations
    // ------------------------------------------------------------------

    pub fn add_card(&mut self, name: impl Into<String>, anniversary: Date) -> CardId {
        let id = CardId::new(Self::mint_id());
        let name = name.into();
        tracing::info!(card = %id, %name, "adding card");
        self.cards.push(Card::new(id.clone(), name, anniversary));
        id
    }

    pub fn remove_card(&mut self, id: &CardId) -> Result<Card, AppError> {
        let index = self
            .cards
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| LookupError::CardNotFound(id.clone()))?;
        tracing::info!(card = %id, "removing card and children");
        Ok(self.cards.remove(index))
    }

    pub fn rename_card(&mut self, id: &CardId, name: impl Into<String>) -> Result<(), AppError> {
        self.card_mut(id)?.name = name.into();
        Ok(())
    }

    /// Edit a card's anniversary. Every anniversary-based child cycle is
    /// derived from this field at query time, so no separate re-derive
    /// step exists to forget.
    pub fn set_card_anniversary(&mut self, id: &CardId, date: Date) -> Result<(), AppError> {
        self.card_mut(id)?.set_anniversary(date);
        Ok(())
    }

    pub fn reorder_card(&mut self, id: &CardId, new_index: usize) -> Result<(), AppError> {
        let index = self
            .cards
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| LookupError::CardNotFound(id.clone()))?;
        let card = self.cards.remove(index);
        let new_index = new_index.min(self.cards.len());
        self.cards.insert(new_index, card);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Benefit mutations
    // ------------------------------------------------------------------

    pub fn add_benefit(
        &mut self,
        card_id: &CardId,
        description: impl Into<String>,
        total_amount: f64,
        kind: BenefitKind,
    ) -> Result<BenefitId, AppError> {
        let id = BenefitId::new(Self::mint_id());
        let benefit = Benefit::new(id.clone(), description, total_amount, kind);
        let card = self.card_mut(card_id)?;
        tracing::info!(card = %card_id, benefit = %id, "adding benefit");
        card.add_benefit(benefit);
        Ok(id)
    }

    pub fn remove_benefit(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
    ) -> Result<Benefit, AppError> {
        let card = self.card_mut(card_id)?;
        card.remove_benefit(benefit_id)
            .ok_or_else(|| LookupError::BenefitNotFound(benefit_id.clone()).into())
    }

    pub fn reorder_benefit(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        new_index: usize,
    ) -> Result<(), AppError> {
        let card = self.card_mut(card_id)?;
        if card.reorder_benefit(benefit_id, new_index) {
            Ok(())
        } else {
            Err(LookupError::BenefitNotFound(benefit_id.clone()).into())
        }
    }

    pub fn set_used_amount(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        amount: f64,
    ) -> Result<f64, AppError> {
        let card = self.card_mut(card_id)?;
        let benefit = Self::benefit_mut(card, benefit_id)?;
        benefit.set_used_amount(amount);
        Ok(benefit.used_amount)
    }

    pub fn set_auto_claim(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        enabled: bool,
        end_date: Option<Date>,
    ) -> Result<(), AppError> {
        let card = self.card_mut(card_id)?;
        Self::benefit_mut(card, benefit_id)?
            .claim_policy
            .set_auto_claim(enabled, end_date);
        Ok(())
    }

    pub fn set_ignored(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        enabled: bool,
        end_date: Option<Date>,
    ) -> Result<(), AppError> {
        let card = self.card_mut(card_id)?;
        Self::benefit_mut(card, benefit_id)?
            .claim_policy
            .set_ignored(enabled, end_date);
        Ok(())
    }

    pub fn link_minimum_spend(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        spend_id: Option<MinimumSpendId>,
    ) -> Result<(), AppError> {
        let card = self.card_mut(card_id)?;
        if let Some(id) = &spend_id
            && card.minimum_spend(id).is_none()
        {
            return Err(LookupError::MinimumSpendNotFound(id.clone()).into());
        }
        Self::benefit_mut(card, benefit_id)?.required_minimum_spend = spend_id;
        Ok(())
    }

    /// Earn this year's carryover instance. Returns false without
    /// mutating when the benefit is not earnable: wrong kind, this year's
    /// instance already exists, or an unmet minimum-spend gate.
    pub fn earn_instance(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        today: Date,
    ) -> Result<bool, AppError> {
        let card = self.card_mut(card_id)?;
        let unlocked = {
            let benefit = card
                .benefit(benefit_id)
                .ok_or_else(|| LookupError::BenefitNotFound(benefit_id.clone()))?;
            card.is_benefit_unlocked(benefit)
        };
        if !unlocked {
            tracing::info!(benefit = %benefit_id, "earn blocked by minimum spend gate");
            return Ok(false);
        }
        let benefit = Self::benefit_mut(card, benefit_id)?;
        let earned = benefit.earn_instance(today);
        if earned {
            tracing::info!(benefit = %benefit_id, %today, "earned carryover instance");
        }
        Ok(earned)
    }

    pub fn set_instance_used(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        index: usize,
        amount: f64,
    ) -> Result<(), AppError> {
        let card = self.card_mut(card_id)?;
        let benefit = Self::benefit_mut(card, benefit_id)?;
        if benefit.set_instance_used_amount(index, amount) {
            Ok(())
        } else {
            Err(LookupError::InstanceNotFound {
                benefit: benefit_id.clone(),
                index,
            }
            .into())
        }
    }

    // ------------------------------------------------------------------
    // Justification mutations
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn add_justification(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        amount: f64,
        note: impl Into<String>,
        reminder_date: Option<Date>,
        charge_date: Option<Date>,
    ) -> Result<JustificationId, AppError> {
        let id = JustificationId::new(Self::mint_id());
        let card = self.card_mut(card_id)?;
        Self::benefit_mut(card, benefit_id)?.add_justification(UsageJustification {
            id: id.clone(),
            amount,
            note: note.into(),
            reminder_date,
            charge_date,
            confirmed: false,
        });
        Ok(id)
    }

    pub fn remove_justification(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        justification_id: &JustificationId,
    ) -> Result<bool, AppError> {
        let card = self.card_mut(card_id)?;
        Ok(Self::benefit_mut(card, benefit_id)?.remove_justification(justification_id))
    }

    pub fn confirm_justification(
        &mut self,
        card_id: &CardId,
        benefit_id: &BenefitId,
        justification_id: &JustificationId,
        confirmed: bool,
    ) -> Result<bool, AppError> {
        let card = self.card_mut(card_id)?;
        Ok(Self::benefit_mut(card, benefit_id)?
            .confirm_justification(justification_id, confirmed))
    }

    // ------------------------------------------------------------------
    // Minimum-spend mutations
    // ------------------------------------------------------------------

    pub fn add_minimum_spend(
        &mut self,
        card_id: &CardId,
        description: impl Into<String>,
        target_amount: f64,
        cadence: SpendCadence,
    ) -> Result<MinimumSpendId, AppError> {
        let id = MinimumSpendId::new(Self::mint_id());
        let spend = MinimumSpend::new(id.clone(), description, target_amount, cadence);
        let card = self.card_mut(card_id)?;
        tracing::info!(card = %card_id, spend = %id, "adding minimum spend");
        card.add_minimum_spend(spend);
        Ok(id)
    }

    pub fn remove_minimum_spend(
        &mut self,
        card_id: &CardId,
        spend_id: &MinimumSpendId,
    ) -> Result<MinimumSpend, AppError> {
        let card = self.card_mut(card_id)?;
        card.remove_minimum_spend(spend_id)
            .ok_or_else(|| LookupError::MinimumSpendNotFound(spend_id.clone()).into())
    }

    pub fn add_spend_progress(
        &mut self,
        card_id: &CardId,
        spend_id: &MinimumSpendId,
        delta: f64,
        today: Date,
    ) -> Result<f64, AppError> {
        let card = self.card_mut(card_id)?;
        let spend = card
            .minimum_spend_mut(spend_id)
            .ok_or_else(|| LookupError::MinimumSpendNotFound(spend_id.clone()))?;
        let was_met = spend.is_met;
        spend.add_progress(delta, today);
        if spend.is_met != was_met {
            tracing::info!(spend = %spend_id, met = spend.is_met, "minimum spend state changed");
        }
        Ok(spend.current_amount)
    }

    // ------------------------------------------------------------------
    // Pending manual resets
    // ------------------------------------------------------------------

    /// Accept a batch of pending manual resets and persist. All-or-
    /// nothing: an unknown id rejects the batch before any mutation, and
    /// a persistence failure restores the pre-batch snapshot so the
    /// in-memory state matches what is durable.
    pub fn accept_pending(
        &mut self,
        accepted: &[(CardId, BenefitId)],
        today: Date,
    ) -> Result<usize, AppError> {
        if accepted.is_empty() {
            return Ok(0);
        }
        let snapshot = self.cards.clone();
        let count = engine::apply_pending(&mut self.cards, accepted, today)?;

        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "persist failed, restoring snapshot");
            self.cards = snapshot;
            return Err(e);
        }

        self.pending
            .retain(|p| !accepted.iter().any(|(c, b)| &p.card_id == c && &p.benefit_id == b));
        tracing::info!(count, "accepted pending resets");
        Ok(count)
    }

    /// Decline the queued decisions. No data mutation: the benefits stay
    /// due and will be surfaced again on the next load.
    pub fn decline_pending(&mut self) {
        tracing::info!(count = self.pending.len(), "declined pending resets");
        self.pending.clear();
    }
}
