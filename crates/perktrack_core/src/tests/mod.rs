//! Integration tests for the benefit lifecycle engine
//!
//! Tests are organized by topic:
//! - `expiry` - Period boundaries, catch-up, anniversary clamping
//! - `carryover` - Earned instance expiry and isolation
//! - `min_spend` - Spend periods, met/unmet transitions, gating
//! - `benefit` - Aggregate behavior: policies, usage, justifications
//! - `card` - Card-level queries and child mutation
//! - `engine` - The reset pass state machine
//! - `records` - Schema validation and record round-trips

mod benefit;
mod card;
mod records;

use jiff::civil::{Date, date};

use crate::model::{
    Benefit, BenefitId, BenefitKind, Card, CardId, Frequency, MinimumSpend, MinimumSpendId,
    ResetType, SpendCadence,
};

/// A card with a mid-June anniversary and no children.
pub(crate) fn empty_card() -> Card {
    Card::new(CardId::from("card-1"), "Sapphire", date(2019, 6, 15))
}

pub(crate) fn recurring_benefit(
    id: &str,
    frequency: Frequency,
    reset_type: ResetType,
    last_reset: Date,
) -> Benefit {
    Benefit::new(
        BenefitId::from(id),
        format!("{id} credit"),
        100.0,
        BenefitKind::Recurring {
            frequency,
            reset_type,
            last_reset,
        },
    )
}

pub(crate) fn carryover_benefit(id: &str, total: f64) -> Benefit {
    Benefit::new(
        BenefitId::from(id),
        format!("{id} carryover"),
        total,
        BenefitKind::Carryover { instances: vec![] },
    )
}

pub(crate) fn one_time_spend(id: &str, target: f64, deadline: Option<Date>) -> MinimumSpend {
    MinimumSpend::new(
        MinimumSpendId::from(id),
        format!("{id} spend"),
        target,
        SpendCadence::OneTime { deadline },
    )
}
