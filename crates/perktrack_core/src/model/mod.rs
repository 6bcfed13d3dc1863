mod benefit;
mod card;
mod ids;
mod min_spend;

pub use benefit::{
    Benefit, BenefitKind, ClaimPolicy, EarnedInstance, Frequency, ResetType, UsageJustification,
};
pub use card::Card;
pub use ids::{BenefitId, CardId, JustificationId, MinimumSpendId};
pub use min_spend::{MinimumSpend, SpendCadence, SpendFrequency};
