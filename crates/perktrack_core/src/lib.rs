//! Card benefit lifecycle engine
//!
//! This crate tracks recurring, one-time, and carryover monetary benefits
//! attached to cards, each governed by a reset/expiry cycle, plus
//! minimum-spend requirements that can gate a benefit's availability.
//! It supports:
//! - Calendar and anniversary period boundaries (monthly through 4-year
//!   cadences) with month-end clamping and leap-year handling
//! - Deterministic catch-up across arbitrarily many skipped periods
//! - Carryover instances that expire independently per calendar year
//! - Auto-claim and ignore policies applied by a snapshot-first reset pass
//! - Schema validation of the serialized record form with path-qualified
//!   violations
//!
//! The engine is pure and synchronous: "today" is always an injected
//! `jiff::civil::Date`, never a wall-clock read, so every pass is
//! replayable. Persistence and rendering are the caller's concern.

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod cycle;
pub mod date_math;
pub mod engine;
pub mod error;
pub mod schema;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use cycle::{CarryoverCycle, ExpiryCycle, MinSpendCycle};
pub use engine::{
    BenefitState, PendingReset, ResetPassOutcome, apply_pending, classify_benefit, detect,
    run_reset_pass,
};
pub use error::LookupError;
pub use model::{
    Benefit, BenefitId, BenefitKind, Card, CardId, ClaimPolicy, EarnedInstance, Frequency,
    JustificationId, MinimumSpend, MinimumSpendId, ResetType, SpendCadence, SpendFrequency,
    UsageJustification,
};
pub use schema::{normalize_midnight_datetimes, validate_card_records};
