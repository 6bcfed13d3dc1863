//! Tests for aggregate benefit behavior: policies, usage, justifications

use jiff::civil::date;

use super::{carryover_benefit, empty_card, recurring_benefit};
use crate::model::{
    BenefitKind, Frequency, JustificationId, ResetType, UsageJustification,
};

#[test]
fn auto_claim_and_ignore_are_mutually_exclusive() {
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );

    benefit.claim_policy.set_auto_claim(true, None);
    assert!(benefit.is_auto_claim_active(date(2024, 2, 1)));

    benefit.claim_policy.set_ignored(true, Some(date(2024, 12, 31)));
    assert!(!benefit.claim_policy.auto_claim);
    assert_eq!(benefit.claim_policy.auto_claim_end_date, None);
    assert!(benefit.is_ignored_active(date(2024, 2, 1)));

    benefit.claim_policy.set_auto_claim(true, None);
    assert!(!benefit.claim_policy.ignored);
    assert_eq!(benefit.claim_policy.ignored_end_date, None);
}

#[test]
fn policy_end_dates_bound_activity() {
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );
    benefit.claim_policy.set_ignored(true, Some(date(2024, 6, 30)));

    assert!(benefit.is_ignored_active(date(2024, 6, 30)));
    assert!(!benefit.is_ignored_active(date(2024, 7, 1)));
}

#[test]
fn policies_never_activate_for_one_time_or_carryover() {
    let mut one_time = crate::model::Benefit::new(
        "welcome".into(),
        "Welcome credit",
        200.0,
        BenefitKind::OneTime { expiry_date: None },
    );
    one_time.claim_policy.set_auto_claim(true, None);
    assert!(!one_time.is_auto_claim_active(date(2024, 2, 1)));

    let mut carryover = carryover_benefit("lounge", 300.0);
    carryover.claim_policy.set_ignored(true, None);
    assert!(!carryover.is_ignored_active(date(2024, 2, 1)));
}

#[test]
fn used_amount_is_clamped() {
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );

    benefit.set_used_amount(250.0);
    assert_eq!(benefit.used_amount, 100.0);

    benefit.set_used_amount(-10.0);
    assert_eq!(benefit.used_amount, 0.0);

    benefit.set_used_amount(f64::NAN);
    assert_eq!(benefit.used_amount, 0.0);

    benefit.set_used_amount(40.0);
    assert!(!benefit.is_fully_used(date(2024, 1, 20)));
    assert_eq!(benefit.remaining_value(date(2024, 1, 20)), 60.0);
}

#[test]
fn reset_zeroes_usage_and_stamps_period() {
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );
    benefit.set_used_amount(80.0);

    benefit.reset(date(2024, 2, 3));
    assert_eq!(benefit.used_amount, 0.0);
    let BenefitKind::Recurring { last_reset, .. } = benefit.kind else {
        unreachable!()
    };
    assert_eq!(last_reset, date(2024, 2, 3));
}

#[test]
fn cycle_view_is_derived_fresh_after_field_edits() {
    let card = empty_card();
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );

    assert!(benefit
        .expiry_cycle(card.anniversary_date)
        .unwrap()
        .is_expired(date(2024, 2, 10)));

    // A reset changes the answer on the very next query
    benefit.reset(date(2024, 2, 10));
    assert!(!benefit
        .expiry_cycle(card.anniversary_date)
        .unwrap()
        .is_expired(date(2024, 2, 10)));
}

#[test]
fn one_time_and_carryover_have_no_expiry_cycle() {
    let card = empty_card();
    let one_time = crate::model::Benefit::new(
        "welcome".into(),
        "Welcome credit",
        200.0,
        BenefitKind::OneTime {
            expiry_date: Some(date(2024, 9, 30)),
        },
    );
    assert!(one_time.expiry_cycle(card.anniversary_date).is_none());

    let carryover = carryover_benefit("lounge", 300.0);
    assert!(carryover.expiry_cycle(card.anniversary_date).is_none());
    assert!(carryover.carryover_cycle().is_some());
}

#[test]
fn justification_ledger_crud() {
    let mut benefit = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );

    benefit.add_justification(UsageJustification {
        id: JustificationId::from("j-1"),
        amount: 25.0,
        note: "Dinner downtown".to_string(),
        reminder_date: Some(date(2024, 1, 28)),
        charge_date: None,
        confirmed: false,
    });
    benefit.add_justification(UsageJustification {
        id: JustificationId::from("j-2"),
        amount: 30.0,
        note: "Brunch".to_string(),
        reminder_date: None,
        charge_date: Some(date(2024, 1, 10)),
        confirmed: true,
    });

    // Informational only: nothing forces this to match used_amount
    assert_eq!(benefit.justified_total(), 55.0);

    assert_eq!(benefit.due_reminders(date(2024, 1, 27)).count(), 0);
    assert_eq!(benefit.due_reminders(date(2024, 1, 28)).count(), 1);

    assert!(benefit.confirm_justification(&JustificationId::from("j-1"), true));
    assert_eq!(benefit.due_reminders(date(2024, 1, 28)).count(), 0);

    assert!(benefit.remove_justification(&JustificationId::from("j-2")));
    assert!(!benefit.remove_justification(&JustificationId::from("j-2")));
    assert_eq!(benefit.justifications.len(), 1);
}

#[test]
fn instance_usage_is_clamped_per_instance() {
    let mut benefit = carryover_benefit("lounge", 300.0);
    benefit.earn_instance(date(2024, 3, 1));

    assert!(benefit.set_instance_used_amount(0, 500.0));
    let BenefitKind::Carryover { instances } = &benefit.kind else {
        unreachable!()
    };
    assert_eq!(instances[0].used_amount, 300.0);

    assert!(!benefit.set_instance_used_amount(5, 10.0));
}
