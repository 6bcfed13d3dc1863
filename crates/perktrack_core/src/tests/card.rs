//! Tests for card-level queries and child mutation

use jiff::civil::date;

use super::{carryover_benefit, empty_card, one_time_spend, recurring_benefit};
use crate::model::{BenefitId, Frequency, MinimumSpendId, ResetType};

#[test]
fn benefits_needing_reset_is_pure_and_selective() {
    let mut card = empty_card();
    card.add_benefit(recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    ));
    card.add_benefit(recurring_benefit(
        "travel",
        Frequency::Annual,
        ResetType::Calendar,
        date(2024, 1, 5),
    ));
    card.add_benefit(carryover_benefit("lounge", 300.0));

    let before = card.clone();
    let due = card.benefits_needing_reset(date(2024, 2, 10));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, BenefitId::from("dining"));
    // The query must not mutate anything
    assert_eq!(card, before);
}

#[test]
fn expiring_within_unions_recurring_and_carryover() {
    let mut card = empty_card();
    // Monthly boundary lands 2024-02-01
    card.add_benefit(recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    ));
    // Carryover instance expiring 2024-12-31
    let mut lounge = carryover_benefit("lounge", 300.0);
    lounge.earn_instance(date(2023, 6, 15));
    card.add_benefit(lounge);

    let soon = card.benefits_expiring_within(date(2024, 1, 25), 7);
    assert_eq!(soon.len(), 1);
    assert_eq!(soon[0].id, BenefitId::from("dining"));

    let year_end = card.benefits_expiring_within(date(2024, 12, 10), 30);
    assert_eq!(year_end.len(), 1);
    assert_eq!(year_end[0].id, BenefitId::from("lounge"));
}

#[test]
fn one_time_expiry_surfaces_while_value_remains() {
    let mut card = empty_card();
    let mut welcome = crate::model::Benefit::new(
        "welcome".into(),
        "Welcome credit",
        200.0,
        crate::model::BenefitKind::OneTime {
            expiry_date: Some(date(2024, 9, 30)),
        },
    );
    card.add_benefit(welcome.clone());

    assert_eq!(card.benefits_expiring_within(date(2024, 9, 10), 30).len(), 1);
    assert!(card.benefits_expiring_within(date(2024, 8, 1), 30).is_empty());

    // Spent benefits are not worth surfacing
    welcome.set_used_amount(200.0);
    card.benefits[0] = welcome;
    assert!(card.benefits_expiring_within(date(2024, 9, 10), 30).is_empty());

    // Past expiry it is no longer "expiring"
    assert!(card.benefit(&"welcome".into()).unwrap().is_one_time_expired(date(2024, 10, 1)));
}

#[test]
fn dangling_min_spend_reference_counts_as_locked() {
    let mut card = empty_card();
    let mut benefit = recurring_benefit(
        "travel",
        Frequency::Annual,
        ResetType::Calendar,
        date(2024, 1, 5),
    );
    benefit.required_minimum_spend = Some(MinimumSpendId::from("missing"));
    card.add_benefit(benefit);

    assert!(!card.is_benefit_unlocked(card.benefit(&"travel".into()).unwrap()));
}

#[test]
fn removing_min_spend_clears_benefit_links() {
    let mut card = empty_card();
    let spend = one_time_spend("ms-1", 4000.0, None);
    let mut benefit = recurring_benefit(
        "travel",
        Frequency::Annual,
        ResetType::Calendar,
        date(2024, 1, 5),
    );
    benefit.required_minimum_spend = Some(spend.id.clone());
    card.add_minimum_spend(spend);
    card.add_benefit(benefit);

    assert!(card.remove_minimum_spend(&MinimumSpendId::from("ms-1")).is_some());
    let benefit = card.benefit(&"travel".into()).unwrap();
    assert_eq!(benefit.required_minimum_spend, None);
    // No longer gated at all
    assert!(card.is_benefit_unlocked(benefit));
}

#[test]
fn reorder_moves_benefit_in_display_order() {
    let mut card = empty_card();
    for id in ["a", "b", "c"] {
        card.add_benefit(recurring_benefit(
            id,
            Frequency::Monthly,
            ResetType::Calendar,
            date(2024, 1, 15),
        ));
    }

    assert!(card.reorder_benefit(&BenefitId::from("c"), 0));
    let order: Vec<&str> = card.benefits.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);

    // Out-of-range target clamps to the end
    assert!(card.reorder_benefit(&BenefitId::from("c"), 99));
    let order: Vec<&str> = card.benefits.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);

    assert!(!card.reorder_benefit(&BenefitId::from("zzz"), 0));
}

#[test]
fn anniversary_edit_rederives_child_cycles() {
    let mut card = empty_card();
    card.add_benefit(recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Anniversary,
        date(2024, 6, 15),
    ));

    let next = |card: &crate::model::Card| {
        card.benefit(&"dining".into())
            .unwrap()
            .expiry_cycle(card.anniversary_date)
            .unwrap()
            .next_reset_date(date(2024, 6, 20))
    };

    assert_eq!(next(&card), date(2024, 7, 15));

    // Moving the anniversary moves every derived boundary with it
    card.set_anniversary(date(2019, 6, 1));
    assert_eq!(next(&card), date(2024, 7, 1));
}

#[test]
fn total_remaining_counts_unlocked_benefits_only() {
    let mut card = empty_card();
    let mut gated = recurring_benefit(
        "travel",
        Frequency::Annual,
        ResetType::Calendar,
        date(2024, 1, 5),
    );
    gated.required_minimum_spend = Some(MinimumSpendId::from("ms-1"));
    card.add_minimum_spend(one_time_spend("ms-1", 4000.0, None));
    card.add_benefit(gated);
    card.add_benefit(recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    ));

    // Only the un-gated benefit counts while the requirement is unmet
    assert_eq!(card.total_remaining_value(date(2024, 1, 20)), 100.0);

    card.minimum_spend_mut(&MinimumSpendId::from("ms-1"))
        .unwrap()
        .set_progress(4000.0, date(2024, 2, 1));
    assert_eq!(card.total_remaining_value(date(2024, 2, 1)), 200.0);
}
