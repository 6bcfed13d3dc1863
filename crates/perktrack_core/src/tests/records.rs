//! Tests for schema validation and record round-trips

use jiff::civil::date;
use serde_json::json;

use super::{carryover_benefit, empty_card, one_time_spend, recurring_benefit};
use crate::model::{Card, Frequency, MinimumSpendId, ResetType};
use crate::schema::{normalize_midnight_datetimes, validate_card_records};

fn populated_card() -> Card {
    let mut card = empty_card();
    let mut dining = recurring_benefit(
        "dining",
        Frequency::Monthly,
        ResetType::Calendar,
        date(2024, 1, 15),
    );
    dining.set_used_amount(40.0);
    dining.claim_policy.set_ignored(true, Some(date(2024, 12, 31)));
    card.add_benefit(dining);

    let mut lounge = carryover_benefit("lounge", 300.0);
    lounge.earn_instance(date(2023, 6, 15));
    lounge.set_instance_used_amount(0, 120.0);
    lounge.required_minimum_spend = Some(MinimumSpendId::from("ms-1"));
    card.add_benefit(lounge);

    let mut spend = one_time_spend("ms-1", 4000.0, Some(date(2024, 9, 1)));
    spend.set_progress(2500.0, date(2024, 3, 1));
    card.add_minimum_spend(spend);
    card
}

#[test]
fn serialized_records_pass_the_schema() {
    let cards = vec![populated_card()];
    let value = serde_json::to_value(&cards).unwrap();
    assert_eq!(validate_card_records(&value), Ok(()));
}

#[test]
fn roundtrip_preserves_observable_queries() {
    let cards = vec![populated_card()];
    let json = serde_json::to_string(&cards).unwrap();
    let restored: Vec<Card> = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, cards);

    let today = date(2024, 2, 10);
    let original = &cards[0];
    let copy = &restored[0];
    assert_eq!(
        original.total_remaining_value(today),
        copy.total_remaining_value(today)
    );
    assert_eq!(
        original
            .benefits_needing_reset(today)
            .iter()
            .map(|b| b.id.clone())
            .collect::<Vec<_>>(),
        copy.benefits_needing_reset(today)
            .iter()
            .map(|b| b.id.clone())
            .collect::<Vec<_>>()
    );
    let dining = copy.benefit(&"dining".into()).unwrap();
    assert_eq!(
        dining
            .expiry_cycle(copy.anniversary_date)
            .unwrap()
            .next_reset_date(today),
        date(2024, 2, 1)
    );
}

#[test]
fn violations_are_path_qualified_and_collected() {
    let candidate = json!([
        {
            "id": "card-1",
            "name": "Sapphire",
            "anniversaryDate": "2019-06-15",
            "benefits": [
                {
                    "id": "dining",
                    "description": "Dining credit",
                    "totalAmount": "a lot",
                    "usedAmount": 0.0,
                    "kind": {"type": "recurring", "frequency": "fortnightly",
                             "resetType": "calendar", "lastReset": "2024-01-15"},
                    "autoClaim": false,
                    "autoClaimEndDate": null,
                    "ignored": false,
                    "ignoredEndDate": null,
                    "requiredMinimumSpend": null
                }
            ]
        }
    ]);

    let violations = validate_card_records(&candidate).unwrap_err();
    assert!(violations.contains(&"root[0].benefits[0].totalAmount should be a number".to_string()));
    assert!(violations.iter().any(|v| v.starts_with(
        "root[0].benefits[0].kind.frequency should be one of monthly, quarterly"
    )));
}

#[test]
fn rejection_is_atomic_across_the_record_set() {
    // One good card, one bad card: the whole set is rejected
    let good = serde_json::to_value(vec![populated_card()]).unwrap();
    let mut records = good.as_array().unwrap().clone();
    records.push(json!({"id": "card-2", "name": "Gold"}));
    let candidate = serde_json::Value::Array(records);

    let violations = validate_card_records(&candidate).unwrap_err();
    assert_eq!(
        violations,
        vec!["root[1].anniversaryDate is required".to_string()]
    );
}

#[test]
fn missing_tag_and_unknown_variant_are_reported() {
    let candidate = json!([
        {
            "id": "card-1",
            "name": "Sapphire",
            "anniversaryDate": "2019-06-15",
            "minimumSpends": [
                {
                    "id": "ms-1",
                    "description": "Signup spend",
                    "targetAmount": 4000.0,
                    "currentAmount": 0.0,
                    "cadence": {"type": "weekly"},
                    "isMet": false,
                    "metDate": null,
                    "ignored": false,
                    "ignoredEndDate": null
                }
            ]
        }
    ]);

    let violations = validate_card_records(&candidate).unwrap_err();
    assert_eq!(
        violations,
        vec!["root[0].minimumSpends[0].cadence.type should be one of oneTime, recurring".to_string()]
    );
}

#[test]
fn midnight_datetimes_validate_and_normalize() {
    let mut candidate = json!([
        {
            "id": "card-1",
            "name": "Sapphire",
            "anniversaryDate": "2019-06-15T00:00:00",
            "benefits": [],
            "minimumSpends": []
        }
    ]);

    assert_eq!(validate_card_records(&candidate), Ok(()));

    normalize_midnight_datetimes(&mut candidate);
    assert_eq!(candidate[0]["anniversaryDate"], "2019-06-15");
    let cards: Vec<Card> = serde_json::from_value(candidate).unwrap();
    assert_eq!(cards[0].anniversary_date, date(2019, 6, 15));
}

#[test]
fn non_midnight_datetime_is_rejected() {
    let candidate = json!([
        {
            "id": "card-1",
            "name": "Sapphire",
            "anniversaryDate": "2019-06-15T09:30:00",
            "benefits": [],
            "minimumSpends": []
        }
    ]);

    let violations = validate_card_records(&candidate).unwrap_err();
    assert_eq!(
        violations,
        vec!["root[0].anniversaryDate should be an ISO-8601 date".to_string()]
    );
}
