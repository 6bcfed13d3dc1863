//! Serialization-boundary validation
//!
//! Externally-sourced record sets (a synced file, an assistant proposal)
//! are untrusted JSON until they pass this check. The schema is a
//! recursive required/nullable/enum descriptor evaluated against
//! `serde_json::Value`; violations are collected as path-qualified
//! strings and the whole candidate set is accepted or rejected
//! atomically, never partially applied.

use serde_json::Value;

/// A recursive shape descriptor.
#[derive(Debug, Clone)]
pub enum Schema {
    /// An object with named fields.
    Object(Vec<Field>),
    /// A homogeneous array.
    Array(Box<Schema>),
    /// An internally-tagged union: the `tag` field selects a variant,
    /// each contributing its own extra fields.
    Tagged {
        tag: &'static str,
        variants: Vec<(&'static str, Vec<Field>)>,
    },
    String,
    Number,
    Bool,
    /// An ISO-8601 civil date, optionally carrying a midnight time
    /// suffix (see [`normalize_midnight_datetimes`]).
    Date,
    /// One of a fixed set of strings.
    Enum(&'static [&'static str]),
    /// The inner schema, or null.
    Nullable(Box<Schema>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

fn nullable(schema: Schema) -> Schema {
    Schema::Nullable(Box::new(schema))
}

/// The persisted record shape: an array of card records.
pub fn card_records_schema() -> Schema {
    Schema::Array(Box::new(card_schema()))
}

fn card_schema() -> Schema {
    Schema::Object(vec![
        Field::required("id", Schema::String),
        Field::required("name", Schema::String),
        Field::required("anniversaryDate", Schema::Date),
        Field::optional("benefits", Schema::Array(Box::new(benefit_schema()))),
        Field::optional(
            "minimumSpends",
            Schema::Array(Box::new(minimum_spend_schema())),
        ),
    ])
}

fn benefit_schema() -> Schema {
    Schema::Object(vec![
        Field::required("id", Schema::String),
        Field::required("description", Schema::String),
        Field::required("totalAmount", Schema::Number),
        Field::required("usedAmount", Schema::Number),
        Field::required("kind", benefit_kind_schema()),
        Field::required("autoClaim", Schema::Bool),
        Field::required("autoClaimEndDate", nullable(Schema::Date)),
        Field::required("ignored", Schema::Bool),
        Field::required("ignoredEndDate", nullable(Schema::Date)),
        Field::required("requiredMinimumSpend", nullable(Schema::String)),
        Field::optional(
            "justifications",
            Schema::Array(Box::new(justification_schema())),
        ),
    ])
}

fn benefit_kind_schema() -> Schema {
    Schema::Tagged {
        tag: "type",
        variants: vec![
            (
                "recurring",
                vec![
                    Field::required(
                        "frequency",
                        Schema::Enum(&[
                            "monthly",
                            "quarterly",
                            "biannual",
                            "annual",
                            "every-4-years",
                        ]),
                    ),
                    Field::required("resetType", Schema::Enum(&["calendar", "anniversary"])),
                    Field::required("lastReset", Schema::Date),
                ],
            ),
            (
                "oneTime",
                vec![Field::required("expiryDate", nullable(Schema::Date))],
            ),
            (
                "carryover",
                vec![Field::required(
                    "instances",
                    Schema::Array(Box::new(instance_schema())),
                )],
            ),
        ],
    }
}

fn instance_schema() -> Schema {
    Schema::Object(vec![
        Field::required("earnedDate", Schema::Date),
        Field::required("usedAmount", Schema::Number),
        Field::optional(
            "justifications",
            Schema::Array(Box::new(justification_schema())),
        ),
    ])
}

fn justification_schema() -> Schema {
    Schema::Object(vec![
        Field::required("id", Schema::String),
        Field::required("amount", Schema::Number),
        Field::required("note", Schema::String),
        Field::required("reminderDate", nullable(Schema::Date)),
        Field::required("chargeDate", nullable(Schema::Date)),
        Field::required("confirmed", Schema::Bool),
    ])
}

fn minimum_spend_schema() -> Schema {
    Schema::Object(vec![
        Field::required("id", Schema::String),
        Field::required("description", Schema::String),
        Field::required("targetAmount", Schema::Number),
        Field::required("currentAmount", Schema::Number),
        Field::required("cadence", spend_cadence_schema()),
        Field::required("isMet", Schema::Bool),
        Field::required("metDate", nullable(Schema::Date)),
        Field::required("ignored", Schema::Bool),
        Field::required("ignoredEndDate", nullable(Schema::Date)),
    ])
}

fn spend_cadence_schema() -> Schema {
    Schema::Tagged {
        tag: "type",
        variants: vec![
            (
                "oneTime",
                vec![Field::required("deadline", nullable(Schema::Date))],
            ),
            (
                "recurring",
                vec![
                    Field::required(
                        "frequency",
                        Schema::Enum(&["monthly", "quarterly", "biannual", "yearly", "annual"]),
                    ),
                    Field::required("resetType", Schema::Enum(&["calendar", "anniversary"])),
                    Field::required("lastReset", Schema::Date),
                ],
            ),
        ],
    }
}

/// Validate a candidate card record array. `Ok(())` means the whole set
/// may be trusted; `Err` carries every violation found.
pub fn validate_card_records(value: &Value) -> Result<(), Vec<String>> {
    let schema = card_records_schema();
    let mut violations = Vec::new();
    validate(value, &schema, "root", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn validate(value: &Value, schema: &Schema, path: &str, violations: &mut Vec<String>) {
    match schema {
        Schema::Nullable(inner) => {
            if !value.is_null() {
                validate(value, inner, path, violations);
            }
        }
        Schema::String => {
            if !value.is_string() {
                violations.push(format!("{path} should be a string"));
            }
        }
        Schema::Number => {
            if !value.is_number() {
                violations.push(format!("{path} should be a number"));
            }
        }
        Schema::Bool => {
            if !value.is_boolean() {
                violations.push(format!("{path} should be a boolean"));
            }
        }
        Schema::Date => match value.as_str() {
            Some(s) if parse_record_date(s).is_some() => {}
            _ => violations.push(format!("{path} should be an ISO-8601 date")),
        },
        Schema::Enum(options) => {
            let matched = value.as_str().is_some_and(|s| options.contains(&s));
            if !matched {
                violations.push(format!("{path} should be one of {}", options.join(", ")));
            }
        }
        Schema::Array(element) => match value.as_array() {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    validate(item, element, &format!("{path}[{index}]"), violations);
                }
            }
            None => violations.push(format!("{path} should be an array")),
        },
        Schema::Object(fields) => match value.as_object() {
            Some(map) => {
                for field in fields {
                    let field_path = format!("{path}.{}", field.name);
                    match map.get(field.name) {
                        Some(field_value) => {
                            validate(field_value, &field.schema, &field_path, violations)
                        }
                        None if field.required => {
                            violations.push(format!("{field_path} is required"))
                        }
                        None => {}
                    }
                }
            }
            None => violations.push(format!("{path} should be an object")),
        },
        Schema::Tagged { tag, variants } => match value.as_object() {
            Some(map) => {
                let tag_path = format!("{path}.{tag}");
                let tag_value = map.get(*tag).and_then(Value::as_str);
                match tag_value.and_then(|t| variants.iter().find(|(name, _)| *name == t)) {
                    Some((_, fields)) => {
                        for field in fields {
                            let field_path = format!("{path}.{}", field.name);
                            match map.get(field.name) {
                                Some(field_value) => {
                                    validate(field_value, &field.schema, &field_path, violations)
                                }
                                None if field.required => {
                                    violations.push(format!("{field_path} is required"))
                                }
                                None => {}
                            }
                        }
                    }
                    None => {
                        let names: Vec<&str> = variants.iter().map(|(name, _)| *name).collect();
                        violations
                            .push(format!("{tag_path} should be one of {}", names.join(", ")));
                    }
                }
            }
            None => violations.push(format!("{path} should be an object")),
        },
    }
}

/// Parse a record date: a plain civil date, or a civil date carrying a
/// midnight time suffix.
fn parse_record_date(s: &str) -> Option<jiff::civil::Date> {
    let date_part = match s.split_once('T') {
        Some((date, time)) => {
            if !is_midnight(time) {
                return None;
            }
            date
        }
        None => s,
    };
    date_part.parse().ok()
}

fn is_midnight(time: &str) -> bool {
    let time = time.strip_suffix('Z').unwrap_or(time);
    matches!(time, "00:00" | "00:00:00" | "00:00:00.000")
}

/// Rewrite midnight date-time strings to plain civil dates, in place.
/// Run before deserializing so records written with full timestamps load
/// cleanly; `validate_card_records` accepts either form.
pub fn normalize_midnight_datetimes(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('T')
                && let Some(date) = parse_record_date(s)
            {
                *s = date.to_string();
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_midnight_datetimes(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                normalize_midnight_datetimes(item);
            }
        }
        _ => {}
    }
}
