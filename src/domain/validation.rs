//! Request validation
//!
//! Declarative per-operation rule tables evaluated against the raw JSON
//! body. Failures are collected as field-level messages and surfaced as a
//! 422 response; nothing is persisted when any rule fails.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// What a field must look like.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// UTF-8 text with a maximum length in characters.
    Text { max_chars: usize },
    /// Well-formed email address.
    Email,
    /// Password with a minimum length in characters.
    Password { min_chars: usize },
    /// Calendar date in `YYYY-MM-DD` form; `max_today` rejects future dates.
    Date { max_today: bool },
    /// Integer amount with an inclusive lower bound.
    Integer { min: i64 },
}

/// A single entry in an operation's rule table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

/// Rules for expense create/update.
pub const EXPENSE_RULES: &[FieldRule] = &[
    FieldRule {
        name: "description",
        required: true,
        kind: FieldKind::Text { max_chars: 191 },
    },
    FieldRule {
        name: "date",
        required: true,
        kind: FieldKind::Date { max_today: true },
    },
    FieldRule {
        name: "value",
        required: true,
        kind: FieldKind::Integer { min: 0 },
    },
];

/// Rules for registration.
pub const REGISTER_RULES: &[FieldRule] = &[
    FieldRule {
        name: "name",
        required: true,
        kind: FieldKind::Text { max_chars: 191 },
    },
    FieldRule {
        name: "email",
        required: true,
        kind: FieldKind::Email,
    },
    FieldRule {
        name: "password",
        required: true,
        kind: FieldKind::Password { min_chars: 8 },
    },
];

/// Rules for login. Credential mismatch is a 401 handled elsewhere; this
/// table only covers presence of the fields themselves.
pub const LOGIN_RULES: &[FieldRule] = &[
    FieldRule {
        name: "email",
        required: true,
        kind: FieldKind::Text { max_chars: 191 },
    },
    FieldRule {
        name: "password",
        required: true,
        kind: FieldKind::Text { max_chars: 191 },
    },
];

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    /// A single message for a single field.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "validation failed for: {}", fields.join(", "))
    }
}

/// Extract and validate a string field (`Text`, `Email`, `Password` kinds).
pub fn string_field(
    body: &Value,
    rule: &FieldRule,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = match body.get(rule.name) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None | Some(Value::String(_)) => {
            if rule.required {
                errors.add(rule.name, format!("The {} field is required.", rule.name));
            }
            return None;
        }
        Some(_) => {
            errors.add(rule.name, format!("The {} must be a string.", rule.name));
            return None;
        }
    };

    match rule.kind {
        FieldKind::Text { max_chars } => {
            if value.chars().count() > max_chars {
                errors.add(
                    rule.name,
                    format!(
                        "The {} may not be greater than {} characters.",
                        rule.name, max_chars
                    ),
                );
                return None;
            }
        }
        FieldKind::Email => {
            if !looks_like_email(&value) {
                errors.add(
                    rule.name,
                    format!("The {} must be a valid email address.", rule.name),
                );
                return None;
            }
        }
        FieldKind::Password { min_chars } => {
            if value.chars().count() < min_chars {
                errors.add(
                    rule.name,
                    format!(
                        "The {} must be at least {} characters.",
                        rule.name, min_chars
                    ),
                );
                return None;
            }
        }
        FieldKind::Date { .. } | FieldKind::Integer { .. } => return None,
    }

    Some(value)
}

/// Extract and validate a `Date` field against the current server date.
pub fn date_field(
    body: &Value,
    rule: &FieldRule,
    today: NaiveDate,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let raw = match body.get(rule.name) {
        Some(Value::String(s)) if !s.is_empty() => s.as_str(),
        Some(Value::Null) | None | Some(Value::String(_)) => {
            if rule.required {
                errors.add(rule.name, format!("The {} field is required.", rule.name));
            }
            return None;
        }
        Some(_) => {
            errors.add(rule.name, format!("The {} is not a valid date.", rule.name));
            return None;
        }
    };

    let date = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            errors.add(rule.name, format!("The {} is not a valid date.", rule.name));
            return None;
        }
    };

    if let FieldKind::Date { max_today: true } = rule.kind {
        if date > today {
            errors.add(
                rule.name,
                format!("The {} must be a date before or equal to today.", rule.name),
            );
            return None;
        }
    }

    Some(date)
}

/// Extract and validate an `Integer` field. Accepts a JSON integer or a
/// numeric string; anything fractional is rejected.
pub fn integer_field(
    body: &Value,
    rule: &FieldRule,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let parsed = match body.get(rule.name) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => v,
            None => {
                errors.add(rule.name, format!("The {} must be an integer.", rule.name));
                return None;
            }
        },
        Some(Value::String(s)) if !s.is_empty() => match s.trim().parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                errors.add(rule.name, format!("The {} must be an integer.", rule.name));
                return None;
            }
        },
        Some(Value::Null) | None | Some(Value::String(_)) => {
            if rule.required {
                errors.add(rule.name, format!("The {} field is required.", rule.name));
            }
            return None;
        }
        Some(_) => {
            errors.add(rule.name, format!("The {} must be an integer.", rule.name));
            return None;
        }
    };

    if let FieldKind::Integer { min } = rule.kind {
        if parsed < min {
            errors.add(
                rule.name,
                format!("The {} must be at least {}.", rule.name, min),
            );
            return None;
        }
    }

    Some(parsed)
}

/// Minimal structural email check: one `@` with non-empty local part and a
/// dotted domain.
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
