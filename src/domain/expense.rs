//! Expense record and validated input
//!
//! An expense belongs to exactly one user, set from the authenticated
//! identity at creation and never taken from the request body.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::money::MinorUnits;
use super::validation::{self, ValidationErrors, EXPENSE_RULES};

/// An expense as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub date: NaiveDate,
    /// Integer minor units (cents).
    pub value: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated create/update input for an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub description: String,
    pub date: NaiveDate,
    pub value: MinorUnits,
}

impl ExpenseInput {
    /// Validate a raw JSON body against the expense rule table.
    ///
    /// Any `user_id` the client sends is ignored entirely; ownership comes
    /// from the authenticated identity.
    pub fn validate(body: &Value, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let description = validation::string_field(body, &EXPENSE_RULES[0], &mut errors);
        let date = validation::date_field(body, &EXPENSE_RULES[1], today, &mut errors);
        let value = validation::integer_field(body, &EXPENSE_RULES[2], &mut errors)
            .and_then(|cents| match MinorUnits::new(cents) {
                Ok(amount) => Some(amount),
                Err(e) => {
                    errors.add("value", e.to_string());
                    None
                }
            });

        match (description, date, value) {
            (Some(description), Some(date), Some(value)) if errors.is_empty() => Ok(Self {
                description,
                date,
                value,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn test_valid_input() {
        let body = json!({
            "description": "Office supplies",
            "date": "2026-08-01",
            "value": 12345
        });

        let input = ExpenseInput::validate(&body, today()).unwrap();
        assert_eq!(input.description, "Office supplies");
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(input.value.cents(), 12345);
    }

    #[test]
    fn test_client_supplied_user_id_is_ignored() {
        let body = json!({
            "description": "Sneaky",
            "date": "2026-08-01",
            "value": 100,
            "user_id": "11111111-1111-1111-1111-111111111111"
        });

        // Validation succeeds and the foreign field simply never surfaces.
        assert!(ExpenseInput::validate(&body, today()).is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let body = json!({
            "description": "x".repeat(192),
            "date": "2027-01-01",
            "value": -50
        });

        let errors = ExpenseInput::validate(&body, today()).unwrap_err();
        assert!(errors.contains("description"));
        assert!(errors.contains("date"));
        assert!(errors.contains("value"));
    }

    #[test]
    fn test_empty_body_reports_all_required() {
        let errors = ExpenseInput::validate(&json!({}), today()).unwrap_err();
        assert!(errors.contains("description"));
        assert!(errors.contains("date"));
        assert!(errors.contains("value"));
    }

    #[test]
    fn test_non_object_body_reports_all_required() {
        let errors = ExpenseInput::validate(&json!("nonsense"), today()).unwrap_err();
        assert!(errors.contains("description"));
    }
}
