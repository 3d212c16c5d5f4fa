//! Resource presenters
//!
//! Map stored rows to their wire shapes. Money leaves the API as a decimal
//! major-unit amount, dates as plain `YYYY-MM-DD`, timestamps as UTC with a
//! literal `Z` and no subseconds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Expense, User};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Wire representation of an expense.
///
/// The owning user appears as `user_id` only; the full user record is
/// never embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseResource {
    pub id: Uuid,
    pub description: String,
    pub date: String,
    pub value: Decimal,
    pub user_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Expense> for ExpenseResource {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            description: expense.description,
            date: expense.date.format(DATE_FORMAT).to_string(),
            // stored minor units divided by 100, exact under the
            // integer-cents invariant
            value: Decimal::new(expense.value, 2),
            user_id: expense.user_id,
            created_at: format_timestamp(expense.created_at),
            updated_at: format_timestamp(expense.updated_at),
        }
    }
}

/// Wire representation of a user. The password hash is not part of the
/// input type, so it can never leak through here.
#[derive(Debug, Clone, Serialize)]
pub struct UserResource {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResource {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: format_timestamp(user.created_at),
            updated_at: format_timestamp(user.updated_at),
        }
    }
}
