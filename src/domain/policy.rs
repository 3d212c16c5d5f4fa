//! Authorization policy
//!
//! Every expense handler consults this one function before reading a
//! specific record or mutating anything. Ownership mismatch answers 403,
//! never 404: the record's existence is acknowledged, access is denied.

use super::expense::Expense;
use super::user::User;

/// What a caller is trying to do to an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    ListOwn,
}

/// Pure ownership decision: may `actor` perform `action` on `target`?
///
/// `Create` and `ListOwn` apply to the expense class as a whole, so they
/// take no target and are always permitted for an authenticated user.
pub fn can(actor: &User, action: Action, target: Option<&Expense>) -> bool {
    match action {
        Action::Create | Action::ListOwn => true,
        Action::View | Action::Update | Action::Delete => {
            target.is_some_and(|expense| expense.user_id == actor.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn user(id: Uuid) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn expense(owner: Uuid) -> Expense {
        let now = Utc::now();
        Expense {
            id: Uuid::new_v4(),
            user_id: owner,
            description: "Lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            value: 1500,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_can_view_update_delete() {
        let owner = user(Uuid::new_v4());
        let target = expense(owner.id);

        for action in [Action::View, Action::Update, Action::Delete] {
            assert!(can(&owner, action, Some(&target)));
        }
    }

    #[test]
    fn test_other_user_is_denied() {
        let owner = user(Uuid::new_v4());
        let intruder = user(Uuid::new_v4());
        let target = expense(owner.id);

        for action in [Action::View, Action::Update, Action::Delete] {
            assert!(!can(&intruder, action, Some(&target)));
        }
    }

    #[test]
    fn test_create_and_list_are_class_level() {
        let anyone = user(Uuid::new_v4());
        assert!(can(&anyone, Action::Create, None));
        assert!(can(&anyone, Action::ListOwn, None));
    }

    #[test]
    fn test_record_actions_require_a_target() {
        let anyone = user(Uuid::new_v4());
        assert!(!can(&anyone, Action::View, None));
        assert!(!can(&anyone, Action::Delete, None));
    }
}
