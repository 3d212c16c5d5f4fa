//! User record
//!
//! Profile data as stored. The password hash never leaves the auth layer;
//! queries that need it return it alongside this struct, not inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{self, ValidationErrors, LOGIN_RULES, REGISTER_RULES};

/// A registered user, safe to hand to presenters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated registration input. The plaintext password lives only long
/// enough to be hashed.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    /// Validate a raw JSON body against the registration rule table.
    /// Email uniqueness is checked against storage by the caller.
    pub fn validate(body: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = validation::string_field(body, &REGISTER_RULES[0], &mut errors);
        let email = validation::string_field(body, &REGISTER_RULES[1], &mut errors);
        let password = validation::string_field(body, &REGISTER_RULES[2], &mut errors);

        if let Some(ref password) = password {
            let confirmation = body.get("password_confirmation").and_then(Value::as_str);
            if confirmation != Some(password.as_str()) {
                errors.add("password", "The password confirmation does not match.");
            }
        }

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(Self {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Validated login input. Presence only; credential verification happens
/// against the stored hash.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(body: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let email = validation::string_field(body, &LOGIN_RULES[0], &mut errors);
        let password = validation::string_field(body, &LOGIN_RULES[1], &mut errors);

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(Self { email, password }),
            _ => Err(errors),
        }
    }
}
