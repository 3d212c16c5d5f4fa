//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{password, token};
use crate::domain::user::{LoginInput, RegisterInput};
use crate::domain::{policy, Action, Expense, ExpenseInput, User, ValidationErrors};
use crate::error::AppError;
use crate::notify::ExpenseCreated;

use super::middleware::CurrentUser;
use super::presenter::{ExpenseResource, UserResource};
use super::AppState;

/// Page size used when the client sends nothing usable.
const DEFAULT_PAGE_SIZE: i64 = 10;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResource,
}

/// Pagination input. Both fields are taken as raw strings so that
/// non-numeric input falls back to defaults instead of erroring.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub data: Vec<ExpenseResource>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// =========================================================================
// Routers
// =========================================================================

/// Routes reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes behind the bearer-token authenticator. The auth middleware is
/// layered on by the caller, which owns the state.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/user", get(current_user))
        .route("/logout", post(logout))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(show_expense)
                .put(update_expense)
                .patch(update_expense)
                .delete(delete_expense),
        )
}

// =========================================================================
// POST /register
// =========================================================================

/// Register a new user
async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<UserResource>), AppError> {
    let input = RegisterInput::validate(&body)?;

    let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(&input.email)
        .fetch_one(&state.pool)
        .await?;

    if taken {
        return Err(ValidationErrors::single("email", "The email has already been taken.").into());
    }

    let password_hash = password::hash(&input.password)?;

    let user: User = match sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING id, name, email, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.email)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await
    {
        Ok(user) => user,
        // Two registrations racing on the same email: the loser gets the
        // same field error the pre-check would have produced.
        Err(e) if is_unique_violation(&e) => {
            return Err(
                ValidationErrors::single("email", "The email has already been taken.").into(),
            );
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(UserResource::from(user))))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

// =========================================================================
// POST /login
// =========================================================================

/// Exchange email + password for a bearer token
async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, AppError> {
    let input = LoginInput::validate(&body)?;

    let row: Option<(Uuid, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
            .bind(&input.email)
            .fetch_optional(&state.pool)
            .await?;

    // Unknown email and wrong password answer identically; the response
    // never says which one happened.
    let Some((user_id, stored_hash)) = row else {
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify(&input.password, &stored_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = token::issue(&state.pool, user_id).await?;

    Ok(Json(TokenResponse { token }))
}

// =========================================================================
// GET /user
// =========================================================================

/// The identity resolved by the authenticator for the presented token
async fn current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: UserResource::from(user),
    })
}

// =========================================================================
// POST /logout
// =========================================================================

/// Revoke every token the caller holds, ending all sessions at once
async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<MessageResponse>, AppError> {
    let revoked = token::revoke_all(&state.pool, user.id).await?;

    tracing::info!(user_id = %user.id, revoked = revoked, "Logged out");

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

// =========================================================================
// GET /expenses
// =========================================================================

/// List the caller's expenses, newest first
async fn list_expenses(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    if !policy::can(&user, Action::ListOwn, None) {
        return Err(AppError::Forbidden("Expense listing is not permitted".to_string()));
    }

    let limit = positive_or(query.limit.as_deref(), DEFAULT_PAGE_SIZE);
    let page = positive_or(query.page.as_deref(), 1);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&state.pool)
        .await?;

    let expenses: Vec<Expense> = sqlx::query_as(
        r#"
        SELECT id, user_id, description, date, value, created_at, updated_at
        FROM expenses
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ExpenseListResponse {
        data: expenses.into_iter().map(ExpenseResource::from).collect(),
        total,
        page,
        limit,
    }))
}

/// Parse a positive integer, falling back instead of erroring on absent,
/// non-numeric, or non-positive input.
fn positive_or(raw: Option<&str>, fallback: i64) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(fallback)
}

// =========================================================================
// POST /expenses
// =========================================================================

/// Create an expense owned by the caller
async fn create_expense(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ExpenseResource>), AppError> {
    if !policy::can(&user, Action::Create, None) {
        return Err(AppError::Forbidden("Expense creation is not permitted".to_string()));
    }

    let input = ExpenseInput::validate(&body, Utc::now().date_naive())?;

    // Ownership comes from the authenticated identity, never the body.
    let expense: Expense = sqlx::query_as(
        r#"
        INSERT INTO expenses (id, user_id, description, date, value, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        RETURNING id, user_id, description, date, value, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&input.description)
    .bind(input.date)
    .bind(input.value.cents())
    .fetch_one(&state.pool)
    .await?;

    // Queued only; delivery neither delays nor fails the response.
    state.notifier.notify(ExpenseCreated {
        user_id: user.id,
        expense_id: expense.id,
        description: expense.description.clone(),
    });

    Ok((StatusCode::CREATED, Json(ExpenseResource::from(expense))))
}

// =========================================================================
// GET /expenses/:id
// =========================================================================

/// Show one expense
async fn show_expense(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseResource>, AppError> {
    let expense = find_expense(&state.pool, id).await?;

    if !policy::can(&user, Action::View, Some(&expense)) {
        return Err(AppError::Forbidden("This expense belongs to another user".to_string()));
    }

    Ok(Json(ExpenseResource::from(expense)))
}

// =========================================================================
// PUT/PATCH /expenses/:id
// =========================================================================

/// Update one expense. Unknown id answers 404, invalid input 422, and
/// ownership mismatch 403, in that order.
async fn update_expense(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<ExpenseResource>, AppError> {
    let expense = find_expense(&state.pool, id).await?;

    let input = ExpenseInput::validate(&body, Utc::now().date_naive())?;

    if !policy::can(&user, Action::Update, Some(&expense)) {
        return Err(AppError::Forbidden("This expense belongs to another user".to_string()));
    }

    let updated: Expense = sqlx::query_as(
        r#"
        UPDATE expenses
        SET description = $2, date = $3, value = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, description, date, value, created_at, updated_at
        "#,
    )
    .bind(expense.id)
    .bind(&input.description)
    .bind(input.date)
    .bind(input.value.cents())
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ExpenseResource::from(updated)))
}

// =========================================================================
// DELETE /expenses/:id
// =========================================================================

/// Hard-delete one expense; the record is unrecoverable afterwards
async fn delete_expense(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let expense = find_expense(&state.pool, id).await?;

    if !policy::can(&user, Action::Delete, Some(&expense)) {
        return Err(AppError::Forbidden("This expense belongs to another user".to_string()));
    }

    sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(expense.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Look up an expense or answer 404. Runs before any ownership decision,
/// so nonexistence is reported as-is rather than masked as 403.
async fn find_expense(pool: &PgPool, id: Uuid) -> Result<Expense, AppError> {
    let expense: Option<Expense> = sqlx::query_as(
        r#"
        SELECT id, user_id, description, date, value, created_at, updated_at
        FROM expenses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    expense.ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_or_falls_back() {
        assert_eq!(positive_or(None, 10), 10);
        assert_eq!(positive_or(Some("abc"), 10), 10);
        assert_eq!(positive_or(Some(""), 10), 10);
        assert_eq!(positive_or(Some("0"), 10), 10);
        assert_eq!(positive_or(Some("-3"), 10), 10);
        assert_eq!(positive_or(Some("25"), 10), 25);
    }

    #[test]
    fn test_list_query_accepts_non_numeric_input() {
        let query: ListQuery = serde_json::from_str(r#"{"limit": "abc"}"#).unwrap();
        assert_eq!(query.limit.as_deref(), Some("abc"));
        assert!(query.page.is_none());
    }

    #[test]
    fn test_token_response_shape() {
        let json = serde_json::to_value(TokenResponse {
            token: "abc123".to_string(),
        })
        .unwrap();
        assert_eq!(json["token"], "abc123");
    }
}
