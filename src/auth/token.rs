//! Bearer tokens
//!
//! Opaque tokens handed to the client once at login. Only the sha256 hex
//! digest is stored, so a database read never yields a usable credential.
//! A user may hold several tokens at once (one per device); revocation
//! deletes all of them in one statement.

use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::User;

/// Random bytes per token; hex-encoded to a 64-character string.
const TOKEN_BYTES: usize = 32;

/// Generate a fresh opaque token string.
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The sha256 hex digest stored in place of the token itself.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mint a token for a user and return the plaintext, which is never
/// recoverable afterwards.
pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate();

    sqlx::query(
        r#"
        INSERT INTO tokens (id, user_id, token_hash, created_at)
        VALUES ($1, $2, $3, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(digest(&token))
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolve a presented token to its user, or None if the digest is unknown.
pub async fn resolve(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT u.id, u.name, u.email, u.created_at, u.updated_at
        FROM tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1
        "#,
    )
    .bind(digest(token))
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Revoke every token the user holds. Logout is deliberately coarse:
/// all sessions end, not just the one that called it.
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
