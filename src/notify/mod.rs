//! Notification dispatch
//!
//! Fire-and-forget delivery of `expense_created` messages. The create
//! handler enqueues and moves on; delivery runs on a background task and a
//! failure there never fails or rolls back the originating request.

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Message sent to an expense owner when their expense is stored.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseCreated {
    pub user_id: Uuid,
    pub expense_id: Uuid,
    pub description: String,
}

/// Cloneable handle for queueing notifications.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<ExpenseCreated>,
}

impl Notifier {
    /// Spawn the delivery worker and return the sending handle.
    pub fn spawn(pool: PgPool) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ExpenseCreated>();

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if let Err(e) = deliver(&pool, &message).await {
                    tracing::warn!(
                        error = %e,
                        expense_id = %message.expense_id,
                        "Notification delivery failed"
                    );
                }
            }
        });

        Self { sender }
    }

    /// Handle backed by an existing channel; the caller owns the receiver.
    #[cfg(test)]
    fn from_sender(sender: mpsc::UnboundedSender<ExpenseCreated>) -> Self {
        Self { sender }
    }

    /// Queue a notification. Never blocks and never errors: if the worker
    /// is gone the message is dropped with a warning.
    pub fn notify(&self, message: ExpenseCreated) {
        if self.sender.send(message).is_err() {
            tracing::warn!("Notification worker is gone; dropping message");
        }
    }
}

async fn deliver(pool: &PgPool, message: &ExpenseCreated) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, payload, created_at)
        VALUES ($1, $2, 'expense_created', $3, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(message.user_id)
    .bind(json!({
        "expense_id": message.expense_id,
        "description": message.description,
    }))
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ExpenseCreated {
        ExpenseCreated {
            user_id: Uuid::new_v4(),
            expense_id: Uuid::new_v4(),
            description: "Lunch".to_string(),
        }
    }

    #[tokio::test]
    async fn test_notify_enqueues_message() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let notifier = Notifier::from_sender(sender);

        let sent = message();
        notifier.notify(sent.clone());

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.expense_id, sent.expense_id);
        assert_eq!(received.user_id, sent.user_id);
    }

    #[tokio::test]
    async fn test_notify_survives_a_dead_worker() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = Notifier::from_sender(sender);
        drop(receiver);

        // Must not panic or error; the message is simply dropped.
        notifier.notify(message());
    }
}
