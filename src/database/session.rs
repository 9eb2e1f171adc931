use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::account::Account;
use crate::models::session::Session;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SessionRepository {
    async fn create_session(&self, account_id: &Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError>;
    async fn get_session_account(&self, token_hash: &str) -> Result<Option<Account>, AppError>;
    async fn delete_session(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_expired_sessions_for_account(&self, account_id: &Uuid) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl SessionRepository for PostgresRepository {
    async fn create_session(&self, account_id: &Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        self.delete_expired_sessions_for_account(account_id).await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_session (account_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, account_id, created_at, expires_at
            "#,
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn get_session_account(&self, token_hash: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.name, a.email, a.phone, a.password_hash, a.role, a.active_role,
                   a.average_rating, a.total_ratings, a.created_at
            FROM user_session s
            JOIN accounts a ON a.id = s.account_id
            WHERE s.token_hash = $1
              AND s.expires_at > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_session WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired_sessions_for_account(&self, account_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_session WHERE account_id = $1 AND expires_at <= now()")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
