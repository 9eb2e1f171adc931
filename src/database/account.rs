use crate::database::postgres_repository::{PostgresRepository, is_unique_violation};
use crate::error::app_error::AppError;
use crate::models::account::{Account, NewAccount, Role};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// Real Argon2 hash used to equalize timing when the looked-up account does not exist.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .ok()
        .map(|hash| hash.to_string())
});

const ACCOUNT_COLUMNS: &str = "id, name, email, phone, password_hash, role, active_role, average_rating, total_ratings, created_at";

#[async_trait::async_trait]
pub trait AccountRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn get_account_by_id(&self, id: &Uuid) -> Result<Option<Account>, AppError>;
    async fn set_active_role(&self, id: &Uuid, role: Role) -> Result<Account, AppError>;
}

#[async_trait::async_trait]
impl AccountRepository for PostgresRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        let (salt, password_hash) = password_hash(&account.password)?;

        let result = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (name, email, phone, salt, password_hash, role, active_role)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&salt)
        .bind(&password_hash)
        .bind(account.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(AppError::AccountAlreadyExists(account.email.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn get_account_by_id(&self, id: &Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn set_active_role(&self, id: &Uuid, role: Role) -> Result<Account, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
            SET active_role = $2
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        account.ok_or_else(|| AppError::not_found("Account not found"))
    }
}

pub(crate) fn verify_password(account: &Account, password: &str) -> Result<(), AppError> {
    let password_hash = PasswordHash::new(&account.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &password_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

/// Throwaway verification so unknown emails cost the same as wrong passwords.
pub(crate) fn dummy_verify(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref()
        && let Ok(hash) = PasswordHash::new(hash)
    {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}

pub(crate) fn password_hash(password: &str) -> Result<(String, String), AppError> {
    let salt_string = SaltString::generate(&mut OsRng);
    let salt = Salt::from(&salt_string);
    let password_hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt)?;

    Ok((salt.to_string(), password_hash.to_string()))
}
