use crate::auth::{CurrentUser, generate_session_token};
use crate::config::SessionConfig;
use crate::database::account::{AccountRepository, dummy_verify, verify_password};
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::account::{Account, AccountResponse, AuthResponse, LoginRequest, RegisterRequest, Role, SetRoleRequest, SetRoleResponse};
use chrono::{Duration, Utc};
use tracing::info;
use validator::Validate;

pub struct AuthService<'a, R> {
    repository: &'a R,
    config: &'a SessionConfig,
}

impl<'a, R> AuthService<'a, R>
where
    R: AccountRepository + SessionRepository + Sync,
{
    pub fn new(repository: &'a R, config: &'a SessionConfig) -> Self {
        AuthService { repository, config }
    }

    pub async fn register(&self, request: RegisterRequest, role: Role) -> Result<AuthResponse, AppError> {
        request.validate()?;
        let new_account = request.into_new_account(role);

        if self.repository.get_account_by_email(&new_account.email).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(new_account.email));
        }

        let account = self.repository.create_account(&new_account).await?;
        info!(account_id = %account.id, role = %role, "account registered");
        self.issue_session(&account).await
    }

    /// Authenticates against the account registered under `role`.
    pub async fn login(&self, request: &LoginRequest, role: Role) -> Result<AuthResponse, AppError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let account = match self.repository.get_account_by_email(&email).await? {
            Some(account) if account.role == role => account,
            _ => {
                dummy_verify(&request.password);
                return Err(AppError::InvalidCredentials);
            }
        };

        verify_password(&account, &request.password)?;
        self.issue_session(&account).await
    }

    async fn issue_session(&self, account: &Account) -> Result<AuthResponse, AppError> {
        let (token, token_hash) = generate_session_token();
        let expires_at = Utc::now() + Duration::seconds(self.config.token_ttl_seconds);
        let session = self.repository.create_session(&account.id, &token_hash, expires_at).await?;

        Ok(AuthResponse {
            token,
            account: AccountResponse::from(account),
            expires_at: session.expires_at,
        })
    }

    pub async fn set_role(&self, current_user: &CurrentUser, request: &SetRoleRequest) -> Result<SetRoleResponse, AppError> {
        let role: Role = request.role.parse().map_err(|e: String| AppError::invalid_field("role", e))?;

        if !current_user.role.may_act_as(role) {
            return Err(AppError::forbidden("Only driver accounts can switch roles"));
        }

        let account = self.repository.set_active_role(&current_user.id, role).await?;
        info!(account_id = %account.id, active_role = %account.active_role, "active role switched");

        Ok(SetRoleResponse {
            success: true,
            active_role: account.active_role,
            message: format!("Switched to {} mode", account.active_role),
        })
    }

    pub async fn me(&self, current_user: &CurrentUser) -> Result<AccountResponse, AppError> {
        let account = self
            .repository
            .get_account_by_id(&current_user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;
        Ok(AccountResponse::from(&account))
    }

    pub async fn logout(&self, current_user: &CurrentUser) -> Result<(), AppError> {
        self.repository.delete_session(&current_user.token_hash).await
    }
}
