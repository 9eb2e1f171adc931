use crate::client::api::{ApiClient, LoginPayload, RegisterPayload};
use crate::client::error::ClientError;
use crate::client::session::{Session, SessionContext};
use crate::models::account::{Role, SetRoleResponse};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterForm {
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Email is required"))]
    pub email: String,
    #[validate(custom(function = "validate_phone_digits", message = "Please enter a valid phone number"))]
    pub phone: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

fn validate_phone_digits(phone: &str) -> Result<(), ValidationError> {
    if phone.chars().filter(char::is_ascii_digit).count() >= 10 {
        Ok(())
    } else {
        Err(ValidationError::new("phone_digits"))
    }
}

impl RegisterForm {
    fn to_payload(&self) -> RegisterPayload {
        RegisterPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
            password_confirm: self.password_confirm.clone(),
        }
    }
}

/// Client-side account flows; every successful call leaves the session store current.
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &SessionContext {
        self.api.session()
    }

    pub async fn register_driver(&self, form: &RegisterForm) -> Result<Session, ClientError> {
        self.register(Role::Driver, form).await
    }

    pub async fn register_passenger(&self, form: &RegisterForm) -> Result<Session, ClientError> {
        self.register(Role::Passenger, form).await
    }

    async fn register(&self, role: Role, form: &RegisterForm) -> Result<Session, ClientError> {
        form.validate()?;
        let response = self.api.register(role, &form.to_payload()).await?;
        let session = Session::new(response.token, response.account);
        self.session().save(&session)?;
        info!(account_id = %session.account.id, role = %role, "Registered and signed in");
        Ok(session)
    }

    pub async fn login_driver(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.login(Role::Driver, email, password).await
    }

    pub async fn login_passenger(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.login(Role::Passenger, email, password).await
    }

    async fn login(&self, role: Role, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut missing = Vec::new();
        if email.trim().is_empty() {
            missing.push("Email is required".to_string());
        }
        if password.is_empty() {
            missing.push("Password is required".to_string());
        }
        if !missing.is_empty() {
            return Err(ClientError::Validation(missing));
        }

        let payload = LoginPayload {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        let response = match self.api.login(role, &payload).await {
            Ok(response) => response,
            Err(ClientError::SessionExpired { .. } | ClientError::NotFound(_)) => {
                return Err(ClientError::Auth(INVALID_CREDENTIALS.to_string()));
            }
            Err(e) => return Err(e),
        };

        let session = Session::new(response.token, response.account);
        self.session().save(&session)?;
        info!(account_id = %session.account.id, role = %role, "Signed in");
        Ok(session)
    }

    /// Switches the operating mode of a driver account. Leaves the session untouched on failure.
    pub async fn switch_role(&self, role: &str) -> Result<SetRoleResponse, ClientError> {
        let session = self
            .session()
            .current()
            .ok_or_else(|| ClientError::Auth("Please log in first".to_string()))?;
        let target: Role = role.parse().map_err(ClientError::Authorization)?;
        if !session.role.may_act_as(target) {
            return Err(ClientError::Authorization("Only drivers can switch roles".to_string()));
        }

        let response = self.api.set_role(target).await?;
        self.session().set_active_role(response.active_role)?;
        Ok(response)
    }

    /// Ends the session locally whatever the server says; safe to call repeatedly.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.session().is_authenticated()
            && let Err(e) = self.api.logout().await
        {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.session().clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn is_driver(&self) -> bool {
        self.session().is_driver()
    }

    pub fn is_passenger(&self) -> bool {
        self.session().is_passenger()
    }

    pub fn is_in_driver_mode(&self) -> bool {
        self.session().is_in_driver_mode()
    }

    pub fn is_in_passenger_mode(&self) -> bool {
        self.session().is_in_passenger_mode()
    }
}
