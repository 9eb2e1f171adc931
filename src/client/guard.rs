use crate::client::session::SessionContext;
use crate::models::account::Role;

pub const DEFAULT_LOGIN_ROUTE: &str = "/driver/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
}

/// Decides whether a protected view may render for the stored session.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    login_route: String,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_ROUTE)
    }
}

impl AccessGuard {
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
        }
    }

    pub fn check(&self, session: &SessionContext) -> GuardDecision {
        if session.is_authenticated() {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect(self.login_route.clone())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecision {
    Allowed,
    WrongMode { required: Role },
    SignedOut,
}

/// Gates a view on the active operating mode rather than the registered role.
pub struct RoleGate;

impl RoleGate {
    pub fn require(mode: Role, session: &SessionContext) -> RoleDecision {
        match session.current() {
            None => RoleDecision::SignedOut,
            Some(s) if s.active_role == mode => RoleDecision::Allowed,
            Some(_) => RoleDecision::WrongMode { required: mode },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::Session;
    use crate::client::testing::account_response;

    #[test]
    fn signed_out_visitors_are_redirected() {
        let session = SessionContext::in_memory();
        assert_eq!(AccessGuard::default().check(&session), GuardDecision::Redirect("/driver/login".to_string()));
        assert_eq!(
            AccessGuard::new("/passenger/login").check(&session),
            GuardDecision::Redirect("/passenger/login".to_string())
        );
        assert_eq!(RoleGate::require(Role::Driver, &session), RoleDecision::SignedOut);
    }

    #[test]
    fn role_gate_follows_active_mode() {
        let session = SessionContext::in_memory();
        session.save(&Session::new("tok".to_string(), account_response(Role::Driver))).unwrap();
        assert_eq!(AccessGuard::default().check(&session), GuardDecision::Render);
        assert_eq!(RoleGate::require(Role::Driver, &session), RoleDecision::Allowed);

        session.set_active_role(Role::Passenger).unwrap();
        assert_eq!(RoleGate::require(Role::Passenger, &session), RoleDecision::Allowed);
        assert_eq!(
            RoleGate::require(Role::Driver, &session),
            RoleDecision::WrongMode { required: Role::Driver }
        );
    }
}
