use crate::client::error::ClientError;
use crate::client::transport::{ApiRequest, ApiResponse, ApiTransport};
use crate::models::account::{AccountResponse, Role};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// Replays queued responses in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ClientError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ApiResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no scripted response".to_string())))
    }
}

pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

pub fn account_response(role: Role) -> AccountResponse {
    AccountResponse {
        id: Uuid::new_v4(),
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        role,
        active_role: Some(role),
        average_rating: 0.0,
        total_ratings: 0,
    }
}

pub fn auth_body(account: &AccountResponse) -> serde_json::Value {
    serde_json::json!({
        "token": "tok-1",
        "account": account,
        "expiresAt": "2030-01-01T00:00:00Z"
    })
}
