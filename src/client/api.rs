use crate::client::error::ClientError;
use crate::client::session::SessionContext;
use crate::client::transport::{ApiRequest, ApiResponse, ApiTransport, HttpMethod, ReqwestTransport};
use crate::config::ClientConfig;
use crate::models::account::{AccountResponse, AuthResponse, Role, SetRoleResponse};
use crate::models::rating::{DriverRatingsResponse, RatingCreatedResponse, RatingStatusResponse};
use crate::models::ride_request::{CancelResponse, RideRequestResponse, RideRequestStatus};
use crate::models::vehicle::{AvailableVehicleResponse, VehicleDeletedResponse, VehicleResponse};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    pub car_type: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub date: NaiveDate,
    pub time: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub notes: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestPayload {
    pub vehicle_id: Uuid,
    pub requested_seats: i32,
    pub passenger_name: String,
    pub passenger_phone: String,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub driver_id: Uuid,
    pub ride_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub cleanliness_rating: Option<i16>,
    pub behavior_rating: Option<i16>,
    pub safety_rating: Option<i16>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub date: Option<NaiveDate>,
}

impl SearchFilters {
    fn query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(pickup) = self.pickup.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            pairs.push(format!("pickup={}", urlencoding::encode(pickup)));
        }
        if let Some(drop) = self.drop.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            pairs.push(format!("drop={}", urlencoding::encode(drop)));
        }
        if let Some(date) = self.date {
            pairs.push(format!("date={}", date.format("%Y-%m-%d")));
        }
        if pairs.is_empty() { String::new() } else { format!("?{}", pairs.join("&")) }
    }
}

#[derive(Deserialize, Default)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Typed access to the ridepool API through the shared session.
///
/// Every request carries the current bearer token when one is stored. A 401
/// from any endpoint clears the session store before the error is returned.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    session: SessionContext,
    login_route: String,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn ApiTransport>, session: SessionContext, login_route: impl Into<String>) -> Self {
        Self {
            transport,
            session,
            login_route: login_route.into(),
        }
    }

    pub fn from_config(config: &ClientConfig, session: SessionContext) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), session, config.login_route.clone()))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    async fn execute(&self, method: HttpMethod, path: String, body: Option<serde_json::Value>) -> Result<ApiResponse, ClientError> {
        let mut request = ApiRequest::new(method, path);
        request.bearer_token = self.session.token();
        request.body = body;

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        Err(self.error_for(&response))
    }

    fn error_for(&self, response: &ApiResponse) -> ClientError {
        let payload: ErrorPayload = serde_json::from_str(&response.body).unwrap_or_default();
        let message = payload.message.unwrap_or_else(|| default_message(response.status).to_string());

        match response.status {
            400 | 422 => {
                let errors = if payload.errors.is_empty() { vec![message] } else { payload.errors };
                ClientError::Validation(errors)
            }
            401 => {
                if let Err(e) = self.session.clear() {
                    warn!(error = %e, "Failed to clear session after 401");
                }
                debug!(redirect = %self.login_route, "Session rejected by server");
                ClientError::SessionExpired {
                    redirect: self.login_route.clone(),
                }
            }
            403 => ClientError::Authorization(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            status => ClientError::Server { status, message },
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: HttpMethod, path: String, body: Option<serde_json::Value>) -> Result<T, ClientError> {
        let response = self.execute(method, path, body).await?;
        serde_json::from_str(&response.body).map_err(|e| ClientError::Server {
            status: response.status,
            message: format!("Malformed response: {e}"),
        })
    }

    async fn call_with<B: Serialize, T: DeserializeOwned>(&self, method: HttpMethod, path: String, body: &B) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Transport(e.to_string()))?;
        self.call(method, path, Some(body)).await
    }

    pub async fn register(&self, role: Role, payload: &RegisterPayload) -> Result<AuthResponse, ClientError> {
        self.call_with(HttpMethod::Post, format!("/auth/{role}/register"), payload).await
    }

    pub async fn login(&self, role: Role, payload: &LoginPayload) -> Result<AuthResponse, ClientError> {
        self.call_with(HttpMethod::Post, format!("/auth/{role}/login"), payload).await
    }

    pub async fn set_role(&self, role: Role) -> Result<SetRoleResponse, ClientError> {
        let body = serde_json::json!({ "role": role.as_str() });
        self.call(HttpMethod::Post, "/auth/set-role".to_string(), Some(body)).await
    }

    pub async fn me(&self) -> Result<AccountResponse, ClientError> {
        self.call(HttpMethod::Get, "/auth/me".to_string(), None).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute(HttpMethod::Post, "/auth/logout".to_string(), None).await.map(|_| ())
    }

    pub async fn list_vehicles(&self, filters: &SearchFilters) -> Result<Vec<AvailableVehicleResponse>, ClientError> {
        self.call(HttpMethod::Get, format!("/vehicles{}", filters.query_string()), None).await
    }

    pub async fn get_vehicle(&self, id: Uuid) -> Result<AvailableVehicleResponse, ClientError> {
        self.call(HttpMethod::Get, format!("/vehicles/{id}"), None).await
    }

    pub async fn create_vehicle(&self, payload: &VehiclePayload) -> Result<VehicleResponse, ClientError> {
        self.call_with(HttpMethod::Post, "/vehicles".to_string(), payload).await
    }

    pub async fn my_vehicles(&self) -> Result<Vec<VehicleResponse>, ClientError> {
        self.call(HttpMethod::Get, "/vehicles/driver/my-vehicles".to_string(), None).await
    }

    pub async fn delete_vehicle(&self, id: Uuid) -> Result<VehicleDeletedResponse, ClientError> {
        self.call(HttpMethod::Delete, format!("/vehicles/{id}"), None).await
    }

    pub async fn create_ride_request(&self, payload: &RideRequestPayload) -> Result<RideRequestResponse, ClientError> {
        self.call_with(HttpMethod::Post, "/ride-requests".to_string(), payload).await
    }

    pub async fn driver_requests(&self, status: Option<RideRequestStatus>) -> Result<Vec<RideRequestResponse>, ClientError> {
        let query = status.map(|s| format!("?status={s}")).unwrap_or_default();
        self.call(HttpMethod::Get, format!("/ride-requests/driver/pending{query}"), None).await
    }

    pub async fn my_requests(&self) -> Result<Vec<RideRequestResponse>, ClientError> {
        self.call(HttpMethod::Get, "/ride-requests/passenger/my-requests".to_string(), None).await
    }

    pub async fn my_bookings(&self) -> Result<Vec<RideRequestResponse>, ClientError> {
        self.call(HttpMethod::Get, "/ride-requests/passenger/my-bookings".to_string(), None).await
    }

    pub async fn accept_request(&self, id: Uuid) -> Result<RideRequestResponse, ClientError> {
        self.call(HttpMethod::Put, format!("/ride-requests/{id}/accept"), None).await
    }

    pub async fn reject_request(&self, id: Uuid, reason: Option<&str>) -> Result<RideRequestResponse, ClientError> {
        let body = serde_json::json!({ "rejectionReason": reason });
        self.call(HttpMethod::Put, format!("/ride-requests/{id}/reject"), Some(body)).await
    }

    pub async fn cancel_request(&self, id: Uuid) -> Result<CancelResponse, ClientError> {
        self.call(HttpMethod::Put, format!("/ride-requests/{id}/cancel"), None).await
    }

    pub async fn submit_rating(&self, payload: &RatingPayload) -> Result<RatingCreatedResponse, ClientError> {
        self.call_with(HttpMethod::Post, "/ratings".to_string(), payload).await
    }

    /// Lists a driver's ratings; a driver the server does not know reads as unrated.
    pub async fn driver_ratings(&self, driver_id: Uuid) -> Result<DriverRatingsResponse, ClientError> {
        match self.call(HttpMethod::Get, format!("/ratings/driver/{driver_id}"), None).await {
            Err(ClientError::NotFound(_)) => Ok(DriverRatingsResponse {
                driver_id,
                average_rating: 0.0,
                total_ratings: 0,
                ratings: Vec::new(),
            }),
            other => other,
        }
    }

    pub async fn rating_status(&self, ride_id: Uuid) -> Result<RatingStatusResponse, ClientError> {
        self.call(HttpMethod::Get, format!("/ratings/ride/{ride_id}"), None).await
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 | 422 => "Invalid request",
        401 => "Authentication required",
        403 => "You do not have permission to perform this action",
        404 => "Resource not found",
        409 => "Request conflicts with the current state",
        _ => "Unexpected server error",
    }
}
