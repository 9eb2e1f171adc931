use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

pub(crate) static BOOKING_PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid booking phone regex"));

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RideRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl RideRequestStatus {
    pub const ALL: [RideRequestStatus; 5] = [
        RideRequestStatus::Pending,
        RideRequestStatus::Accepted,
        RideRequestStatus::Rejected,
        RideRequestStatus::Cancelled,
        RideRequestStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RideRequestStatus::Pending => "pending",
            RideRequestStatus::Accepted => "accepted",
            RideRequestStatus::Rejected => "rejected",
            RideRequestStatus::Cancelled => "cancelled",
            RideRequestStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideRequestStatus::Rejected | RideRequestStatus::Cancelled | RideRequestStatus::Completed)
    }

    pub fn can_transition_to(self, next: RideRequestStatus) -> bool {
        use RideRequestStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Rejected) | (Pending, Cancelled) | (Accepted, Completed) | (Accepted, Cancelled)
        )
    }

    /// Whether cancelling from this state hands seats back to the listing.
    pub fn holds_seats(self) -> bool {
        self == RideRequestStatus::Accepted
    }
}

impl fmt::Display for RideRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideRequestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RideRequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("Unknown ride request status: {value}"))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RideRequest {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub requested_seats: i32,
    pub status: RideRequestStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRideRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub requested_seats: i32,
}

/// Outcome of a cancellation, including the seats handed back to the listing.
#[derive(Debug, Clone)]
pub struct CancelledRideRequest {
    pub request: RideRequest,
    pub seats_restored: i32,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestCreate {
    #[serde(alias = "rideId")]
    pub vehicle_id: Uuid,
    #[validate(range(min = 1, max = 8, message = "Requested seats must be between 1 and 8"))]
    pub requested_seats: i32,
    #[serde(default)]
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Passenger name is required"))]
    pub passenger_name: String,
    #[serde(default)]
    #[schemars(regex(path = "BOOKING_PHONE_REGEX"))]
    #[validate(regex(path = *BOOKING_PHONE_REGEX, message = "Please enter a valid 10-digit phone number"))]
    pub passenger_phone: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[serde(alias = "reason")]
    #[validate(length(max = 500, message = "Rejection reason must be at most 500 characters"))]
    pub rejection_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestResponse {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub requested_seats: i32,
    pub status: RideRequestStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&RideRequest> for RideRequestResponse {
    fn from(request: &RideRequest) -> Self {
        Self {
            id: request.id,
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            passenger_id: request.passenger_id,
            passenger_name: request.passenger_name.clone(),
            passenger_phone: request.passenger_phone.clone(),
            requested_seats: request.requested_seats,
            status: request.status,
            rejection_reason: request.rejection_reason.clone(),
            created_at: request.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    #[serde(flatten)]
    pub request: RideRequestResponse,
    pub seats_restored: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRidesResponse {
    pub completed: usize,
    pub ride_request_ids: Vec<Uuid>,
}
