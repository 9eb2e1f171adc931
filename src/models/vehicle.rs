use crate::models::account::Account;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub car_type: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub ride_date: NaiveDate,
    pub ride_time: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn can_seat(&self, seats: i32) -> bool {
        seats >= 1 && self.available_seats >= seats
    }
}

/// A listing joined with the display details of its driver.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AvailableVehicle {
    #[sqlx(flatten)]
    pub vehicle: Vehicle,
    pub driver_name: String,
    pub driver_average_rating: f64,
    pub driver_total_ratings: i32,
}

impl AvailableVehicle {
    pub fn new(vehicle: Vehicle, driver: &Account) -> Self {
        Self {
            vehicle,
            driver_name: driver.name.clone(),
            driver_average_rating: driver.average_rating,
            driver_total_ratings: driver.total_ratings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub owner_account_id: Uuid,
    pub car_type: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub ride_date: NaiveDate,
    pub ride_time: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub notes: String,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_available_seats", skip_on_field_errors = false))]
pub struct VehicleRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Car type is required"))]
    pub car_type: String,
    #[serde(default)]
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Pickup location is required"))]
    pub pickup_location: String,
    #[serde(default)]
    #[validate(custom(function = "crate::models::validate_not_blank", message = "Destination location is required"))]
    pub drop_location: String,
    #[validate(required(message = "Date is required"))]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    #[schemars(regex(path = "TIME_REGEX"))]
    #[validate(regex(path = *TIME_REGEX, message = "Time is required"))]
    pub time: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 8, message = "Total seats must be 1-8"))]
    pub total_seats: i32,
    #[validate(required(message = "Available seats are required"))]
    pub available_seats: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: String,
}

fn validate_available_seats(request: &VehicleRequest) -> Result<(), ValidationError> {
    match request.available_seats {
        Some(available) if available < 0 || available > request.total_seats => {
            let mut error = ValidationError::new("available_seats_out_of_range");
            error.message = Some(format!("Available seats must be 0-{}", request.total_seats).into());
            Err(error)
        }
        _ => Ok(()),
    }
}

impl VehicleRequest {
    /// Converts a request that has already passed `validate()`.
    pub fn to_new_vehicle(&self, owner_account_id: Uuid) -> Option<NewVehicle> {
        Some(NewVehicle {
            owner_account_id,
            car_type: self.car_type.trim().to_string(),
            pickup_location: self.pickup_location.trim().to_string(),
            drop_location: self.drop_location.trim().to_string(),
            ride_date: self.date?,
            ride_time: self.time.clone(),
            total_seats: self.total_seats,
            available_seats: self.available_seats?,
            notes: self.notes.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehicleFilters {
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub date: Option<NaiveDate>,
}

impl VehicleFilters {
    pub fn new(pickup: Option<String>, drop: Option<String>, date: Option<NaiveDate>) -> Self {
        let clean = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            pickup: clean(pickup),
            drop: clean(drop),
            date,
        }
    }

    pub fn matches(&self, vehicle: &Vehicle, today: NaiveDate) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_ref()
                .is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
        };

        vehicle.ride_date >= today
            && contains(&vehicle.pickup_location, &self.pickup)
            && contains(&vehicle.drop_location, &self.drop)
            && self.date.is_none_or(|date| vehicle.ride_date == date)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub car_type: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub date: NaiveDate,
    pub time: String,
    pub total_seats: i32,
    pub available_seats: i32,
    #[serde(default)]
    pub notes: String,
}

impl From<&Vehicle> for VehicleResponse {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            driver_id: vehicle.owner_account_id,
            car_type: vehicle.car_type.clone(),
            pickup_location: vehicle.pickup_location.clone(),
            drop_location: vehicle.drop_location.clone(),
            date: vehicle.ride_date,
            time: vehicle.ride_time.clone(),
            total_seats: vehicle.total_seats,
            available_seats: vehicle.available_seats,
            notes: vehicle.notes.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub name: String,
    pub average_rating: f64,
    pub total_ratings: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableVehicleResponse {
    #[serde(flatten)]
    pub vehicle: VehicleResponse,
    pub driver: DriverSummary,
}

impl From<&AvailableVehicle> for AvailableVehicleResponse {
    fn from(available: &AvailableVehicle) -> Self {
        Self {
            vehicle: VehicleResponse::from(&available.vehicle),
            driver: DriverSummary {
                name: available.driver_name.clone(),
                average_rating: available.driver_average_rating,
                total_ratings: available.driver_total_ratings,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDeletedResponse {
    pub success: bool,
    pub cancelled_requests: u64,
}
