use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub ride_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub cleanliness_rating: Option<i16>,
    pub behavior_rating: Option<i16>,
    pub safety_rating: Option<i16>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatingWithPassenger {
    #[sqlx(flatten)]
    pub rating: Rating,
    pub passenger_name: String,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub ride_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub cleanliness_rating: Option<i16>,
    pub behavior_rating: Option<i16>,
    pub safety_rating: Option<i16>,
}

/// Driver aggregate after a rating has been recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: i32,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub driver_id: Uuid,
    #[serde(alias = "rideRequestId")]
    pub ride_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 1000, message = "Review must be at most 1000 characters"))]
    pub review: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Cleanliness rating must be between 1 and 5"))]
    pub cleanliness_rating: Option<i16>,
    #[validate(range(min = 1, max = 5, message = "Behavior rating must be between 1 and 5"))]
    pub behavior_rating: Option<i16>,
    #[validate(range(min = 1, max = 5, message = "Safety rating must be between 1 and 5"))]
    pub safety_rating: Option<i16>,
}

impl RatingRequest {
    pub fn to_new_rating(&self, passenger_id: Uuid) -> NewRating {
        NewRating {
            passenger_id,
            driver_id: self.driver_id,
            ride_id: self.ride_id,
            rating: self.rating,
            review: self.review.as_ref().map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            cleanliness_rating: self.cleanliness_rating,
            behavior_rating: self.behavior_rating,
            safety_rating: self.safety_rating,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Uuid,
    pub ride_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub cleanliness_rating: Option<i16>,
    pub behavior_rating: Option<i16>,
    pub safety_rating: Option<i16>,
    #[serde(default)]
    pub passenger_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id,
            passenger_id: rating.passenger_id,
            driver_id: rating.driver_id,
            ride_id: rating.ride_id,
            rating: rating.rating,
            review: rating.review.clone(),
            cleanliness_rating: rating.cleanliness_rating,
            behavior_rating: rating.behavior_rating,
            safety_rating: rating.safety_rating,
            passenger_name: None,
            created_at: rating.created_at,
        }
    }
}

impl From<&RatingWithPassenger> for RatingResponse {
    fn from(row: &RatingWithPassenger) -> Self {
        Self {
            passenger_name: Some(row.passenger_name.clone()),
            ..RatingResponse::from(&row.rating)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingCreatedResponse {
    pub rating: RatingResponse,
    pub driver_average_rating: f64,
    pub driver_total_ratings: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverRatingsResponse {
    pub driver_id: Uuid,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub ratings: Vec<RatingResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingStatusResponse {
    pub ride_id: Uuid,
    pub rated: bool,
}

/// Mean of the scores rounded to one decimal place, `0.0` when there are none.
pub fn average_rating(scores: &[i16]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f64 = scores.iter().map(|&s| f64::from(s)).sum();
    round_to_tenth(sum / scores.len() as f64)
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
