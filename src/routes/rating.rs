use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::rating::{DriverRatingsResponse, RatingCreatedResponse, RatingRequest, RatingResponse, RatingStatusResponse};
use crate::service::rating::RatingService;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// Rate the driver of a completed ride
#[openapi(tag = "Ratings")]
#[post("/", data = "<payload>")]
pub async fn create_rating(pool: &State<PgPool>, current_user: CurrentUser, payload: Json<RatingRequest>) -> Result<Json<RatingCreatedResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let (rating, summary) = RatingService::new(&repo).submit(&current_user, &payload).await?;
    Ok(Json(RatingCreatedResponse {
        rating: RatingResponse::from(&rating),
        driver_average_rating: summary.average_rating,
        driver_total_ratings: summary.total_ratings,
    }))
}

/// Ratings received by a driver, newest first
#[openapi(tag = "Ratings")]
#[get("/driver/<id>")]
pub async fn list_driver_ratings(pool: &State<PgPool>, _current_user: CurrentUser, id: String) -> Result<Json<DriverRatingsResponse>, AppError> {
    let driver_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    Ok(Json(RatingService::new(&repo).list_for_driver(&driver_id).await?))
}

/// Whether the current passenger has already rated a ride
#[openapi(tag = "Ratings")]
#[get("/ride/<id>")]
pub async fn get_rating_status(pool: &State<PgPool>, current_user: CurrentUser, id: String) -> Result<Json<RatingStatusResponse>, AppError> {
    let ride_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let rated = RatingService::new(&repo).rated(&current_user, &ride_id).await?;
    Ok(Json(RatingStatusResponse { ride_id, rated }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_rating, list_driver_ratings, get_rating_status]
}
