use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::ride_request::{CancelResponse, RejectRequest, RideRequestCreate, RideRequestResponse};
use crate::service::booking::BookingService;
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// Request seats on a listing
#[openapi(tag = "Ride Requests")]
#[post("/", data = "<payload>")]
pub async fn create_ride_request(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    payload: Json<RideRequestCreate>,
) -> Result<Json<RideRequestResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let request = BookingService::new(&repo).create(&current_user, &payload).await?;
    Ok(Json(RideRequestResponse::from(&request)))
}

/// Requests on the current driver's listings, optionally filtered by status
#[openapi(tag = "Ride Requests")]
#[get("/driver/pending?<status>")]
pub async fn list_driver_requests(pool: &State<PgPool>, current_user: CurrentUser, status: Option<String>) -> Result<Json<Vec<RideRequestResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let requests = BookingService::new(&repo).list_for_driver(&current_user, status.as_deref()).await?;
    Ok(Json(requests.iter().map(RideRequestResponse::from).collect()))
}

/// Requests made by the current passenger
#[openapi(tag = "Ride Requests")]
#[get("/passenger/my-requests")]
pub async fn list_my_requests(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<RideRequestResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let requests = BookingService::new(&repo).list_for_passenger(&current_user).await?;
    Ok(Json(requests.iter().map(RideRequestResponse::from).collect()))
}

/// Bookings of the current passenger
#[openapi(tag = "Ride Requests")]
#[get("/passenger/my-bookings")]
pub async fn list_my_bookings(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<RideRequestResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let requests = BookingService::new(&repo).list_for_passenger(&current_user).await?;
    Ok(Json(requests.iter().map(RideRequestResponse::from).collect()))
}

/// Accept a pending request and reserve its seats
#[openapi(tag = "Ride Requests")]
#[put("/<id>/accept")]
pub async fn accept_ride_request(pool: &State<PgPool>, current_user: CurrentUser, id: String) -> Result<Json<RideRequestResponse>, AppError> {
    let request_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let request = BookingService::new(&repo).accept(&current_user, &request_id).await?;
    Ok(Json(RideRequestResponse::from(&request)))
}

/// Reject a pending request with an optional reason
#[openapi(tag = "Ride Requests")]
#[put("/<id>/reject", data = "<payload>")]
pub async fn reject_ride_request(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    id: String,
    payload: Json<RejectRequest>,
) -> Result<Json<RideRequestResponse>, AppError> {
    let request_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let request = BookingService::new(&repo).reject(&current_user, &request_id, &payload).await?;
    Ok(Json(RideRequestResponse::from(&request)))
}

/// Cancel one of the current passenger's requests
#[openapi(tag = "Ride Requests")]
#[put("/<id>/cancel")]
pub async fn cancel_ride_request(pool: &State<PgPool>, current_user: CurrentUser, id: String) -> Result<Json<CancelResponse>, AppError> {
    let request_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let cancelled = BookingService::new(&repo).cancel(&current_user, &request_id).await?;
    Ok(Json(CancelResponse {
        request: RideRequestResponse::from(&cancelled.request),
        seats_restored: cancelled.seats_restored,
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![
        create_ride_request,
        list_driver_requests,
        list_my_requests,
        list_my_bookings,
        accept_ride_request,
        reject_ride_request,
        cancel_ride_request
    ]
}
