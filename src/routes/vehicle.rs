use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::vehicle::{AvailableVehicleResponse, VehicleDeletedResponse, VehicleFilters, VehicleRequest, VehicleResponse};
use crate::service::catalog::CatalogService;
use chrono::{NaiveDate, Utc};
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

fn parse_date_filter(date: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::invalid_field("date", "Date must be formatted as YYYY-MM-DD")),
    }
}

/// List upcoming rides, optionally filtered by pickup, drop and exact date
#[openapi(tag = "Vehicles")]
#[get("/?<pickup>&<drop>&<date>")]
pub async fn list_available_vehicles(
    pool: &State<PgPool>,
    _current_user: CurrentUser,
    pickup: Option<String>,
    drop: Option<String>,
    date: Option<String>,
) -> Result<Json<Vec<AvailableVehicleResponse>>, AppError> {
    let filters = VehicleFilters::new(pickup, drop, parse_date_filter(date)?);
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let vehicles = CatalogService::new(&repo).list_available(&filters, Utc::now().date_naive()).await?;
    Ok(Json(vehicles.iter().map(AvailableVehicleResponse::from).collect()))
}

/// Publish a ride listing
#[openapi(tag = "Vehicles")]
#[post("/", data = "<payload>")]
pub async fn create_vehicle(pool: &State<PgPool>, current_user: CurrentUser, payload: Json<VehicleRequest>) -> Result<Json<VehicleResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let vehicle = CatalogService::new(&repo).create(&current_user, &payload).await?;
    Ok(Json(VehicleResponse::from(&vehicle)))
}

/// List the listings owned by the current driver
#[openapi(tag = "Vehicles")]
#[get("/driver/my-vehicles")]
pub async fn list_my_vehicles(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let vehicles = CatalogService::new(&repo).list_mine(&current_user).await?;
    Ok(Json(vehicles.iter().map(VehicleResponse::from).collect()))
}

/// Get a single listing with its driver summary
#[openapi(tag = "Vehicles")]
#[get("/<id>")]
pub async fn get_vehicle(pool: &State<PgPool>, _current_user: CurrentUser, id: String) -> Result<Json<AvailableVehicleResponse>, AppError> {
    let vehicle_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let vehicle = CatalogService::new(&repo).get(&vehicle_id).await?;
    Ok(Json(AvailableVehicleResponse::from(&vehicle)))
}

/// Delete an owned listing; its pending and accepted requests are cancelled
#[openapi(tag = "Vehicles")]
#[delete("/<id>")]
pub async fn delete_vehicle(pool: &State<PgPool>, current_user: CurrentUser, id: String) -> Result<Json<VehicleDeletedResponse>, AppError> {
    let vehicle_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let cancelled_requests = CatalogService::new(&repo).delete(&current_user, &vehicle_id).await?;
    Ok(Json(VehicleDeletedResponse {
        success: true,
        cancelled_requests,
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_available_vehicles, create_vehicle, list_my_vehicles, get_vehicle, delete_vehicle]
}
