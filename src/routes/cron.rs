use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::ride_request::{CompletedRidesResponse, RideRequestResponse};
use crate::service::booking::BookingService;
use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket::serde::json::Json;
use rocket::{State, post, put, routes};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) struct CronAuth;

pub(crate) fn cron_token_matches(expected: &str, incoming: Option<&str>) -> bool {
    !expected.is_empty() && incoming == Some(expected)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CronAuth {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };

        if config.cron.auth_token.is_empty() {
            return Outcome::Error((Status::BadRequest, AppError::BadRequest("Cron auth token is not configured".to_string())));
        }

        if cron_token_matches(&config.cron.auth_token, req.headers().get_one("x-cron-token")) {
            Outcome::Success(CronAuth)
        } else {
            Outcome::Error((Status::Forbidden, AppError::forbidden("Invalid cron token")))
        }
    }
}

#[post("/complete-rides")]
pub async fn complete_rides(pool: &State<PgPool>, _cron_auth: CronAuth) -> Result<Json<CompletedRidesResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let ride_request_ids = BookingService::new(&repo).complete_due(Utc::now().date_naive()).await?;
    Ok(Json(CompletedRidesResponse {
        completed: ride_request_ids.len(),
        ride_request_ids,
    }))
}

#[put("/ride-requests/<id>/complete")]
pub async fn complete_ride_request(pool: &State<PgPool>, _cron_auth: CronAuth, id: String) -> Result<Json<RideRequestResponse>, AppError> {
    let request_id = Uuid::parse_str(&id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let request = BookingService::new(&repo).complete(&request_id).await?;
    Ok(Json(RideRequestResponse::from(&request)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![complete_rides, complete_ride_request]
}
