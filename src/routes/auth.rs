use crate::auth::CurrentUser;
use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::account::{AccountResponse, AuthResponse, LoginRequest, RegisterRequest, Role, SetRoleRequest, SetRoleResponse};
use crate::service::auth::AuthService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;

async fn register(pool: &PgPool, config: &Config, payload: RegisterRequest, role: Role) -> Result<Json<AuthResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.clone() };
    let service = AuthService::new(&repo, &config.session);
    Ok(Json(service.register(payload, role).await?))
}

async fn login(pool: &PgPool, config: &Config, payload: &LoginRequest, role: Role) -> Result<Json<AuthResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.clone() };
    let service = AuthService::new(&repo, &config.session);
    Ok(Json(service.login(payload, role).await?))
}

/// Register a driver account and start a session
#[openapi(tag = "Auth")]
#[post("/driver/register", data = "<payload>")]
pub async fn register_driver(pool: &State<PgPool>, config: &State<Config>, payload: Json<RegisterRequest>) -> Result<Json<AuthResponse>, AppError> {
    register(pool.inner(), config.inner(), payload.into_inner(), Role::Driver).await
}

/// Register a passenger account and start a session
#[openapi(tag = "Auth")]
#[post("/passenger/register", data = "<payload>")]
pub async fn register_passenger(pool: &State<PgPool>, config: &State<Config>, payload: Json<RegisterRequest>) -> Result<Json<AuthResponse>, AppError> {
    register(pool.inner(), config.inner(), payload.into_inner(), Role::Passenger).await
}

/// Log in to a driver account
#[openapi(tag = "Auth")]
#[post("/driver/login", data = "<payload>")]
pub async fn login_driver(pool: &State<PgPool>, config: &State<Config>, payload: Json<LoginRequest>) -> Result<Json<AuthResponse>, AppError> {
    login(pool.inner(), config.inner(), &payload, Role::Driver).await
}

/// Log in to a passenger account
#[openapi(tag = "Auth")]
#[post("/passenger/login", data = "<payload>")]
pub async fn login_passenger(pool: &State<PgPool>, config: &State<Config>, payload: Json<LoginRequest>) -> Result<Json<AuthResponse>, AppError> {
    login(pool.inner(), config.inner(), &payload, Role::Passenger).await
}

/// Switch the active role of a driver account
#[openapi(tag = "Auth")]
#[post("/set-role", data = "<payload>")]
pub async fn set_role(
    pool: &State<PgPool>,
    config: &State<Config>,
    current_user: CurrentUser,
    payload: Json<SetRoleRequest>,
) -> Result<Json<SetRoleResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, &config.session);
    Ok(Json(service.set_role(&current_user, &payload).await?))
}

/// Return the account behind the bearer token
#[openapi(tag = "Auth")]
#[get("/me")]
pub async fn me(pool: &State<PgPool>, config: &State<Config>, current_user: CurrentUser) -> Result<Json<AccountResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, &config.session);
    Ok(Json(service.me(&current_user).await?))
}

/// End the current session
#[openapi(tag = "Auth")]
#[post("/logout")]
pub async fn logout(pool: &State<PgPool>, config: &State<Config>, current_user: CurrentUser) -> Result<Status, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    AuthService::new(&repo, &config.session).logout(&current_user).await?;
    Ok(Status::Ok)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register_driver, register_passenger, login_driver, login_passenger, set_role, me, logout]
}
