use rocket::http::Status;
use rocket::{State, get};
use rocket_okapi::openapi;
use sqlx::PgPool;

/// Liveness probe that also checks the database connection
#[openapi(tag = "Health")]
#[get("/")]
pub async fn healthcheck(pool: &State<PgPool>) -> Status {
    match sqlx::query("SELECT 1").execute(pool.inner()).await {
        Ok(_) => Status::Ok,
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Status::ServiceUnavailable
        }
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![healthcheck]
}
