use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;
use crate::service::booking::BookingService;
use chrono::{NaiveDate, Utc};

#[derive(Debug, Clone, Copy)]
pub struct CompleteRidesResult {
    pub rides_completed: usize,
    pub cutoff: NaiveDate,
}

/// Completes every accepted booking whose ride date has passed.
pub async fn complete_rides(config: &Config) -> Result<CompleteRidesResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let cutoff = Utc::now().date_naive();
    let completed = BookingService::new(&repo)
        .complete_due(cutoff)
        .await
        .map_err(|err| format!("Failed to complete rides: {err:?}"))?;

    pool.close().await;

    Ok(CompleteRidesResult {
        rides_completed: completed.len(),
        cutoff,
    })
}
