use crate::database::postgres_repository::{PostgresRepository, is_unique_violation};
use crate::error::app_error::AppError;
use crate::models::rating::{NewRating, Rating, RatingSummary, RatingWithPassenger};
use uuid::Uuid;

const RATING_COLUMNS: &str = "id, passenger_id, driver_id, ride_id, rating, review, cleanliness_rating, behavior_rating, safety_rating, created_at";

#[async_trait::async_trait]
pub trait RatingRepository {
    /// Stores the rating and refreshes the driver's aggregate in one transaction.
    async fn create_rating(&self, rating: &NewRating) -> Result<(Rating, RatingSummary), AppError>;
    async fn rating_exists(&self, passenger_id: &Uuid, ride_id: &Uuid) -> Result<bool, AppError>;
    async fn list_ratings_for_driver(&self, driver_id: &Uuid) -> Result<Vec<RatingWithPassenger>, AppError>;
}

#[async_trait::async_trait]
impl RatingRepository for PostgresRepository {
    async fn create_rating(&self, rating: &NewRating) -> Result<(Rating, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;

        // serializes concurrent recomputes for the same driver
        sqlx::query("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(rating.driver_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Driver not found"))?;

        let inserted = sqlx::query_as::<_, Rating>(&format!(
            r#"
            INSERT INTO ratings (passenger_id, driver_id, ride_id, rating, review, cleanliness_rating, behavior_rating, safety_rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating.passenger_id)
        .bind(rating.driver_id)
        .bind(rating.ride_id)
        .bind(rating.rating)
        .bind(rating.review.as_deref())
        .bind(rating.cleanliness_rating)
        .bind(rating.behavior_rating)
        .bind(rating.safety_rating)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => return Err(AppError::conflict("You have already rated this ride")),
            Err(e) => return Err(e.into()),
        };

        let (average_rating, total_ratings): (f64, i32) = sqlx::query_as(
            r#"
            UPDATE accounts a
            SET average_rating = s.average_rating,
                total_ratings = s.total_ratings
            FROM (
                SELECT ROUND(AVG(rating)::numeric, 1)::float8 AS average_rating,
                       COUNT(*)::int4 AS total_ratings
                FROM ratings
                WHERE driver_id = $1
            ) s
            WHERE a.id = $1
            RETURNING a.average_rating, a.total_ratings
            "#,
        )
        .bind(rating.driver_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((
            inserted,
            RatingSummary {
                average_rating,
                total_ratings,
            },
        ))
    }

    async fn rating_exists(&self, passenger_id: &Uuid, ride_id: &Uuid) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM ratings WHERE passenger_id = $1 AND ride_id = $2)")
            .bind(passenger_id)
            .bind(ride_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn list_ratings_for_driver(&self, driver_id: &Uuid) -> Result<Vec<RatingWithPassenger>, AppError> {
        let ratings = sqlx::query_as::<_, RatingWithPassenger>(
            r#"
            SELECT r.id, r.passenger_id, r.driver_id, r.ride_id, r.rating, r.review,
                   r.cleanliness_rating, r.behavior_rating, r.safety_rating, r.created_at,
                   p.name AS passenger_name
            FROM ratings r
            JOIN accounts p ON p.id = r.passenger_id
            WHERE r.driver_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }
}
