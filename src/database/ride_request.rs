use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::ride_request::{CancelledRideRequest, NewRideRequest, RideRequest, RideRequestStatus};
use chrono::NaiveDate;
use uuid::Uuid;

const RIDE_REQUEST_COLUMNS: &str =
    "id, vehicle_id, driver_id, passenger_id, passenger_name, passenger_phone, requested_seats, status, rejection_reason, created_at, updated_at";

#[async_trait::async_trait]
pub trait RideRequestRepository {
    async fn create_ride_request(&self, request: &NewRideRequest) -> Result<RideRequest, AppError>;
    async fn get_ride_request(&self, id: &Uuid) -> Result<Option<RideRequest>, AppError>;
    async fn list_ride_requests_for_driver(&self, driver_id: &Uuid, status: Option<RideRequestStatus>) -> Result<Vec<RideRequest>, AppError>;
    async fn list_ride_requests_for_passenger(&self, passenger_id: &Uuid) -> Result<Vec<RideRequest>, AppError>;
    /// Moves a pending request to accepted and takes its seats from the listing.
    async fn accept_ride_request(&self, id: &Uuid) -> Result<RideRequest, AppError>;
    /// Status change that carries no seat effect; `None` when the request is no longer in `from`.
    async fn transition_ride_request(
        &self,
        id: &Uuid,
        from: RideRequestStatus,
        to: RideRequestStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<RideRequest>, AppError>;
    /// Cancels a pending or accepted request, handing held seats back to the listing.
    async fn cancel_ride_request(&self, id: &Uuid) -> Result<CancelledRideRequest, AppError>;
    /// Completes accepted requests whose ride date is before `today`.
    async fn complete_due_ride_requests(&self, today: NaiveDate) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait::async_trait]
impl RideRequestRepository for PostgresRepository {
    async fn create_ride_request(&self, request: &NewRideRequest) -> Result<RideRequest, AppError> {
        let created = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            INSERT INTO ride_requests (vehicle_id, driver_id, passenger_id, passenger_name, passenger_phone, requested_seats, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {RIDE_REQUEST_COLUMNS}
            "#
        ))
        .bind(request.vehicle_id)
        .bind(request.driver_id)
        .bind(request.passenger_id)
        .bind(&request.passenger_name)
        .bind(&request.passenger_phone)
        .bind(request.requested_seats)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_ride_request(&self, id: &Uuid) -> Result<Option<RideRequest>, AppError> {
        let request = sqlx::query_as::<_, RideRequest>(&format!("SELECT {RIDE_REQUEST_COLUMNS} FROM ride_requests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn list_ride_requests_for_driver(&self, driver_id: &Uuid, status: Option<RideRequestStatus>) -> Result<Vec<RideRequest>, AppError> {
        let requests = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            SELECT {RIDE_REQUEST_COLUMNS}
            FROM ride_requests
            WHERE driver_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(driver_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn list_ride_requests_for_passenger(&self, passenger_id: &Uuid) -> Result<Vec<RideRequest>, AppError> {
        let requests = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            SELECT {RIDE_REQUEST_COLUMNS}
            FROM ride_requests
            WHERE passenger_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn accept_ride_request(&self, id: &Uuid) -> Result<RideRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RideRequest>(&format!("SELECT {RIDE_REQUEST_COLUMNS} FROM ride_requests WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Ride request not found"))?;

        if request.status != RideRequestStatus::Pending {
            return Err(AppError::conflict(format!("Cannot accept a {} ride request", request.status)));
        }
        let vehicle_id = request.vehicle_id.ok_or_else(|| AppError::not_found("Vehicle not found"))?;

        let reserved = sqlx::query(
            r#"
            UPDATE vehicles
            SET available_seats = available_seats - $2
            WHERE id = $1
              AND available_seats >= $2
            "#,
        )
        .bind(vehicle_id)
        .bind(request.requested_seats)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if reserved == 0 {
            return Err(AppError::conflict("Not enough seats available"));
        }

        let accepted = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            UPDATE ride_requests
            SET status = 'accepted', updated_at = now()
            WHERE id = $1
            RETURNING {RIDE_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(accepted)
    }

    async fn transition_ride_request(
        &self,
        id: &Uuid,
        from: RideRequestStatus,
        to: RideRequestStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<RideRequest>, AppError> {
        let request = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            UPDATE ride_requests
            SET status = $3,
                rejection_reason = COALESCE($4, rejection_reason),
                updated_at = now()
            WHERE id = $1
              AND status = $2
            RETURNING {RIDE_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(rejection_reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn cancel_ride_request(&self, id: &Uuid) -> Result<CancelledRideRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RideRequest>(&format!("SELECT {RIDE_REQUEST_COLUMNS} FROM ride_requests WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Ride request not found"))?;

        if !request.status.can_transition_to(RideRequestStatus::Cancelled) {
            return Err(AppError::conflict(format!("Cannot cancel a {} ride request", request.status)));
        }

        let mut seats_restored = 0;
        if request.status.holds_seats()
            && let Some(vehicle_id) = request.vehicle_id
        {
            let restored: Option<(i32, i32)> = sqlx::query_as(
                r#"
                WITH previous AS (
                    SELECT available_seats FROM vehicles WHERE id = $1 FOR UPDATE
                )
                UPDATE vehicles v
                SET available_seats = LEAST(v.total_seats, v.available_seats + $2)
                FROM previous
                WHERE v.id = $1
                RETURNING previous.available_seats, v.available_seats
                "#,
            )
            .bind(vehicle_id)
            .bind(request.requested_seats)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((before, after)) = restored {
                seats_restored = after - before;
            }
        }

        let cancelled = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            UPDATE ride_requests
            SET status = 'cancelled', updated_at = now()
            WHERE id = $1
            RETURNING {RIDE_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CancelledRideRequest {
            request: cancelled,
            seats_restored,
        })
    }

    async fn complete_due_ride_requests(&self, today: NaiveDate) -> Result<Vec<Uuid>, AppError> {
        let completed: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE ride_requests r
            SET status = 'completed', updated_at = now()
            FROM vehicles v
            WHERE v.id = r.vehicle_id
              AND r.status = 'accepted'
              AND v.ride_date < $1
            RETURNING r.id
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(completed.into_iter().map(|(id,)| id).collect())
    }
}
