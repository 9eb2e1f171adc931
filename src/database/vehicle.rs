use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::vehicle::{AvailableVehicle, NewVehicle, Vehicle, VehicleFilters};
use chrono::NaiveDate;
use uuid::Uuid;

const VEHICLE_COLUMNS: &str = "id, owner_account_id, car_type, pickup_location, drop_location, ride_date, ride_time, total_seats, available_seats, notes, created_at";

#[async_trait::async_trait]
pub trait VehicleRepository {
    async fn create_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError>;
    async fn get_vehicle(&self, id: &Uuid) -> Result<Option<Vehicle>, AppError>;
    async fn list_vehicles_by_owner(&self, owner_account_id: &Uuid) -> Result<Vec<Vehicle>, AppError>;
    async fn list_available_vehicles(&self, filters: &VehicleFilters, today: NaiveDate) -> Result<Vec<AvailableVehicle>, AppError>;
    /// Deletes the listing and cancels its open requests, returning how many were cancelled.
    async fn delete_vehicle(&self, id: &Uuid) -> Result<u64, AppError>;
}

#[async_trait::async_trait]
impl VehicleRepository for PostgresRepository {
    async fn create_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError> {
        let created = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (owner_account_id, car_type, pickup_location, drop_location, ride_date, ride_time, total_seats, available_seats, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(vehicle.owner_account_id)
        .bind(&vehicle.car_type)
        .bind(&vehicle.pickup_location)
        .bind(&vehicle.drop_location)
        .bind(vehicle.ride_date)
        .bind(&vehicle.ride_time)
        .bind(vehicle.total_seats)
        .bind(vehicle.available_seats)
        .bind(&vehicle.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_vehicle(&self, id: &Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn list_vehicles_by_owner(&self, owner_account_id: &Uuid) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            SELECT {VEHICLE_COLUMNS}
            FROM vehicles
            WHERE owner_account_id = $1
            ORDER BY ride_date DESC, ride_time DESC
            "#
        ))
        .bind(owner_account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn list_available_vehicles(&self, filters: &VehicleFilters, today: NaiveDate) -> Result<Vec<AvailableVehicle>, AppError> {
        // strpos keeps user input out of LIKE pattern syntax
        let vehicles = sqlx::query_as::<_, AvailableVehicle>(
            r#"
            SELECT v.id, v.owner_account_id, v.car_type, v.pickup_location, v.drop_location, v.ride_date,
                   v.ride_time, v.total_seats, v.available_seats, v.notes, v.created_at,
                   a.name AS driver_name,
                   a.average_rating AS driver_average_rating,
                   a.total_ratings AS driver_total_ratings
            FROM vehicles v
            JOIN accounts a ON a.id = v.owner_account_id
            WHERE v.ride_date >= $1
              AND ($2::text IS NULL OR strpos(lower(v.pickup_location), lower($2)) > 0)
              AND ($3::text IS NULL OR strpos(lower(v.drop_location), lower($3)) > 0)
              AND ($4::date IS NULL OR v.ride_date = $4)
            ORDER BY v.ride_date ASC, v.ride_time ASC
            "#,
        )
        .bind(today)
        .bind(filters.pickup.as_deref())
        .bind(filters.drop.as_deref())
        .bind(filters.date)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn delete_vehicle(&self, id: &Uuid) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query(
            r#"
            UPDATE ride_requests
            SET status = 'cancelled', updated_at = now()
            WHERE vehicle_id = $1
              AND status IN ('pending', 'accepted')
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("Vehicle not found"));
        }

        tx.commit().await?;
        Ok(cancelled)
    }
}
