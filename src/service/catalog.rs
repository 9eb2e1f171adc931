use crate::auth::CurrentUser;
use crate::database::account::AccountRepository;
use crate::database::vehicle::VehicleRepository;
use crate::error::app_error::AppError;
use crate::models::vehicle::{AvailableVehicle, Vehicle, VehicleFilters, VehicleRequest};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct CatalogService<'a, R> {
    repository: &'a R,
}

impl<'a, R> CatalogService<'a, R>
where
    R: VehicleRepository + AccountRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        CatalogService { repository }
    }

    pub async fn create(&self, current_user: &CurrentUser, request: &VehicleRequest) -> Result<Vehicle, AppError> {
        if !current_user.is_driver() {
            return Err(AppError::forbidden("Only drivers can list vehicles"));
        }
        request.validate()?;

        let new_vehicle = request
            .to_new_vehicle(current_user.id)
            .ok_or_else(|| AppError::BadRequest("Date and available seats are required".to_string()))?;
        let vehicle = self.repository.create_vehicle(&new_vehicle).await?;
        info!(vehicle_id = %vehicle.id, owner_id = %current_user.id, "vehicle listed");
        Ok(vehicle)
    }

    pub async fn list_mine(&self, current_user: &CurrentUser) -> Result<Vec<Vehicle>, AppError> {
        if !current_user.is_driver() {
            return Err(AppError::forbidden("Only drivers have vehicle listings"));
        }
        self.repository.list_vehicles_by_owner(&current_user.id).await
    }

    pub async fn list_available(&self, filters: &VehicleFilters, today: NaiveDate) -> Result<Vec<AvailableVehicle>, AppError> {
        self.repository.list_available_vehicles(filters, today).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<AvailableVehicle, AppError> {
        let vehicle = self.repository.get_vehicle(id).await?.ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        let driver = self
            .repository
            .get_account_by_id(&vehicle.owner_account_id)
            .await?
            .ok_or_else(|| AppError::not_found("Driver not found"))?;
        Ok(AvailableVehicle::new(vehicle, &driver))
    }

    /// Removes an owned listing; open requests on it are cancelled with it.
    pub async fn delete(&self, current_user: &CurrentUser, id: &Uuid) -> Result<u64, AppError> {
        let vehicle = self.repository.get_vehicle(id).await?.ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        if vehicle.owner_account_id != current_user.id {
            return Err(AppError::forbidden("You can only delete your own vehicles"));
        }

        let cancelled = self.repository.delete_vehicle(id).await?;
        info!(vehicle_id = %id, cancelled_requests = cancelled, "vehicle deleted");
        Ok(cancelled)
    }
}
