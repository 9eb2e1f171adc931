use crate::auth::CurrentUser;
use crate::database::account::AccountRepository;
use crate::database::rating::RatingRepository;
use crate::database::ride_request::RideRequestRepository;
use crate::error::app_error::AppError;
use crate::models::rating::{DriverRatingsResponse, Rating, RatingRequest, RatingResponse, RatingSummary};
use crate::models::ride_request::RideRequestStatus;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct RatingService<'a, R> {
    repository: &'a R,
}

impl<'a, R> RatingService<'a, R>
where
    R: RatingRepository + RideRequestRepository + AccountRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        RatingService { repository }
    }

    pub async fn submit(&self, current_user: &CurrentUser, request: &RatingRequest) -> Result<(Rating, RatingSummary), AppError> {
        request.validate()?;

        let ride = self
            .repository
            .get_ride_request(&request.ride_id)
            .await?
            .ok_or_else(|| AppError::not_found("Ride not found"))?;

        if ride.passenger_id != current_user.id {
            return Err(AppError::forbidden("You can only rate rides you booked"));
        }
        if ride.status != RideRequestStatus::Completed {
            return Err(AppError::conflict("Only completed rides can be rated"));
        }
        if self.repository.rating_exists(&current_user.id, &ride.id).await? {
            return Err(AppError::conflict("You have already rated this ride"));
        }
        if ride.driver_id != request.driver_id {
            return Err(AppError::invalid_field("driver_id", "Driver does not match this ride"));
        }

        let (rating, summary) = self.repository.create_rating(&request.to_new_rating(current_user.id)).await?;
        info!(
            rating_id = %rating.id,
            driver_id = %rating.driver_id,
            average_rating = summary.average_rating,
            total_ratings = summary.total_ratings,
            "rating recorded"
        );
        Ok((rating, summary))
    }

    pub async fn rated(&self, current_user: &CurrentUser, ride_id: &Uuid) -> Result<bool, AppError> {
        self.repository.rating_exists(&current_user.id, ride_id).await
    }

    pub async fn list_for_driver(&self, driver_id: &Uuid) -> Result<DriverRatingsResponse, AppError> {
        let driver = self
            .repository
            .get_account_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::not_found("Driver not found"))?;
        let ratings = self.repository.list_ratings_for_driver(driver_id).await?;

        Ok(DriverRatingsResponse {
            driver_id: driver.id,
            average_rating: driver.average_rating,
            total_ratings: driver.total_ratings,
            ratings: ratings.iter().map(RatingResponse::from).collect(),
        })
    }
}
