use crate::auth::CurrentUser;
use crate::database::ride_request::RideRequestRepository;
use crate::database::vehicle::VehicleRepository;
use crate::error::app_error::AppError;
use crate::models::ride_request::{CancelledRideRequest, NewRideRequest, RejectRequest, RideRequest, RideRequestCreate, RideRequestStatus};
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct BookingService<'a, R> {
    repository: &'a R,
}

impl<'a, R> BookingService<'a, R>
where
    R: RideRequestRepository + VehicleRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        BookingService { repository }
    }

    pub async fn create(&self, current_user: &CurrentUser, request: &RideRequestCreate) -> Result<RideRequest, AppError> {
        if !current_user.acts_as_passenger() {
            return Err(AppError::forbidden("Switch to passenger mode to book rides"));
        }
        request.validate()?;

        let vehicle = self
            .repository
            .get_vehicle(&request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vehicle not found"))?;

        if vehicle.owner_account_id == current_user.id {
            return Err(AppError::forbidden("You cannot book your own ride"));
        }
        if !vehicle.can_seat(request.requested_seats) {
            return Err(AppError::conflict(format!("Only {} seats available", vehicle.available_seats)));
        }

        let new_request = NewRideRequest {
            vehicle_id: vehicle.id,
            driver_id: vehicle.owner_account_id,
            passenger_id: current_user.id,
            passenger_name: request.passenger_name.trim().to_string(),
            passenger_phone: request.passenger_phone.clone(),
            requested_seats: request.requested_seats,
        };
        let created = self.repository.create_ride_request(&new_request).await?;
        info!(ride_request_id = %created.id, vehicle_id = %vehicle.id, seats = created.requested_seats, "ride requested");
        Ok(created)
    }

    pub async fn list_for_driver(&self, current_user: &CurrentUser, status: Option<&str>) -> Result<Vec<RideRequest>, AppError> {
        if !current_user.is_driver() {
            return Err(AppError::forbidden("Only drivers receive ride requests"));
        }
        let status = parse_status_filter(status)?;
        self.repository.list_ride_requests_for_driver(&current_user.id, status).await
    }

    pub async fn list_for_passenger(&self, current_user: &CurrentUser) -> Result<Vec<RideRequest>, AppError> {
        self.repository.list_ride_requests_for_passenger(&current_user.id).await
    }

    pub async fn accept(&self, current_user: &CurrentUser, id: &Uuid) -> Result<RideRequest, AppError> {
        let request = self.load(id).await?;
        ensure_driver(current_user, &request)?;
        ensure_transition(&request, RideRequestStatus::Accepted)?;

        let accepted = self.repository.accept_ride_request(id).await?;
        info!(ride_request_id = %id, seats = accepted.requested_seats, "ride request accepted");
        Ok(accepted)
    }

    pub async fn reject(&self, current_user: &CurrentUser, id: &Uuid, payload: &RejectRequest) -> Result<RideRequest, AppError> {
        payload.validate()?;
        let request = self.load(id).await?;
        ensure_driver(current_user, &request)?;
        ensure_transition(&request, RideRequestStatus::Rejected)?;

        let reason = payload.rejection_reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let rejected = self
            .repository
            .transition_ride_request(id, RideRequestStatus::Pending, RideRequestStatus::Rejected, reason)
            .await?
            .ok_or_else(|| AppError::conflict("Ride request is no longer pending"))?;
        info!(ride_request_id = %id, "ride request rejected");
        Ok(rejected)
    }

    pub async fn cancel(&self, current_user: &CurrentUser, id: &Uuid) -> Result<CancelledRideRequest, AppError> {
        let request = self.load(id).await?;
        if request.passenger_id != current_user.id {
            return Err(AppError::forbidden("You can only cancel your own ride requests"));
        }
        ensure_transition(&request, RideRequestStatus::Cancelled)?;

        let cancelled = self.repository.cancel_ride_request(id).await?;
        info!(ride_request_id = %id, seats_restored = cancelled.seats_restored, "ride request cancelled");
        Ok(cancelled)
    }

    /// Marks an accepted ride as travelled; completing twice returns the stored request.
    pub async fn complete(&self, id: &Uuid) -> Result<RideRequest, AppError> {
        let request = self.load(id).await?;
        if request.status == RideRequestStatus::Completed {
            return Ok(request);
        }
        ensure_transition(&request, RideRequestStatus::Completed)?;

        match self
            .repository
            .transition_ride_request(id, RideRequestStatus::Accepted, RideRequestStatus::Completed, None)
            .await?
        {
            Some(completed) => {
                info!(ride_request_id = %id, "ride completed");
                Ok(completed)
            }
            None => {
                let current = self.load(id).await?;
                if current.status == RideRequestStatus::Completed {
                    Ok(current)
                } else {
                    Err(AppError::conflict(format!("Cannot complete a {} ride request", current.status)))
                }
            }
        }
    }

    pub async fn complete_due(&self, today: NaiveDate) -> Result<Vec<Uuid>, AppError> {
        let completed = self.repository.complete_due_ride_requests(today).await?;
        info!(completed = completed.len(), "completed rides before {}", today);
        Ok(completed)
    }

    async fn load(&self, id: &Uuid) -> Result<RideRequest, AppError> {
        self.repository
            .get_ride_request(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ride request not found"))
    }
}

fn ensure_driver(current_user: &CurrentUser, request: &RideRequest) -> Result<(), AppError> {
    if request.driver_id != current_user.id {
        return Err(AppError::forbidden("This ride request belongs to another driver"));
    }
    Ok(())
}

fn ensure_transition(request: &RideRequest, next: RideRequestStatus) -> Result<(), AppError> {
    if !request.status.can_transition_to(next) {
        return Err(AppError::conflict(format!(
            "Cannot move ride request from {} to {}",
            request.status, next
        )));
    }
    Ok(())
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<RideRequestStatus>, AppError> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .to_lowercase()
            .parse()
            .map(Some)
            .map_err(|e: String| AppError::invalid_field("status", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{Account, Role};
    use crate::models::vehicle::Vehicle;
    use crate::test_utils::{MockRepository, current_user, ride_request_create};
    use proptest::prelude::*;

    struct Scenario {
        repo: MockRepository,
        driver: Account,
        passenger: Account,
        vehicle: Vehicle,
    }

    async fn scenario(total: i32) -> Scenario {
        let repo = MockRepository::new();
        let driver = repo.insert_account("driver@example.com", Role::Driver).await;
        let passenger = repo.insert_account("passenger@example.com", Role::Passenger).await;
        let vehicle = repo.insert_vehicle(&driver, total, total).await;
        Scenario {
            repo,
            driver,
            passenger,
            vehicle,
        }
    }

    async fn seats_left(repo: &MockRepository, vehicle: &Vehicle) -> i32 {
        repo.get_vehicle(&vehicle.id).await.unwrap().unwrap().available_seats
    }

    #[tokio::test]
    async fn create_starts_pending_without_taking_seats() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);

        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 2)).await.unwrap();

        assert_eq!(request.status, RideRequestStatus::Pending);
        assert_eq!(request.driver_id, s.driver.id);
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 4);
    }

    #[tokio::test]
    async fn create_rejects_more_seats_than_available() {
        let s = scenario(2).await;
        let service = BookingService::new(&s.repo);

        let result = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 3)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_requires_passenger_mode() {
        let s = scenario(4).await;
        let other_driver = s.repo.insert_account("other-driver@example.com", Role::Driver).await;
        let service = BookingService::new(&s.repo);

        let result = service.create(&current_user(&other_driver), &ride_request_create(&s.vehicle, 1)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn driver_cannot_book_own_listing_in_passenger_mode() {
        let s = scenario(4).await;
        let mut owner = current_user(&s.driver);
        owner.active_role = Role::Passenger;
        let service = BookingService::new(&s.repo);

        let result = service.create(&owner, &ride_request_create(&s.vehicle, 1)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn accept_takes_seats_and_conflict_leaves_them() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let driver = current_user(&s.driver);
        let passenger = current_user(&s.passenger);

        let a = service.create(&passenger, &ride_request_create(&s.vehicle, 3)).await.unwrap();
        let b = service.create(&passenger, &ride_request_create(&s.vehicle, 2)).await.unwrap();

        let accepted = service.accept(&driver, &a.id).await.unwrap();
        assert_eq!(accepted.status, RideRequestStatus::Accepted);
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 1);

        let result = service.accept(&driver, &b.id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 1);
        let b = s.repo.get_ride_request(&b.id).await.unwrap().unwrap();
        assert_eq!(b.status, RideRequestStatus::Pending);
    }

    #[tokio::test]
    async fn only_listing_driver_may_decide() {
        let s = scenario(4).await;
        let intruder = s.repo.insert_account("intruder@example.com", Role::Driver).await;
        let service = BookingService::new(&s.repo);
        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 1)).await.unwrap();

        let accept = service.accept(&current_user(&intruder), &request.id).await;
        let reject = service.reject(&current_user(&intruder), &request.id, &RejectRequest::default()).await;
        assert!(matches!(accept, Err(AppError::Forbidden(_))));
        assert!(matches!(reject, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn reject_records_reason_without_touching_seats() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 2)).await.unwrap();

        let payload = RejectRequest {
            rejection_reason: Some("Car is full".to_string()),
        };
        let rejected = service.reject(&current_user(&s.driver), &request.id, &payload).await.unwrap();

        assert_eq!(rejected.status, RideRequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Car is full"));
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 4);
    }

    #[tokio::test]
    async fn cancelling_accepted_booking_restores_seats() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let passenger = current_user(&s.passenger);
        let request = service.create(&passenger, &ride_request_create(&s.vehicle, 3)).await.unwrap();
        service.accept(&current_user(&s.driver), &request.id).await.unwrap();

        let cancelled = service.cancel(&passenger, &request.id).await.unwrap();

        assert_eq!(cancelled.request.status, RideRequestStatus::Cancelled);
        assert_eq!(cancelled.seats_restored, 3);
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 4);
    }

    #[tokio::test]
    async fn only_requesting_passenger_may_cancel() {
        let s = scenario(4).await;
        let other = s.repo.insert_account("other-p@example.com", Role::Passenger).await;
        let service = BookingService::new(&s.repo);
        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 1)).await.unwrap();

        let result = service.cancel(&current_user(&other), &request.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn terminal_requests_cannot_move() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let driver = current_user(&s.driver);
        let passenger = current_user(&s.passenger);
        let request = service.create(&passenger, &ride_request_create(&s.vehicle, 1)).await.unwrap();
        service.reject(&driver, &request.id, &RejectRequest::default()).await.unwrap();

        assert!(matches!(service.accept(&driver, &request.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(service.cancel(&passenger, &request.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(service.complete(&request.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn pending_requests_cannot_complete() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 1)).await.unwrap();

        assert!(matches!(service.complete(&request.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn completion_is_idempotent() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let request = service.create(&current_user(&s.passenger), &ride_request_create(&s.vehicle, 2)).await.unwrap();
        service.accept(&current_user(&s.driver), &request.id).await.unwrap();

        let first = service.complete(&request.id).await.unwrap();
        let second = service.complete(&request.id).await.unwrap();

        assert_eq!(first.status, RideRequestStatus::Completed);
        assert_eq!(second.status, RideRequestStatus::Completed);
        assert_eq!(seats_left(&s.repo, &s.vehicle).await, 2);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);

        let result = service.accept(&current_user(&s.driver), &Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn driver_listing_filters_by_status() {
        let s = scenario(4).await;
        let service = BookingService::new(&s.repo);
        let driver = current_user(&s.driver);
        let passenger = current_user(&s.passenger);
        let a = service.create(&passenger, &ride_request_create(&s.vehicle, 1)).await.unwrap();
        service.create(&passenger, &ride_request_create(&s.vehicle, 1)).await.unwrap();
        service.accept(&driver, &a.id).await.unwrap();

        assert_eq!(service.list_for_driver(&driver, None).await.unwrap().len(), 2);
        assert_eq!(service.list_for_driver(&driver, Some("pending")).await.unwrap().len(), 1);
        assert_eq!(service.list_for_driver(&driver, Some("ACCEPTED")).await.unwrap().len(), 1);
        assert!(matches!(
            service.list_for_driver(&driver, Some("done")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[derive(Debug, Clone)]
    enum Action {
        Request(i32),
        Accept(usize),
        Reject(usize),
        Cancel(usize),
        Complete(usize),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (1..=4i32).prop_map(Action::Request),
            (0..8usize).prop_map(Action::Accept),
            (0..8usize).prop_map(Action::Reject),
            (0..8usize).prop_map(Action::Cancel),
            (0..8usize).prop_map(Action::Complete),
        ]
    }

    fn pick(ids: &[Uuid], index: usize) -> Option<Uuid> {
        (!ids.is_empty()).then(|| ids[index % ids.len()])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn seats_stay_within_capacity(total in 1..=8i32, actions in prop::collection::vec(action(), 1..24)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let s = scenario(total).await;
                let service = BookingService::new(&s.repo);
                let driver = current_user(&s.driver);
                let passenger = current_user(&s.passenger);
                let mut ids: Vec<Uuid> = Vec::new();

                for action in actions {
                    // every failure must leave the listing untouched, so results are ignored
                    match action {
                        Action::Request(seats) => {
                            if let Ok(request) = service.create(&passenger, &ride_request_create(&s.vehicle, seats)).await {
                                ids.push(request.id);
                            }
                        }
                        Action::Accept(i) => if let Some(id) = pick(&ids, i) { let _ = service.accept(&driver, &id).await; },
                        Action::Reject(i) => if let Some(id) = pick(&ids, i) { let _ = service.reject(&driver, &id, &RejectRequest::default()).await; },
                        Action::Cancel(i) => if let Some(id) = pick(&ids, i) { let _ = service.cancel(&passenger, &id).await; },
                        Action::Complete(i) => if let Some(id) = pick(&ids, i) { let _ = service.complete(&id).await; },
                    }

                    let available = seats_left(&s.repo, &s.vehicle).await;
                    let committed = s.repo.seats_committed(&s.vehicle.id).await;
                    assert!((0..=total).contains(&available), "available {available} outside 0..={total}");
                    assert_eq!(available + committed, total, "accepted seats and free seats must add up to capacity");
                }
            });
        }
    }
}
