use crate::auth::CurrentUser;
use crate::database::account::{AccountRepository, password_hash};
use crate::database::rating::RatingRepository;
use crate::database::ride_request::RideRequestRepository;
use crate::database::session::SessionRepository;
use crate::database::vehicle::VehicleRepository;
use crate::error::app_error::AppError;
use crate::models::account::{Account, NewAccount, RegisterRequest, Role};
use crate::models::rating::{NewRating, Rating, RatingRequest, RatingSummary, RatingWithPassenger, average_rating};
use crate::models::ride_request::{CancelledRideRequest, NewRideRequest, RideRequest, RideRequestCreate, RideRequestStatus};
use crate::models::session::Session;
use crate::models::vehicle::{AvailableVehicle, NewVehicle, Vehicle, VehicleFilters, VehicleRequest};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::LazyLock;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret1";

static TEST_PASSWORD_HASH: LazyLock<String> = LazyLock::new(|| password_hash(TEST_PASSWORD).expect("hash test password").1);

struct StoredSession {
    session: Session,
    token_hash: String,
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Account>,
    sessions: Vec<StoredSession>,
    vehicles: Vec<Vehicle>,
    ride_requests: Vec<RideRequest>,
    ratings: Vec<Rating>,
}

/// In-memory stand-in for `PostgresRepository` that keeps the same invariants.
#[derive(Default)]
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, email: &str, role: Role) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            password_hash: TEST_PASSWORD_HASH.clone(),
            role,
            active_role: role,
            average_rating: 0.0,
            total_ratings: 0,
            created_at: Utc::now(),
        };
        self.state.lock().await.accounts.push(account.clone());
        account
    }

    pub async fn insert_vehicle(&self, owner: &Account, total_seats: i32, available_seats: i32) -> Vehicle {
        let new_vehicle = NewVehicle {
            owner_account_id: owner.id,
            car_type: "Sedan".to_string(),
            pickup_location: "Pune".to_string(),
            drop_location: "Mumbai".to_string(),
            ride_date: future_date(),
            ride_time: "08:30".to_string(),
            total_seats,
            available_seats,
            notes: String::new(),
        };
        self.create_vehicle(&new_vehicle).await.expect("insert vehicle")
    }

    pub async fn set_vehicle_date(&self, id: &Uuid, date: NaiveDate) {
        let mut state = self.state.lock().await;
        if let Some(vehicle) = state.vehicles.iter_mut().find(|v| v.id == *id) {
            vehicle.ride_date = date;
        }
    }

    pub async fn insert_ride_request(&self, vehicle: &Vehicle, passenger: &Account, seats: i32) -> RideRequest {
        let new_request = NewRideRequest {
            vehicle_id: vehicle.id,
            driver_id: vehicle.owner_account_id,
            passenger_id: passenger.id,
            passenger_name: passenger.name.clone(),
            passenger_phone: "9876543210".to_string(),
            requested_seats: seats,
        };
        self.create_ride_request(&new_request).await.expect("insert ride request")
    }

    /// Seats taken by accepted or completed requests on the listing.
    pub async fn seats_committed(&self, vehicle_id: &Uuid) -> i32 {
        let state = self.state.lock().await;
        state
            .ride_requests
            .iter()
            .filter(|r| r.vehicle_id == Some(*vehicle_id))
            .filter(|r| matches!(r.status, RideRequestStatus::Accepted | RideRequestStatus::Completed))
            .map(|r| r.requested_seats)
            .sum()
    }
}

fn touch(request: &mut RideRequest, status: RideRequestStatus) {
    request.status = status;
    request.updated_at = Utc::now();
}

#[async_trait::async_trait]
impl AccountRepository for MockRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        let (_, hash) = password_hash(&account.password)?;
        let mut state = self.state.lock().await;
        if state.accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::AccountAlreadyExists(account.email.clone()));
        }

        let created = Account {
            id: Uuid::new_v4(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            password_hash: hash,
            role: account.role,
            active_role: account.role,
            average_rating: 0.0,
            total_ratings: 0,
            created_at: Utc::now(),
        };
        state.accounts.push(created.clone());
        Ok(created)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.state.lock().await.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn get_account_by_id(&self, id: &Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.state.lock().await.accounts.iter().find(|a| a.id == *id).cloned())
    }

    async fn set_active_role(&self, id: &Uuid, role: Role) -> Result<Account, AppError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| AppError::not_found("Account not found"))?;
        account.active_role = role;
        Ok(account.clone())
    }
}

#[async_trait::async_trait]
impl SessionRepository for MockRepository {
    async fn create_session(&self, account_id: &Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        let session = Session {
            id: Uuid::new_v4(),
            account_id: *account_id,
            created_at: Utc::now(),
            expires_at,
        };
        let mut state = self.state.lock().await;
        state.sessions.retain(|s| s.session.account_id != *account_id || s.session.expires_at > Utc::now());
        state.sessions.push(StoredSession {
            session: session.clone(),
            token_hash: token_hash.to_string(),
        });
        Ok(session)
    }

    async fn get_session_account(&self, token_hash: &str) -> Result<Option<Account>, AppError> {
        let state = self.state.lock().await;
        let account = state
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.session.expires_at > Utc::now())
            .and_then(|s| state.accounts.iter().find(|a| a.id == s.session.account_id))
            .cloned();
        Ok(account)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), AppError> {
        self.state.lock().await.sessions.retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_expired_sessions_for_account(&self, account_id: &Uuid) -> Result<(), AppError> {
        self.state
            .lock()
            .await
            .sessions
            .retain(|s| s.session.account_id != *account_id || s.session.expires_at > Utc::now());
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleRepository for MockRepository {
    async fn create_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, AppError> {
        let created = Vehicle {
            id: Uuid::new_v4(),
            owner_account_id: vehicle.owner_account_id,
            car_type: vehicle.car_type.clone(),
            pickup_location: vehicle.pickup_location.clone(),
            drop_location: vehicle.drop_location.clone(),
            ride_date: vehicle.ride_date,
            ride_time: vehicle.ride_time.clone(),
            total_seats: vehicle.total_seats,
            available_seats: vehicle.available_seats,
            notes: vehicle.notes.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().await.vehicles.push(created.clone());
        Ok(created)
    }

    async fn get_vehicle(&self, id: &Uuid) -> Result<Option<Vehicle>, AppError> {
        Ok(self.state.lock().await.vehicles.iter().find(|v| v.id == *id).cloned())
    }

    async fn list_vehicles_by_owner(&self, owner_account_id: &Uuid) -> Result<Vec<Vehicle>, AppError> {
        let state = self.state.lock().await;
        let mut vehicles: Vec<Vehicle> = state.vehicles.iter().filter(|v| v.owner_account_id == *owner_account_id).cloned().collect();
        vehicles.sort_by(|a, b| (b.ride_date, &b.ride_time).cmp(&(a.ride_date, &a.ride_time)));
        Ok(vehicles)
    }

    async fn list_available_vehicles(&self, filters: &VehicleFilters, today: NaiveDate) -> Result<Vec<AvailableVehicle>, AppError> {
        let state = self.state.lock().await;
        let mut vehicles: Vec<AvailableVehicle> = state
            .vehicles
            .iter()
            .filter(|v| filters.matches(v, today))
            .filter_map(|v| {
                let driver = state.accounts.iter().find(|a| a.id == v.owner_account_id)?;
                Some(AvailableVehicle::new(v.clone(), driver))
            })
            .collect();
        vehicles.sort_by(|a, b| (a.vehicle.ride_date, &a.vehicle.ride_time).cmp(&(b.vehicle.ride_date, &b.vehicle.ride_time)));
        Ok(vehicles)
    }

    async fn delete_vehicle(&self, id: &Uuid) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let before = state.vehicles.len();
        state.vehicles.retain(|v| v.id != *id);
        if state.vehicles.len() == before {
            return Err(AppError::not_found("Vehicle not found"));
        }

        let mut cancelled = 0;
        for request in state.ride_requests.iter_mut().filter(|r| r.vehicle_id == Some(*id)) {
            if request.status.can_transition_to(RideRequestStatus::Cancelled) {
                touch(request, RideRequestStatus::Cancelled);
                cancelled += 1;
            }
            request.vehicle_id = None;
        }
        Ok(cancelled)
    }
}

#[async_trait::async_trait]
impl RideRequestRepository for MockRepository {
    async fn create_ride_request(&self, request: &NewRideRequest) -> Result<RideRequest, AppError> {
        let now = Utc::now();
        let created = RideRequest {
            id: Uuid::new_v4(),
            vehicle_id: Some(request.vehicle_id),
            driver_id: request.driver_id,
            passenger_id: request.passenger_id,
            passenger_name: request.passenger_name.clone(),
            passenger_phone: request.passenger_phone.clone(),
            requested_seats: request.requested_seats,
            status: RideRequestStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.ride_requests.push(created.clone());
        Ok(created)
    }

    async fn get_ride_request(&self, id: &Uuid) -> Result<Option<RideRequest>, AppError> {
        Ok(self.state.lock().await.ride_requests.iter().find(|r| r.id == *id).cloned())
    }

    async fn list_ride_requests_for_driver(&self, driver_id: &Uuid, status: Option<RideRequestStatus>) -> Result<Vec<RideRequest>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .ride_requests
            .iter()
            .rev()
            .filter(|r| r.driver_id == *driver_id && status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }

    async fn list_ride_requests_for_passenger(&self, passenger_id: &Uuid) -> Result<Vec<RideRequest>, AppError> {
        let state = self.state.lock().await;
        Ok(state.ride_requests.iter().rev().filter(|r| r.passenger_id == *passenger_id).cloned().collect())
    }

    async fn accept_ride_request(&self, id: &Uuid) -> Result<RideRequest, AppError> {
        let mut state = self.state.lock().await;
        let MockState { vehicles, ride_requests, .. } = &mut *state;

        let request = ride_requests
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| AppError::not_found("Ride request not found"))?;
        if request.status != RideRequestStatus::Pending {
            return Err(AppError::conflict(format!("Cannot accept a {} ride request", request.status)));
        }

        let vehicle = vehicles
            .iter_mut()
            .find(|v| Some(v.id) == request.vehicle_id)
            .ok_or_else(|| AppError::not_found("Vehicle not found"))?;
        if vehicle.available_seats < request.requested_seats {
            return Err(AppError::conflict("Not enough seats available"));
        }

        vehicle.available_seats -= request.requested_seats;
        touch(request, RideRequestStatus::Accepted);
        Ok(request.clone())
    }

    async fn transition_ride_request(
        &self,
        id: &Uuid,
        from: RideRequestStatus,
        to: RideRequestStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<RideRequest>, AppError> {
        let mut state = self.state.lock().await;
        let Some(request) = state.ride_requests.iter_mut().find(|r| r.id == *id && r.status == from) else {
            return Ok(None);
        };
        touch(request, to);
        if let Some(reason) = rejection_reason {
            request.rejection_reason = Some(reason.to_string());
        }
        Ok(Some(request.clone()))
    }

    async fn cancel_ride_request(&self, id: &Uuid) -> Result<CancelledRideRequest, AppError> {
        let mut state = self.state.lock().await;
        let MockState { vehicles, ride_requests, .. } = &mut *state;

        let request = ride_requests
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| AppError::not_found("Ride request not found"))?;
        if !request.status.can_transition_to(RideRequestStatus::Cancelled) {
            return Err(AppError::conflict(format!("Cannot cancel a {} ride request", request.status)));
        }

        let mut seats_restored = 0;
        if request.status.holds_seats()
            && let Some(vehicle) = vehicles.iter_mut().find(|v| Some(v.id) == request.vehicle_id)
        {
            let restored = (vehicle.available_seats + request.requested_seats).min(vehicle.total_seats);
            seats_restored = restored - vehicle.available_seats;
            vehicle.available_seats = restored;
        }

        touch(request, RideRequestStatus::Cancelled);
        Ok(CancelledRideRequest {
            request: request.clone(),
            seats_restored,
        })
    }

    async fn complete_due_ride_requests(&self, today: NaiveDate) -> Result<Vec<Uuid>, AppError> {
        let mut state = self.state.lock().await;
        let MockState { vehicles, ride_requests, .. } = &mut *state;

        let mut completed = Vec::new();
        for request in ride_requests.iter_mut().filter(|r| r.status == RideRequestStatus::Accepted) {
            let due = vehicles.iter().any(|v| Some(v.id) == request.vehicle_id && v.ride_date < today);
            if due {
                touch(request, RideRequestStatus::Completed);
                completed.push(request.id);
            }
        }
        Ok(completed)
    }
}

#[async_trait::async_trait]
impl RatingRepository for MockRepository {
    async fn create_rating(&self, rating: &NewRating) -> Result<(Rating, RatingSummary), AppError> {
        let mut state = self.state.lock().await;
        if state.ratings.iter().any(|r| r.passenger_id == rating.passenger_id && r.ride_id == rating.ride_id) {
            return Err(AppError::conflict("You have already rated this ride"));
        }

        let created = Rating {
            id: Uuid::new_v4(),
            passenger_id: rating.passenger_id,
            driver_id: rating.driver_id,
            ride_id: rating.ride_id,
            rating: rating.rating,
            review: rating.review.clone(),
            cleanliness_rating: rating.cleanliness_rating,
            behavior_rating: rating.behavior_rating,
            safety_rating: rating.safety_rating,
            created_at: Utc::now(),
        };
        state.ratings.push(created.clone());

        let scores: Vec<i16> = state.ratings.iter().filter(|r| r.driver_id == rating.driver_id).map(|r| r.rating).collect();
        let summary = RatingSummary {
            average_rating: average_rating(&scores),
            total_ratings: scores.len() as i32,
        };
        let driver = state
            .accounts
            .iter_mut()
            .find(|a| a.id == rating.driver_id)
            .ok_or_else(|| AppError::not_found("Driver not found"))?;
        driver.average_rating = summary.average_rating;
        driver.total_ratings = summary.total_ratings;

        Ok((created, summary))
    }

    async fn rating_exists(&self, passenger_id: &Uuid, ride_id: &Uuid) -> Result<bool, AppError> {
        let state = self.state.lock().await;
        Ok(state.ratings.iter().any(|r| r.passenger_id == *passenger_id && r.ride_id == *ride_id))
    }

    async fn list_ratings_for_driver(&self, driver_id: &Uuid) -> Result<Vec<RatingWithPassenger>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .ratings
            .iter()
            .rev()
            .filter(|r| r.driver_id == *driver_id)
            .map(|r| RatingWithPassenger {
                rating: r.clone(),
                passenger_name: state
                    .accounts
                    .iter()
                    .find(|a| a.id == r.passenger_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

pub fn current_user(account: &Account) -> CurrentUser {
    CurrentUser {
        id: account.id,
        name: account.name.clone(),
        email: account.email.clone(),
        phone: account.phone.clone(),
        role: account.role,
        active_role: account.active_role,
        token_hash: String::new(),
    }
}

pub fn future_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(30)
}

pub fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Test Account".to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        password: TEST_PASSWORD.to_string(),
        password_confirm: TEST_PASSWORD.to_string(),
    }
}

pub fn vehicle_request(total_seats: i32, available_seats: i32) -> VehicleRequest {
    VehicleRequest {
        car_type: "SUV".to_string(),
        pickup_location: "Pune".to_string(),
        drop_location: "Nashik".to_string(),
        date: Some(future_date()),
        time: "07:15".to_string(),
        total_seats,
        available_seats: Some(available_seats),
        notes: String::new(),
    }
}

pub fn ride_request_create(vehicle: &Vehicle, seats: i32) -> RideRequestCreate {
    RideRequestCreate {
        vehicle_id: vehicle.id,
        requested_seats: seats,
        passenger_name: "Passenger".to_string(),
        passenger_phone: "9123456780".to_string(),
    }
}

pub fn rating_request(ride: &RideRequest, rating: i16) -> RatingRequest {
    RatingRequest {
        driver_id: ride.driver_id,
        ride_id: ride.id,
        rating,
        review: Some("Smooth ride".to_string()),
        cleanliness_rating: None,
        behavior_rating: None,
        safety_rating: None,
    }
}
