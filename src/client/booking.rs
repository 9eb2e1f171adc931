use crate::client::api::{ApiClient, RideRequestPayload};
use crate::client::error::ClientError;
use crate::client::session::SessionContext;
use crate::models::ride_request::{BOOKING_PHONE_REGEX, RideRequestResponse};
use uuid::Uuid;

/// Booking details collected before a ride request is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub passenger_name: String,
    pub passenger_phone: String,
}

impl BookingForm {
    /// Prefills from the signed-in account, keeping only the digits of its phone number.
    pub fn prefilled(session: &SessionContext) -> Self {
        session
            .current()
            .map(|s| Self {
                passenger_name: s.account.name,
                passenger_phone: s.account.phone.chars().filter(char::is_ascii_digit).collect(),
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let mut errors = Vec::new();
        if self.passenger_name.trim().is_empty() {
            errors.push("Passenger name is required".to_string());
        }
        if !BOOKING_PHONE_REGEX.is_match(self.passenger_phone.trim()) {
            errors.push("Please enter a valid 10-digit phone number".to_string());
        }
        if errors.is_empty() { Ok(()) } else { Err(ClientError::Validation(errors)) }
    }

    pub fn to_payload(&self, vehicle_id: Uuid, requested_seats: i32) -> Result<RideRequestPayload, ClientError> {
        self.validate()?;
        if requested_seats < 1 {
            return Err(ClientError::Validation(vec!["Requested seats must be at least 1".to_string()]));
        }
        Ok(RideRequestPayload {
            vehicle_id,
            requested_seats,
            passenger_name: self.passenger_name.trim().to_string(),
            passenger_phone: self.passenger_phone.trim().to_string(),
        })
    }

    pub async fn submit(&self, api: &ApiClient, vehicle_id: Uuid, requested_seats: i32) -> Result<RideRequestResponse, ClientError> {
        let payload = self.to_payload(vehicle_id, requested_seats)?;
        api.create_ride_request(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::Session;
    use crate::client::testing::{ScriptedTransport, account_response, json_response};
    use crate::models::account::Role;
    use std::sync::Arc;

    #[test]
    fn form_is_prefilled_from_session() {
        let session = SessionContext::in_memory();
        assert_eq!(BookingForm::prefilled(&session), BookingForm::default());

        let mut account = account_response(Role::Passenger);
        account.phone = "+91 98765-43210".to_string();
        session.save(&Session::new("tok".to_string(), account)).unwrap();

        let form = BookingForm::prefilled(&session);
        assert_eq!(form.passenger_name, "Asha Rao");
        assert_eq!(form.passenger_phone, "919876543210");
        assert!(form.validate().is_err());
    }

    #[test]
    fn phone_must_be_exactly_ten_digits() {
        let mut form = BookingForm {
            passenger_name: "Asha".to_string(),
            passenger_phone: "987654321".to_string(),
        };
        assert!(form.validate().is_err());
        form.passenger_phone = "9876543210".to_string();
        assert!(form.validate().is_ok());
        assert!(form.to_payload(Uuid::new_v4(), 0).is_err());
    }

    #[tokio::test]
    async fn valid_booking_is_sent_to_the_server() {
        let transport = Arc::new(ScriptedTransport::new());
        let vehicle_id = Uuid::new_v4();
        transport.push(json_response(
            200,
            serde_json::json!({
                "id": Uuid::new_v4(),
                "vehicleId": vehicle_id,
                "driverId": Uuid::new_v4(),
                "passengerId": Uuid::new_v4(),
                "passengerName": "Asha",
                "passengerPhone": "9876543210",
                "requestedSeats": 2,
                "status": "pending",
                "rejectionReason": null,
                "createdAt": "2030-01-01T00:00:00Z"
            }),
        ));
        let api = ApiClient::new(transport.clone(), SessionContext::in_memory(), "/driver/login");
        let form = BookingForm {
            passenger_name: " Asha ".to_string(),
            passenger_phone: "9876543210".to_string(),
        };

        let created = form.submit(&api, vehicle_id, 2).await.unwrap();
        assert_eq!(created.requested_seats, 2);

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["vehicleId"], serde_json::json!(vehicle_id));
        assert_eq!(body["passengerName"], "Asha");
    }
}
