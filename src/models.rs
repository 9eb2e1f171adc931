pub mod account;
pub mod rating;
pub mod ride_request;
pub mod session;
pub mod vehicle;

use validator::ValidationError;

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
