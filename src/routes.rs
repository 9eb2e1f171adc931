pub mod auth;
pub mod cron;
pub mod error;
pub mod health;
pub mod rating;
pub mod ride_request;
pub mod vehicle;
