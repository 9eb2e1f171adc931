pub mod account;
pub mod postgres_repository;
pub mod rating;
pub mod ride_request;
pub mod session;
pub mod vehicle;
