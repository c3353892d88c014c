pub mod auth;
pub mod children;
pub mod messages;
pub mod ratings;
pub mod ride_requests;
pub mod rides;
pub mod schools;
