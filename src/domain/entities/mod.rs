pub mod booking;
pub mod client;
pub mod contact;
pub mod notification;
pub mod rate_limit;
pub mod verification;
