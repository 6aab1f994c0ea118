pub mod booking;
pub mod contact;
pub mod notifications;
pub mod verification;
