pub mod appointment;
pub mod contact;
pub mod json_error;
pub mod system;
