pub mod entities;
pub mod messages;
pub mod use_cases;
pub mod validation;
