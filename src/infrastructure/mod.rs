pub mod limiter;
pub mod notify;
pub mod store;
pub mod utils;
