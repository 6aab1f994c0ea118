pub mod clock;
pub mod get_client_ip;
pub mod mask;
pub mod user_agent;
