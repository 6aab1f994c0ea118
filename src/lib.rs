use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, messages, use_cases, validation};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{limiter, notify, store, utils};

use entities::{rate_limit::RateLimitEntry, verification::VerificationRecord};
use limiter::rate_limiter::RateLimiter;
use repositories::notifier::{EmailSender, PushNotifier, UserAgentParser, VerificationChannel};
use store::memory::MemoryStore;
use use_cases::{
    booking::{BookingHandler, Notifiers},
    contact::ContactHandler,
    verification::VerificationHandler,
};
use utils::{
    clock::{Clock, SystemClock},
    user_agent::WootheeParser,
};

pub type VerificationStore = MemoryStore<VerificationRecord>;
pub type RateLimitStore = MemoryStore<RateLimitEntry>;

pub type AppVerificationHandler = VerificationHandler<VerificationStore>;
pub type AppBookingHandler = BookingHandler<VerificationStore>;
pub type AppRateLimiter = RateLimiter<RateLimitStore>;

/// External collaborators the handlers talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub channel: Arc<dyn VerificationChannel>,
    pub mailer: Arc<dyn EmailSender>,
    pub push: Option<Arc<dyn PushNotifier>>,
    pub user_agents: Arc<dyn UserAgentParser>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn from_config(config: &settings::AppConfig) -> anyhow::Result<Self> {
        let client = notify::build_http_client(config)?;

        Ok(Collaborators {
            channel: notify::build_channels(config, &client),
            mailer: notify::build_mailer(config, &client)?,
            push: notify::build_push(config, &client),
            user_agents: Arc::new(WootheeParser::new()),
            clock: Arc::new(SystemClock),
        })
    }
}

pub struct AppState {
    pub verification_handler: AppVerificationHandler,
    pub booking_handler: AppBookingHandler,
    pub contact_handler: ContactHandler,
    pub rate_limiter: AppRateLimiter,
    pub trust_x_forwarded_for: bool,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, collaborators: Collaborators) -> Self {
        let verification_policy = config.verification.policy();
        let verifications = VerificationStore::new();

        let notifiers = Notifiers {
            mailer: collaborators.mailer,
            push: collaborators.push,
            user_agents: collaborators.user_agents,
            operator_address: config.email.operator_address.clone(),
        };

        AppState {
            verification_handler: VerificationHandler::new(
                verifications.clone(),
                collaborators.channel,
                collaborators.clock.clone(),
                verification_policy,
            ),
            booking_handler: BookingHandler::new(
                verifications,
                notifiers.clone(),
                collaborators.clock.clone(),
                verification_policy,
            ),
            contact_handler: ContactHandler::new(notifiers, collaborators.clock.clone()),
            rate_limiter: RateLimiter::new(
                RateLimitStore::new(),
                config.rate_limit.policy(),
                collaborators.clock,
            ),
            trust_x_forwarded_for: config.trust_x_forwarded_for,
        }
    }
}
