use actix_web::web;
use tokio::time::{interval, Duration};

use crate::AppState;

/// Periodically drops expired verification records and idle limiter entries.
/// Expiry is also checked on every access; this only bounds memory.
pub async fn start_sweep_task(state: web::Data<AppState>, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        match state.verification_handler.purge_expired().await {
            Ok(0) => {}
            Ok(count) => tracing::info!("Purged {} expired verification records", count),
            Err(e) => tracing::error!("Verification purge failed: {}", e),
        }

        match state.rate_limiter.purge_stale().await {
            Ok(0) => {}
            Ok(count) => tracing::info!("Purged {} idle rate-limit entries", count),
            Err(e) => tracing::error!("Rate-limit purge failed: {}", e),
        }
    }
}
