use std::sync::Arc;

use chrono::{Duration, Utc};
use contact_backend::{
    entities::{
        client::ClientContext,
        rate_limit::{ClientKeyMode, RateDecision, RateLimitEntry, RateLimitPolicy},
    },
    limiter::rate_limiter::RateLimiter,
    store::memory::MemoryStore,
    utils::{clock::ManualClock, get_client_ip::client_key},
};
use futures_util::future::join_all;

fn limiter(max_requests: u32, block_for: Option<Duration>) -> (RateLimiter<MemoryStore<RateLimitEntry>>, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let policy = RateLimitPolicy {
        window: Duration::minutes(15),
        max_requests,
        block_for,
        key_mode: ClientKeyMode::Ip,
    };
    (RateLimiter::new(MemoryStore::new(), policy, Arc::new(clock.clone())), clock)
}

#[actix_rt::test]
async fn admits_exactly_n_per_window() {
    let (limiter, clock) = limiter(5, None);

    for remaining in (0..5).rev() {
        let decision = limiter.check("203.0.113.1").await.unwrap();
        assert_eq!(decision, RateDecision::Admitted { remaining });
    }

    let denied = limiter.check("203.0.113.1").await.unwrap();
    assert_eq!(
        denied,
        RateDecision::Limited {
            retry_after: Duration::minutes(15)
        }
    );

    clock.advance(Duration::minutes(15));
    assert!(limiter.check("203.0.113.1").await.unwrap().is_admitted());
}

#[actix_rt::test]
async fn block_outlasts_the_window() {
    let (limiter, clock) = limiter(2, Some(Duration::hours(24)));
    let start = Utc::now();
    clock.set(start);

    limiter.check("client").await.unwrap();
    limiter.check("client").await.unwrap();
    let blocked = limiter.check("client").await.unwrap();
    assert_eq!(
        blocked,
        RateDecision::Blocked {
            until: start + Duration::hours(24),
            retry_after: Duration::hours(24)
        }
    );

    clock.advance(Duration::hours(2));
    assert!(matches!(
        limiter.check("client").await.unwrap(),
        RateDecision::Blocked { .. }
    ));

    clock.advance(Duration::hours(22));
    assert_eq!(
        limiter.check("client").await.unwrap(),
        RateDecision::Admitted { remaining: 1 }
    );
}

#[actix_rt::test]
async fn concurrent_checks_admit_no_more_than_the_limit() {
    let (limiter, _clock) = limiter(5, None);

    let decisions = join_all((0..20).map(|_| limiter.check("burst"))).await;
    let admitted = decisions
        .into_iter()
        .filter(|d| d.as_ref().unwrap().is_admitted())
        .count();

    assert_eq!(admitted, 5);
}

#[test]
fn user_agent_mode_separates_clients_behind_one_ip() {
    let firefox = ClientContext {
        ip: "192.0.2.10".into(),
        user_agent: Some("Firefox".into()),
        ..ClientContext::default()
    };
    let curl = ClientContext {
        user_agent: Some("curl/8.0".into()),
        ..firefox.clone()
    };

    assert_eq!(
        client_key(&firefox, ClientKeyMode::Ip),
        client_key(&curl, ClientKeyMode::Ip)
    );
    assert_ne!(
        client_key(&firefox, ClientKeyMode::IpUserAgent),
        client_key(&curl, ClientKeyMode::IpUserAgent)
    );
}
