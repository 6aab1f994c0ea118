use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{HeaderName, HeaderValue},
        Method,
    },
    web, Error, ResponseError,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{
    rc::Rc,
    task::{Context, Poll},
};

use crate::{
    entities::rate_limit::RateDecision,
    errors::AppError,
    utils::get_client_ip::{client_context, client_key},
    AppState,
};

/// Counts POST requests per client against the shared limiter and rejects
/// denied clients with 429 before the handler runs.
pub struct RateLimit;

impl<S> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitService {
            service: Rc::new(service),
        })
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if *req.method() != Method::POST {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in rate-limit middleware");
                let error = AppError::InternalError("application state missing".into());
                return Ok(req.into_response(error.error_response()));
            };

            let client = client_context(req.request(), state.trust_x_forwarded_for);
            // each protected endpoint keeps its own budget per client
            let key = format!(
                "{}|{}",
                req.path(),
                client_key(&client, state.rate_limiter.policy().key_mode)
            );

            let decision = match state.rate_limiter.check(&key).await {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter unavailable");
                    return Ok(req.into_response(e.error_response()));
                }
            };

            match decision {
                RateDecision::Admitted { remaining } => {
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(remaining),
                    );
                    Ok(res)
                }
                RateDecision::Limited { .. } => {
                    tracing::warn!(
                        event = "RATE_LIMITED",
                        ip = %client.ip,
                        path = %req.path(),
                        user_agent = client.user_agent.as_deref().unwrap_or("-"),
                    );
                    Ok(deny(req, decision))
                }
                RateDecision::Blocked { until, .. } => {
                    tracing::warn!(
                        event = "IP_BLOCKED",
                        ip = %client.ip,
                        path = %req.path(),
                        blocked_until = %until.to_rfc3339(),
                    );
                    Ok(deny(req, decision))
                }
            }
        })
    }
}

fn deny(req: ServiceRequest, decision: RateDecision) -> ServiceResponse<BoxBody> {
    let error = decision.into_error().unwrap_or_else(AppError::rate_exceeded);
    req.into_response(error.error_response())
}
