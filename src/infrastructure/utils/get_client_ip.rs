use actix_web::{http::header, HttpRequest};

use crate::entities::{client::ClientContext, rate_limit::ClientKeyMode};

/// Extract the client's IP address from the request, considering X-Forwarded-For if trusted
/// `trust_x_forwarded_for`: whether to trust the X-Forwarded-For header
pub fn get_client_ip(req: &HttpRequest, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        if let Some(forwarded) = req.headers().get("x-forwarded-for") {
            if let Ok(s) = forwarded.to_str() {
                let first = s.split(',').next().unwrap_or("").trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value(req: &HttpRequest, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn client_context(req: &HttpRequest, trust_x_forwarded_for: bool) -> ClientContext {
    ClientContext {
        ip: get_client_ip(req, trust_x_forwarded_for),
        user_agent: header_value(req, header::USER_AGENT),
        referer: header_value(req, header::REFERER),
        origin: header_value(req, header::ORIGIN),
    }
}

/// Rate-limit key for a client under the configured composition.
pub fn client_key(client: &ClientContext, mode: ClientKeyMode) -> String {
    match mode {
        ClientKeyMode::Ip => client.ip.clone(),
        ClientKeyMode::IpUserAgent => format!(
            "{}|{}",
            client.ip,
            client.user_agent.as_deref().unwrap_or("-")
        ),
    }
}
