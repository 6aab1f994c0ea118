use std::fmt;

use serde::Serialize;

/// Request metadata used for rate-limit keys and operator diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub origin: Option<String>,
}

/// Browser, OS and device descriptors parsed from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAgentInfo {
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device: String,
}

impl Default for UserAgentInfo {
    fn default() -> Self {
        UserAgentInfo {
            browser: "Unknown".to_string(),
            browser_version: String::new(),
            os: "Unknown".to_string(),
            os_version: String::new(),
            device: "Unknown".to_string(),
        }
    }
}

impl UserAgentInfo {
    pub fn browser_label(&self) -> String {
        join_label(&self.browser, &self.browser_version)
    }

    pub fn os_label(&self) -> String {
        join_label(&self.os, &self.os_version)
    }
}

impl fmt::Display for UserAgentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} ({})", self.browser_label(), self.os_label(), self.device)
    }
}

fn join_label(name: &str, version: &str) -> String {
    if version.is_empty() || version == "UNKNOWN" {
        name.to_string()
    } else {
        format!("{} {}", name, version)
    }
}
