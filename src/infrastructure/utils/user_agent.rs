use woothee::parser::Parser;

use crate::{entities::client::UserAgentInfo, repositories::notifier::UserAgentParser};

pub struct WootheeParser {
    parser: Parser,
}

impl WootheeParser {
    pub fn new() -> Self {
        WootheeParser { parser: Parser::new() }
    }
}

impl Default for WootheeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentParser for WootheeParser {
    fn parse(&self, user_agent: &str) -> UserAgentInfo {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return UserAgentInfo::default();
        }

        match self.parser.parse(user_agent) {
            Some(result) => {
                let fallback = UserAgentInfo::default();
                UserAgentInfo {
                    browser: known(&result.name).unwrap_or(fallback.browser),
                    browser_version: known(&result.version).unwrap_or_default(),
                    os: known(&result.os).unwrap_or(fallback.os),
                    os_version: known(&result.os_version).unwrap_or_default(),
                    device: known(&result.category).unwrap_or(fallback.device),
                }
            }
            None => UserAgentInfo::default(),
        }
    }
}

const UNKNOWN: &str = "UNKNOWN";

/// woothee reports missing fields as "UNKNOWN".
fn known(value: &str) -> Option<String> {
    (!value.is_empty() && value != UNKNOWN).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_desktop_browser() {
        let info = WootheeParser::new().parse(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        );

        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.device, "pc");
    }

    #[test]
    fn unparseable_agents_fall_back_to_unknown() {
        let info = WootheeParser::new().parse("");
        assert_eq!(info, UserAgentInfo::default());
    }
}
