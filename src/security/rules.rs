use std::time::Duration;

use crate::config::{RuleMode, WindowLimit};

use super::RequestFingerprint;

/// Request signatures that are always refused.
const SHIELD_SIGNATURES: &[&str] = &[
    "../",
    "..\\",
    "%2e%2e",
    "/etc/passwd",
    "/proc/self",
    "<script",
    "%3cscript",
    "javascript:",
    "union select",
    "union%20select",
    "union+select",
    "' or '1'='1",
    "%27%20or%20%271%27%3d%271",
    "sleep(",
    "xp_cmdshell",
    "${jndi:",
    "%24%7bjndi",
];

#[derive(Debug, Clone)]
pub struct ShieldRule {
    pub mode: RuleMode,
}

impl ShieldRule {
    pub fn new(mode: RuleMode) -> Self {
        Self { mode }
    }

    pub fn matches(&self, request: &RequestFingerprint) -> bool {
        let target = request.target.to_ascii_lowercase();
        SHIELD_SIGNATURES.iter().any(|sig| target.contains(sig))
    }
}

/// Automation clients that identify themselves in `User-Agent`.
const AUTOMATION_AGENTS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scrapy",
    "curl/",
    "wget/",
    "python-requests",
    "python-urllib",
    "aiohttp",
    "go-http-client",
    "java/",
    "okhttp",
    "libwww-perl",
    "headlesschrome",
    "phantomjs",
];

const SEARCH_ENGINES: &[&str] = &[
    "googlebot",
    "bingbot",
    "duckduckbot",
    "yandexbot",
    "baiduspider",
    "applebot",
];

const PREVIEWERS: &[&str] = &[
    "slackbot",
    "twitterbot",
    "facebookexternalhit",
    "discordbot",
    "linkedinbot",
    "telegrambot",
    "whatsapp",
];

#[derive(Debug, Clone)]
pub struct BotRule {
    pub mode: RuleMode,
    pub allow: Vec<&'static str>,
}

impl BotRule {
    /// Search engines, link previewers and HTTPie are let through.
    pub fn new(mode: RuleMode) -> Self {
        let mut allow = Vec::new();
        allow.extend_from_slice(SEARCH_ENGINES);
        allow.extend_from_slice(PREVIEWERS);
        allow.push("httpie");
        Self { mode, allow }
    }

    pub fn is_bot(&self, request: &RequestFingerprint) -> bool {
        let Some(ua) = request.user_agent.as_deref().map(str::to_ascii_lowercase) else {
            return true;
        };
        if ua.trim().is_empty() {
            return true;
        }
        if self.allow.iter().any(|a| ua.contains(a)) {
            return false;
        }
        AUTOMATION_AGENTS.iter().any(|a| ua.contains(a))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowRule {
    pub name: String,
    pub max: u32,
    pub interval: Duration,
}

impl SlidingWindowRule {
    pub fn new(name: impl Into<String>, max: u32, interval: Duration) -> Self {
        Self {
            name: name.into(),
            max,
            interval,
        }
    }

    pub fn from_limit(name: impl Into<String>, limit: WindowLimit) -> Self {
        Self::new(name, limit.max, limit.interval)
    }

    pub fn key(&self, client: &str) -> String {
        format!("{}:{}", self.name, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(target: &str, ua: Option<&str>) -> RequestFingerprint {
        RequestFingerprint {
            client: "127.0.0.1".into(),
            user_agent: ua.map(Into::into),
            method: "GET".into(),
            target: target.into(),
        }
    }

    #[test]
    fn shield_catches_traversal_and_injection() {
        let shield = ShieldRule::new(RuleMode::Live);
        assert!(shield.matches(&req("/api?file=../../etc/passwd", None)));
        assert!(shield.matches(&req("/api/users?q=1%27%20OR%20%271%27%3D%271", None)));
        assert!(shield.matches(&req("/search?q=UNION+SELECT+password", None)));
        assert!(!shield.matches(&req("/api/users/5b0c6a7e", None)));
    }

    #[test]
    fn bot_rule_flags_automation_and_allows_listed() {
        let bots = BotRule::new(RuleMode::Live);
        assert!(bots.is_bot(&req("/", None)));
        assert!(bots.is_bot(&req("/", Some("curl/8.4.0"))));
        assert!(bots.is_bot(&req("/", Some("python-requests/2.31"))));
        assert!(!bots.is_bot(&req("/", Some("HTTPie/3.2.2"))));
        assert!(!bots.is_bot(&req(
            "/",
            Some("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)")
        )));
        assert!(!bots.is_bot(&req(
            "/",
            Some("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36")
        )));
    }

    #[test]
    fn allow_list_and_automation_list_are_disjoint() {
        let bots = BotRule::new(RuleMode::Live);
        for agent in AUTOMATION_AGENTS {
            assert!(!bots.allow.contains(agent), "{agent} is both allowed and flagged");
        }
    }

    #[test]
    fn window_keys_are_scoped_by_rule() {
        let rule = SlidingWindowRule::new("guest-rate-limit", 5, Duration::from_secs(60));
        assert_eq!(rule.key("10.0.0.1"), "guest-rate-limit:10.0.0.1");
    }
}
