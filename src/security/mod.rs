//! Bot detection, shield policy and per-tier rate limiting, consulted on
//! every request before authentication.

mod client;
mod limiter;
mod middleware;
mod rules;

pub use client::{LocalSecurityClient, SecurityClient};
pub use limiter::SlidingWindowLimiter;
pub use middleware::protect;
pub use rules::{BotRule, ShieldRule, SlidingWindowRule};

use crate::{config::TierLimits, users::repo_types::Role};

/// Rate-limit bucket derived from the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Guest,
    User,
    Admin,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Guest, Tier::User, Tier::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Guest => "guest",
            Tier::User => "user",
            Tier::Admin => "admin",
        }
    }
}

impl From<Option<Role>> for Tier {
    fn from(role: Option<Role>) -> Self {
        match role {
            None => Tier::Guest,
            Some(Role::User) => Tier::User,
            Some(Role::Admin) => Tier::Admin,
        }
    }
}

impl TierLimits {
    pub fn for_tier(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Guest => self.guest,
            Tier::User => self.user,
            Tier::Admin => self.admin,
        }
    }
}

/// What the security client saw of the request.
#[derive(Debug, Clone)]
pub struct RequestFingerprint {
    pub client: String,
    pub user_agent: Option<String>,
    pub method: String,
    /// Path plus query string.
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Bot,
    Shield,
    RateLimit,
}

impl DenyReason {
    pub fn message(self) -> &'static str {
        match self {
            DenyReason::Bot => "Automated requests are not allowed",
            DenyReason::Shield => "Requests blocked by policy",
            DenyReason::RateLimit => "Rate limit exceeded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}
