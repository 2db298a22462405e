use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub secure: bool,
}

/// Argon2 work factor.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    Live,
    DryRun,
}

impl RuleMode {
    fn parse(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "live" => Some(Self::Live),
            "dry_run" | "dry-run" | "dryrun" => Some(Self::DryRun),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowLimit {
    pub max: u32,
    pub interval: Duration,
}

/// Per-tier request quotas, indexed by [`crate::security::Tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TierLimits {
    pub guest: u32,
    pub user: u32,
    pub admin: u32,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            guest: 5,
            user: 10,
            admin: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub bot_mode: RuleMode,
    pub shield_mode: RuleMode,
    /// Key callers on `X-Forwarded-For` instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
    pub tier_limits: TierLimits,
    pub window: Duration,
    pub burst: Option<WindowLimit>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bot_mode: RuleMode::DryRun,
            shield_mode: RuleMode::Live,
            trust_proxy: false,
            tier_limits: TierLimits::default(),
            window: Duration::from_secs(60),
            burst: Some(WindowLimit {
                max: 5,
                interval: Duration::from_secs(2),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub password: PasswordConfig,
    pub security: SecurityConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "acquisitions".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "acquisitions-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60 * 24),
        };

        let password = PasswordConfig {
            memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", argon2::Params::DEFAULT_M_COST),
            iterations: env_or("PASSWORD_HASH_ITERATIONS", argon2::Params::DEFAULT_T_COST),
        };

        let defaults = TierLimits::default();
        let burst_max: u32 = env_or("RATE_LIMIT_BURST", 5);
        let security = SecurityConfig {
            bot_mode: std::env::var("SECURITY_BOT_MODE")
                .ok()
                .and_then(|v| RuleMode::parse(&v))
                .unwrap_or(RuleMode::DryRun),
            shield_mode: std::env::var("SECURITY_SHIELD_MODE")
                .ok()
                .and_then(|v| RuleMode::parse(&v))
                .unwrap_or(RuleMode::Live),
            trust_proxy: env_or("TRUST_PROXY", false),
            tier_limits: TierLimits {
                guest: env_or("RATE_LIMIT_GUEST", defaults.guest),
                user: env_or("RATE_LIMIT_USER", defaults.user),
                admin: env_or("RATE_LIMIT_ADMIN", defaults.admin),
            },
            window: Duration::from_secs(env_or("RATE_LIMIT_WINDOW_SECS", 60)),
            burst: (burst_max > 0).then(|| WindowLimit {
                max: burst_max,
                interval: Duration::from_secs(env_or("RATE_LIMIT_BURST_WINDOW_SECS", 2)),
            }),
        };

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            cookie: CookieConfig {
                secure: env_or("COOKIE_SECURE", production),
            },
            password,
            security,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_mode_accepts_common_spellings() {
        assert_eq!(RuleMode::parse("LIVE"), Some(RuleMode::Live));
        assert_eq!(RuleMode::parse("dry_run"), Some(RuleMode::DryRun));
        assert_eq!(RuleMode::parse("dry-run"), Some(RuleMode::DryRun));
        assert_eq!(RuleMode::parse("enforce"), None);
    }

    #[test]
    fn security_defaults_match_tier_table() {
        let cfg = SecurityConfig::default();
        assert_eq!(cfg.tier_limits, TierLimits { guest: 5, user: 10, admin: 20 });
        assert_eq!(cfg.window, Duration::from_secs(60));
        assert_eq!(cfg.bot_mode, RuleMode::DryRun);
        assert_eq!(cfg.shield_mode, RuleMode::Live);
        assert!(!cfg.trust_proxy);
        assert_eq!(cfg.burst.map(|b| b.max), Some(5));
    }
}
