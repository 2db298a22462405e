use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{RuleMode, SecurityConfig};

use super::{
    limiter::SlidingWindowLimiter,
    rules::{BotRule, ShieldRule, SlidingWindowRule},
    Decision, DenyReason, RequestFingerprint, Tier,
};

/// Decision service consulted once per request.
#[async_trait]
pub trait SecurityClient: Send + Sync {
    async fn protect(&self, request: &RequestFingerprint, tier: Tier) -> anyhow::Result<Decision>;

    /// Maintenance hook; returns the number of entries dropped.
    async fn cleanup_expired(&self) -> anyhow::Result<u64>;
}

/// In-process decision service: bot rule, shield rule, burst window, then the tier window.
#[derive(Debug)]
pub struct LocalSecurityClient {
    config: SecurityConfig,
    bots: BotRule,
    shield: ShieldRule,
    limiter: SlidingWindowLimiter,
}

impl LocalSecurityClient {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            bots: BotRule::new(config.bot_mode),
            shield: ShieldRule::new(config.shield_mode),
            limiter: SlidingWindowLimiter::new(),
            config,
        }
    }

    pub fn tier_rule(&self, tier: Tier) -> SlidingWindowRule {
        SlidingWindowRule::new(
            format!("{}-rate-limit", tier.as_str()),
            self.config.tier_limits.for_tier(tier),
            self.config.window,
        )
    }

    fn burst_rule(&self) -> Option<SlidingWindowRule> {
        self.config
            .burst
            .map(|limit| SlidingWindowRule::from_limit("burst", limit))
    }

    pub fn decide(
        &self,
        request: &RequestFingerprint,
        tier: Tier,
        now: Instant,
    ) -> anyhow::Result<Decision> {
        if self.bots.is_bot(request) {
            match self.bots.mode {
                RuleMode::Live => return Ok(Decision::Deny(DenyReason::Bot)),
                RuleMode::DryRun => debug!(
                    client = %request.client,
                    user_agent = ?request.user_agent,
                    "bot detected (dry run)"
                ),
            }
        }

        if self.shield.matches(request) {
            match self.shield.mode {
                RuleMode::Live => return Ok(Decision::Deny(DenyReason::Shield)),
                RuleMode::DryRun => warn!(target = %request.target, "shield match (dry run)"),
            }
        }

        let rules = self.burst_rule().into_iter().chain([self.tier_rule(tier)]);
        for rule in rules {
            if !self.limiter.check(&rule.key(&request.client), &rule, now)? {
                debug!(rule = %rule.name, max = rule.max, client = %request.client, "window exhausted");
                return Ok(Decision::Deny(DenyReason::RateLimit));
            }
        }

        Ok(Decision::Allow)
    }
}

#[async_trait]
impl SecurityClient for LocalSecurityClient {
    async fn protect(&self, request: &RequestFingerprint, tier: Tier) -> anyhow::Result<Decision> {
        self.decide(request, tier, Instant::now())
    }

    async fn cleanup_expired(&self) -> anyhow::Result<u64> {
        self.limiter.cleanup_expired(Instant::now())
    }
}
