use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, Instant},
};

use super::rules::SlidingWindowRule;

/// Sliding window log: one timestamp per admitted request, per key.
#[derive(Debug, Default)]
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug)]
struct Window {
    hits: VecDeque<Instant>,
    interval: Duration,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits and records the request if the key is under its limit.
    pub fn check(&self, key: &str, rule: &SlidingWindowRule, now: Instant) -> anyhow::Result<bool> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| anyhow::anyhow!("rate limiter state poisoned"))?;
        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            hits: VecDeque::new(),
            interval: rule.interval,
        });
        window.interval = rule.interval;
        prune(&mut window.hits, rule.interval, now);

        if window.hits.len() as u32 >= rule.max {
            return Ok(false);
        }
        window.hits.push_back(now);
        Ok(true)
    }

    /// Drops keys whose whole log has aged out. Returns the number removed.
    pub fn cleanup_expired(&self, now: Instant) -> anyhow::Result<u64> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| anyhow::anyhow!("rate limiter state poisoned"))?;
        let before = windows.len();
        windows.retain(|_, w| {
            prune(&mut w.hits, w.interval, now);
            !w.hits.is_empty()
        });
        Ok((before - windows.len()) as u64)
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

fn prune(hits: &mut VecDeque<Instant>, interval: Duration, now: Instant) {
    while let Some(&oldest) = hits.front() {
        if now.saturating_duration_since(oldest) >= interval {
            hits.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(max: u32, secs: u64) -> SlidingWindowRule {
        SlidingWindowRule::new("test", max, Duration::from_secs(secs))
    }

    #[test]
    fn admits_up_to_max_then_denies() {
        let limiter = SlidingWindowLimiter::new();
        let r = rule(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check("k", &r, now).unwrap());
        }
        assert!(!limiter.check("k", &r, now).unwrap());
        assert!(limiter.check("other", &r, now).unwrap());
    }

    #[test]
    fn window_slides_per_request() {
        let limiter = SlidingWindowLimiter::new();
        let r = rule(2, 60);
        let t0 = Instant::now();
        assert!(limiter.check("k", &r, t0).unwrap());
        assert!(limiter.check("k", &r, t0 + Duration::from_secs(30)).unwrap());
        assert!(!limiter.check("k", &r, t0 + Duration::from_secs(59)).unwrap());
        // first hit has aged out, second is still inside the window
        assert!(limiter.check("k", &r, t0 + Duration::from_secs(60)).unwrap());
        assert!(!limiter.check("k", &r, t0 + Duration::from_secs(61)).unwrap());
    }

    #[test]
    fn denied_requests_do_not_extend_the_window() {
        let limiter = SlidingWindowLimiter::new();
        let r = rule(1, 10);
        let t0 = Instant::now();
        assert!(limiter.check("k", &r, t0).unwrap());
        assert!(!limiter.check("k", &r, t0 + Duration::from_secs(5)).unwrap());
        assert!(limiter.check("k", &r, t0 + Duration::from_secs(10)).unwrap());
    }

    #[test]
    fn cleanup_drops_idle_keys() {
        let limiter = SlidingWindowLimiter::new();
        let t0 = Instant::now();
        limiter.check("short", &rule(5, 2), t0).unwrap();
        limiter.check("long", &rule(5, 60), t0).unwrap();
        assert_eq!(limiter.tracked_keys(), 2);
        let removed = limiter.cleanup_expired(t0 + Duration::from_secs(3)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
