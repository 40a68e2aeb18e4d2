use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

/// Sliding-window limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock();
        let hits = windows.entry(client.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            let retry_after = hits
                .front()
                .map(|first| self.window.saturating_sub(now.duration_since(*first)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        hits.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - hits.len(),
        }
    }
}
