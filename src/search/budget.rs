//! Search budgets and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared stop flag, polled between plies and playouts.
///
/// Clones share the flag, so a controller can keep one half and hand the
/// other to a running search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag before the next decision.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// How much work one decision may spend.
///
/// Either limit may be absent; with both absent the search runs to its own
/// natural end (fixed depth, or the MCTS pool filling up).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Wall-clock limit in milliseconds.
    pub time_ms: Option<u64>,
    /// Node (alpha-beta) or playout (MCTS) limit.
    pub nodes: Option<u64>,
}

impl Budget {
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            time_ms: None,
            nodes: None,
        }
    }

    #[must_use]
    pub const fn time(ms: u64) -> Self {
        Self {
            time_ms: Some(ms),
            nodes: None,
        }
    }

    #[must_use]
    pub const fn nodes(n: u64) -> Self {
        Self {
            time_ms: None,
            nodes: Some(n),
        }
    }

    #[must_use]
    pub const fn with_time(mut self, ms: u64) -> Self {
        self.time_ms = Some(ms);
        self
    }

    #[must_use]
    pub const fn with_nodes(mut self, n: u64) -> Self {
        self.nodes = Some(n);
        self
    }

    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.time_ms.is_none() && self.nodes.is_none()
    }

    /// Start the clock.
    #[must_use]
    pub fn start(&self, cancel: &CancelToken) -> Limits {
        let started = Instant::now();
        Limits {
            started,
            deadline: self.time_ms.map(|ms| started + Duration::from_millis(ms)),
            nodes: self.nodes,
            cancel: cancel.clone(),
        }
    }
}

/// A running budget.
#[derive(Clone, Debug)]
pub struct Limits {
    started: Instant,
    deadline: Option<Instant>,
    nodes: Option<u64>,
    cancel: CancelToken,
}

impl Limits {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fraction of the budget used so far, in `[0, 1]`.
    ///
    /// With both a time and a node limit the larger fraction wins. With no
    /// limit at all this is always zero.
    #[must_use]
    pub fn part_done(&self, nodes: u64) -> f64 {
        let by_time = self.deadline.map(|d| {
            let total = d.saturating_duration_since(self.started).as_secs_f64();
            if total <= 0.0 {
                1.0
            } else {
                self.elapsed().as_secs_f64() / total
            }
        });
        let by_nodes = self.nodes.map(|n| if n == 0 { 1.0 } else { nodes as f64 / n as f64 });

        match (by_time, by_nodes) {
            (Some(t), Some(n)) => t.max(n),
            (Some(t), None) => t,
            (None, Some(n)) => n,
            (None, None) => 0.0,
        }
        .clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn past_deadline(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    #[must_use]
    pub fn nodes_exhausted(&self, nodes: u64) -> bool {
        self.nodes.is_some_and(|n| nodes >= n)
    }

    #[must_use]
    pub fn node_limit(&self) -> Option<u64> {
        self.nodes
    }

    /// No time and no node limit.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.deadline.is_none() && self.nodes.is_none()
    }

    /// Any reason to stop now.
    #[must_use]
    pub fn should_stop(&self, nodes: u64) -> bool {
        self.is_cancelled() || self.nodes_exhausted(nodes) || self.past_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        token.cancel();
        assert!(other.is_cancelled());

        other.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_node_budget() {
        let limits = Budget::nodes(100).start(&CancelToken::new());
        assert!(!limits.should_stop(99));
        assert!(limits.should_stop(100));
        assert!((limits.part_done(25) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_unlimited_budget() {
        let budget = Budget::unlimited();
        assert!(budget.is_unlimited());
        let limits = budget.start(&CancelToken::new());
        assert!(!limits.should_stop(u64::MAX));
        assert_eq!(limits.part_done(1_000), 0.0);
    }

    #[test]
    fn test_zero_time_budget_is_past_deadline() {
        let limits = Budget::time(0).start(&CancelToken::new());
        assert!(limits.past_deadline());
        assert_eq!(limits.part_done(0), 1.0);
    }

    #[test]
    fn test_cancel_stops_limits() {
        let token = CancelToken::new();
        let limits = Budget::unlimited().start(&token);
        token.cancel();
        assert!(limits.should_stop(0));
    }

    #[test]
    fn test_budget_serialization() {
        let budget = Budget::time(250).with_nodes(10_000);
        let text = toml::to_string(&budget).unwrap();
        let back: Budget = toml::from_str(&text).unwrap();
        assert_eq!(back, budget);
    }
}
