//! Multi-token rate limit pool
//!
//! Tracks a cached health snapshot per access token and picks the least
//! exhausted token for the next call. Selection is best-effort: when every
//! token is near exhaustion the pool blocks the caller for one coarse
//! cooldown interval, then answers with whatever the cache says. Exhaustion
//! is cleared only by an explicit refresh, never by elapsed time alone.
//!
//! The pool does no internal locking. Behind concurrent callers, mutation
//! (`refresh_all`, `update_health`) must be synchronized externally.

use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use tracing::{debug, info, warn};

use crate::client::api::GraphQlTransport;
use crate::client::config::ClientConfig;
use crate::client::error::{ClientError, Result};
use crate::domain::TokenHealth;

/// Blocking wait capability, injectable so the one-hour cooldown can be
/// observed in tests without a literal one-hour test.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper: parks the calling thread.
#[derive(Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone)]
struct TokenEntry {
    label: CompactString,
    token: String,
    health: TokenHealth,
}

/// Pool of probed tokens with cached rate-limit health.
pub struct TokenPool {
    entries: Vec<TokenEntry>,
    low_quota_threshold: u32,
    cooldown: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl TokenPool {
    /// Probe every `(label, token)` candidate and seed the pool with the
    /// survivors. Candidates whose probe fails (invalid or revoked tokens)
    /// are dropped with a warning; they are never retried.
    pub fn initialize(
        pairs: &[(&str, &str)],
        api: &impl GraphQlTransport,
        config: &ClientConfig,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(pairs.len());

        for (label, token) in pairs {
            match api.probe(token) {
                Ok(health) => {
                    debug!(
                        label = %label,
                        login = ?health.login,
                        remaining = health.remaining,
                        "Token probe succeeded"
                    );
                    entries.push(TokenEntry {
                        label: (*label).into(),
                        token: (*token).to_string(),
                        health,
                    });
                },
                Err(e) => {
                    warn!(label = %label, error = %e, "Dropping token: health probe failed");
                },
            }
        }

        if entries.is_empty() {
            return Err(ClientError::NoUsableTokens);
        }

        info!(
            tracked = entries.len(),
            dropped = pairs.len() - entries.len(),
            "Token pool initialized"
        );

        Ok(Self {
            entries,
            low_quota_threshold: config.low_quota_threshold,
            cooldown: config.cooldown,
            sleeper: Arc::new(ThreadSleeper),
        })
    }

    /// Replace the blocking wait implementation.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Re-probe every tracked token, overwriting cached health. When a
    /// re-probe fails the prior snapshot is kept: remote unavailability is
    /// usually transient, and a stale view beats an empty pool.
    pub fn refresh_all(&mut self, api: &impl GraphQlTransport) {
        for entry in &mut self.entries {
            match api.probe(&entry.token) {
                Ok(health) => {
                    debug!(label = %entry.label, remaining = health.remaining, "Token health refreshed");
                    entry.health = health;
                },
                Err(e) => {
                    warn!(label = %entry.label, error = %e, "Health refresh failed; keeping cached state");
                },
            }
        }
    }

    /// Token with the maximum cached remaining quota.
    ///
    /// If even the best token is below the low-quota threshold, block for
    /// one cooldown interval, recompute, and return the new maximum
    /// regardless of whether it improved. One wait, one re-check, no loop.
    pub fn best_single(&self) -> Option<&str> {
        let mut best = self.best_index()?;

        if self.entries[best].health.remaining < self.low_quota_threshold {
            warn!(
                label = %self.entries[best].label,
                remaining = self.entries[best].health.remaining,
                cooldown_secs = self.cooldown.as_secs(),
                "All tokens near exhaustion; cooling down"
            );
            self.sleeper.sleep(self.cooldown);
            best = self.best_index()?;
        }

        Some(self.entries[best].token.as_str())
    }

    /// Exactly `n` tokens ranked by remaining quota, for callers fanning out
    /// to external workers.
    ///
    /// Only tokens strictly above the threshold are eligible. A scarce pool
    /// is cycled so the same token serves several workers rather than
    /// failing the request; an empty eligible set triggers one cooldown wait
    /// and then yields whatever the cycle of the (still empty) set gives.
    pub fn best_n(&self, n: usize) -> Vec<String> {
        let mut eligible = self.eligible();

        if eligible.is_empty() {
            warn!(
                cooldown_secs = self.cooldown.as_secs(),
                "No token above the low-quota threshold; cooling down"
            );
            self.sleeper.sleep(self.cooldown);
            eligible = self.eligible();
        }

        // Cycling an empty set is empty, so the post-wait case falls out.
        eligible.iter().cycle().take(n).map(|t| t.to_string()).collect()
    }

    /// Overwrite the cached health for `token`, typically from the
    /// `rateLimit` block of a data response. Unknown tokens (explicit
    /// caller-supplied ones the pool never tracked) are ignored.
    pub fn update_health(&mut self, token: &str, health: TokenHealth) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.token == token) {
            debug!(label = %entry.label, remaining = health.remaining, "Token health updated");
            entry.health = health;
        }
    }

    /// Cached `(label, health)` snapshot per tracked token.
    pub fn statuses(&self) -> impl Iterator<Item = (&str, &TokenHealth)> {
        self.entries.iter().map(|e| (e.label.as_str(), &e.health))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn best_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| e.health.remaining)
            .map(|(i, _)| i)
    }

    /// Tokens strictly above the threshold, highest remaining quota first.
    fn eligible(&self) -> Vec<&str> {
        let mut ranked: Vec<&TokenEntry> = self
            .entries
            .iter()
            .filter(|e| e.health.remaining > self.low_quota_threshold)
            .collect();
        ranked.sort_by(|a, b| b.health.remaining.cmp(&a.health.remaining));
        ranked.into_iter().map(|e| e.token.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::Value;

    use super::*;

    /// Probe-only transport: maps token -> health, `None` meaning the probe
    /// fails for that token.
    struct FakeProbe {
        healths: HashMap<String, Option<TokenHealth>>,
    }

    impl FakeProbe {
        fn new(healths: &[(&str, Option<u32>)]) -> Self {
            Self {
                healths: healths
                    .iter()
                    .map(|(token, remaining)| {
                        ((*token).to_string(), remaining.map(health_with_remaining))
                    })
                    .collect(),
            }
        }
    }

    impl GraphQlTransport for FakeProbe {
        fn send(&self, _query: &str, _variables: Value, _token: &str) -> Result<Value> {
            panic!("the pool must only probe, never issue data queries");
        }

        fn probe(&self, token: &str) -> Result<TokenHealth> {
            match self.healths.get(token) {
                Some(Some(health)) => Ok(health.clone()),
                _ => Err(ClientError::graphql("Bad credentials")),
            }
        }
    }

    #[derive(Default)]
    struct CountingSleeper {
        count: AtomicUsize,
    }

    impl Sleeper for CountingSleeper {
        fn sleep(&self, _duration: Duration) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn health_with_remaining(remaining: u32) -> TokenHealth {
        TokenHealth {
            login: Some("user".into()),
            limit: 5000,
            cost: 1,
            remaining,
            reset_at: None,
        }
    }

    fn pool_with(remaining: &[u32]) -> (TokenPool, Arc<CountingSleeper>) {
        let tokens: Vec<String> = (0..remaining.len()).map(|i| format!("tok{i}")).collect();
        let labels: Vec<String> = (0..remaining.len()).map(|i| format!("key{i}")).collect();
        let pairs: Vec<(&str, &str)> = labels
            .iter()
            .zip(&tokens)
            .map(|(l, t)| (l.as_str(), t.as_str()))
            .collect();
        let scripted: Vec<(&str, Option<u32>)> = tokens
            .iter()
            .zip(remaining)
            .map(|(t, r)| (t.as_str(), Some(*r)))
            .collect();

        let sleeper = Arc::new(CountingSleeper::default());
        let pool = TokenPool::initialize(
            &pairs,
            &FakeProbe::new(&scripted),
            &ClientConfig::default(),
        )
        .unwrap()
        .with_sleeper(sleeper.clone());

        (pool, sleeper)
    }

    #[test]
    fn initialize_drops_tokens_that_fail_their_probe() {
        let api = FakeProbe::new(&[("good", Some(4000)), ("revoked", None)]);
        let pool = TokenPool::initialize(
            &[("primary", "good"), ("old", "revoked")],
            &api,
            &ClientConfig::default(),
        )
        .unwrap();

        assert_eq!(pool.len(), 1);
        let (label, health) = pool.statuses().next().unwrap();
        assert_eq!(label, "primary");
        assert_eq!(health.remaining, 4000);
    }

    #[test]
    fn initialize_fails_when_every_probe_fails() {
        let api = FakeProbe::new(&[("a", None), ("b", None)]);
        let result = TokenPool::initialize(&[("x", "a"), ("y", "b")], &api, &ClientConfig::default());
        assert!(matches!(result, Err(ClientError::NoUsableTokens)));
    }

    #[test]
    fn best_single_picks_max_remaining_without_waiting() {
        let (pool, sleeper) = pool_with(&[5, 3, 50]);

        assert_eq!(pool.best_single(), Some("tok2"));
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn best_single_waits_exactly_once_when_all_tokens_are_low() {
        let (pool, sleeper) = pool_with(&[5, 3, 8]);

        // Post-wait maximum is returned even though nothing improved.
        assert_eq!(pool.best_single(), Some("tok2"));
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn best_n_cycles_a_scarce_pool() {
        let (pool, sleeper) = pool_with(&[5, 20, 3]);

        let batch = pool.best_n(3);
        assert_eq!(batch, ["tok1", "tok1", "tok1"]);
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn best_n_ranks_and_truncates_to_exactly_n() {
        let (pool, _) = pool_with(&[100, 50, 30, 20]);

        let batch = pool.best_n(2);
        assert_eq!(batch, ["tok0", "tok1"]);
    }

    #[test]
    fn best_n_with_zero_eligible_waits_once_and_returns_empty() {
        let (pool, sleeper) = pool_with(&[5, 3, 8]);

        let batch = pool.best_n(3);
        assert!(batch.is_empty());
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn threshold_is_strictly_above_for_best_n() {
        // Exactly at the threshold (10) is not eligible.
        let (pool, sleeper) = pool_with(&[10, 11]);

        let batch = pool.best_n(2);
        assert_eq!(batch, ["tok1", "tok1"]);
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refresh_overwrites_health_but_keeps_stale_state_on_failure() {
        let (mut pool, _) = pool_with(&[40, 60]);

        // tok0 renews, tok1's re-probe fails.
        let refreshed = FakeProbe::new(&[("tok0", Some(5000)), ("tok1", None)]);
        pool.refresh_all(&refreshed);

        let snapshot: HashMap<&str, u32> =
            pool.statuses().map(|(l, h)| (l, h.remaining)).collect();
        assert_eq!(snapshot["key0"], 5000);
        assert_eq!(snapshot["key1"], 60);
    }

    #[test]
    fn update_health_overwrites_tracked_tokens_and_ignores_strangers() {
        let (mut pool, _) = pool_with(&[40]);

        pool.update_health("tok0", health_with_remaining(7));
        assert_eq!(pool.statuses().next().unwrap().1.remaining, 7);

        pool.update_health("not-tracked", health_with_remaining(9000));
        assert_eq!(pool.len(), 1);
    }
}
