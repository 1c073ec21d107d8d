#![deny(missing_docs)]
//! Quota enforcement and the circuit breaker it (and every other protected
//! call site) relies on.
//!
//! No single crate in the reference corpus implements either of these —
//! they're hand-built here in the same idiom the corpus uses elsewhere
//! (`thiserror` errors, `Arc<Mutex<..>>`/atomics for shared mutable state,
//! `async_trait` for the pluggable durable-store seam). See `DESIGN.md` for
//! the grounding note.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from quota and durable-store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum QuotaError {
    /// The durable/cache layer failed to answer.
    #[error("quota backend unavailable: {0}")]
    BackendUnavailable(String),
    /// The tenant has exhausted its quota.
    #[error("tenant '{tenant}' exceeded monthly limit of {limit}")]
    Exceeded {
        /// The tenant id.
        tenant: String,
        /// The configured monthly limit.
        limit: u64,
    },
}

/// One of the three layers a quota check may fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLayer {
    /// An in-process atomic counter, reset at process start.
    Local,
    /// A shared cache (e.g. Redis), consulted when the local layer can't
    /// answer confidently.
    Cache,
    /// The durable system of record.
    Durable,
}

/// A remote quota backend (cache or durable store). Implementations are
/// expected to be cheap to clone (e.g. an `Arc`-wrapped client).
#[async_trait]
pub trait QuotaBackend: Send + Sync {
    /// Return the tenant's usage so far this month, or an error if the
    /// backend could not be reached.
    async fn usage(&self, tenant_id: &str) -> Result<u64, QuotaError>;

    /// Record one unit of usage for the tenant.
    async fn increment(&self, tenant_id: &str) -> Result<(), QuotaError>;
}

/// Circuit breaker states per §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls are rejected immediately without attempting the wrapped call.
    Open,
    /// A bounded number of trial calls are let through to probe recovery.
    HalfOpen,
}

struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_calls_used: u32,
}

/// A three-state (Closed/Open/HalfOpen) failure-isolation wrapper around a
/// call site, shared by the Quota Enforcer's remote layers and any other
/// component that calls out to an unreliable dependency.
pub struct CircuitBreaker {
    inner: Mutex<CircuitInner>,
    failure_threshold: u32,
    reset_timeout: Duration,
    half_open_max_calls: u32,
}

impl CircuitBreaker {
    /// Construct a breaker starting `Closed`.
    pub fn new(failure_threshold: u32, reset_timeout: Duration, half_open_max_calls: u32) -> Self {
        Self {
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_calls_used: 0,
            }),
            failure_threshold,
            reset_timeout,
            half_open_max_calls,
        }
    }

    /// Current state, transitioning `Open -> HalfOpen` first if the reset
    /// timeout has elapsed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("circuit breaker poisoned");
        self.maybe_transition_to_half_open(&mut inner);
        inner.state
    }

    fn maybe_transition_to_half_open(&self, inner: &mut CircuitInner) {
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_calls_used = 0;
                }
            }
        }
    }

    /// Whether a call is currently allowed through.
    pub fn allow_call(&self) -> bool {
        let mut inner = self.inner.lock().expect("circuit breaker poisoned");
        self.maybe_transition_to_half_open(&mut inner);
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.half_open_calls_used < self.half_open_max_calls {
                    inner.half_open_calls_used += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call. In `HalfOpen`, closes the breaker.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker poisoned");
        inner.consecutive_failures = 0;
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
    }

    /// Record a failed call. Cancellation must never be recorded as a
    /// failure — callers are responsible for that distinction before
    /// calling this.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }
}

/// Per-tenant in-process counter, reset whenever the process restarts.
/// Consulted first; cheap, but not authoritative across instances.
#[derive(Default)]
pub struct LocalCounter {
    counts: Mutex<HashMap<String, AtomicU64>>,
}

impl LocalCounter {
    /// Construct an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current local count for a tenant.
    pub fn get(&self, tenant_id: &str) -> u64 {
        let counts = self.counts.lock().expect("local counter poisoned");
        counts.get(tenant_id).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    /// Increment and return the new local count for a tenant.
    pub fn increment(&self, tenant_id: &str) -> u64 {
        let mut counts = self.counts.lock().expect("local counter poisoned");
        let counter = counts.entry(tenant_id.to_string()).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// The three-layer quota enforcer: local counter first, then cache, then
/// durable store, each protected by its own circuit breaker. All three
/// layers failing is fail-open by design (an infra outage must not halt
/// the fleet); a definitive over-limit reading from any reachable layer
/// rejects.
pub struct QuotaEnforcer {
    local: LocalCounter,
    cache: Option<(Box<dyn QuotaBackend>, CircuitBreaker)>,
    durable: Option<(Box<dyn QuotaBackend>, CircuitBreaker)>,
    monthly_limit: u64,
    /// Counts requests that fell through every layer and were fail-open allowed.
    pub fail_open_count: AtomicU32,
}

impl QuotaEnforcer {
    /// Construct an enforcer with only the local layer (no cache/durable
    /// backend configured).
    pub fn local_only(monthly_limit: u64) -> Self {
        Self {
            local: LocalCounter::new(),
            cache: None,
            durable: None,
            monthly_limit,
            fail_open_count: AtomicU32::new(0),
        }
    }

    /// Attach a cache-layer backend, builder-style.
    pub fn with_cache(mut self, backend: Box<dyn QuotaBackend>, breaker: CircuitBreaker) -> Self {
        self.cache = Some((backend, breaker));
        self
    }

    /// Attach a durable-layer backend, builder-style.
    pub fn with_durable(mut self, backend: Box<dyn QuotaBackend>, breaker: CircuitBreaker) -> Self {
        self.durable = Some((backend, breaker));
        self
    }

    /// Check whether `tenant_id` may make one more request this month,
    /// and record the attempt against whichever layer answers.
    pub async fn check_and_record(&self, tenant_id: &str) -> Result<(), QuotaError> {
        let local_count = self.local.increment(tenant_id);
        if local_count > self.monthly_limit {
            // The local counter is only authoritative within this process;
            // still, a local-only deployment (no cache/durable layer) must
            // be able to enforce quota, so a definitive local overage
            // rejects too.
            if self.cache.is_none() && self.durable.is_none() {
                return Err(QuotaError::Exceeded { tenant: tenant_id.to_string(), limit: self.monthly_limit });
            }
        }

        if let Some((backend, breaker)) = &self.cache {
            if breaker.allow_call() {
                match backend.usage(tenant_id).await {
                    Ok(usage) => {
                        breaker.record_success();
                        if usage >= self.monthly_limit {
                            return Err(QuotaError::Exceeded { tenant: tenant_id.to_string(), limit: self.monthly_limit });
                        }
                        let _ = backend.increment(tenant_id).await;
                        return Ok(());
                    }
                    Err(_) => breaker.record_failure(),
                }
            }
        }

        if let Some((backend, breaker)) = &self.durable {
            if breaker.allow_call() {
                match backend.usage(tenant_id).await {
                    Ok(usage) => {
                        breaker.record_success();
                        if usage >= self.monthly_limit {
                            return Err(QuotaError::Exceeded { tenant: tenant_id.to_string(), limit: self.monthly_limit });
                        }
                        let _ = backend.increment(tenant_id).await;
                        return Ok(());
                    }
                    Err(_) => breaker.record_failure(),
                }
            }
        }

        // Every reachable layer failed (or none were configured beyond
        // local and the local count didn't definitively exceed limit).
        // Fail open.
        self.fail_open_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
