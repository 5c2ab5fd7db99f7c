// ── Paw Voice Engine: HTTP Retry & Circuit Breaker ─────────────────────────
//
// Used by the streaming backend when opening a generation request.
//
//   • Exponential backoff with ±25% jitter (base 500ms, max 8s, 2 retries)
//   • Retry on 429 (rate limit), 500, 502, 503, 504
//   • Respects integer `Retry-After` headers
//   • Circuit breaker: 5 consecutive failures → fail fast for 60s
//
// Retry delays are short: every attempt spends the turn's generation timeout.

use crate::atoms::error::{EngineError, EngineResult};
use log::warn;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

// ── Constants ──────────────────────────────────────────────────────────────

/// Maximum retry attempts after the first request.
pub const MAX_RETRIES: u32 = 2;

const INITIAL_RETRY_DELAY_MS: u64 = 500;
const MAX_RETRY_DELAY_MS: u64 = 8_000;

pub const CIRCUIT_THRESHOLD: u32 = 5;
pub const CIRCUIT_COOLDOWN_SECS: u64 = 60;

// ── Retryable status detection ─────────────────────────────────────────────

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

// ── Backoff delay ──────────────────────────────────────────────────────────

/// Backoff for a 0-based attempt, before jitter. A server `Retry-After` can
/// lengthen the wait (capped at the max) but never shorten it.
pub fn backoff_ms(attempt: u32, retry_after_secs: Option<u64>) -> u64 {
    let base_ms = INITIAL_RETRY_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
    let capped_ms = base_ms.min(MAX_RETRY_DELAY_MS);
    match retry_after_secs {
        Some(secs) => (secs.saturating_mul(1000)).min(MAX_RETRY_DELAY_MS).max(capped_ms),
        None => capped_ms,
    }
}

/// Sleep with exponential backoff + jitter. Returns the delay for logging.
pub async fn retry_delay(attempt: u32, retry_after_secs: Option<u64>) -> Duration {
    let delay = Duration::from_millis(apply_jitter(backoff_ms(attempt, retry_after_secs)));
    tokio::time::sleep(delay).await;
    delay
}

fn apply_jitter(base_ms: u64) -> u64 {
    let jitter_range = (base_ms / 4) as i64;
    if jitter_range == 0 {
        return base_ms.max(50);
    }
    let offset = (rand_jitter() % (2 * jitter_range + 1)) - jitter_range;
    (base_ms as i64 + offset).max(50) as u64
}

/// Clock nanos as a cheap jitter source.
fn rand_jitter() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as i64
}

/// Integer seconds only; HTTP-date values fall back to computed backoff.
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    header_value.trim().parse::<u64>().ok()
}

// ── Circuit Breaker ────────────────────────────────────────────────────────

/// Trips after `threshold` consecutive failures, then rejects requests until
/// `cooldown_secs` have passed. After the cool-down one probe is let through;
/// its outcome either closes the circuit or re-arms the cool-down.
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    /// Epoch seconds when the circuit last tripped.
    tripped_at: AtomicU64,
    threshold: u32,
    cooldown_secs: u64,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CIRCUIT_THRESHOLD, CIRCUIT_COOLDOWN_SECS)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl CircuitBreaker {
    pub const fn new(threshold: u32, cooldown_secs: u64) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            tripped_at: AtomicU64::new(0),
            threshold,
            cooldown_secs,
        }
    }

    /// `Ok` when a request may go out, a Backend error while the circuit is open.
    pub fn check(&self, backend: &str) -> EngineResult<()> {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        if failures < self.threshold {
            return Ok(());
        }
        let elapsed = now_secs().saturating_sub(self.tripped_at.load(Ordering::Relaxed));
        if elapsed < self.cooldown_secs {
            Err(EngineError::backend(
                backend,
                format!(
                    "circuit open after {} consecutive failures, retry in {}s",
                    failures,
                    self.cooldown_secs - elapsed
                ),
            ))
        } else {
            Ok(())
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.tripped_at.store(0, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        let prev = self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        if prev + 1 >= self.threshold {
            self.tripped_at.store(now_secs(), Ordering::Relaxed);
            warn!(
                "[circuit-breaker] Tripped after {} consecutive failures, cooling down {}s",
                prev + 1,
                self.cooldown_secs
            );
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}
