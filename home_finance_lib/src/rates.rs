use std::cell::RefCell;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::money::Rate;

/// Inflation assumed when no live figure can be obtained.
pub fn fallback_inflation() -> Rate {
    Rate::from_float(2.5)
}

/// A source of the current annual inflation figure. Implementations may go
/// to the network, which is why fetching can fail.
pub trait RateProvider {
    fn fetch_rate(&self) -> Result<Rate>;
}

/// A provider pinned to a fixed rate, for tests and offline scenarios.
pub struct StaticRateProvider(pub Rate);

impl RateProvider for StaticRateProvider {
    fn fetch_rate(&self) -> Result<Rate> {
        Ok(self.0)
    }
}

/// Caches a provider's last good answer for a TTL and falls back to the
/// default figure when the provider fails.
pub struct CachedRateProvider<P> {
    inner: P,
    ttl: Duration,
    cached: RefCell<Option<(Instant, Rate)>>,
}

impl<P: RateProvider> CachedRateProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RefCell::new(None),
        }
    }

    /// The current rate: cached if fresh, refetched otherwise, the
    /// fallback if the fetch fails. Failures are not cached so the next
    /// call retries.
    pub fn current_rate(&self) -> Rate {
        if let Some((at, rate)) = *self.cached.borrow() {
            if at.elapsed() < self.ttl {
                return rate;
            }
        }
        match self.inner.fetch_rate() {
            Ok(rate) => {
                *self.cached.borrow_mut() = Some((Instant::now(), rate));
                rate
            }
            Err(e) => {
                log::warn!(
                    "Falling back to {} inflation, rate fetch failed: {:#}",
                    fallback_inflation(),
                    e
                );
                fallback_inflation()
            }
        }
    }
}

impl<P: RateProvider> RateProvider for CachedRateProvider<P> {
    fn fetch_rate(&self) -> Result<Rate> {
        Ok(self.current_rate())
    }
}
