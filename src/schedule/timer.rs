use crate::config::PressurePolicy;
use std::time::{Duration, Instant};

/// One-shot liveness timer for queued jobs that no render pass picked up.
///
/// Once fired it stays quiet until [`FallbackTimer::disarm`] (called by every render pass), so a
/// stalled queue produces exactly one fallback pass per arming.
#[derive(Clone, Debug)]
pub struct FallbackTimer {
    timeout: Duration,
    deadline: Option<Instant>,
    fired: bool,
}

impl FallbackTimer {
    /// Create a disarmed timer.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
            fired: false,
        }
    }

    /// Start counting from `now` unless already armed or already fired.
    pub fn arm(&mut self, now: Instant) {
        if self.deadline.is_none() && !self.fired {
            self.deadline = Some(now + self.timeout);
        }
    }

    /// Stop the timer and allow it to be armed again.
    pub fn disarm(&mut self) {
        self.deadline = None;
        self.fired = false;
    }

    /// Return `true` when armed and not yet fired.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Return `true` exactly once, the first time `now` reaches the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                self.fired = true;
                true
            }
            _ => false,
        }
    }
}

/// Tracks whether Regular jobs arrive faster than passes drain them.
///
/// Counts are kept per window of `window` length. At the end of a window the scheduler enters
/// pressure mode when arrivals reached `min_arrivals` and exceeded what was drained.
#[derive(Clone, Debug)]
pub struct PressureTracker {
    policy: PressurePolicy,
    window: Duration,
    window_start: Option<Instant>,
    arrivals: usize,
    drained: usize,
    under_pressure: bool,
}

impl PressureTracker {
    /// Create a tracker with no history.
    pub fn new(policy: PressurePolicy, window: Duration) -> Self {
        Self {
            policy,
            window,
            window_start: None,
            arrivals: 0,
            drained: 0,
            under_pressure: false,
        }
    }

    /// Regular jobs painted per pass outside pressure mode.
    pub fn batch_size(&self) -> usize {
        self.policy.regular_batch_size.max(1)
    }

    pub(crate) fn record_arrival(&mut self) {
        self.arrivals = self.arrivals.saturating_add(1);
    }

    pub(crate) fn record_drained(&mut self, n: usize) {
        self.drained = self.drained.saturating_add(n);
    }

    /// Close the current window if it has elapsed at `now`.
    pub fn roll(&mut self, now: Instant) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return;
        };
        if now.saturating_duration_since(start) < self.window {
            return;
        }
        if self.policy.enabled
            && self.arrivals >= self.policy.min_arrivals
            && self.arrivals > self.drained
            && !self.under_pressure
        {
            tracing::debug!(
                arrivals = self.arrivals,
                drained = self.drained,
                "regular jobs under pressure"
            );
            self.under_pressure = true;
        }
        self.arrivals = 0;
        self.drained = 0;
        self.window_start = Some(now);
    }

    /// Return `true` while the next pass must drain the whole Regular batch.
    pub fn is_under_pressure(&self) -> bool {
        self.under_pressure
    }

    pub(crate) fn relieve(&mut self) {
        self.under_pressure = false;
    }

    pub(crate) fn reset(&mut self) {
        self.window_start = None;
        self.arrivals = 0;
        self.drained = 0;
        self.under_pressure = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/timer.rs"]
mod tests;
