// src/scheduler.rs
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::PaperlessApi;
use crate::config::EndpointConfig;
use crate::poller::Poller;
use crate::status::{PollFailure, SensorSnapshot, SensorState, SensorStatus};

/// Minimum-interval gate.
/// - First call always passes.
/// - Inside the interval, calls are refused.
/// - A passing call records its time.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run: None,
        }
    }

    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let ready = match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if ready {
            self.last_run = Some(now);
        }
        ready
    }

    /// Mark a run that bypassed the gate.
    pub fn record(&mut self, now: Instant) {
        self.last_run = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "status")]
pub enum UpdateOutcome {
    Polled(SensorStatus),
    Throttled,
    /// Another poll is still in flight.
    Busy,
}

/// Owns one sensor: its poller, its state, and the gate in front of them.
/// At most one poll runs at a time; callers that collide get `Busy`
/// instead of queueing behind it.
pub struct SensorRunner<A> {
    cfg: EndpointConfig,
    poller: Poller<A>,
    state: tokio::sync::Mutex<SensorState>,
    throttle: Mutex<Throttle>,
    snapshot: RwLock<SensorSnapshot>,
    deadline: Duration,
}

impl<A: PaperlessApi> SensorRunner<A> {
    pub fn new(cfg: EndpointConfig, poller: Poller<A>) -> Self {
        let state = SensorState::new();
        let snapshot = state.snapshot(&cfg);
        let deadline = cfg.request_timeout() * 3;
        let throttle = Throttle::new(cfg.scan_interval());
        Self {
            cfg,
            poller,
            state: tokio::sync::Mutex::new(state),
            throttle: Mutex::new(throttle),
            snapshot: RwLock::new(snapshot),
            deadline,
        }
    }

    /// Bound on a whole poll, previews included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.throttle = Mutex::new(Throttle::new(min_interval));
        self
    }

    /// Last published view. Does not wait for an in-flight poll.
    pub fn snapshot(&self) -> SensorSnapshot {
        match self.snapshot.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// On-demand update, gated by the throttle.
    pub async fn update(&self) -> UpdateOutcome {
        self.run(true).await
    }

    /// Scheduled update. The loop's own cadence is the gate, so the throttle
    /// only records the run.
    pub async fn tick(&self) -> UpdateOutcome {
        self.run(false).await
    }

    async fn run(&self, gated: bool) -> UpdateOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!("poll already in flight");
            return UpdateOutcome::Busy;
        };

        let acquired = {
            let now = Instant::now();
            let mut throttle = match self.throttle.lock() {
                Ok(t) => t,
                Err(poisoned) => poisoned.into_inner(),
            };
            if gated {
                throttle.try_acquire(now)
            } else {
                throttle.record(now);
                true
            }
        };
        if !acquired {
            tracing::trace!("poll throttled");
            return UpdateOutcome::Throttled;
        }

        let polled = tokio::time::timeout(self.deadline, self.poller.poll(&mut state)).await;
        let status = match polled {
            Ok(result) => result.status,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "poll overran its deadline, abandoned"
                );
                state.record_failure(&PollFailure::Timeout);
                state.last_polled = Some(chrono::Utc::now());
                state.status
            }
        };

        let snap = state.snapshot(&self.cfg);
        match self.snapshot.write() {
            Ok(mut s) => *s = snap,
            Err(poisoned) => *poisoned.into_inner() = snap,
        }
        UpdateOutcome::Polled(status)
    }
}

/// Poll on a fixed cadence. Missed ticks are skipped, never queued.
pub fn spawn_poll_loop<A>(runner: Arc<SensorRunner<A>>, interval: Duration) -> JoinHandle<()>
where
    A: PaperlessApi + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = runner.tick().await;
            tracing::debug!(target: "scheduler", ?outcome, "scheduled tick");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_passes() {
        let mut t = Throttle::new(Duration::from_secs(60));
        assert!(t.try_acquire(Instant::now()));
    }

    #[test]
    fn inside_interval_refused_then_passes() {
        let mut t = Throttle::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(t.try_acquire(t0));
        assert!(!t.try_acquire(t0 + Duration::from_secs(30)));
        assert!(t.try_acquire(t0 + Duration::from_secs(60)));
        // refusal does not move the window
        assert!(!t.try_acquire(t0 + Duration::from_secs(90)));
    }

    #[test]
    fn outcome_serializes_for_api() {
        let v = serde_json::to_value(UpdateOutcome::Polled(SensorStatus::Online)).unwrap();
        assert_eq!(v, serde_json::json!({"outcome": "polled", "status": "Online"}));
        let v = serde_json::to_value(UpdateOutcome::Busy).unwrap();
        assert_eq!(v, serde_json::json!({"outcome": "busy"}));
    }
}
