//! Per-group load window.
//!
//! A [`Deadline`] owns the timer for one test group and fires a shared
//! [`CancellationToken`] when the window elapses. Virtual users hold a cheap
//! [`DeadlineHandle`] and check it cooperatively; nothing here aborts tasks.
use crate::MAX_DURATION;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

pub struct Deadline {
    handle: DeadlineHandle,
    timer: JoinHandle<()>,
}

impl Deadline {
    /// Start a window of `duration` from now.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(duration: Duration) -> Self {
        Self::with_token(duration, CancellationToken::new())
    }

    /// Like [`Deadline::start`], but cancelling `parent` fires the deadline early.
    pub fn child_of(parent: &CancellationToken, duration: Duration) -> Self {
        Self::with_token(duration, parent.child_token())
    }

    fn with_token(duration: Duration, token: CancellationToken) -> Self {
        let started_at = Instant::now();
        // Validated configs stay below the cap; clamp anything else.
        let ends_at = started_at + duration.min(MAX_DURATION);
        let handle = DeadlineHandle {
            token: token.clone(),
            started_at,
            ends_at,
        };

        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = sleep_until(ends_at) => {
                    trace!("Deadline reached.");
                    token.cancel();
                }
                _ = token.cancelled() => {
                    debug!("Deadline fired early.");
                }
            }
        });

        Self { handle, timer }
    }

    pub fn handle(&self) -> DeadlineHandle {
        self.handle.clone()
    }

    /// Fire the deadline now. Firing twice is a no-op.
    pub fn fire(&self) {
        self.handle.token.cancel();
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Shared view of a [`Deadline`]. Once expired it stays expired.
#[derive(Clone)]
pub struct DeadlineHandle {
    token: CancellationToken,
    started_at: Instant,
    ends_at: Instant,
}

impl DeadlineHandle {
    /// Checked against the monotonic clock as well as the token, so an actor
    /// never dispatches past the window even if the timer task has not run yet.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.ends_at
    }

    /// Resolves once the deadline has fired.
    pub async fn expired(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = sleep_until(self.ends_at) => {}
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        if self.token.is_cancelled() {
            Duration::ZERO
        } else {
            self.ends_at.saturating_duration_since(Instant::now())
        }
    }

    pub fn ends_at(&self) -> Instant {
        self.ends_at
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl fmt::Debug for DeadlineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineHandle")
            .field("expired", &self.is_expired())
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Log elapsed and remaining time every `every` until the deadline fires.
pub(crate) async fn countdown(deadline: DeadlineHandle, group: String, every: Duration) {
    let total = deadline.ends_at - deadline.started_at;
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // NOTE: First tick completes instantly
    interval.tick().await;

    loop {
        tokio::select! {
            _ = deadline.expired() => break,
            _ = interval.tick() => {
                info!(
                    "[{group}] Elapsed {} / {}, remaining {}",
                    humantime::format_duration(round_secs(deadline.elapsed())),
                    humantime::format_duration(total),
                    humantime::format_duration(round_secs(deadline.remaining())),
                );
            }
        }
    }
}

fn round_secs(dur: Duration) -> Duration {
    Duration::from_secs(dur.as_secs_f64().round() as u64)
}
