//! Per-question countdown.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};

/// Start a countdown of `limit`.
///
/// The [`AnswerTimer`] half is awaited by whoever auto-submits on expiry; the
/// [`TimerHandle`] stays with the question view. Cancelling or dropping the
/// handle stops the countdown.
#[must_use]
pub fn arm(limit: Duration) -> (AnswerTimer, TimerHandle) {
    let deadline = Instant::now() + limit;
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (
        AnswerTimer {
            deadline,
            cancel_rx,
        },
        TimerHandle {
            deadline,
            limit,
            cancel_tx: Some(cancel_tx),
        },
    )
}

#[derive(Debug)]
pub struct AnswerTimer {
    deadline: Instant,
    cancel_rx: oneshot::Receiver<()>,
}

impl AnswerTimer {
    /// Resolves to `true` when the limit elapsed, `false` when cancelled first.
    pub async fn expired(self) -> bool {
        let Self {
            deadline,
            cancel_rx,
        } = self;
        tokio::select! {
            biased;
            _ = cancel_rx => false,
            () = sleep_until(deadline) => true,
        }
    }
}

#[derive(Debug)]
pub struct TimerHandle {
    deadline: Instant,
    limit: Duration,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl TimerHandle {
    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whole seconds left, rounded up, for the countdown label.
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        let remaining = self.remaining();
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Milliseconds since the timer was armed, capped at the limit.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = self.limit.saturating_sub(self.remaining());
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_limit() {
        let (timer, handle) = arm(Duration::from_secs(60));
        assert_eq!(handle.remaining_secs(), 60);
        let waiter = tokio::spawn(timer.expired());

        tokio::time::advance(Duration::from_millis(59_500)).await;
        assert_eq!(handle.remaining_secs(), 1);
        assert_eq!(handle.elapsed_ms(), 59_500);
        assert!(!waiter.is_finished());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(waiter.await.unwrap());
        assert_eq!(handle.remaining(), Duration::ZERO);
        assert_eq!(handle.elapsed_ms(), 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_countdown() {
        let (timer, handle) = arm(Duration::from_secs(60));
        let waiter = tokio::spawn(timer.expired());
        tokio::time::advance(Duration::from_secs(5)).await;
        handle.cancel();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (timer, handle) = arm(Duration::from_secs(60));
        drop(handle);
        assert!(!timer.expired().await);
    }
}
