//! Explicit scheduled-task abstraction.
//!
//! Every repeating timer is paired with a cancellation handle at creation;
//! [`TimerScope`] groups the handles belonging to one mounted view so
//! teardown is a single `cancel()` (also run on drop) instead of ad hoc
//! cleanup closures.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to one repeating task. Cancelling stops the schedule; an
/// in-flight callback invocation runs to completion.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Spawns a standalone repeating task. The first invocation fires
/// immediately; subsequent ones follow the cadence.
pub fn repeat<F, Fut>(cadence: Duration, f: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    repeat_with_token(cadence, CancellationToken::new(), f)
}

fn repeat_with_token<F, Fut>(cadence: Duration, token: CancellationToken, mut f: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let task_token = token.clone();
    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = task_token.cancelled() => break,
                _ = interval.tick() => f().await,
            }
        }
    });
    TaskHandle { token, join }
}

/// Cancellation scope for the timers of one mounted view.
///
/// Tasks spawned through the scope are linked to a single root token;
/// `cancel()` (or dropping the scope) stops all of them together.
#[derive(Debug)]
pub struct TimerScope {
    token: CancellationToken,
}

impl TimerScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token observers can use to discard work finishing after teardown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawns a repeating task tied to this scope's lifetime.
    pub fn repeat<F, Fut>(&self, cadence: Duration, f: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        repeat_with_token(cadence, self.token.child_token(), f)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for TimerScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    /// First invocation is immediate, then one per cadence tick.
    #[tokio::test(start_paused = true)]
    async fn test_repeat_fires_immediately_then_on_cadence() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let handle = repeat(Duration::from_secs(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4); // t = 0, 1, 2, 3

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert!(handle.is_finished());
    }

    /// Cancelling the scope stops every task spawned through it.
    #[tokio::test(start_paused = true)]
    async fn test_scope_cancels_all_tasks() {
        let count = Arc::new(AtomicU32::new(0));
        let scope = TimerScope::new();
        for _ in 0..2 {
            let c = count.clone();
            scope.repeat(Duration::from_secs(1), move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4); // 2 tasks x (t = 0, 1)

        scope.cancel();
        assert!(scope.is_cancelled());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    /// Dropping the scope cancels its tasks (no leaked timers).
    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let count = Arc::new(AtomicU32::new(0));
        {
            let scope = TimerScope::new();
            let c = count.clone();
            scope.repeat(Duration::from_secs(1), move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                }
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let settled = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), settled);
    }
}
