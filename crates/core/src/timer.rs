//! Cancellable repeating tasks owned by the controller.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Identifies a task scheduled on a [`TimerSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TimerId(u64);

/// A set of repeating tasks that can be cancelled individually or all at
/// once. Dropping the set cancels every task in it.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    tasks: HashMap<TimerId, JoinHandle<()>>,
    next_id: u64,
}

impl TimerSet {
    /// Runs `f` every `period`, starting one period from now, until it
    /// returns `Break` or the timer is cancelled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_every<F>(&mut self, period: Duration, mut f: F) -> TimerId
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let task = tokio::spawn(async move {
            loop {
                interval.tick().await;
                if f().is_break() {
                    break;
                }
            }
        });
        self.tasks.insert(id, task);
        id
    }

    /// Cancels one task. Returns `false` if it was not in the set.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(task) = self.tasks.remove(&id) else {
            return false;
        };
        task.abort();
        true
    }

    /// Cancels every task and returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
        count
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::sleep;

    use super::*;

    const PERIOD: Duration = Duration::from_millis(20);

    fn counting(
        timers: &mut TimerSet,
        limit: Option<usize>,
    ) -> (TimerId, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_clone = Arc::clone(&ticks);
        let id = timers.schedule_every(PERIOD, move || {
            let n = ticks_clone.fetch_add(1, Ordering::SeqCst) + 1;
            if limit.is_some_and(|limit| n >= limit) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        (id, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut timers = TimerSet::default();
        let (_, ticks) = counting(&mut timers, None);

        sleep(PERIOD / 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        sleep(PERIOD * 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_stops_ticking() {
        let mut timers = TimerSet::default();
        let (_, ticks) = counting(&mut timers, Some(3));

        sleep(PERIOD * 10).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut timers = TimerSet::default();
        let (first, first_ticks) = counting(&mut timers, None);
        let (_, second_ticks) = counting(&mut timers, None);

        sleep(PERIOD + PERIOD / 2).await;
        assert!(timers.cancel(first));
        assert!(!timers.cancel(first));

        sleep(PERIOD * 2).await;
        assert_eq!(first_ticks.load(Ordering::SeqCst), 1);
        assert_eq!(second_ticks.load(Ordering::SeqCst), 3);

        assert_eq!(timers.cancel_all(), 1);
        sleep(PERIOD * 2).await;
        assert_eq!(second_ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_everything() {
        let mut timers = TimerSet::default();
        let (_, ticks) = counting(&mut timers, None);
        drop(timers);

        sleep(PERIOD * 5).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
