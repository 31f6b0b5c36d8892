//! Unified refresh scheduler.
//!
//! A view owns one scheduler. Every polling loop it needs (data refresh,
//! clock redraw) is registered here and stops when the scheduler is
//! cancelled or dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Wakes a polling loop ahead of its next tick.
///
/// Fires that arrive while the job is running are kept, so the loop runs
/// once more right after.
#[derive(Debug, Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.notify.notify_one();
    }

    async fn fired(&self) {
        self.notify.notified().await;
    }
}

#[derive(Default)]
pub struct RefreshScheduler {
    loops: Vec<(&'static str, JoinHandle<()>)>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` now, then every `period`, and whenever `trigger` fires.
    pub fn poll<F, Fut>(&mut self, name: &'static str, period: Duration, trigger: RefreshTrigger, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = trigger.fired() => {
                        tracing::debug!(loop_name = name, "Refresh triggered");
                        interval.reset();
                    }
                }
                job().await;
            }
        });

        tracing::debug!(loop_name = name, period_secs = period.as_secs(), "Polling loop started");
        self.loops.push((name, handle));
    }

    /// Run `job` now and then every `period`.
    pub fn every<F, Fut>(&mut self, name: &'static str, period: Duration, job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.poll(name, period, RefreshTrigger::new(), job);
    }

    /// Loops that are still running.
    pub fn active(&self) -> usize {
        self.loops.iter().filter(|(_, h)| !h.is_finished()).count()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.loops.iter().map(|(name, _)| *name).collect()
    }

    /// Stop every loop.
    pub fn cancel(&mut self) {
        for (name, handle) in self.loops.drain(..) {
            handle.abort();
            tracing::debug!(loop_name = name, "Polling loop cancelled");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_job(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_on_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        scheduler.every("data", Duration::from_secs(10), counter_job(&runs));

        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(25)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_runs_early() {
        let runs = Arc::new(AtomicUsize::new(0));
        let trigger = RefreshTrigger::new();
        let mut scheduler = RefreshScheduler::new();
        scheduler.poll("data", Duration::from_secs(30), trigger.clone(), counter_job(&runs));
        settle().await;

        trigger.fire();
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_loops() {
        let runs = Arc::new(AtomicUsize::new(0));
        {
            let mut scheduler = RefreshScheduler::new();
            scheduler.every("clock", Duration::from_secs(10), counter_job(&runs));
            settle().await;
            assert_eq!(scheduler.names(), vec!["clock"]);
        }

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
