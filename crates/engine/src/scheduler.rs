//! Recurring-task scheduler for reconciliation jobs.
//!
//! Provides a fixed-interval ticker on a dedicated thread. Jobs are
//! registered once and run in registration order on every tick; a job
//! panic is caught and logged, never killing the ticker. Shutdown wakes
//! the sleeping ticker immediately and joins the thread.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::error;

/// One registered recurring job
struct JobEntry {
    name: String,
    work: Box<dyn Fn() + Send + Sync>,
}

struct SchedulerInner {
    jobs: Mutex<Vec<Arc<JobEntry>>>,
    sleep_lock: Mutex<()>,
    wake: Condvar,
    shutdown: AtomicBool,
    interval: Duration,
    ticks: AtomicU64,
}

/// Scheduler metrics snapshot
pub struct SchedulerStats {
    /// Completed ticks since creation
    pub ticks: u64,
    /// Number of registered jobs
    pub job_count: usize,
}

/// Fixed-interval recurring scheduler.
///
/// The ticker thread is named `parkwell-recon`. All registered jobs run on
/// that one thread, so two jobs never execute concurrently with each other —
/// the mutual-exclusion contract the transaction resource needs.
pub struct RecurringScheduler {
    inner: Arc<SchedulerInner>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl RecurringScheduler {
    /// Create a scheduler ticking at the given interval
    pub fn new(interval: Duration) -> Self {
        let inner = Arc::new(SchedulerInner {
            jobs: Mutex::new(Vec::new()),
            sleep_lock: Mutex::new(()),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
            interval,
            ticks: AtomicU64::new(0),
        });

        let inner_clone = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("parkwell-recon".to_string())
            .spawn(move || ticker_loop(&inner_clone))
            .expect("failed to spawn recurring scheduler thread");

        Self {
            inner,
            ticker: Mutex::new(Some(handle)),
        }
    }

    /// Register a recurring job under a diagnostic name.
    ///
    /// Jobs registered after startup join the rotation on the next tick.
    pub fn register(&self, name: impl Into<String>, work: impl Fn() + Send + Sync + 'static) {
        self.inner.jobs.lock().push(Arc::new(JobEntry {
            name: name.into(),
            work: Box::new(work),
        }));
    }

    /// Run every registered job once, immediately, on the caller's thread.
    ///
    /// Used by tests and by operators forcing a pass outside the timer.
    pub fn tick_now(&self) {
        run_jobs(&self.inner);
        self.inner.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of scheduler metrics
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.inner.ticks.load(Ordering::Relaxed),
            job_count: self.inner.jobs.lock().len(),
        }
    }

    /// Shut down the scheduler: wake the ticker and join it. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);

        // Lock the sleep mutex before notifying to prevent lost-wakeup:
        // the ticker holds this lock between its shutdown check and its
        // condvar wait, so acquiring it guarantees the ticker is either
        // already in wait_for (and our notify will wake it) or hasn't
        // checked shutdown yet (and will see it's true when it does).
        {
            let _guard = self.inner.sleep_lock.lock();
            self.inner.wake.notify_all();
        }

        if let Some(handle) = self.ticker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RecurringScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ticker_loop(inner: &SchedulerInner) {
    let mut guard = inner.sleep_lock.lock();
    loop {
        let result = inner.wake.wait_for(&mut guard, inner.interval);
        if inner.shutdown.load(Ordering::Acquire) {
            return;
        }
        // A wake without shutdown is spurious; only a timed-out sleep ticks
        if !result.timed_out() {
            continue;
        }
        run_jobs(inner);
        inner.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

fn run_jobs(inner: &SchedulerInner) {
    // Snapshot so a long job never blocks registration
    let jobs: Vec<Arc<JobEntry>> = inner.jobs.lock().clone();
    for job in jobs {
        // catch_unwind keeps one panicking job from killing the ticker
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (job.work)())).is_err() {
            error!(job = %job.name, "recurring job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_tick_now_runs_all_jobs_in_order() {
        let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        scheduler.register("first", move || o.lock().push("first"));
        let o = Arc::clone(&order);
        scheduler.register("second", move || o.lock().push("second"));

        scheduler.tick_now();
        assert_eq!(*order.lock(), vec!["first", "second"]);
        scheduler.shutdown();
    }

    #[test]
    fn test_timer_fires() {
        let scheduler = RecurringScheduler::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        scheduler.register("count", move || {
            c.fetch_add(1, Ordering::Relaxed);
        });

        std::thread::sleep(Duration::from_millis(120));
        scheduler.shutdown();
        assert!(counter.load(Ordering::Relaxed) >= 2);
    }

    #[test]
    fn test_panicking_job_does_not_kill_ticker() {
        let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.register("explodes", || panic!("intentional test panic"));
        let c = Arc::clone(&counter);
        scheduler.register("survives", move || {
            c.fetch_add(1, Ordering::Relaxed);
        });

        scheduler.tick_now();
        scheduler.tick_now();
        assert_eq!(counter.load(Ordering::Relaxed), 2);
        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let scheduler = RecurringScheduler::new(Duration::from_millis(10));
        scheduler.register("noop", || {});
        scheduler.shutdown();
        scheduler.shutdown();
        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_wakes_sleeping_ticker_promptly() {
        // A very long interval must not delay shutdown
        let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
        let start = std::time::Instant::now();
        scheduler.shutdown();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stats() {
        let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
        scheduler.register("a", || {});
        scheduler.register("b", || {});
        scheduler.tick_now();

        let stats = scheduler.stats();
        assert_eq!(stats.job_count, 2);
        assert_eq!(stats.ticks, 1);
        scheduler.shutdown();
    }
}
