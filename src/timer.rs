use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// Repeating timers. The first firing happens one full period after scheduling.
pub trait Scheduler: Send + Sync {
    fn schedule_repeating(&self, period: Duration, callback: TimerCallback) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
    fn is_live(&self, handle: TimerHandle) -> bool;
}

/// Runs each timer as a task on a tokio runtime; cancelling aborts the task.
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TimerHandle, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_count(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.values().filter(|task| !task.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let task = self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        match self.tasks.lock() {
            Ok(mut tasks) => {
                tasks.retain(|_, task| !task.is_finished());
                tasks.insert(handle, task);
            }
            Err(_) => {
                tracing::warn!("timer table poisoned, dropping timer");
                task.abort();
            }
        }
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(task) = tasks.remove(&handle) {
                task.abort();
            }
        }
    }

    fn is_live(&self, handle: TimerHandle) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.get(&handle).is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}
