//! Tick scheduler
//!
//! A cooperative task runner over a millisecond clock. It stands in for the
//! timer primitives of an event loop:
//! - `defer` - one-shot task due immediately (a zero-delay timeout)
//! - `set_timeout` - one-shot task due after a delay
//! - `set_interval` - periodic task, first due one period from now
//!
//! The clock only moves when it is pumped, either explicitly through
//! [`TickScheduler::advance`] (deterministic, used by tests and simulations)
//! or in real time by a background thread started with
//! [`TickScheduler::start_background`].
//!
//! Tasks fire in chronological order, ties in registration order. A task's
//! callback is taken out of the task table while it runs, so a callback can
//! register or cancel tasks (including itself) without deadlocking, and a
//! periodic task is never re-entered.

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskId;
}

/// What a task wants after it ran
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskControl {
    /// Keep a periodic task scheduled (ignored for one-shot tasks)
    Continue,
    /// Remove the task
    Stop,
}

/// Boxed task body
pub type TaskCallback = Box<dyn FnMut() -> TaskControl + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskKind {
    Once,
    Every(u64),
}

struct Task {
    kind: TaskKind,
    due_ms: u64,
    seq: u64,
    /// `None` while the callback is executing
    callback: Option<TaskCallback>,
}

struct SchedulerInner {
    tasks: SlotMap<TaskId, Task>,
    now_ms: u64,
    next_seq: u64,
    /// Set while tasks are being run, guards against nested pumping
    pumping: bool,
}

impl SchedulerInner {
    fn insert(&mut self, kind: TaskKind, delay_ms: u64, callback: TaskCallback) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(Task {
            kind,
            due_ms: self.now_ms + delay_ms,
            seq,
            callback: Some(callback),
        })
    }

    /// Earliest runnable task due at or before `until`
    fn next_runnable(&self, until: u64) -> Option<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.callback.is_some() && task.due_ms <= until)
            .min_by_key(|(_, task)| (task.due_ms, task.seq))
            .map(|(id, _)| id)
    }

    /// Take the callback of the earliest runnable task and advance the clock
    /// to its due time
    ///
    /// Only tasks holding a callback are runnable, so the take cannot miss.
    fn take_next(&mut self, until: u64) -> Option<(TaskId, TaskCallback)> {
        let id = self.next_runnable(until)?;
        let task = self.tasks.get_mut(id)?;
        let callback = task.callback.take()?;
        self.now_ms = self.now_ms.max(task.due_ms);
        Some((id, callback))
    }

    fn next_due(&self) -> Option<u64> {
        self.tasks
            .values()
            .filter(|task| task.callback.is_some())
            .map(|task| task.due_ms)
            .min()
    }
}

fn lock(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the pumping flag when a pump ends, including by unwinding
///
/// A task whose callback unwound is still recorded in `running` and gets
/// removed, since its callback is gone.
struct PumpGuard<'a> {
    inner: &'a Mutex<SchedulerInner>,
    running: Option<TaskId>,
}

impl Drop for PumpGuard<'_> {
    fn drop(&mut self) {
        let mut guard = lock(self.inner);
        if let Some(id) = self.running.take() {
            tracing::warn!("TickScheduler: task panicked, removing it");
            guard.tasks.remove(id);
        }
        guard.pumping = false;
    }
}

/// Run every task due up to `until`, then move the clock to `until`
///
/// Returns the number of task executions.
fn pump(inner: &Mutex<SchedulerInner>, until: u64) -> usize {
    {
        let mut guard = lock(inner);
        if guard.pumping {
            tracing::warn!("TickScheduler: nested advance ignored");
            return 0;
        }
        guard.pumping = true;
    }
    let mut pump_guard = PumpGuard {
        inner,
        running: None,
    };

    let mut executed = 0;
    loop {
        let Some((id, mut callback)) = lock(inner).take_next(until) else {
            break;
        };

        // Run without the lock so the task can schedule or cancel
        pump_guard.running = Some(id);
        let control = callback();
        pump_guard.running = None;
        executed += 1;

        let mut guard = lock(inner);
        let state = &mut *guard;
        let reschedule = match state.tasks.get_mut(id) {
            // Cancelled while running
            None => continue,
            Some(task) => match (task.kind, control) {
                (TaskKind::Every(period), TaskControl::Continue) => {
                    task.due_ms += period;
                    task.seq = state.next_seq;
                    task.callback = Some(callback);
                    true
                }
                _ => false,
            },
        };
        if reschedule {
            state.next_seq += 1;
        } else {
            state.tasks.remove(id);
        }
    }

    let mut guard = lock(inner);
    guard.now_ms = guard.now_ms.max(until);
    drop(guard);
    drop(pump_guard);
    executed
}

/// The scheduler that owns the clock and the task table
///
/// Components receive a [`SchedulerHandle`] and register tasks through it;
/// whoever owns the `TickScheduler` decides how the clock is pumped.
///
/// # Background Thread Mode
///
/// ```ignore
/// let mut scheduler = TickScheduler::new();
/// scheduler.start_background(); // pumps the clock in real time
/// ```
pub struct TickScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    /// Stop signal for background thread
    stop_flag: Arc<AtomicBool>,
    /// Background thread handle (if running)
    thread_handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                tasks: SlotMap::with_key(),
                now_ms: 0,
                next_seq: 0,
                pumping: false,
            })),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current clock value in milliseconds
    pub fn now_ms(&self) -> u64 {
        lock(&self.inner).now_ms
    }

    /// Move the clock forward by `ms`, running every task that falls due
    ///
    /// Returns the number of task executions.
    pub fn advance(&self, ms: u64) -> usize {
        let until = self.now_ms() + ms;
        pump(&self.inner, until)
    }

    /// Run the tasks that are already due without moving the clock
    pub fn run_due(&self) -> usize {
        self.advance(0)
    }

    /// Keep advancing until no task is left or `limit_ms` has passed
    ///
    /// Jumps straight from one due time to the next. Returns the elapsed
    /// clock time.
    pub fn run_until_idle(&self, limit_ms: u64) -> u64 {
        let start = self.now_ms();
        let deadline = start + limit_ms;
        loop {
            let next = lock(&self.inner).next_due();
            match next {
                Some(due) if due <= deadline => {
                    pump(&self.inner, due);
                }
                _ => break,
            }
        }
        self.now_ms() - start
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        lock(&self.inner).next_due()
    }

    /// Number of scheduled tasks (including one that is currently running)
    pub fn task_count(&self) -> usize {
        lock(&self.inner).tasks.len()
    }

    /// Check if any task is still scheduled
    pub fn has_pending(&self) -> bool {
        self.task_count() > 0
    }

    /// Start pumping the clock from a background thread in real time
    ///
    /// The thread advances the clock by the wall time elapsed since its last
    /// iteration, at millisecond resolution.
    pub fn start_background(&mut self) {
        if self.thread_handle.is_some() {
            return; // Already running
        }

        let inner = Arc::clone(&self.inner);
        let stop_flag = Arc::clone(&self.stop_flag);

        tracing::debug!("TickScheduler: starting background thread");
        self.thread_handle = Some(thread::spawn(move || {
            let resolution = Duration::from_millis(1);
            let mut last = Instant::now();
            let mut carried_us: u128 = 0;

            while !stop_flag.load(Ordering::Relaxed) {
                let now = Instant::now();
                carried_us += (now - last).as_micros();
                last = now;

                let whole_ms = (carried_us / 1000) as u64;
                if whole_ms > 0 {
                    carried_us %= 1000;
                    let until = lock(&inner).now_ms + whole_ms;
                    pump(&inner, until);
                }

                thread::sleep(resolution);
            }
        }));
    }

    /// Stop the background thread
    pub fn stop_background(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            tracing::debug!("TickScheduler: background thread stopped");
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    /// Check if the background thread is running
    pub fn is_background_running(&self) -> bool {
        self.thread_handle.is_some()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop_background();
    }
}

/// A weak handle to the tick scheduler
///
/// Registering through a handle whose scheduler was dropped returns `None`;
/// every other operation becomes a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    fn register(&self, kind: TaskKind, delay_ms: u64, callback: TaskCallback) -> Option<TaskId> {
        self.inner
            .upgrade()
            .map(|inner| lock(&inner).insert(kind, delay_ms, callback))
    }

    /// Run `f` once, as soon as the scheduler is next pumped
    pub fn defer<F>(&self, f: F) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.set_timeout(0, f)
    }

    /// Run `f` once after `delay_ms`
    pub fn set_timeout<F>(&self, delay_ms: u64, f: F) -> Option<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut f = Some(f);
        self.register(
            TaskKind::Once,
            delay_ms,
            Box::new(move || {
                if let Some(f) = f.take() {
                    f();
                }
                TaskControl::Stop
            }),
        )
    }

    /// Run `f` every `period_ms` until it returns [`TaskControl::Stop`] or
    /// the task is cancelled
    pub fn set_interval<F>(&self, period_ms: u64, f: F) -> Option<TaskId>
    where
        F: FnMut() -> TaskControl + Send + 'static,
    {
        let period_ms = period_ms.max(1);
        self.register(TaskKind::Every(period_ms), period_ms, Box::new(f))
    }

    /// Remove a task. Returns `true` if it was still scheduled.
    pub fn cancel(&self, id: TaskId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| lock(&inner).tasks.remove(id).is_some())
    }

    /// Check if a task is still scheduled
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| lock(&inner).tasks.contains_key(id))
    }

    /// Current clock value, or `None` if the scheduler is gone
    pub fn now_ms(&self) -> Option<u64> {
        self.inner.upgrade().map(|inner| lock(&inner).now_ms)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
