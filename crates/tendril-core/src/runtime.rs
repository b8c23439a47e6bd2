use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

use crate::clock::{Clock, SystemClock, TestClock};
use crate::Dispose;

new_key_type! {
    /// Handle for a scheduled timeout or interval.
    pub struct TimerId;
}

/// Shortest period an interval may have; zero would spin `run_due` forever.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeat { period: Duration, f: Rc<dyn Fn()> },
}

struct Timer {
    due: Instant,
    seq: u64,
    cb: Callback,
}

#[derive(Default)]
struct TimerQueue {
    timers: SlotMap<TimerId, Timer>,
    next_seq: u64,
}

impl TimerQueue {
    fn push(&mut self, due: Instant, cb: Callback) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(Timer { due, seq, cb })
    }

    /// Earliest timer due at or before `now`, ties broken by scheduling order.
    fn next_due(&self, now: Instant) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(id, _)| id)
    }
}

/// Per-application event loop state: the clock and the timer queue.
///
/// Nothing here is process-global; each `Runtime` (and its clones) is an
/// independent loop. The host drives it by calling [`Runtime::run_due`].
#[derive(Clone)]
pub struct Runtime {
    clock: Rc<dyn Clock>,
    queue: Rc<RefCell<TimerQueue>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::system()
    }
}

impl Runtime {
    pub fn new(clock: impl Clock) -> Self {
        Self {
            clock: Rc::new(clock),
            queue: Rc::new(RefCell::new(TimerQueue::default())),
        }
    }

    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// A runtime on a deterministic clock, for tests and simulations.
    pub fn with_test_clock() -> (Self, TestClock) {
        let clock = TestClock::new();
        (Self::new(clock.clone()), clock)
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn set_timeout(&self, delay: Duration, f: impl FnOnce() + 'static) -> TimerId {
        let due = self.now() + delay;
        self.queue.borrow_mut().push(due, Callback::Once(Box::new(f)))
    }

    pub fn set_interval(&self, period: Duration, f: impl Fn() + 'static) -> TimerId {
        let period = if period < MIN_INTERVAL {
            log::warn!("set_interval: period {period:?} clamped to {MIN_INTERVAL:?}");
            MIN_INTERVAL
        } else {
            period
        };
        let due = self.now() + period;
        self.queue.borrow_mut().push(
            due,
            Callback::Repeat {
                period,
                f: Rc::new(f),
            },
        )
    }

    /// Idempotent: cancelling a fired or unknown timer returns `false`.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.queue.borrow_mut().timers.remove(id).is_some()
    }

    /// A cleanup handle that cancels `id`.
    pub fn cancel_on_dispose(&self, id: TimerId) -> Dispose {
        let rt = self.clone();
        Dispose::new(move || {
            rt.cancel(id);
        })
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.borrow().timers.contains_key(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.borrow().timers.values().map(|t| t.due).min()
    }

    /// Fires every timer due by now, in deadline order. Callbacks run with no
    /// borrow held, so they may schedule or cancel timers; newly scheduled
    /// timers that are already due fire in the same call.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        loop {
            let now = self.now();
            let task = {
                let mut q = self.queue.borrow_mut();
                let Some(id) = q.next_due(now) else {
                    break;
                };
                let repeat = match &q.timers[id].cb {
                    Callback::Repeat { period, f } => Some((*period, f.clone())),
                    Callback::Once(_) => None,
                };
                match repeat {
                    Some((period, f)) => {
                        let seq = q.next_seq;
                        q.next_seq += 1;
                        let timer = &mut q.timers[id];
                        let mut next = timer.due + period;
                        if next <= now {
                            next = now + period;
                        }
                        timer.due = next;
                        timer.seq = seq;
                        Task::Repeat(f)
                    }
                    None => match q.timers.remove(id).map(|t| t.cb) {
                        Some(Callback::Once(f)) => Task::Once(f),
                        _ => continue,
                    },
                }
            };
            fired += 1;
            match task {
                Task::Once(f) => f(),
                Task::Repeat(f) => f(),
            }
        }
        if fired > 0 {
            log::debug!("runtime: fired {fired} timer(s)");
        }
        fired
    }

    /// Moves `clock` forward by `by`, stopping at each intermediate deadline
    /// so every timer observes its own due time as "now".
    pub fn advance(&self, clock: &TestClock, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            if deadline > target {
                break;
            }
            if deadline > self.now() {
                clock.set(deadline);
            }
            fired += self.run_due();
        }
        clock.set(target);
        fired + self.run_due()
    }
}

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeat(Rc<dyn Fn()>),
}
