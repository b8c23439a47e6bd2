//! Timing gates: debounce (trailing edge) and throttle (leading edge plus a
//! single coalesced trailing update).
//!
//! Both keep at most one pending timer on the owning [`Runtime`]. Dropping the
//! last handle, or calling `dispose`, cancels that timer, so a torn-down gate
//! never publishes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_time::{Duration, Instant};

use crate::{Runtime, Signal, TimerId};

struct GateState<T> {
    runtime: Runtime,
    period: Duration,
    pending: Option<TimerId>,
    staged: Option<T>,
    last_emit: Option<Instant>,
    disposed: bool,
}

impl<T> GateState<T> {
    fn new(runtime: &Runtime, period: Duration) -> Self {
        Self {
            runtime: runtime.clone(),
            period,
            pending: None,
            staged: None,
            last_emit: None,
            disposed: false,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            self.runtime.cancel(id);
        }
    }
}

impl<T> Drop for GateState<T> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Fires the staged value of a gate; used by both gate kinds.
fn fire_staged<T: 'static>(weak: &Weak<RefCell<GateState<T>>>, value: &Signal<T>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let staged = {
        let mut st = inner.borrow_mut();
        st.pending = None;
        if st.disposed {
            return;
        }
        let staged = st.staged.take();
        if staged.is_some() {
            st.last_emit = Some(st.runtime.now());
        }
        staged
    };
    if let Some(v) = staged {
        value.set(v);
    }
}

/// Debounced value: publishes only after `delay` passes with no new input.
pub struct Debounced<T: 'static> {
    inner: Rc<RefCell<GateState<T>>>,
    value: Signal<T>,
}

impl<T: 'static> Clone for Debounced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Clone + 'static> Debounced<T> {
    pub fn new(runtime: &Runtime, initial: T, delay: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GateState::new(runtime, delay))),
            value: Signal::new(initial),
        }
    }

    /// Restarts the quiet period with `v` as the candidate value.
    pub fn set(&self, v: T) {
        let mut st = self.inner.borrow_mut();
        if st.disposed {
            log::debug!("debounce: input after dispose ignored");
            return;
        }
        st.cancel_pending();
        if st.period.is_zero() {
            st.staged = None;
            st.last_emit = Some(st.runtime.now());
            drop(st);
            self.value.set(v);
            return;
        }
        st.staged = Some(v);
        let weak = Rc::downgrade(&self.inner);
        let value = self.value.clone();
        let id = st
            .runtime
            .set_timeout(st.period, move || fire_staged(&weak, &value));
        st.pending = Some(id);
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn value(&self) -> Signal<T> {
        self.value.clone()
    }

    pub fn delay(&self) -> Duration {
        self.inner.borrow().period
    }

    /// Applies to the next input; a pending timer keeps its deadline.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.borrow_mut().period = delay;
    }

    pub fn is_pending(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    /// Drops the pending value without publishing it.
    pub fn cancel(&self) {
        let mut st = self.inner.borrow_mut();
        st.cancel_pending();
        st.staged = None;
    }

    /// Publishes the pending value now.
    pub fn flush(&self) {
        let staged = {
            let mut st = self.inner.borrow_mut();
            st.cancel_pending();
            let staged = st.staged.take();
            if staged.is_some() {
                st.last_emit = Some(st.runtime.now());
            }
            staged
        };
        if let Some(v) = staged {
            self.value.set(v);
        }
    }

    /// Idempotent.
    pub fn dispose(&self) {
        let mut st = self.inner.borrow_mut();
        st.disposed = true;
        st.cancel_pending();
        st.staged = None;
    }
}

/// Throttled value: at most one publish per `interval`.
///
/// Input arriving inside the interval is held back and published once the
/// interval ends; later inputs replace the held value without scheduling
/// more timers.
pub struct Throttled<T: 'static> {
    inner: Rc<RefCell<GateState<T>>>,
    value: Signal<T>,
}

impl<T: 'static> Clone for Throttled<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T: Clone + 'static> Throttled<T> {
    pub fn new(runtime: &Runtime, initial: T, interval: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GateState::new(runtime, interval))),
            value: Signal::new(initial),
        }
    }

    pub fn set(&self, v: T) {
        let mut st = self.inner.borrow_mut();
        if st.disposed {
            log::debug!("throttle: input after dispose ignored");
            return;
        }
        let now = st.runtime.now();

        if st.pending.is_some() {
            st.staged = Some(v);
            return;
        }

        let elapsed = st.last_emit.map(|last| now.saturating_duration_since(last));
        let ready = match elapsed {
            None => true,
            Some(e) => e >= st.period,
        };
        if ready || st.period.is_zero() {
            st.last_emit = Some(now);
            drop(st);
            self.value.set(v);
            return;
        }

        let remaining = st.period - elapsed.unwrap_or_default();
        st.staged = Some(v);
        let weak = Rc::downgrade(&self.inner);
        let value = self.value.clone();
        let id = st
            .runtime
            .set_timeout(remaining, move || fire_staged(&weak, &value));
        st.pending = Some(id);
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn value(&self) -> Signal<T> {
        self.value.clone()
    }

    pub fn interval(&self) -> Duration {
        self.inner.borrow().period
    }

    pub fn set_interval(&self, interval: Duration) {
        self.inner.borrow_mut().period = interval;
    }

    pub fn is_pending(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    pub fn last_emit(&self) -> Option<Instant> {
        self.inner.borrow().last_emit
    }

    pub fn cancel(&self) {
        let mut st = self.inner.borrow_mut();
        st.cancel_pending();
        st.staged = None;
    }

    pub fn flush(&self) {
        let staged = {
            let mut st = self.inner.borrow_mut();
            st.cancel_pending();
            let staged = st.staged.take();
            if staged.is_some() {
                st.last_emit = Some(st.runtime.now());
            }
            staged
        };
        if let Some(v) = staged {
            self.value.set(v);
        }
    }

    /// Idempotent.
    pub fn dispose(&self) {
        let mut st = self.inner.borrow_mut();
        st.disposed = true;
        st.cancel_pending();
        st.staged = None;
    }
}
