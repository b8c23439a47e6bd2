//! Composition-scoped wrappers around the core primitives.
//!
//! Each `use_*` function keeps its state in the calling [`Instance`]'s slots
//! and registers its cleanup on the instance scope, so unmounting releases
//! every listener and timer it created.
//!
//! [`Instance`]: crate::Instance

use std::cell::RefCell;
use std::hash::Hash;
use std::ops::RangeInclusive;

use web_time::Duration;

use crate::{
    Cx, Debounced, Dispose, MapState, ReducerStore, SetState, Signal, Source, Subscription,
    Throttled,
};

pub fn use_state<T: 'static>(cx: &Cx<'_>, init: impl FnOnce() -> T) -> Signal<T> {
    (*cx.remember(|| Signal::new(init()))).clone()
}

/// Attaches `source` on the first pass and re-attaches whenever its key
/// changes. Returns the observed value.
pub fn use_source<S: Source>(cx: &Cx<'_>, source: S) -> Signal<S::Value> {
    let slot = cx.remember(|| RefCell::new(None::<Subscription<S>>));

    let mut sub = slot.borrow_mut();
    if let Some(active) = sub.as_mut() {
        active.reconfigure(source);
        return active.value();
    }

    let created = Subscription::new(source);
    let value = created.value();
    *sub = Some(created);
    drop(sub);

    let owned = slot.clone();
    cx.scope().add_disposer(move || {
        let taken = owned.borrow_mut().take();
        if let Some(mut s) = taken {
            s.dispose();
        }
    });
    value
}

/// Trailing-edge debounce of a value that changes between passes.
pub fn use_debounce<T: Clone + PartialEq + 'static>(cx: &Cx<'_>, value: T, delay: Duration) -> T {
    let gate = cx.remember(|| Debounced::new(cx.runtime(), value.clone(), delay));
    let last_input = cx.remember(|| RefCell::new(value.clone()));
    cx.mount_effect(|| {
        let gate = (*gate).clone();
        Dispose::new(move || gate.dispose())
    });

    gate.set_delay(delay);
    if *last_input.borrow() != value {
        *last_input.borrow_mut() = value.clone();
        gate.set(value);
    }
    gate.get()
}

/// Throttle of a value that changes between passes.
pub fn use_throttle<T: Clone + PartialEq + 'static>(
    cx: &Cx<'_>,
    value: T,
    interval: Duration,
) -> T {
    let gate = cx.remember(|| Throttled::new(cx.runtime(), value.clone(), interval));
    let last_input = cx.remember(|| RefCell::new(value.clone()));
    cx.mount_effect(|| {
        let gate = (*gate).clone();
        Dispose::new(move || gate.dispose())
    });

    gate.set_interval(interval);
    if *last_input.borrow() != value {
        *last_input.borrow_mut() = value.clone();
        gate.set(value);
    }
    gate.get()
}

pub fn use_map<K, V, I>(cx: &Cx<'_>, init: impl FnOnce() -> I) -> MapState<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    I: IntoIterator<Item = (K, V)>,
{
    (*cx.remember(|| MapState::new(init()))).clone()
}

pub fn use_set<T, I>(cx: &Cx<'_>, init: impl FnOnce() -> I) -> SetState<T>
where
    T: Eq + Hash + Clone + 'static,
    I: IntoIterator<Item = T>,
{
    (*cx.remember(|| SetState::new(init()))).clone()
}

/// The store is built once per mount; later passes return the same store.
pub fn use_reducer_with_middleware<S: 'static, A: 'static>(
    cx: &Cx<'_>,
    build: impl FnOnce() -> ReducerStore<S, A>,
) -> ReducerStore<S, A> {
    (*cx.remember(build)).clone()
}

/// The value passed on the previous pass, `None` on the first.
pub fn use_previous<T: Clone + 'static>(cx: &Cx<'_>, value: T) -> Option<T> {
    let slot = cx.remember(|| RefCell::new(None::<T>));
    slot.borrow_mut().replace(value)
}

#[derive(Clone)]
pub struct Toggle {
    value: Signal<bool>,
}

impl Toggle {
    pub fn get(&self) -> bool {
        self.value.get()
    }
    pub fn toggle(&self) {
        self.value.update(|v| !v);
    }
    pub fn set(&self, on: bool) {
        self.value.set_if_changed(on);
    }
    pub fn signal(&self) -> Signal<bool> {
        self.value.clone()
    }
}

pub fn use_toggle(cx: &Cx<'_>, initial: bool) -> Toggle {
    Toggle {
        value: use_state(cx, || initial),
    }
}

/// Integer state optionally clamped to a range.
#[derive(Clone)]
pub struct Counter {
    value: Signal<i64>,
    initial: i64,
    bounds: Option<RangeInclusive<i64>>,
}

impl Counter {
    fn clamp(&self, v: i64) -> i64 {
        match &self.bounds {
            // A reversed range is read as its normalised form.
            Some(r) => v.clamp(*r.start().min(r.end()), *r.start().max(r.end())),
            None => v,
        }
    }

    pub fn get(&self) -> i64 {
        self.value.get()
    }
    pub fn increment(&self) {
        self.add(1);
    }
    pub fn decrement(&self) {
        self.add(-1);
    }
    pub fn add(&self, delta: i64) {
        let next = self.clamp(self.value.get().saturating_add(delta));
        self.value.set_if_changed(next);
    }
    pub fn set(&self, v: i64) {
        let v = self.clamp(v);
        self.value.set_if_changed(v);
    }
    pub fn reset(&self) {
        self.set(self.initial);
    }
    pub fn signal(&self) -> Signal<i64> {
        self.value.clone()
    }
}

pub fn use_counter(cx: &Cx<'_>, initial: i64, bounds: Option<RangeInclusive<i64>>) -> Counter {
    if let Some(r) = &bounds
        && r.start() > r.end()
    {
        log::warn!("use_counter: reversed bounds {r:?}; using {}..={}", r.end(), r.start());
    }
    let value = use_state(cx, || initial);
    let counter = Counter {
        value,
        initial,
        bounds,
    };
    // An initial value outside the range is pulled into it on the first pass.
    let clamped = counter.clamp(counter.get());
    counter.value.set_if_changed(clamped);
    counter
}
