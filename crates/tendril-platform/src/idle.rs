use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

use tendril_core::{Dispose, Emitter, EventTarget, Runtime, Source, TimerId};
use web_time::Duration;

pub const DEFAULT_ACTIVITY_EVENTS: &[&str] = &[
    "mousemove",
    "mousedown",
    "keydown",
    "touchstart",
    "wheel",
    "resize",
];

#[derive(Clone, Debug, PartialEq)]
pub struct IdleOptions {
    pub timeout: Duration,
    /// Events that count as activity.
    pub events: Vec<Cow<'static, str>>,
    pub initial_idle: bool,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            events: DEFAULT_ACTIVITY_EVENTS.iter().map(|e| Cow::Borrowed(*e)).collect(),
            initial_idle: false,
        }
    }
}

impl IdleOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_events<I, N>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Cow<'static, str>>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_initial_idle(mut self, idle: bool) -> Self {
        self.initial_idle = idle;
        self
    }
}

/// `true` once `timeout` passes without any activity event.
pub struct IdleSource<E: 'static> {
    runtime: Runtime,
    target: EventTarget<E>,
    options: IdleOptions,
}

impl<E: 'static> IdleSource<E> {
    pub fn new(runtime: &Runtime, target: &EventTarget<E>, options: IdleOptions) -> Self {
        Self {
            runtime: runtime.clone(),
            target: target.clone(),
            options,
        }
    }
}

struct IdleTimer {
    runtime: Runtime,
    timeout: Duration,
    current: Cell<Option<TimerId>>,
    emit: Emitter<bool>,
}

impl IdleTimer {
    fn restart(self: &Rc<Self>) {
        if let Some(id) = self.current.take() {
            self.runtime.cancel(id);
        }
        let emit = self.emit.clone();
        let id = self.runtime.set_timeout(self.timeout, move || {
            log::debug!("idle: no activity, going idle");
            emit.emit_if_changed(true);
        });
        self.current.set(Some(id));
    }

    fn stop(&self) {
        if let Some(id) = self.current.take() {
            self.runtime.cancel(id);
        }
    }
}

impl<E: 'static> Source for IdleSource<E> {
    type Value = bool;
    type Key = (usize, IdleOptions);

    fn key(&self) -> Self::Key {
        (self.target.id(), self.options.clone())
    }

    fn initial(&self) -> bool {
        self.options.initial_idle
    }

    fn attach(&self, emit: Emitter<bool>) -> Dispose {
        let timer = Rc::new(IdleTimer {
            runtime: self.runtime.clone(),
            timeout: self.options.timeout,
            current: Cell::new(None),
            emit: emit.clone(),
        });
        timer.restart();

        let mut handles: Vec<Dispose> = self
            .options
            .events
            .iter()
            .map(|name| {
                let timer = timer.clone();
                let emit = emit.clone();
                self.target.listen(name.clone(), move |_: &E| {
                    emit.emit_if_changed(false);
                    timer.restart();
                })
            })
            .collect();
        handles.push(Dispose::new(move || timer.stop()));
        Dispose::all(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_core::Subscription;

    #[test]
    fn goes_idle_and_wakes_on_activity() {
        let (rt, clock) = Runtime::with_test_clock();
        let window: EventTarget<()> = EventTarget::new();
        let sub = Subscription::new(IdleSource::new(
            &rt,
            &window,
            IdleOptions::default()
                .with_timeout(Duration::from_millis(1000))
                .with_events(["keydown", "mousemove"]),
        ));
        assert!(!sub.get());

        rt.advance(&clock, Duration::from_millis(900));
        window.dispatch("keydown", &());
        rt.advance(&clock, Duration::from_millis(900));
        assert!(!sub.get(), "activity restarts the countdown");

        rt.advance(&clock, Duration::from_millis(100));
        assert!(sub.get());

        window.dispatch("mousemove", &());
        assert!(!sub.get());
        assert_eq!(rt.pending_timers(), 1);
    }

    #[test]
    fn teardown_removes_listeners_and_timer() {
        let (rt, _clock) = Runtime::with_test_clock();
        let window: EventTarget<()> = EventTarget::new();
        let sub = Subscription::new(IdleSource::new(&rt, &window, IdleOptions::default()));
        assert_eq!(window.listener_count(), DEFAULT_ACTIVITY_EVENTS.len());
        assert_eq!(rt.pending_timers(), 1);
        drop(sub);
        assert_eq!(window.listener_count(), 0);
        assert_eq!(rt.pending_timers(), 0);
    }
}
