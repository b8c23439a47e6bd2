//! Position tracking behind a provider trait.
//!
//! The browser-style API is callback based: a watch delivers positions until
//! cleared and a one-shot request delivers exactly one result. Both are
//! wrapped as [`Source`]s so teardown clears the watch and late results are
//! dropped by the emitter.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tendril_core::{Dispose, Emitter, Runtime, Source, Subscription};
use web_time::Duration;

use crate::GeoError;

new_key_type! {
    pub struct WatchId;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    /// Degrees clockwise from true north.
    pub heading: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = meters;
        self
    }

    pub fn with_timestamp(mut self, ms: u64) -> Self {
        self.timestamp = ms;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    /// Give up on a one-shot request after this long.
    pub timeout: Option<Duration>,
    /// Accept a cached position at most this old.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: None,
            maximum_age: Duration::ZERO,
        }
    }
}

impl GeolocationOptions {
    pub fn with_high_accuracy(mut self, on: bool) -> Self {
        self.high_accuracy = on;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_maximum_age(mut self, age: Duration) -> Self {
        self.maximum_age = age;
        self
    }
}

pub type PositionResult = Result<Position, GeoError>;

pub trait PositionProvider: 'static {
    fn is_supported(&self) -> bool {
        true
    }

    fn watch(
        &self,
        options: &GeolocationOptions,
        callback: Box<dyn Fn(PositionResult)>,
    ) -> Result<WatchId, GeoError>;

    fn clear_watch(&self, id: WatchId);

    fn current_position(
        &self,
        options: &GeolocationOptions,
        callback: Box<dyn FnOnce(PositionResult)>,
    );
}

/// A runtime with no positioning hardware.
pub struct UnsupportedProvider;

impl PositionProvider for UnsupportedProvider {
    fn is_supported(&self) -> bool {
        false
    }

    fn watch(
        &self,
        _options: &GeolocationOptions,
        _callback: Box<dyn Fn(PositionResult)>,
    ) -> Result<WatchId, GeoError> {
        Err(GeoError::Unsupported)
    }

    fn clear_watch(&self, _id: WatchId) {}

    fn current_position(
        &self,
        _options: &GeolocationOptions,
        callback: Box<dyn FnOnce(PositionResult)>,
    ) {
        callback(Err(GeoError::Unsupported));
    }
}

#[derive(Default)]
struct SimulatedInner {
    watches: SlotMap<WatchId, Rc<dyn Fn(PositionResult)>>,
    pending: Vec<Box<dyn FnOnce(PositionResult)>>,
    last: Option<Position>,
}

/// Provider driven by hand, for tests and demos.
///
/// Watches receive every [`push`](Self::push); one-shot requests queue until
/// [`resolve_pending`](Self::resolve_pending).
#[derive(Clone, Default)]
pub struct SimulatedProvider {
    inner: Rc<RefCell<SimulatedInner>>,
    denied: Rc<Cell<bool>>,
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, denied: bool) {
        self.denied.set(denied);
    }

    fn broadcast(&self, result: PositionResult) {
        let callbacks: Vec<_> = self.inner.borrow().watches.values().cloned().collect();
        for cb in callbacks {
            cb(result.clone());
        }
    }

    pub fn push(&self, position: Position) {
        self.inner.borrow_mut().last = Some(position.clone());
        self.broadcast(Ok(position));
    }

    pub fn fail(&self, error: GeoError) {
        self.broadcast(Err(error));
    }

    /// Answers every queued one-shot request with the last pushed position.
    pub fn resolve_pending(&self) -> usize {
        let (pending, last) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.pending), inner.last.clone())
        };
        let n = pending.len();
        for cb in pending {
            let result = if self.denied.get() {
                Err(GeoError::PermissionDenied)
            } else {
                last.clone()
                    .ok_or_else(|| GeoError::PositionUnavailable("no fix yet".into()))
            };
            cb(result);
        }
        n
    }

    pub fn active_watches(&self) -> usize {
        self.inner.borrow().watches.len()
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl PositionProvider for SimulatedProvider {
    fn watch(
        &self,
        _options: &GeolocationOptions,
        callback: Box<dyn Fn(PositionResult)>,
    ) -> Result<WatchId, GeoError> {
        if self.denied.get() {
            return Err(GeoError::PermissionDenied);
        }
        let callback: Rc<dyn Fn(PositionResult)> = Rc::from(callback);
        let (id, last) = {
            let mut inner = self.inner.borrow_mut();
            (inner.watches.insert(callback.clone()), inner.last.clone())
        };
        if let Some(p) = last {
            callback(Ok(p));
        }
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        self.inner.borrow_mut().watches.remove(id);
    }

    fn current_position(
        &self,
        _options: &GeolocationOptions,
        callback: Box<dyn FnOnce(PositionResult)>,
    ) {
        self.inner.borrow_mut().pending.push(callback);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeolocationState {
    pub loading: bool,
    pub position: Option<Position>,
    pub error: Option<GeoError>,
}

impl Default for GeolocationState {
    fn default() -> Self {
        Self {
            loading: true,
            position: None,
            error: None,
        }
    }
}

impl GeolocationState {
    fn unsupported() -> Self {
        Self {
            loading: false,
            position: None,
            error: Some(GeoError::Unsupported),
        }
    }

    /// A fix replaces any earlier error; an error keeps the last fix.
    fn apply(&self, result: PositionResult) -> Self {
        match result {
            Ok(p) => Self {
                loading: false,
                position: Some(p),
                error: None,
            },
            Err(e) => {
                log::debug!("geolocation: {e}");
                Self {
                    loading: false,
                    position: self.position.clone(),
                    error: Some(e),
                }
            }
        }
    }
}

fn provider_id(p: &Rc<dyn PositionProvider>) -> usize {
    Rc::as_ptr(p) as *const () as usize
}

/// Continuous position watch.
pub struct GeolocationSource {
    provider: Rc<dyn PositionProvider>,
    options: GeolocationOptions,
}

impl GeolocationSource {
    pub fn new(provider: Rc<dyn PositionProvider>, options: GeolocationOptions) -> Self {
        Self { provider, options }
    }
}

impl Source for GeolocationSource {
    type Value = GeolocationState;
    type Key = (usize, GeolocationOptions);

    fn key(&self) -> Self::Key {
        (provider_id(&self.provider), self.options.clone())
    }

    fn initial(&self) -> GeolocationState {
        if self.provider.is_supported() {
            GeolocationState::default()
        } else {
            GeolocationState::unsupported()
        }
    }

    fn attach(&self, emit: Emitter<GeolocationState>) -> Dispose {
        if !self.provider.is_supported() {
            return Dispose::noop();
        }
        let sink = emit.clone();
        let watched = self.provider.watch(
            &self.options,
            Box::new(move |result| {
                sink.update(|s| s.apply(result));
            }),
        );
        match watched {
            Ok(id) => {
                let provider = self.provider.clone();
                Dispose::new(move || provider.clear_watch(id))
            }
            Err(e) => {
                emit.update(|s| s.apply(Err(e)));
                Dispose::noop()
            }
        }
    }
}

/// A single position request, with an optional timeout on the runtime.
pub struct CurrentPositionSource {
    runtime: Runtime,
    provider: Rc<dyn PositionProvider>,
    options: GeolocationOptions,
}

impl CurrentPositionSource {
    pub fn new(
        runtime: &Runtime,
        provider: Rc<dyn PositionProvider>,
        options: GeolocationOptions,
    ) -> Self {
        Self {
            runtime: runtime.clone(),
            provider,
            options,
        }
    }
}

impl Source for CurrentPositionSource {
    type Value = GeolocationState;
    type Key = (usize, GeolocationOptions);

    fn key(&self) -> Self::Key {
        (provider_id(&self.provider), self.options.clone())
    }

    fn initial(&self) -> GeolocationState {
        if self.provider.is_supported() {
            GeolocationState::default()
        } else {
            GeolocationState::unsupported()
        }
    }

    fn attach(&self, emit: Emitter<GeolocationState>) -> Dispose {
        if !self.provider.is_supported() {
            return Dispose::noop();
        }

        // Whichever of the answer or the timeout lands first wins.
        let settled = Rc::new(Cell::new(false));

        let timer = self.options.timeout.map(|t| {
            let emit = emit.clone();
            let settled = settled.clone();
            self.runtime.set_timeout(t, move || {
                if !settled.replace(true) {
                    emit.update(|s| s.apply(Err(GeoError::Timeout)));
                }
            })
        });

        let runtime = self.runtime.clone();
        self.provider.current_position(
            &self.options,
            Box::new(move |result| {
                if settled.replace(true) {
                    return;
                }
                if let Some(id) = timer {
                    runtime.cancel(id);
                }
                if !emit.update(|s| s.apply(result)) {
                    log::debug!("geolocation: discarding position for a torn-down request");
                }
            }),
        );

        match timer {
            Some(id) => self.runtime.cancel_on_dispose(id),
            None => Dispose::noop(),
        }
    }
}

/// Starts a one-shot request. Dropping the returned subscription discards
/// whatever arrives later.
pub fn request_position(
    runtime: &Runtime,
    provider: Rc<dyn PositionProvider>,
    options: GeolocationOptions,
) -> Subscription<CurrentPositionSource> {
    Subscription::new(CurrentPositionSource::new(runtime, provider, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (SimulatedProvider, Rc<dyn PositionProvider>) {
        let sim = SimulatedProvider::new();
        let dynp: Rc<dyn PositionProvider> = Rc::new(sim.clone());
        (sim, dynp)
    }

    #[test]
    fn watch_tracks_pushed_positions() {
        let (sim, p) = provider();
        let sub = Subscription::new(GeolocationSource::new(p, GeolocationOptions::default()));
        assert!(sub.get().loading);
        assert_eq!(sim.active_watches(), 1);

        sim.push(Position::new(51.5, -0.12).with_accuracy(10.0));
        let s = sub.get();
        assert!(!s.loading);
        assert_eq!(s.position.as_ref().map(|p| p.latitude), Some(51.5));

        sim.fail(GeoError::PositionUnavailable("tunnel".into()));
        let s = sub.get();
        assert!(s.position.is_some());
        assert!(matches!(s.error, Some(GeoError::PositionUnavailable(_))));

        drop(sub);
        assert_eq!(sim.active_watches(), 0);
    }

    #[test]
    fn unsupported_is_reported_without_attaching() {
        let p: Rc<dyn PositionProvider> = Rc::new(UnsupportedProvider);
        let sub = Subscription::new(GeolocationSource::new(p, GeolocationOptions::default()));
        let s = sub.get();
        assert!(!s.loading);
        assert_eq!(s.error, Some(GeoError::Unsupported));
    }

    #[test]
    fn denied_watch_surfaces_error() {
        let (sim, p) = provider();
        sim.deny(true);
        let sub = Subscription::new(GeolocationSource::new(p, GeolocationOptions::default()));
        assert_eq!(sub.get().error, Some(GeoError::PermissionDenied));
        assert_eq!(sim.active_watches(), 0);
    }

    #[test]
    fn late_one_shot_result_is_discarded() {
        let (rt, _clock) = Runtime::with_test_clock();
        let (sim, p) = provider();
        sim.push(Position::new(1.0, 2.0));

        let req = request_position(&rt, p, GeolocationOptions::default());
        let value = req.value();
        assert_eq!(sim.pending_requests(), 1);
        drop(req);

        assert_eq!(sim.resolve_pending(), 1);
        assert!(value.get().loading);
        assert!(value.get().position.is_none());
    }

    #[test]
    fn one_shot_times_out() {
        let (rt, clock) = Runtime::with_test_clock();
        let (sim, p) = provider();
        let req = request_position(
            &rt,
            p,
            GeolocationOptions::default().with_timeout(Duration::from_millis(500)),
        );
        rt.advance(&clock, Duration::from_millis(500));
        assert_eq!(req.get().error, Some(GeoError::Timeout));

        // The answer after the timeout loses.
        sim.push(Position::new(3.0, 4.0));
        sim.resolve_pending();
        assert!(req.get().position.is_none());
    }

    #[test]
    fn one_shot_answer_cancels_timeout() {
        let (rt, _clock) = Runtime::with_test_clock();
        let (sim, p) = provider();
        sim.push(Position::new(3.0, 4.0));
        let req = request_position(
            &rt,
            p,
            GeolocationOptions::default().with_timeout(Duration::from_secs(5)),
        );
        sim.resolve_pending();
        assert_eq!(req.get().position.map(|p| p.longitude), Some(4.0));
        assert_eq!(rt.pending_timers(), 0);
    }
}
