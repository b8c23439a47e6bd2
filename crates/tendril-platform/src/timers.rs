use tendril_core::{Dispose, Emitter, Runtime, Source};
use web_time::Duration;

/// Counts ticks of a repeating timer. A `None` period pauses it; the count
/// restarts from zero whenever the period changes.
pub struct IntervalSource {
    runtime: Runtime,
    period: Option<Duration>,
}

impl IntervalSource {
    pub fn new(runtime: &Runtime, period: Option<Duration>) -> Self {
        Self {
            runtime: runtime.clone(),
            period,
        }
    }
}

impl Source for IntervalSource {
    type Value = u64;
    type Key = Option<Duration>;

    fn key(&self) -> Self::Key {
        self.period
    }

    fn initial(&self) -> u64 {
        0
    }

    fn attach(&self, emit: Emitter<u64>) -> Dispose {
        let Some(period) = self.period else {
            return Dispose::noop();
        };
        let id = self.runtime.set_interval(period, move || {
            emit.update(|n| n + 1);
        });
        self.runtime.cancel_on_dispose(id)
    }
}

/// Flips to `true` once `delay` has elapsed. `None` never fires.
pub struct TimeoutSource {
    runtime: Runtime,
    delay: Option<Duration>,
}

impl TimeoutSource {
    pub fn new(runtime: &Runtime, delay: Option<Duration>) -> Self {
        Self {
            runtime: runtime.clone(),
            delay,
        }
    }
}

impl Source for TimeoutSource {
    type Value = bool;
    type Key = Option<Duration>;

    fn key(&self) -> Self::Key {
        self.delay
    }

    fn initial(&self) -> bool {
        false
    }

    fn attach(&self, emit: Emitter<bool>) -> Dispose {
        let Some(delay) = self.delay else {
            return Dispose::noop();
        };
        let id = self.runtime.set_timeout(delay, move || {
            emit.emit(true);
        });
        self.runtime.cancel_on_dispose(id)
    }
}
