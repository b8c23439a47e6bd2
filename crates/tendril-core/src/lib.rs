//! # Signals, sources, and hooks
//!
//! Tendril turns external change notifications into local snapshots. There
//! are a few pieces:
//!
//! - `Signal<T>`: an observable snapshot holder.
//! - `Source` / `Subscription`: attach to an external producer once per
//!   configuration, detach exactly once.
//! - `Runtime`: the clock and timer queue everything time-based runs on.
//! - `Instance` / `Cx`: a component instance with remembered slots and a
//!   cleanup scope, driven by `use_*` hooks.
//!
//! ## Signals
//!
//! ```rust
//! use tendril_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| v + 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Writes replace the value wholesale; `snapshot()` hands out the shared
//! `Rc<T>` so callers never see a half-updated structure.
//!
//! ## Sources
//!
//! ```rust
//! use tendril_core::*;
//!
//! let window: EventTarget<u32> = EventTarget::new();
//! let clicks = Subscription::new(EventSource::new(
//!     &window,
//!     ["click"],
//!     0u32,
//!     |count, _name, _ev| Some(count + 1),
//! ));
//! window.dispatch("click", &0);
//! assert_eq!(clicks.get(), 1);
//! drop(clicks);
//! assert_eq!(window.listener_count(), 0);
//! ```
//!
//! ## Time
//!
//! Timers never fire on their own: the host calls `Runtime::run_due` from its
//! event loop. Tests use `Runtime::with_test_clock` and `Runtime::advance`.
//!
//! ```rust
//! use tendril_core::*;
//! use web_time::Duration;
//!
//! let (rt, clock) = Runtime::with_test_clock();
//! let search = Debounced::new(&rt, String::new(), Duration::from_millis(300));
//! search.set("ru".into());
//! search.set("rust".into());
//! rt.advance(&clock, Duration::from_millis(300));
//! assert_eq!(search.get(), "rust");
//! ```
//!
//! ## Hooks
//!
//! ```rust
//! use tendril_core::*;
//! use web_time::Duration;
//!
//! let (rt, _clock) = Runtime::with_test_clock();
//! let instance = Instance::new(&rt);
//! let shown = instance.compose(|cx| {
//!     let tags = use_set(cx, || ["a"]);
//!     tags.toggle("b");
//!     use_debounce(cx, tags.len(), Duration::from_millis(100))
//! });
//! assert_eq!(shown, 2);
//! instance.unmount();
//! assert_eq!(rt.pending_timers(), 0);
//! ```

pub mod clock;
pub mod collections;
pub mod effects;
pub mod error;
pub mod events;
pub mod gate;
pub mod hooks;
pub mod instance;
pub mod reducer;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod source;
mod tests;

pub use clock::*;
pub use collections::*;
pub use effects::*;
pub use error::*;
pub use events::*;
pub use gate::*;
pub use hooks::*;
pub use instance::*;
pub use reducer::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
pub use source::*;
