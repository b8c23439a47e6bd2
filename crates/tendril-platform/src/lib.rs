//! Platform adapters for `tendril-core`.
//!
//! Each module wraps one outside capability as a [`Source`] (or a small state
//! handle) and degrades to a fallback value when the capability is missing:
//!
//! - `storage`: JSON-persisted values that stay in sync across instances.
//! - `clipboard`: copy/read with a self-resetting `copied` flag.
//! - `geolocation`: position watches and one-shot requests.
//! - `media`: viewport environment, media queries, window size.
//! - `idle`, `keyboard`, `network`, `timers`: event and timer driven flags.
//! - `form`: field values with validation.
//!
//! ```rust
//! use tendril_core::{Instance, Runtime};
//! use tendril_platform::*;
//!
//! let (rt, _clock) = Runtime::with_test_clock();
//! let storage = Storage::memory();
//! let viewport = Viewport::default();
//! let app = Instance::new(&rt);
//!
//! let (count, wide) = app.compose(|cx| {
//!     let count = use_persisted(cx, &storage, "visits", || 0u32);
//!     let wide = use_media_query(cx, Some(&viewport), "(min-width: 1024px)");
//!     (count, wide)
//! });
//! count.update(|n| n + 1).unwrap();
//! assert_eq!(read_or(&storage, "visits", 0u32), 1);
//! assert!(wide);
//! ```
//!
//! [`Source`]: tendril_core::Source

pub mod clipboard;
pub mod error;
pub mod form;
pub mod geolocation;
pub mod hooks;
pub mod idle;
pub mod keyboard;
pub mod media;
pub mod network;
pub mod storage;
pub mod timers;

pub use clipboard::*;
pub use error::*;
pub use form::*;
pub use geolocation::*;
pub use hooks::*;
pub use idle::*;
pub use keyboard::*;
pub use media::*;
pub use network::*;
pub use storage::*;
pub use timers::*;
