use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tendril_core::{Runtime, Signal, TimerId};
use web_time::Duration;

use crate::ClipboardError;

pub trait ClipboardBackend: 'static {
    fn read_text(&self) -> Result<String, ClipboardError>;
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process clipboard; can be told to refuse access.
#[derive(Default)]
pub struct MemoryClipboard {
    text: RefCell<Option<String>>,
    denied: Cell<bool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, denied: bool) {
        self.denied.set(denied);
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        if self.denied.get() {
            return Err(ClipboardError::PermissionDenied);
        }
        self.text.borrow().clone().ok_or(ClipboardError::Empty)
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.denied.get() {
            return Err(ClipboardError::PermissionDenied);
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

pub struct UnavailableClipboard;

impl ClipboardBackend for UnavailableClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

/// The desktop clipboard via `arboard`.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    clipboard: parking_lot::Mutex<Option<arboard::Clipboard>>,
}

#[cfg(feature = "system-clipboard")]
impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                log::warn!("clipboard: system clipboard unavailable: {e}");
                None
            }
        };
        Self {
            clipboard: parking_lot::Mutex::new(clipboard),
        }
    }

    fn map_err(e: arboard::Error) -> ClipboardError {
        match e {
            arboard::Error::ContentNotAvailable => ClipboardError::Empty,
            arboard::Error::ClipboardNotSupported => ClipboardError::Unavailable,
            other => ClipboardError::Backend(other.to_string()),
        }
    }
}

#[cfg(feature = "system-clipboard")]
impl ClipboardBackend for SystemClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        let mut guard = self.clipboard.lock();
        let cb = guard.as_mut().ok_or(ClipboardError::Unavailable)?;
        cb.get_text().map_err(Self::map_err)
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self.clipboard.lock();
        let cb = guard.as_mut().ok_or(ClipboardError::Unavailable)?;
        cb.set_text(text.to_owned()).map_err(Self::map_err)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipboardOptions {
    /// How long `copied` stays set after a successful copy. Zero keeps it set
    /// until the next copy.
    pub reset_after: Duration,
}

impl Default for ClipboardOptions {
    fn default() -> Self {
        Self {
            reset_after: Duration::from_millis(2000),
        }
    }
}

impl ClipboardOptions {
    pub fn with_reset_after(mut self, d: Duration) -> Self {
        self.reset_after = d;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipboardSnapshot {
    pub copied: bool,
    /// Last text successfully copied or read.
    pub text: Option<String>,
    pub last_error: Option<ClipboardError>,
}

struct ClipboardInner {
    backend: Rc<dyn ClipboardBackend>,
    runtime: Runtime,
    options: ClipboardOptions,
    value: Signal<ClipboardSnapshot>,
    reset_timer: Cell<Option<TimerId>>,
    live: Rc<Cell<bool>>,
}

impl ClipboardInner {
    fn cancel_reset(&self) {
        if let Some(id) = self.reset_timer.take() {
            self.runtime.cancel(id);
        }
    }
}

impl Drop for ClipboardInner {
    fn drop(&mut self) {
        self.live.set(false);
        self.cancel_reset();
    }
}

/// Copy/read state with a self-clearing `copied` flag.
#[derive(Clone)]
pub struct ClipboardState {
    inner: Rc<ClipboardInner>,
}

impl ClipboardState {
    pub fn new(
        runtime: &Runtime,
        backend: Rc<dyn ClipboardBackend>,
        options: ClipboardOptions,
    ) -> Self {
        Self {
            inner: Rc::new(ClipboardInner {
                backend,
                runtime: runtime.clone(),
                options,
                value: Signal::new(ClipboardSnapshot::default()),
                reset_timer: Cell::new(None),
                live: Rc::new(Cell::new(true)),
            }),
        }
    }

    /// Returns whether the text reached the clipboard. Failures are logged
    /// and recorded in the snapshot, never raised.
    pub fn copy(&self, text: impl Into<String>) -> bool {
        let inner = &self.inner;
        if !inner.live.get() {
            return false;
        }
        let text = text.into();
        inner.cancel_reset();

        match inner.backend.write_text(&text) {
            Ok(()) => {
                inner.value.set(ClipboardSnapshot {
                    copied: true,
                    text: Some(text),
                    last_error: None,
                });
                if !inner.options.reset_after.is_zero() {
                    let value = inner.value.clone();
                    let live = inner.live.clone();
                    let id = inner.runtime.set_timeout(inner.options.reset_after, move || {
                        if live.get() {
                            value.update(|s| ClipboardSnapshot {
                                copied: false,
                                ..s.clone()
                            });
                        }
                    });
                    inner.reset_timer.set(Some(id));
                }
                true
            }
            Err(e) => {
                log::warn!("clipboard: copy failed: {e}");
                inner.value.update(|s| ClipboardSnapshot {
                    copied: false,
                    text: s.text.clone(),
                    last_error: Some(e),
                });
                false
            }
        }
    }

    pub fn read(&self) -> Result<String, ClipboardError> {
        let inner = &self.inner;
        let result = inner.backend.read_text();
        if !inner.live.get() {
            return result;
        }
        match &result {
            Ok(text) => inner.value.update(|s| ClipboardSnapshot {
                text: Some(text.clone()),
                last_error: None,
                ..s.clone()
            }),
            Err(e) => {
                log::warn!("clipboard: read failed: {e}");
                inner.value.update(|s| ClipboardSnapshot {
                    last_error: Some(e.clone()),
                    ..s.clone()
                });
            }
        }
        result
    }

    pub fn copied(&self) -> bool {
        self.inner.value.with(|s| s.copied)
    }

    pub fn snapshot(&self) -> ClipboardSnapshot {
        self.inner.value.get()
    }

    pub fn value(&self) -> Signal<ClipboardSnapshot> {
        self.inner.value.clone()
    }

    /// Cancels the pending reset and ignores later calls. Idempotent.
    pub fn dispose(&self) {
        self.inner.live.set(false);
        self.inner.cancel_reset();
    }
}
