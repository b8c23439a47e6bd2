use std::cell::RefCell;
use std::rc::Rc;

/// Cleanup handle returned by every attach/subscribe call.
///
/// Clones share the same cleanup, and the cleanup runs at most once no matter
/// how many clones call [`Dispose::run`].
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A handle with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs every handle in order as one cleanup.
    pub fn all(handles: impl IntoIterator<Item = Dispose>) -> Self {
        let handles: Vec<Dispose> = handles.into_iter().collect();
        Dispose::new(move || {
            for h in handles {
                h.run();
            }
        })
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        // Take first so the cleanup may drop or re-enter this handle.
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl std::fmt::Debug for Dispose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispose")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Helper to register cleanup inside an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}
