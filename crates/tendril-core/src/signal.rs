use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle for a [`Signal::subscribe`] registration.
    pub struct SubId;
}

/// Observable snapshot holder. Writes replace the value, then notify every
/// subscriber with a reference to the committed value.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: Rc<T>,
    version: u64,
    subs: SlotMap<SubId, Rc<dyn Fn(&T)>>,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subs.len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value: Rc::new(value),
            version: 0,
            subs: SlotMap::with_key(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.0.borrow().value).clone()
    }

    /// The current snapshot, shared rather than cloned.
    pub fn snapshot(&self) -> Rc<T> {
        self.0.borrow().value.clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.snapshot();
        f(&value)
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.0.borrow().version
    }

    pub fn set(&self, v: T) {
        {
            let mut inner = self.0.borrow_mut();
            inner.value = Rc::new(v);
            inner.version += 1;
        }
        self.notify();
    }

    /// Writes only when the new value differs. Returns whether it wrote.
    pub fn set_if_changed(&self, v: T) -> bool
    where
        T: PartialEq,
    {
        if *self.0.borrow().value == v {
            return false;
        }
        self.set(v);
        true
    }

    /// Replaces the value with one computed from the current snapshot.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.snapshot();
        self.set(f(&current));
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    /// Idempotent; unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.0.borrow_mut().subs.remove(id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }

    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity shared by clones of this signal.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    fn notify(&self) {
        // Snapshot the callbacks and the value so subscribers may read, write
        // or unsubscribe without hitting an outstanding borrow.
        let (value, subs) = {
            let inner = self.0.borrow();
            let subs: Vec<Rc<dyn Fn(&T)>> = inner.subs.values().cloned().collect();
            (inner.value.clone(), subs)
        };
        for s in subs {
            s(&value);
        }
    }
}

pub fn signal<T: 'static>(t: T) -> Signal<T> {
    Signal::new(t)
}
