use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::Dispose;

new_key_type! {
    pub struct ListenerId;
}

struct Listener<E> {
    event: Cow<'static, str>,
    seq: u64,
    f: Rc<dyn Fn(&E)>,
}

struct TargetInner<E> {
    listeners: SlotMap<ListenerId, Listener<E>>,
    next_seq: u64,
}

/// A named-event dispatcher standing in for a host object that emits events
/// (a window, a document, a storage area).
///
/// Listeners for the same event fire in registration order.
pub struct EventTarget<E: 'static> {
    inner: Rc<RefCell<TargetInner<E>>>,
}

impl<E: 'static> Clone for EventTarget<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: 'static> Default for EventTarget<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventTarget<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TargetInner {
                listeners: SlotMap::with_key(),
                next_seq: 0,
            })),
        }
    }

    pub fn add_listener(
        &self,
        event: impl Into<Cow<'static, str>>,
        f: impl Fn(&E) + 'static,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.listeners.insert(Listener {
            event: event.into(),
            seq,
            f: Rc::new(f),
        })
    }

    /// Removing twice is a no-op.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.borrow_mut().listeners.remove(id).is_some()
    }

    /// Registers `f` and returns the matching deregistration. The handle holds
    /// the target weakly, so a dropped target is not kept alive by it.
    pub fn listen(&self, event: impl Into<Cow<'static, str>>, f: impl Fn(&E) + 'static) -> Dispose {
        let id = self.add_listener(event, f);
        let weak: Weak<RefCell<TargetInner<E>>> = Rc::downgrade(&self.inner);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.remove(id);
            }
        })
    }

    /// Delivers `payload` to every listener of `event`. Returns how many ran.
    pub fn dispatch(&self, event: &str, payload: &E) -> usize {
        let mut matching: Vec<(u64, ListenerId, Rc<dyn Fn(&E)>)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, l)| l.event == event)
            .map(|(id, l)| (l.seq, id, l.f.clone()))
            .collect();
        matching.sort_by_key(|(seq, _, _)| *seq);

        let mut delivered = 0;
        for (_, id, f) in matching {
            // A listener removed by an earlier one in this dispatch is skipped.
            if !self.inner.borrow().listeners.contains_key(id) {
                continue;
            }
            f(payload);
            delivered += 1;
        }
        delivered
    }

    /// Identity of the underlying target, shared by clones.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn listener_count_for(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .values()
            .filter(|l| l.event == event)
            .count()
    }
}
