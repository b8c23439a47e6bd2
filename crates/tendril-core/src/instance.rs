use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Dispose, Runtime, Scope};

#[derive(Default)]
struct Composer {
    slots: Vec<Option<Box<dyn Any>>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
}

/// One owning component instance: its remembered slots and the scope every
/// hook registers cleanups on.
///
/// The first [`Instance::compose`] mounts it; [`Instance::unmount`] (or drop)
/// runs every cleanup and drops every slot. Composing again after an unmount
/// mounts a fresh instance state.
pub struct Instance {
    runtime: Runtime,
    composer: RefCell<Composer>,
    scope: RefCell<Scope>,
    mounted: Cell<bool>,
    compositions: Cell<u64>,
}

impl Instance {
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            composer: RefCell::new(Composer::default()),
            scope: RefCell::new(Scope::new()),
            mounted: Cell::new(false),
            compositions: Cell::new(0),
        }
    }

    /// Runs one composition pass. Hooks called inside `f` are matched to their
    /// slots by call order, so they must be called unconditionally.
    pub fn compose<R>(&self, f: impl FnOnce(&Cx<'_>) -> R) -> R {
        let was_mounted = self.mounted.replace(true);
        let stale_scope = self.scope.borrow().is_disposed();
        if !was_mounted && stale_scope {
            log::debug!("instance: remounting after unmount");
            *self.scope.borrow_mut() = Scope::new();
        }
        self.composer.borrow_mut().cursor = 0;
        self.compositions.set(self.compositions.get() + 1);
        f(&Cx { instance: self })
    }

    /// Idempotent.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.scope.borrow().dispose();
        // Drop slot values outside the borrow; their destructors may call back.
        let (slots, keyed) = {
            let mut c = self.composer.borrow_mut();
            c.cursor = 0;
            (
                std::mem::take(&mut c.slots),
                std::mem::take(&mut c.keyed_slots),
            )
        };
        drop(slots);
        drop(keyed);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn compositions(&self) -> u64 {
        self.compositions.get()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn scope(&self) -> Scope {
        self.scope.borrow().clone()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Hook context for one composition pass.
pub struct Cx<'a> {
    instance: &'a Instance,
}

impl Cx<'_> {
    pub fn runtime(&self) -> &Runtime {
        &self.instance.runtime
    }

    pub fn scope(&self) -> Scope {
        self.instance.scope()
    }

    /// Slot-based remember: the Nth call in a pass always gets the Nth slot.
    pub fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Rc<T> {
        let cursor = {
            let mut c = self.instance.composer.borrow_mut();
            let cursor = c.cursor;
            c.cursor += 1;
            cursor
        };

        let existing = {
            let c = self.instance.composer.borrow();
            match c.slots.get(cursor) {
                Some(Some(slot)) => Some(slot.downcast_ref::<Rc<T>>().cloned()),
                _ => None,
            }
        };
        match existing {
            Some(Some(rc)) => return rc,
            Some(None) => log::warn!(
                "remember: slot {} type changed; replacing. \
                 If this is due to conditional composition, prefer remember_with_key.",
                cursor
            ),
            None => {}
        }

        // `init` may itself remember; it must not see a held borrow.
        let rc: Rc<T> = Rc::new(init());
        let mut c = self.instance.composer.borrow_mut();
        if c.slots.len() <= cursor {
            c.slots.resize_with(cursor + 1, || None);
        }
        c.slots[cursor] = Some(Box::new(rc.clone()));
        rc
    }

    /// Key-based remember, stable across conditional branches.
    pub fn remember_with_key<T: 'static>(
        &self,
        key: impl Into<String>,
        init: impl FnOnce() -> T,
    ) -> Rc<T> {
        let key = key.into();
        {
            let c = self.instance.composer.borrow();
            if let Some(existing) = c.keyed_slots.get(&key) {
                if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                    return rc.clone();
                }
                log::warn!(
                    "remember_with_key: key '{}' reused with a different type; replacing.",
                    key
                );
            }
        }

        let rc: Rc<T> = Rc::new(init());
        self.instance
            .composer
            .borrow_mut()
            .keyed_slots
            .insert(key, Box::new(rc.clone()));
        rc
    }

    pub fn remember_state<T: 'static>(&self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        self.remember(|| RefCell::new(init()))
    }

    /// Runs `effect` on the first pass and whenever `key` changes; the
    /// previous cleanup runs before the new effect. The last cleanup runs on
    /// unmount.
    pub fn disposable_effect<K: PartialEq + 'static>(
        &self,
        key: K,
        effect: impl FnOnce() -> Dispose,
    ) {
        struct EffectSlot<K> {
            key: Option<K>,
            cleanup: Option<Dispose>,
        }

        let slot = self.remember(|| {
            RefCell::new(EffectSlot::<K> {
                key: None,
                cleanup: None,
            })
        });

        let first = slot.borrow().key.is_none();
        if first {
            let slot = slot.clone();
            self.scope().add_disposer(move || {
                let cleanup = slot.borrow_mut().cleanup.take();
                if let Some(d) = cleanup {
                    d.run();
                }
            });
        }

        let changed = slot.borrow().key.as_ref() != Some(&key);
        if !changed {
            return;
        }
        let previous = {
            let mut s = slot.borrow_mut();
            s.key = Some(key);
            s.cleanup.take()
        };
        if let Some(d) = previous {
            d.run();
        }
        let d = effect();
        slot.borrow_mut().cleanup = Some(d);
    }

    /// Runs `effect` once per mount.
    pub fn mount_effect(&self, effect: impl FnOnce() -> Dispose) {
        self.disposable_effect((), effect);
    }
}
