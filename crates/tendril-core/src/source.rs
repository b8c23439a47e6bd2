//! The subscription primitive: one attachment per source configuration, the
//! latest value exposed as a [`Signal`], and guaranteed detachment.

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::{Dispose, EventTarget, Signal};

/// An external producer of change notifications.
///
/// `attach` registers whatever listeners the source needs and returns the
/// single cleanup that removes all of them. Sources must not panic when the
/// capability behind them is missing; they publish a fallback instead.
pub trait Source: 'static {
    type Value: Clone + 'static;
    /// Identity of the configuration. A different key means re-attach.
    type Key: PartialEq + Clone + Debug + 'static;

    fn key(&self) -> Self::Key;

    /// Value published before the first notification.
    fn initial(&self) -> Self::Value;

    fn attach(&self, emit: Emitter<Self::Value>) -> Dispose;
}

/// Publishing end handed to [`Source::attach`].
///
/// Once the attachment is torn down every emit is discarded, including emits
/// from async completions that were in flight at teardown.
pub struct Emitter<T: 'static> {
    signal: Signal<T>,
    live: Rc<Cell<bool>>,
}

impl<T: 'static> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            live: self.live.clone(),
        }
    }
}

impl<T: 'static> Emitter<T> {
    /// An emitter that stays live until the returned flag is cleared.
    pub fn new(signal: Signal<T>) -> (Self, Rc<Cell<bool>>) {
        let live = Rc::new(Cell::new(true));
        (
            Self {
                signal,
                live: live.clone(),
            },
            live,
        )
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Returns `false` when the value was discarded.
    pub fn emit(&self, v: T) -> bool {
        if !self.live.get() {
            log::debug!("emitter: dropping update after teardown");
            return false;
        }
        self.signal.set(v);
        true
    }

    /// Like [`Emitter::emit`], skipping writes equal to the current value.
    pub fn emit_if_changed(&self, v: T) -> bool
    where
        T: PartialEq,
    {
        self.live.get() && self.signal.set_if_changed(v)
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        if !self.live.get() {
            return false;
        }
        self.signal.update(f);
        true
    }

    pub fn current(&self) -> Rc<T> {
        self.signal.snapshot()
    }
}

struct Attachment {
    dispose: Dispose,
    live: Rc<Cell<bool>>,
}

impl Attachment {
    fn detach(self) {
        self.live.set(false);
        self.dispose.run();
    }
}

/// One active attachment to a [`Source`], owned by a single hook instance.
pub struct Subscription<S: Source> {
    key: S::Key,
    value: Signal<S::Value>,
    active: Option<Attachment>,
}

impl<S: Source> Subscription<S> {
    /// Activates immediately.
    pub fn new(source: S) -> Self {
        let value = Signal::new(source.initial());
        let mut sub = Self {
            key: source.key(),
            value,
            active: None,
        };
        sub.attach(&source);
        sub
    }

    fn attach(&mut self, source: &S) {
        let (emitter, live) = Emitter::new(self.value.clone());
        log::debug!("subscription: attach {:?}", self.key);
        let dispose = source.attach(emitter);
        self.active = Some(Attachment { dispose, live });
    }

    fn detach(&mut self) {
        if let Some(a) = self.active.take() {
            log::debug!("subscription: detach {:?}", self.key);
            a.detach();
        }
    }

    /// No-op for an equal key. Otherwise the old attachment is fully torn
    /// down before the new source attaches, and the value restarts from the
    /// new source's `initial()`.
    pub fn reconfigure(&mut self, source: S) -> bool {
        let key = source.key();
        if key == self.key && self.active.is_some() {
            return false;
        }
        self.detach();
        self.key = key;
        self.value.set(source.initial());
        self.attach(&source);
        true
    }

    pub fn key(&self) -> &S::Key {
        &self.key
    }

    pub fn get(&self) -> S::Value {
        self.value.get()
    }

    /// Read handle to the observed value.
    pub fn value(&self) -> Signal<S::Value> {
        self.value.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Idempotent.
    pub fn dispose(&mut self) {
        self.detach();
    }
}

impl<S: Source> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Folds events named in `events` from an [`EventTarget`] into a value.
///
/// The fold returns `None` to leave the value untouched.
pub struct EventSource<E: 'static, T: 'static> {
    target: EventTarget<E>,
    events: SmallVec<[Cow<'static, str>; 4]>,
    initial: T,
    fold: Rc<dyn Fn(&T, &str, &E) -> Option<T>>,
}

impl<E: 'static, T: Clone + 'static> EventSource<E, T> {
    pub fn new<I, N>(
        target: &EventTarget<E>,
        events: I,
        initial: T,
        fold: impl Fn(&T, &str, &E) -> Option<T> + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Cow<'static, str>>,
    {
        Self {
            target: target.clone(),
            events: events.into_iter().map(Into::into).collect(),
            initial,
            fold: Rc::new(fold),
        }
    }
}

impl<E: 'static, T: Clone + 'static> Source for EventSource<E, T> {
    type Value = T;
    type Key = (usize, Vec<Cow<'static, str>>);

    fn key(&self) -> Self::Key {
        (self.target.id(), self.events.to_vec())
    }

    fn initial(&self) -> T {
        self.initial.clone()
    }

    fn attach(&self, emit: Emitter<T>) -> Dispose {
        let handles = self.events.iter().map(|name| {
            let emit = emit.clone();
            let fold = self.fold.clone();
            let event = name.clone();
            self.target.listen(name.clone(), move |payload: &E| {
                let current = emit.current();
                if let Some(next) = fold(&current, &event, payload) {
                    emit.emit(next);
                }
            })
        });
        Dispose::all(handles.collect::<Vec<_>>())
    }
}
