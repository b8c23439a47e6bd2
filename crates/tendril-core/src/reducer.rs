//! Reducer state with an ordered middleware chain.
//!
//! ```rust
//! use tendril_core::*;
//!
//! let store = ReducerStore::builder(0i32, |s: &i32, a: &i32| s + a)
//!     .middleware_fn("double", |_store, a, next| next.run(a * 2))
//!     .build();
//! store.dispatch(3).unwrap();
//! assert_eq!(*store.state(), 6);
//! ```

use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::{DispatchError, Signal};

/// Nested dispatches (middleware dispatching from inside `handle`) deeper than
/// this fail with [`DispatchError::TooDeep`].
pub const MAX_DISPATCH_DEPTH: usize = 64;

/// One interceptor in the chain.
///
/// A middleware may forward the action with `next.run`, forward a different
/// action, return without calling `next` (the action is dropped), or dispatch
/// further actions through `store`. Returning an error aborts the dispatch
/// before the reducer runs.
pub trait Middleware<S: 'static, A: 'static>: 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handle(
        &self,
        store: &ReducerStore<S, A>,
        action: A,
        next: Next<'_, S, A>,
    ) -> Result<(), DispatchError>;
}

/// Continuation to the rest of the chain.
pub struct Next<'a, S: 'static, A: 'static> {
    store: &'a ReducerStore<S, A>,
    index: usize,
}

impl<S: 'static, A: 'static> Next<'_, S, A> {
    pub fn run(self, action: A) -> Result<(), DispatchError> {
        self.store.run_stage(self.index, action)
    }
}

type ReducerFn<S, A> = Box<dyn Fn(&S, &A) -> S>;
type AfterFn<S, A> = Box<dyn Fn(&A, &S)>;

struct StoreInner<S: 'static, A: 'static> {
    state: Signal<S>,
    reducer: ReducerFn<S, A>,
    middleware: Vec<Rc<dyn Middleware<S, A>>>,
    afterware: Vec<AfterFn<S, A>>,
    depth: Cell<usize>,
}

pub struct ReducerStore<S: 'static, A: 'static> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S: 'static, A: 'static> Clone for ReducerStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: 'static, A: 'static> ReducerStore<S, A> {
    pub fn builder(
        initial: S,
        reducer: impl Fn(&S, &A) -> S + 'static,
    ) -> ReducerStoreBuilder<S, A> {
        ReducerStoreBuilder {
            initial,
            reducer: Box::new(reducer),
            middleware: Vec::new(),
            afterware: Vec::new(),
        }
    }

    pub fn new(initial: S, reducer: impl Fn(&S, &A) -> S + 'static) -> Self {
        Self::builder(initial, reducer).build()
    }

    /// Runs `action` through every middleware in registration order, then the
    /// reducer. State is written only by the reducer stage, so a dispatch
    /// aborted by a middleware leaves it untouched.
    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        let depth = self.inner.depth.get();
        if depth >= MAX_DISPATCH_DEPTH {
            log::warn!("dispatch: nested depth {depth} reached; aborting");
            return Err(DispatchError::TooDeep(MAX_DISPATCH_DEPTH));
        }
        self.inner.depth.set(depth + 1);
        let result = self.run_stage(0, action);
        self.inner.depth.set(depth);
        result
    }

    fn run_stage(&self, index: usize, action: A) -> Result<(), DispatchError> {
        if let Some(m) = self.inner.middleware.get(index).cloned() {
            return m.handle(self, action, Next { store: self, index: index + 1 });
        }

        let current = self.inner.state.snapshot();
        let next = (self.inner.reducer)(&current, &action);
        self.inner.state.set(next);

        let committed = self.inner.state.snapshot();
        for after in &self.inner.afterware {
            after(&action, &committed);
        }
        Ok(())
    }

    /// Current state snapshot.
    pub fn state(&self) -> Rc<S> {
        self.inner.state.snapshot()
    }

    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.get()
    }

    pub fn signal(&self) -> Signal<S> {
        self.inner.state.clone()
    }

    pub fn middleware_names(&self) -> Vec<String> {
        self.inner
            .middleware
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }
}

pub struct ReducerStoreBuilder<S: 'static, A: 'static> {
    initial: S,
    reducer: ReducerFn<S, A>,
    middleware: Vec<Rc<dyn Middleware<S, A>>>,
    afterware: Vec<AfterFn<S, A>>,
}

impl<S: 'static, A: 'static> ReducerStoreBuilder<S, A> {
    /// Appends to the chain; earlier registrations run first.
    pub fn middleware(mut self, m: impl Middleware<S, A>) -> Self {
        self.middleware.push(Rc::new(m));
        self
    }

    pub fn middleware_fn(
        self,
        name: impl Into<String>,
        f: impl Fn(&ReducerStore<S, A>, A, Next<'_, S, A>) -> Result<(), DispatchError> + 'static,
    ) -> Self {
        self.middleware(FnMiddleware {
            name: name.into(),
            f,
        })
    }

    /// Runs after each committed reducer step with the action and new state.
    pub fn afterware(mut self, f: impl Fn(&A, &S) + 'static) -> Self {
        self.afterware.push(Box::new(f));
        self
    }

    pub fn build(self) -> ReducerStore<S, A> {
        ReducerStore {
            inner: Rc::new(StoreInner {
                state: Signal::new(self.initial),
                reducer: self.reducer,
                middleware: self.middleware,
                afterware: self.afterware,
                depth: Cell::new(0),
            }),
        }
    }
}

/// Closure-backed middleware with a display name.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<S, A, F> Middleware<S, A> for FnMiddleware<F>
where
    S: 'static,
    A: 'static,
    F: Fn(&ReducerStore<S, A>, A, Next<'_, S, A>) -> Result<(), DispatchError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(
        &self,
        store: &ReducerStore<S, A>,
        action: A,
        next: Next<'_, S, A>,
    ) -> Result<(), DispatchError> {
        (self.f)(store, action, next)
    }
}

/// Logs every action and the state it produced at debug level.
pub struct LoggingMiddleware {
    label: String,
}

impl LoggingMiddleware {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl<S: Debug + 'static, A: Debug + 'static> Middleware<S, A> for LoggingMiddleware {
    fn name(&self) -> &str {
        &self.label
    }

    fn handle(
        &self,
        store: &ReducerStore<S, A>,
        action: A,
        next: Next<'_, S, A>,
    ) -> Result<(), DispatchError> {
        log::debug!("[{}] action {:?}", self.label, action);
        let result = next.run(action);
        match &result {
            Ok(()) => log::debug!("[{}] state {:?}", self.label, store.state()),
            Err(e) => log::debug!("[{}] aborted: {e}", self.label),
        }
        result
    }
}
