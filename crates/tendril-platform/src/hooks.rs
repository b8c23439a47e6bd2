//! `use_*` wrappers binding each platform source to an [`Instance`].
//!
//! [`Instance`]: tendril_core::Instance

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tendril_core::{Cx, Dispose, EventTarget, Signal, use_source};
use web_time::Duration;

use crate::{
    ClipboardBackend, ClipboardOptions, ClipboardState, FormState, GeolocationOptions,
    GeolocationSource, GeolocationState, IdleOptions, IdleSource, IntervalSource, Key, KeyEvent,
    KeyPressSource, MediaQuerySource, Modifiers, OnlineSource, PersistedState, PositionProvider,
    Storage, TimeoutSource, Viewport, WindowSizeSource,
};

/// A value persisted under `key`. The state is created on the first pass and
/// stops following other instances on unmount.
pub fn use_persisted<T>(
    cx: &Cx<'_>,
    storage: &Storage,
    key: &str,
    default: impl FnOnce() -> T,
) -> PersistedState<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    let state = cx.remember(|| PersistedState::new(storage, key, default()));
    cx.mount_effect(|| {
        let state = (*state).clone();
        Dispose::new(move || state.dispose())
    });
    if state.key() != key {
        log::warn!(
            "use_persisted: key changed from `{}` to `{key}`; keeping the first",
            state.key()
        );
    }
    (*state).clone()
}

pub fn use_clipboard(
    cx: &Cx<'_>,
    backend: impl FnOnce() -> Rc<dyn ClipboardBackend>,
    options: ClipboardOptions,
) -> ClipboardState {
    let state = cx.remember(|| ClipboardState::new(cx.runtime(), backend(), options));
    cx.mount_effect(|| {
        let state = (*state).clone();
        Dispose::new(move || state.dispose())
    });
    (*state).clone()
}

pub fn use_geolocation(
    cx: &Cx<'_>,
    provider: &Rc<dyn PositionProvider>,
    options: GeolocationOptions,
) -> Signal<GeolocationState> {
    use_source(cx, GeolocationSource::new(provider.clone(), options))
}

pub fn use_media_query(cx: &Cx<'_>, viewport: Option<&Viewport>, query: &str) -> bool {
    use_source(cx, MediaQuerySource::new(viewport, query)).get()
}

pub fn use_window_size(cx: &Cx<'_>, viewport: Option<&Viewport>) -> (u32, u32) {
    use_source(cx, WindowSizeSource::new(viewport)).get()
}

pub fn use_idle<E: 'static>(cx: &Cx<'_>, target: &EventTarget<E>, options: IdleOptions) -> bool {
    use_source(cx, IdleSource::new(cx.runtime(), target, options)).get()
}

pub fn use_key_press(
    cx: &Cx<'_>,
    target: &EventTarget<KeyEvent>,
    key: Key,
    modifiers: Modifiers,
) -> bool {
    use_source(cx, KeyPressSource::new(target, key, modifiers)).get()
}

pub fn use_online(cx: &Cx<'_>, target: &EventTarget<()>, initially_online: bool) -> bool {
    use_source(cx, OnlineSource::new(target, initially_online)).get()
}

/// Tick count; `None` pauses and a new period restarts the count.
pub fn use_interval(cx: &Cx<'_>, period: Option<Duration>) -> u64 {
    use_source(cx, IntervalSource::new(cx.runtime(), period)).get()
}

pub fn use_timeout(cx: &Cx<'_>, delay: Option<Duration>) -> bool {
    use_source(cx, TimeoutSource::new(cx.runtime(), delay)).get()
}

pub fn use_form(cx: &Cx<'_>, build: impl FnOnce() -> FormState) -> FormState {
    (*cx.remember(build)).clone()
}
