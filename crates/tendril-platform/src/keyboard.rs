use bitflags::bitflags;
use tendril_core::{Dispose, Emitter, EventSource, EventTarget, Source};

pub const KEY_DOWN: &str = "keydown";
pub const KEY_UP: &str = "keyup";
/// Focus loss; every key counts as released.
pub const BLUR: &str = "blur";

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3; // Cmd on Mac, Win key on Windows
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
    F(u8), // F1-F12
}

impl Key {
    /// Letters compare without case so Shift does not change the key.
    pub fn matches(&self, other: &Key) -> bool {
        match (self, other) {
            (Key::Character(a), Key::Character(b)) => a.to_lowercase().eq(b.to_lowercase()),
            (a, b) => a == b,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            is_repeat: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }
}

/// Whether `key` is held, optionally only while `modifiers` are also held.
pub struct KeyPressSource {
    target: EventTarget<KeyEvent>,
    key: Key,
    modifiers: Modifiers,
}

impl KeyPressSource {
    pub fn new(target: &EventTarget<KeyEvent>, key: Key, modifiers: Modifiers) -> Self {
        Self {
            target: target.clone(),
            key,
            modifiers,
        }
    }

    fn events(&self) -> EventSource<KeyEvent, bool> {
        let key = self.key.clone();
        let required = self.modifiers;
        EventSource::new(
            &self.target,
            [KEY_DOWN, KEY_UP, BLUR],
            false,
            move |pressed, name, ev: &KeyEvent| match name {
                KEY_DOWN if key.matches(&ev.key) && ev.modifiers.contains(required) => {
                    (!*pressed).then_some(true)
                }
                KEY_UP if key.matches(&ev.key) => pressed.then_some(false),
                BLUR => pressed.then_some(false),
                _ => None,
            },
        )
    }
}

impl Source for KeyPressSource {
    type Value = bool;
    type Key = (usize, Key, Modifiers);

    fn key(&self) -> Self::Key {
        (self.target.id(), self.key.clone(), self.modifiers)
    }

    fn initial(&self) -> bool {
        false
    }

    fn attach(&self, emit: Emitter<bool>) -> Dispose {
        self.events().attach(emit)
    }
}
