//! Persisted key-value state with change notifications between instances.
//!
//! A [`Storage`] pairs a raw string backend with an event target that plays
//! the role of the browser's `storage` event: every write through one
//! [`PersistedState`] is announced to every other state bound to the same key.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tendril_core::{Dispose, Emitter, EventTarget, Signal, Source, Subscription};

use crate::StorageError;

/// Event name used for change notifications.
pub const STORAGE_EVENT: &str = "storage";

/// Raw string storage.
pub trait KeyValueStore: 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Stands in for a runtime with no storage at all.
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }
    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// A JSON object on disk, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// A missing file starts empty; an unreadable or malformed one is logged
    /// and also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!(
                    "storage: {} is not a JSON object ({e}); starting empty",
                    path.display()
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("storage: cannot read {} ({e}); starting empty", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        let io = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, text).map_err(io)?;
        std::fs::rename(&tmp, &self.path).map_err(io)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }
    // The in-memory map only changes once the new contents are on disk.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Change notification for one key. `new_value` is `None` on removal.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    /// Writer identity; `0` for writes from outside this process.
    pub origin: u64,
}

/// A storage area: backend plus change notifications.
#[derive(Clone)]
pub struct Storage {
    backend: Rc<dyn KeyValueStore>,
    events: EventTarget<StorageEvent>,
    next_origin: Rc<Cell<u64>>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("listeners", &self.events.listener_count())
            .finish()
    }
}

impl Storage {
    pub fn new(backend: impl KeyValueStore) -> Self {
        Self {
            backend: Rc::new(backend),
            events: EventTarget::new(),
            next_origin: Rc::new(Cell::new(1)),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn events(&self) -> &EventTarget<StorageEvent> {
        &self.events
    }

    fn id(&self) -> usize {
        self.events.id()
    }

    fn new_origin(&self) -> u64 {
        let o = self.next_origin.get();
        self.next_origin.set(o + 1);
        o
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key)
    }

    fn write(&self, origin: u64, key: &str, raw: Option<&str>) -> Result<(), StorageError> {
        match raw {
            Some(v) => self.backend.set(key, v)?,
            None => self.backend.remove(key)?,
        }
        self.events.dispatch(
            STORAGE_EVENT,
            &StorageEvent {
                key: key.to_string(),
                new_value: raw.map(str::to_string),
                origin,
            },
        );
        Ok(())
    }

    /// A write made by someone else (another process or tab sharing the
    /// backend). Every bound state is notified.
    pub fn set_external(&self, key: &str, raw: Option<&str>) -> Result<(), StorageError> {
        self.write(0, key, raw)
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("storage: malformed value under `{key}` ignored: {e}");
            None
        }
    }
}

/// Reads `key`, falling back to `default` when absent, malformed, or when
/// the storage itself is unavailable.
pub fn read_or<T: DeserializeOwned>(storage: &Storage, key: &str, default: T) -> T {
    match storage.get_raw(key) {
        Ok(Some(raw)) => decode(key, &raw).unwrap_or(default),
        Ok(None) => default,
        Err(e) => {
            log::warn!("storage: read of `{key}` failed: {e}");
            default
        }
    }
}

/// Source following one key of a [`Storage`].
pub struct PersistedSource<T> {
    storage: Storage,
    key: String,
    origin: u64,
    default: T,
}

impl<T> Source for PersistedSource<T>
where
    T: Clone + DeserializeOwned + 'static,
{
    type Value = T;
    type Key = (usize, String);

    fn key(&self) -> Self::Key {
        (self.storage.id(), self.key.clone())
    }

    fn initial(&self) -> T {
        read_or(&self.storage, &self.key, self.default.clone())
    }

    fn attach(&self, emit: Emitter<T>) -> Dispose {
        let key = self.key.clone();
        let origin = self.origin;
        let default = self.default.clone();
        self.storage.events.listen(STORAGE_EVENT, move |ev: &StorageEvent| {
            if ev.key != key || ev.origin == origin {
                return;
            }
            match &ev.new_value {
                Some(raw) => {
                    if let Some(v) = decode::<T>(&key, raw) {
                        emit.emit(v);
                    }
                }
                None => {
                    emit.emit(default.clone());
                }
            }
        })
    }
}

struct PersistedInner<T: Clone + DeserializeOwned + 'static> {
    storage: Storage,
    key: String,
    origin: u64,
    default: T,
    sub: RefCell<Subscription<PersistedSource<T>>>,
}

/// A value persisted under one key and kept in sync with other instances.
pub struct PersistedState<T: Clone + DeserializeOwned + 'static> {
    inner: Rc<PersistedInner<T>>,
}

impl<T: Clone + DeserializeOwned + 'static> Clone for PersistedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PersistedState<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    pub fn new(storage: &Storage, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let origin = storage.new_origin();
        let sub = Subscription::new(PersistedSource {
            storage: storage.clone(),
            key: key.clone(),
            origin,
            default: default.clone(),
        });
        Self {
            inner: Rc::new(PersistedInner {
                storage: storage.clone(),
                key,
                origin,
                default,
                sub: RefCell::new(sub),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn get(&self) -> T {
        self.inner.sub.borrow().get()
    }

    pub fn value(&self) -> Signal<T> {
        self.inner.sub.borrow().value()
    }

    /// Serializes and stores `v`, then publishes it locally and to the other
    /// instances. On failure nothing changes and the error is returned.
    pub fn set(&self, v: T) -> Result<(), StorageError> {
        let inner = &self.inner;
        let raw = serde_json::to_string(&v).map_err(|source| StorageError::Encode {
            key: inner.key.clone(),
            source,
        })?;
        if let Err(e) = inner.storage.write(inner.origin, &inner.key, Some(&raw)) {
            log::warn!("storage: write of `{}` failed: {e}", inner.key);
            return Err(e);
        }
        self.value().set(v);
        Ok(())
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), StorageError> {
        let next = f(&self.get());
        self.set(next)
    }

    /// Deletes the key and falls back to the default.
    pub fn remove(&self) -> Result<(), StorageError> {
        let inner = &self.inner;
        inner.storage.write(inner.origin, &inner.key, None)?;
        self.value().set(inner.default.clone());
        Ok(())
    }

    /// Stops following other instances. Idempotent.
    pub fn dispose(&self) {
        self.inner.sub.borrow_mut().dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font_size: u32,
        recent: Vec<String>,
    }

    fn prefs() -> Prefs {
        Prefs {
            theme: "dark".into(),
            font_size: 14,
            recent: vec!["a.txt".into(), "b.txt".into()],
        }
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let storage = Storage::new(FileStore::open(&path));
        let state = PersistedState::new(&storage, "prefs", Prefs {
            theme: "light".into(),
            font_size: 12,
            recent: vec![],
        });
        state.set(prefs()).unwrap();
        drop(state);
        drop(storage);

        let reopened = Storage::new(FileStore::open(&path));
        let state = PersistedState::new(&reopened, "prefs", Prefs {
            theme: "light".into(),
            font_size: 12,
            recent: vec![],
        });
        assert_eq!(state.get(), prefs());
    }

    #[test]
    fn failed_file_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("prefs.json");
        std::fs::write(&good, r#"{"k":"1"}"#).unwrap();
        let store = FileStore::open(&good);
        // Point a second store at a directory that does not exist.
        let missing = dir.path().join("missing_dir").join("s.json");
        let broken = Storage::new(FileStore::open(&missing));

        let a = PersistedState::new(&broken, "k", 1u8);
        assert!(matches!(a.set(2), Err(StorageError::Io { .. })));
        assert_eq!(a.get(), 1);
        assert_eq!(PersistedState::new(&broken, "k", 1u8).get(), 1);
        assert_eq!(read_or(&broken, "k", 1u8), 1);

        broken.set_external("other", Some("5")).unwrap_err();
        assert_eq!(broken.get_raw("other").unwrap(), None);

        // A failed removal keeps the entry too.
        std::fs::create_dir(good.with_extension("tmp")).unwrap();
        assert!(store.remove("k").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        let storage = Storage::new(FileStore::open(&path));
        assert_eq!(read_or(&storage, "anything", 7u8), 7);
    }

    #[test]
    fn instances_on_one_key_stay_in_sync() {
        let storage = Storage::memory();
        let a = PersistedState::new(&storage, "count", 0i32);
        let b = PersistedState::new(&storage, "count", 0i32);
        let other = PersistedState::new(&storage, "other", 0i32);

        a.set(5).unwrap();
        assert_eq!(b.get(), 5);
        assert_eq!(other.get(), 0);

        let v = a.value().version();
        b.update(|n| n + 1).unwrap();
        assert_eq!(a.get(), 6);
        assert_eq!(a.value().version(), v + 1);

        b.remove().unwrap();
        assert_eq!(a.get(), 0);
        assert_eq!(storage.get_raw("count").unwrap(), None);
    }

    #[test]
    fn malformed_values_fall_back_or_are_ignored() {
        let storage = Storage::memory();
        storage.set_external("n", Some("{oops")).unwrap();
        let state = PersistedState::new(&storage, "n", 3u32);
        assert_eq!(state.get(), 3);

        storage.set_external("n", Some("10")).unwrap();
        assert_eq!(state.get(), 10);
        storage.set_external("n", Some("\"ten\"")).unwrap();
        assert_eq!(state.get(), 10);
    }

    #[test]
    fn unavailable_storage_keeps_default_and_reports_writes() {
        let storage = Storage::new(UnavailableStore);
        let state = PersistedState::new(&storage, "k", String::from("fallback"));
        assert_eq!(state.get(), "fallback");
        assert!(matches!(state.set("new".into()), Err(StorageError::Unavailable)));
        assert_eq!(state.get(), "fallback");
    }

    #[test]
    fn dispose_stops_following() {
        let storage = Storage::memory();
        let state = PersistedState::new(&storage, "k", 1u8);
        assert_eq!(storage.events().listener_count(), 1);
        state.dispose();
        state.dispose();
        assert_eq!(storage.events().listener_count(), 0);
        storage.set_external("k", Some("9")).unwrap();
        assert_eq!(state.get(), 1);
    }
}
