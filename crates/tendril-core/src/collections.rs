use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use crate::Signal;

/// Associative state whose every mutation publishes a fresh map.
///
/// Snapshots are never aliased across mutations: callers holding an older
/// `Rc` keep seeing exactly what they saw, and `Rc::ptr_eq` is a valid change
/// check.
pub struct MapState<K: 'static, V: 'static> {
    initial: Rc<HashMap<K, V>>,
    value: Signal<HashMap<K, V>>,
}

impl<K: 'static, V: 'static> Clone for MapState<K, V> {
    fn clone(&self) -> Self {
        Self {
            initial: self.initial.clone(),
            value: self.value.clone(),
        }
    }
}

impl<K, V> MapState<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    pub fn new(initial: impl IntoIterator<Item = (K, V)>) -> Self {
        let map: HashMap<K, V> = initial.into_iter().collect();
        Self {
            value: Signal::new(map.clone()),
            initial: Rc::new(map),
        }
    }

    fn replace(&self, f: impl FnOnce(&mut HashMap<K, V>)) -> Rc<HashMap<K, V>> {
        let mut next = (*self.value.snapshot()).clone();
        f(&mut next);
        self.value.set(next);
        self.value.snapshot()
    }

    pub fn set(&self, key: K, value: V) -> Rc<HashMap<K, V>> {
        self.replace(|m| {
            m.insert(key, value);
        })
    }

    pub fn set_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> Rc<HashMap<K, V>> {
        self.replace(|m| m.extend(entries))
    }

    pub fn remove(&self, key: &K) -> Rc<HashMap<K, V>> {
        self.replace(|m| {
            m.remove(key);
        })
    }

    pub fn clear(&self) -> Rc<HashMap<K, V>> {
        self.replace(|m| m.clear())
    }

    /// Back to the entries given at construction.
    pub fn reset(&self) -> Rc<HashMap<K, V>> {
        let initial = self.initial.clone();
        self.replace(move |m| *m = (*initial).clone())
    }

    pub fn has(&self, key: &K) -> bool {
        self.value.with(|m| m.contains_key(key))
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.value.with(|m| m.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.value.with(|m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Rc<HashMap<K, V>> {
        self.value.snapshot()
    }

    pub fn signal(&self) -> Signal<HashMap<K, V>> {
        self.value.clone()
    }
}

/// Unique-element state; same snapshot rules as [`MapState`].
pub struct SetState<T: 'static> {
    initial: Rc<HashSet<T>>,
    value: Signal<HashSet<T>>,
}

impl<T: 'static> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            initial: self.initial.clone(),
            value: self.value.clone(),
        }
    }
}

impl<T> SetState<T>
where
    T: Eq + Hash + Clone + 'static,
{
    pub fn new(initial: impl IntoIterator<Item = T>) -> Self {
        let set: HashSet<T> = initial.into_iter().collect();
        Self {
            value: Signal::new(set.clone()),
            initial: Rc::new(set),
        }
    }

    fn replace(&self, f: impl FnOnce(&mut HashSet<T>)) -> Rc<HashSet<T>> {
        let mut next = (*self.value.snapshot()).clone();
        f(&mut next);
        self.value.set(next);
        self.value.snapshot()
    }

    pub fn add(&self, item: T) -> Rc<HashSet<T>> {
        self.replace(|s| {
            s.insert(item);
        })
    }

    pub fn remove(&self, item: &T) -> Rc<HashSet<T>> {
        self.replace(|s| {
            s.remove(item);
        })
    }

    /// Present → removed, absent → added.
    pub fn toggle(&self, item: T) -> Rc<HashSet<T>> {
        self.replace(|s| {
            if !s.remove(&item) {
                s.insert(item);
            }
        })
    }

    pub fn clear(&self) -> Rc<HashSet<T>> {
        self.replace(|s| s.clear())
    }

    pub fn reset(&self) -> Rc<HashSet<T>> {
        let initial = self.initial.clone();
        self.replace(move |s| *s = (*initial).clone())
    }

    pub fn has(&self, item: &T) -> bool {
        self.value.with(|s| s.contains(item))
    }

    pub fn len(&self) -> usize {
        self.value.with(|s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Rc<HashSet<T>> {
        self.value.snapshot()
    }

    pub fn signal(&self) -> Signal<HashSet<T>> {
        self.value.clone()
    }
}
