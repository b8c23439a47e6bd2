//! Form field state with per-field validation.
//!
//! ```rust
//! use tendril_platform::form::{FormState, validators};
//!
//! let form = FormState::builder()
//!     .field("email", "")
//!     .validator("email", validators::required())
//!     .validator("email", validators::email())
//!     .build();
//!
//! assert!(!form.submit(|_| {}));
//! assert_eq!(form.error("email").as_deref(), Some("required"));
//!
//! form.set_field("email", "ada@example.com");
//! assert!(form.submit(|values| assert_eq!(values["email"], "ada@example.com")));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tendril_core::Signal;

pub type Values = BTreeMap<String, String>;

/// Returns an error message, or `None` when the field is fine. Gets the
/// field's value and every value in the form.
pub type Validator = Rc<dyn Fn(&str, &Values) -> Option<String>>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub values: Values,
    /// First failing message per field.
    pub errors: BTreeMap<String, String>,
    pub touched: BTreeSet<String>,
    pub submit_count: u32,
}

#[derive(Default)]
pub struct FormBuilder {
    initial: Values,
    validators: BTreeMap<String, Vec<Validator>>,
    validate_on_change: bool,
}

impl FormBuilder {
    pub fn field(mut self, name: impl Into<String>, initial: impl Into<String>) -> Self {
        self.initial.insert(name.into(), initial.into());
        self
    }

    pub fn validator(mut self, name: impl Into<String>, v: Validator) -> Self {
        self.validators.entry(name.into()).or_default().push(v);
        self
    }

    /// Re-check touched fields on every edit instead of only on touch/submit.
    pub fn validate_on_change(mut self, on: bool) -> Self {
        self.validate_on_change = on;
        self
    }

    pub fn build(self) -> FormState {
        for name in self.validators.keys() {
            if !self.initial.contains_key(name) {
                log::warn!("form: validator for undeclared field `{name}` is never run");
            }
        }
        let snapshot = FormSnapshot {
            values: self.initial.clone(),
            ..Default::default()
        };
        FormState {
            inner: Rc::new(FormInner {
                initial: self.initial,
                validators: self.validators,
                validate_on_change: self.validate_on_change,
                state: Signal::new(snapshot),
            }),
        }
    }
}

struct FormInner {
    initial: Values,
    validators: BTreeMap<String, Vec<Validator>>,
    validate_on_change: bool,
    state: Signal<FormSnapshot>,
}

/// Clones share the same form.
#[derive(Clone)]
pub struct FormState {
    inner: Rc<FormInner>,
}

impl FormState {
    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    fn check(&self, name: &str, values: &Values) -> Option<String> {
        let value = values.get(name).map(String::as_str).unwrap_or("");
        self.inner
            .validators
            .get(name)?
            .iter()
            .find_map(|v| v(value, values))
    }

    fn revalidate<'a>(
        &self,
        snap: &mut FormSnapshot,
        fields: impl IntoIterator<Item = &'a String>,
    ) {
        for name in fields {
            match self.check(name, &snap.values) {
                Some(msg) => snap.errors.insert(name.clone(), msg),
                None => snap.errors.remove(name),
            };
        }
    }

    /// Unknown fields are logged and ignored.
    pub fn set_field(&self, name: &str, value: impl Into<String>) -> bool {
        if !self.inner.initial.contains_key(name) {
            log::warn!("form: ignoring write to unknown field `{name}`");
            return false;
        }
        let value = value.into();
        self.inner.state.update(|s| {
            let mut next = s.clone();
            next.values.insert(name.to_string(), value);
            if self.inner.validate_on_change {
                let mut fields = next.touched.clone();
                fields.insert(name.to_string());
                self.revalidate(&mut next, &fields);
            }
            next
        });
        true
    }

    /// Marks a field as visited and validates it.
    pub fn touch(&self, name: &str) {
        if !self.inner.initial.contains_key(name) {
            log::warn!("form: ignoring touch of unknown field `{name}`");
            return;
        }
        self.inner.state.update(|s| {
            let mut next = s.clone();
            next.touched.insert(name.to_string());
            self.revalidate(&mut next, [&name.to_string()]);
            next
        });
    }

    /// Validates every field. Returns whether the form is valid.
    pub fn validate(&self) -> bool {
        self.inner.state.update(|s| {
            let mut next = s.clone();
            self.revalidate(&mut next, self.inner.initial.keys());
            next
        });
        self.is_valid()
    }

    /// Touches and validates everything, then hands the values to `on_valid`
    /// if there are no errors.
    pub fn submit(&self, on_valid: impl FnOnce(&Values)) -> bool {
        self.inner.state.update(|s| {
            let mut next = s.clone();
            next.submit_count += 1;
            next.touched.extend(self.inner.initial.keys().cloned());
            self.revalidate(&mut next, self.inner.initial.keys());
            next
        });
        let snap = self.inner.state.snapshot();
        if !snap.errors.is_empty() {
            log::debug!("form: submit blocked by {} error(s)", snap.errors.len());
            return false;
        }
        on_valid(&snap.values);
        true
    }

    pub fn reset(&self) {
        self.inner.state.set(FormSnapshot {
            values: self.inner.initial.clone(),
            ..Default::default()
        });
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.inner.state.with(|s| s.values.get(name).cloned())
    }

    pub fn error(&self, name: &str) -> Option<String> {
        self.inner.state.with(|s| s.errors.get(name).cloned())
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.inner.state.with(|s| s.touched.contains(name))
    }

    pub fn is_valid(&self) -> bool {
        self.inner.state.with(|s| s.errors.is_empty())
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.state.with(|s| s.values != self.inner.initial)
    }

    pub fn snapshot(&self) -> Rc<FormSnapshot> {
        self.inner.state.snapshot()
    }

    pub fn signal(&self) -> Signal<FormSnapshot> {
        self.inner.state.clone()
    }
}

pub mod validators {
    use std::rc::Rc;

    use super::{Validator, Values};

    pub fn required() -> Validator {
        Rc::new(|v: &str, _: &Values| v.trim().is_empty().then(|| "required".to_string()))
    }

    pub fn min_len(n: usize) -> Validator {
        Rc::new(move |v: &str, _: &Values| {
            (v.chars().count() < n).then(|| format!("must be at least {n} characters"))
        })
    }

    /// Loose shape check: one `@`, something before it, a dot after it.
    /// Empty values pass; pair with [`required`] for mandatory fields.
    pub fn email() -> Validator {
        Rc::new(|v: &str, _: &Values| {
            if v.is_empty() {
                return None;
            }
            let ok = match v.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty()
                        && !domain.contains('@')
                        && domain
                            .split_once('.')
                            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                }
                None => false,
            };
            (!ok).then(|| "not a valid email address".to_string())
        })
    }

    pub fn matches_field(other: &'static str) -> Validator {
        Rc::new(move |v: &str, all: &Values| {
            (all.get(other).map(String::as_str) != Some(v)).then(|| format!("must match {other}"))
        })
    }
}
