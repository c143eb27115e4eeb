//! Form state store.
//!
//! [`FormStore`] owns one [`FormState`] and is the only place it changes.
//! The store is single-threaded: every method takes `&self` and runs to
//! completion, including observer fan-out, before returning. The one
//! suspension point is the caller's submit future inside
//! [`FormStore::handle_submit`]; other methods may be called while it is
//! pending, and a second submit is not rejected.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::condition;
use crate::introspect::{self, default_values};
use crate::spec::schema::FormSchema;
use crate::state::{ErrorMap, FormMeta, FormState, Values};
use crate::submission::Submission;
use crate::validate::{validate_field, validate_values};
use crate::visibility::{
    VisibilityMap, resolve_enablement, resolve_visibility, visible_field_ids,
};

type Observer = dyn Fn(&FormState, &FormMeta);

/// Handle returned by [`FormStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Result of [`FormStore::handle_submit`] when the callback did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Validation passed and the callback completed with this value.
    Submitted(T),
    /// Validation failed; the callback was not invoked.
    Invalid(ErrorMap),
}

impl<T> SubmitOutcome<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

struct Inner {
    schema: FormSchema,
    initial: Values,
    state: FormState,
}

impl Inner {
    /// Reports schema diagnostics through `warn!` before taking the schema.
    fn build(schema: FormSchema, overrides: Option<Values>) -> Self {
        let diagnostics = introspect::lint(&schema);
        if !diagnostics.is_empty() {
            debug!(schema = %schema.id, count = diagnostics.len(), "schema loaded with diagnostics");
        }
        let mut initial = default_values(&schema);
        if let Some(overrides) = overrides {
            initial.extend(overrides);
        }
        Self {
            schema,
            state: FormState::with_values(initial.clone()),
            initial,
        }
    }

    /// Runs the field validator for `id` and records the outcome.
    fn validate_one(&mut self, id: &str) -> bool {
        let Some(field) = self.schema.field(id) else {
            warn!(field = %id, schema = %self.schema.id, "validation requested for unknown field");
            return true;
        };
        match validate_field(field, self.state.values.get(id), &self.state.values) {
            Some(message) => {
                debug!(field = %id, %message, "field invalid");
                self.state.errors.insert(id.to_string(), message);
                false
            }
            None => {
                self.state.errors.remove(id);
                true
            }
        }
    }

    fn reset(&mut self) {
        self.state = FormState::with_values(self.initial.clone());
    }

    fn meta(&self) -> FormMeta {
        let visibility = resolve_visibility(&self.schema, &self.state.values);
        let enablement = resolve_enablement(&self.schema, &self.state.values);
        let in_order = |flags: &VisibilityMap| -> Vec<String> {
            self.schema
                .fields
                .iter()
                .filter(|field| flags.get(&field.id).copied().unwrap_or(true))
                .map(|field| field.id.clone())
                .collect()
        };
        FormMeta {
            is_dirty: self.state.is_dirty(&self.initial),
            is_valid: self.state.is_valid(),
            touched_fields: self.state.touched.iter().cloned().collect(),
            error_fields: self.state.errors.keys().cloned().collect(),
            visible_fields: in_order(&visibility),
            enabled_fields: in_order(&enablement),
        }
    }
}

/// Clears `is_submitting` when a submit finishes or is abandoned.
struct SubmittingGuard<'a> {
    store: &'a FormStore,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.store.mutate(|inner| inner.state.is_submitting = false);
    }
}

/// Owner of a form's state; see the module docs for the threading model.
pub struct FormStore {
    inner: RefCell<Inner>,
    observers: RefCell<Vec<(Subscription, Rc<Observer>)>>,
    next_subscription: Cell<u64>,
}

impl fmt::Debug for FormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FormStore")
            .field("schema", &inner.schema.id)
            .field("state", &inner.state)
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

impl FormStore {
    /// Builds a store from schema defaults overridden by `initial_values`.
    pub fn new(schema: FormSchema, initial_values: Option<Values>) -> Self {
        Self {
            inner: RefCell::new(Inner::build(schema, initial_values)),
            observers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
        }
    }

    /// Replaces schema, snapshot and state; observers are kept and notified.
    pub fn initialize(&self, schema: FormSchema, initial_values: Option<Values>) {
        *self.inner.borrow_mut() = Inner::build(schema, initial_values);
        self.notify();
    }

    pub fn set_value(&self, id: &str, value: Value) {
        self.mutate(|inner| {
            if !inner.schema.contains(id) {
                warn!(field = %id, schema = %inner.schema.id, "value set for unknown field");
            }
            inner.state.values.insert(id.to_string(), value);
            inner.state.errors.remove(id);

            let stale: Vec<String> = introspect::dependents(&inner.schema, id)
                .filter(|field| inner.state.touched.contains(&field.id))
                .map(|field| field.id.clone())
                .collect();
            for dependent in stale {
                debug!(field = %dependent, changed = %id, "revalidating dependent field");
                inner.validate_one(&dependent);
            }
        });
    }

    /// Merges `values` and clears every error.
    pub fn set_values(&self, values: Values) {
        self.mutate(|inner| {
            inner.state.values.extend(values);
            inner.state.errors.clear();
        });
    }

    pub fn set_touched(&self, id: &str, touched: bool) {
        self.mutate(|inner| {
            if touched {
                inner.state.touched.insert(id.to_string());
            } else {
                inner.state.touched.remove(id);
            }
        });
    }

    pub fn set_touched_multiple<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutate(|inner| inner.state.touched.extend(ids.into_iter().map(Into::into)));
    }

    /// Sets or clears an error from outside the built-in rules.
    pub fn set_error(&self, id: &str, message: Option<String>) {
        self.mutate(|inner| match message {
            Some(message) => {
                inner.state.errors.insert(id.to_string(), message);
            }
            None => {
                inner.state.errors.remove(id);
            }
        });
    }

    pub fn validate_single_field(&self, id: &str) -> bool {
        self.mutate(|inner| inner.validate_one(id))
    }

    /// Validates every visible field and replaces the error map wholesale.
    pub fn validate_all_fields(&self) -> bool {
        self.mutate(|inner| inner.state.is_validating = true);
        self.mutate(|inner| {
            inner.state.errors = validate_values(&inner.schema, &inner.state.values);
            inner.state.is_validating = false;
            debug!(errors = inner.state.errors.len(), "validated all visible fields");
            inner.state.is_valid()
        })
    }

    /// Touches and validates every visible field, then hands the visible
    /// values to `on_submit`.
    ///
    /// An error from `on_submit` is returned as-is. `is_submitting` is
    /// cleared and observers notified on every exit, including when the
    /// returned future is dropped before it completes.
    pub async fn handle_submit<F, Fut, T, E>(&self, on_submit: F) -> Result<SubmitOutcome<T>, E>
    where
        F: FnOnce(Submission) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.mutate(|inner| {
            inner.state.is_submitting = true;
            inner.state.submit_count += 1;
        });
        let _submitting = SubmittingGuard { store: self };
        {
            let mut inner = self.inner.borrow_mut();
            let visible = visible_field_ids(&inner.schema, &inner.state.values);
            inner.state.touched.extend(visible);
        }

        if !self.validate_all_fields() {
            return Ok(SubmitOutcome::Invalid(self.errors()));
        }

        let submission = {
            let inner = self.inner.borrow();
            Submission::collect(&inner.schema, &inner.state)
        };
        let result = on_submit(submission).await;
        if result.is_err() {
            debug!("submit callback failed");
        }
        result.map(SubmitOutcome::Submitted)
    }

    /// Restores the initial snapshot and clears errors, touched and counters.
    pub fn reset(&self) {
        self.mutate(Inner::reset);
    }

    pub fn reset_field(&self, id: &str) {
        self.mutate(|inner| {
            match inner.initial.get(id).cloned() {
                Some(value) => inner.state.values.insert(id.to_string(), value),
                None => inner.state.values.remove(id),
            };
            inner.state.errors.remove(id);
            inner.state.touched.remove(id);
        });
    }

    /// Swaps the schema and resets to its defaults, discarding prior state.
    pub fn set_schema(&self, schema: FormSchema) {
        self.mutate(|inner| *inner = Inner::build(schema, None));
    }

    /// Registers an observer called after every mutation, in registration order.
    ///
    /// Observers must not mutate the store from inside the callback.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&FormState, &FormMeta) + 'static,
    {
        let handle = Subscription(self.next_subscription.get());
        self.next_subscription.set(handle.0 + 1);
        let observer: Rc<Observer> = Rc::new(observer);
        self.observers.borrow_mut().push((handle, observer));
        handle
    }

    /// Removes an observer. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(handle, _)| handle != subscription);
        observers.len() != before
    }

    pub fn state(&self) -> FormState {
        self.inner.borrow().state.clone()
    }

    pub fn meta(&self) -> FormMeta {
        self.inner.borrow().meta()
    }

    pub fn schema(&self) -> FormSchema {
        self.inner.borrow().schema.clone()
    }

    pub fn initial_values(&self) -> Values {
        self.inner.borrow().initial.clone()
    }

    pub fn values(&self) -> Values {
        self.inner.borrow().state.values.clone()
    }

    pub fn value(&self, id: &str) -> Option<Value> {
        self.inner.borrow().state.values.get(id).cloned()
    }

    pub fn errors(&self) -> ErrorMap {
        self.inner.borrow().state.errors.clone()
    }

    pub fn error(&self, id: &str) -> Option<String> {
        self.inner.borrow().state.errors.get(id).cloned()
    }

    /// The error a renderer should show: only for touched fields.
    pub fn displayed_error(&self, id: &str) -> Option<String> {
        let inner = self.inner.borrow();
        if inner.state.touched.contains(id) {
            inner.state.errors.get(id).cloned()
        } else {
            None
        }
    }

    pub fn is_touched(&self, id: &str) -> bool {
        self.inner.borrow().state.touched.contains(id)
    }

    /// Unknown fields are reported as not visible.
    pub fn is_visible(&self, id: &str) -> bool {
        let inner = self.inner.borrow();
        inner.schema.field(id).is_some_and(|field| {
            condition::evaluate(field.visible_when.as_ref(), &inner.state.values)
        })
    }

    /// Unknown fields are reported as not enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        let inner = self.inner.borrow();
        inner.schema.field(id).is_some_and(|field| {
            condition::evaluate(field.enabled_when.as_ref(), &inner.state.values)
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.borrow().state.is_submitting
    }

    /// True when the visibility or enablement of `field` depends on `id`.
    pub fn field_depends_on(&self, field: &str, id: &str) -> bool {
        let inner = self.inner.borrow();
        inner
            .schema
            .field(field)
            .is_some_and(|spec| introspect::field_depends_on(spec, id))
    }

    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.borrow();
        introspect::dependents(&inner.schema, id)
            .map(|field| field.id.clone())
            .collect()
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut Inner) -> R) -> R {
        let result = {
            let mut inner = self.inner.borrow_mut();
            change(&mut *inner)
        };
        self.notify();
        result
    }

    fn notify(&self) {
        let (state, meta) = {
            let inner = self.inner.borrow();
            (inner.state.clone(), inner.meta())
        };
        let observers: Vec<Rc<Observer>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&state, &meta);
        }
    }
}
