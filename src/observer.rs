//! Resolution observers.
//!
//! Observers receive a callback for every component the container creates.
//! They are called synchronously on the creating thread, so keep them cheap.
//! [`LoggingObserver`] forwards every event to `tracing`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;

/// Observer trait for component creation events.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, ResolutionObserver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ResolutionObserver for Recorder {
///     fn created(&self, name: &str, _elapsed: Duration) {
///         self.0.lock().unwrap().push(name.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut components = ComponentCollection::new();
/// components.add_observer(recorder.clone());
/// components.register(ComponentDefinition::from_instance("greeting", "hi")).unwrap();
/// let _container = components.build().unwrap();
///
/// assert_eq!(*recorder.0.lock().unwrap(), ["greeting"]);
/// ```
pub trait ResolutionObserver: Send + Sync + 'static {
    /// A creation attempt for `name` started on this thread.
    fn creating(&self, _name: &str) {}

    /// `name` finished after `elapsed`.
    fn created(&self, _name: &str, _elapsed: Duration) {}

    /// Creating `name` failed; its state has been purged.
    fn failed(&self, _name: &str, _error: &DiError) {}

    /// An early reference to `name` was handed out to break a cycle.
    fn early_reference_exposed(&self, _name: &str) {}
}

/// Collection of observers, notified in registration order.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ResolutionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn creating(&self, name: &str) {
        for observer in &self.observers {
            observer.creating(name);
        }
    }

    pub(crate) fn created(&self, name: &str, elapsed: Duration) {
        for observer in &self.observers {
            observer.created(name, elapsed);
        }
    }

    pub(crate) fn failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.failed(name, error);
        }
    }

    pub(crate) fn early_reference_exposed(&self, name: &str) {
        for observer in &self.observers {
            observer.early_reference_exposed(name);
        }
    }
}

/// Observer that emits `tracing` events.
///
/// Creation start and end are `debug`, early references `trace`, failures `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl LoggingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl ResolutionObserver for LoggingObserver {
    fn creating(&self, name: &str) {
        tracing::debug!(component = name, "creating component");
    }

    fn created(&self, name: &str, elapsed: Duration) {
        tracing::debug!(component = name, elapsed_us = elapsed.as_micros() as u64, "component ready");
    }

    fn failed(&self, name: &str, error: &DiError) {
        tracing::warn!(component = name, error = %error, "component creation failed");
    }

    fn early_reference_exposed(&self, name: &str) {
        tracing::trace!(component = name, "early reference exposed");
    }
}
