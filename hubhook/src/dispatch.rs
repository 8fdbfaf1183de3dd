//! Event-name keyed handler registry and fan-out.
//!
//! Handlers are plain synchronous callbacks. Dispatch runs them in
//! registration order on the calling task; there is no queue and no retry.
//!
//! A handler that panics is isolated: the panic is caught and logged, and the
//! remaining handlers for the event still run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde_json::Value;
use tracing::{debug, error};

/// A registered webhook callback.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// One (event name, handler) pair in the registry.
#[derive(Clone)]
pub struct HandlerBinding {
    /// Event name as registered; matched case-insensitively.
    pub event: String,
    pub handler: Handler,
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers whose event name matched.
    pub matched: usize,
    /// Matched handlers that panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Number of handlers that ran to completion.
    pub fn succeeded(&self) -> usize {
        self.matched - self.failed
    }
}

/// Ordered registry of handler bindings.
///
/// Cloning a `Dispatcher` yields another handle onto the same registry.
#[derive(Clone, Default)]
pub struct Dispatcher {
    bindings: Arc<RwLock<Vec<HandlerBinding>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `event`.
    ///
    /// Duplicate event names are allowed; every handler registered for an
    /// event is invoked on dispatch.
    pub fn register<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let event = event.into();
        debug!(event = %event, "webhook_handler_registered");

        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HandlerBinding {
                event,
                handler: Arc::new(handler),
            });
    }

    /// Invoke every handler registered for `event`, in registration order.
    ///
    /// Matching ignores case, including non-ASCII letters. An event with no handlers is a no-op.
    pub fn dispatch(&self, event: &str, payload: &Value) -> DispatchReport {
        // Snapshot the matching handlers so the lock is not held while they
        // run; a handler may register further handlers.
        let handlers = self.handlers_for(event);

        let mut report = DispatchReport {
            matched: handlers.len(),
            failed: 0,
        };

        for (index, handler) in handlers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(payload)));

            if let Err(cause) = outcome {
                report.failed += 1;
                error!(
                    event = %event,
                    handler_index = index,
                    panic = %panic_message(cause.as_ref()),
                    "webhook_handler_panicked"
                );
            }
        }

        debug!(
            event = %event,
            matched = report.matched,
            failed = report.failed,
            "webhook_dispatch_complete"
        );

        report
    }

    /// Total number of registered bindings.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of handlers that would run for `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.read()
            .iter()
            .filter(|b| event_matches(&b.event, event))
            .count()
    }

    fn handlers_for(&self, event: &str) -> Vec<Handler> {
        self.read()
            .iter()
            .filter(|b| event_matches(&b.event, event))
            .map(|b| Arc::clone(&b.handler))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<HandlerBinding>> {
        // Handlers never run under the lock, so poisoning cannot leave the
        // registry half-written.
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bindings", &*self.read())
            .finish()
    }
}

/// Compare event names ignoring case, folding Unicode letters as well.
fn event_matches(registered: &str, event: &str) -> bool {
    registered == event
        || registered
            .chars()
            .flat_map(char::to_lowercase)
            .eq(event.chars().flat_map(char::to_lowercase))
}

/// Extract a printable message from a panic payload.
fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
