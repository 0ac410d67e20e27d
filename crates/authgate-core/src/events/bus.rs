//! Fire-and-forget fan-out of invalidation events.
//!
//! Lifecycle: handlers are registered on an [`InvalidationBusBuilder`] at
//! startup, the built [`InvalidationBus`] is shared by every publisher, and
//! [`InvalidationBus::wait`] drains in-flight handler tasks on shutdown.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use super::invalidation::{EventKind, InvalidationEvent};
use crate::result::AppResult;

/// Default upper bound on a single handler run.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(10);

/// A background reaction to an invalidation event.
///
/// Handlers must be idempotent: the same event may be handled after the
/// affected entry has already expired.
#[async_trait]
pub trait InvalidationHandler: Send + Sync + 'static {
    /// Name used in log records.
    fn name(&self) -> &str;

    /// Handle one event.
    async fn handle(&self, event: &InvalidationEvent) -> AppResult<()>;
}

type HandlerMap = HashMap<EventKind, Vec<Arc<dyn InvalidationHandler>>>;

/// Collects handler registrations before the bus starts.
pub struct InvalidationBusBuilder {
    handlers: HandlerMap,
    timeout: Duration,
}

impl InvalidationBusBuilder {
    /// Create an empty builder with the default handler timeout.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    /// Override the per-handler timeout.
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register `handler` for every event of `kind`.
    pub fn register(mut self, kind: EventKind, handler: Arc<dyn InvalidationHandler>) -> Self {
        debug!(kind = %kind, handler = %handler.name(), "Registered invalidation handler");
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    /// Freeze the registry and start accepting events.
    pub fn build(self) -> InvalidationBus {
        InvalidationBus {
            handlers: Arc::new(self.handlers),
            tracker: TaskTracker::new(),
            timeout: self.timeout,
        }
    }
}

impl Default for InvalidationBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process invalidation bus with an immutable handler registry.
#[derive(Clone)]
pub struct InvalidationBus {
    handlers: Arc<HandlerMap>,
    tracker: TaskTracker,
    timeout: Duration,
}

impl InvalidationBus {
    /// Start building a bus.
    pub fn builder() -> InvalidationBusBuilder {
        InvalidationBusBuilder::new()
    }

    /// Dispatch `event` to every handler registered for its kind.
    ///
    /// Each handler runs on its own tracked task. Returns immediately with
    /// the number of tasks spawned; never waits for handler completion.
    pub fn publish(&self, event: InvalidationEvent) -> usize {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            debug!(kind = %event.kind(), "No handlers for invalidation event");
            return 0;
        };

        let event = Arc::new(event);
        for handler in handlers {
            let handler = Arc::clone(handler);
            let event = Arc::clone(&event);
            let timeout = self.timeout;
            self.tracker.spawn(run_handler(handler, event, timeout));
        }
        handlers.len()
    }

    /// Block until every in-flight handler task has finished.
    ///
    /// The bus keeps accepting events afterwards.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of handler tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("kinds", &self.handlers.len())
            .field("in_flight", &self.tracker.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

async fn run_handler(
    handler: Arc<dyn InvalidationHandler>,
    event: Arc<InvalidationEvent>,
    timeout: Duration,
) {
    let name = handler.name().to_string();
    let result = tokio::time::timeout(
        timeout,
        AssertUnwindSafe(handler.handle(&event)).catch_unwind(),
    )
    .await;

    match result {
        Ok(Ok(Ok(()))) => {
            debug!(handler = %name, kind = %event.kind(), "Invalidation handled");
        }
        Ok(Ok(Err(e))) => {
            warn!(handler = %name, kind = %event.kind(), error = %e, "Invalidation handler failed");
        }
        Ok(Err(panic)) => {
            let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(handler = %name, kind = %event.kind(), panic = %panic_msg, "Invalidation handler panicked");
        }
        Err(_) => {
            error!(
                handler = %name,
                kind = %event.kind(),
                timeout_secs = timeout.as_secs(),
                "Invalidation handler timed out"
            );
        }
    }
}
