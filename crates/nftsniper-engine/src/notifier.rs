//! Per-contract event publication

use alloy_primitives::Address;
use nftsniper_core::TaskEvent;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

type Handler = Arc<dyn Fn(&TaskEvent) + Send + Sync>;

/// Typed publish point task observers subscribe to, keyed by contract.
///
/// Handlers run synchronously in subscription order on the emitting task's
/// cycle. A panicking handler is caught and logged; the remaining handlers
/// still run and the emitting cycle is unaffected.
pub struct EventNotifier {
    handlers: RwLock<HashMap<Address, Vec<Handler>>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler for one contract's events
    pub fn on<F>(&self, contract: Address, handler: F)
    where
        F: Fn(&TaskEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap();
        handlers.entry(contract).or_default().push(Arc::new(handler));
    }

    /// Publish an event to its contract's handlers. Fire-and-forget; an
    /// event for a contract without subscribers is dropped.
    pub fn emit(&self, event: &TaskEvent) {
        // Handlers are invoked outside the lock so one may re-subscribe
        // without deadlocking.
        let subscribers: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap();
            match handlers.get(&event.contract()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        debug!(
            contract = %event.contract(),
            kind = event.kind(),
            subscribers = subscribers.len(),
            "Publishing event"
        );

        for handler in subscribers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(
                    contract = %event.contract(),
                    kind = event.kind(),
                    "Event handler panicked"
                );
            }
        }
    }

    /// Number of handlers registered for a contract
    pub fn subscriber_count(&self, contract: Address) -> usize {
        self.handlers
            .read()
            .unwrap()
            .get(&contract)
            .map_or(0, |list| list.len())
    }

    /// Drop every handler registered for a contract
    pub fn clear(&self, contract: Address) {
        self.handlers.write().unwrap().remove(&contract);
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new()
    }
}
