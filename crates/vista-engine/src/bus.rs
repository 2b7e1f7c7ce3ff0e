//! Dialog event bus.
//!
//! A namespaced publish/subscribe channel that decouples action triggers from
//! the component owning dialog state. Actions publish a `DialogRequest` on
//! their entity's namespace ("candidate", "deal", ...); the screen that
//! renders dialogs subscribes to that namespace for as long as it is mounted.
//!
//! ## Contract
//!
//! - One subscriber per namespace is expected. A second one is accepted but
//!   logged; both receive every request.
//! - Publishing with no subscriber drops the request and logs a warning.
//! - Requests are delivered to the subscribers registered at publish time.
//!   Nothing is buffered or replayed.
//! - A `DialogSubscription` unsubscribes when dropped.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

use vista_core::config::DialogRequest;

/// Callback receiving dialog requests.
pub type DialogHandler = Arc<dyn Fn(&DialogRequest) + Send + Sync>;

struct Subscriber {
    id: String,
    handler: DialogHandler,
}

type Channels = RwLock<HashMap<String, Vec<Subscriber>>>;

/// Result of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered to this many subscribers.
    Delivered(usize),
    /// No subscriber was listening.
    Dropped,
}

// =============================================================================
// DialogBus
// =============================================================================

/// Shared dialog bus. Clones share the same channels.
#[derive(Clone, Default)]
pub struct DialogBus {
    channels: Arc<Channels>,
}

impl DialogBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `namespace`. The handler stays registered until the
    /// returned subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, namespace: impl Into<String>, handler: F) -> DialogSubscription
    where
        F: Fn(&DialogRequest) + Send + Sync + 'static,
    {
        let namespace = namespace.into();
        let id = format!("dialog:{}", uuid::Uuid::new_v4());

        let mut channels = self.channels.write();
        let subscribers = channels.entry(namespace.clone()).or_default();
        if !subscribers.is_empty() {
            tracing::warn!(
                "Namespace '{}' already has {} subscriber(s); requests will reach all of them",
                namespace,
                subscribers.len()
            );
        }
        subscribers.push(Subscriber {
            id: id.clone(),
            handler: Arc::new(handler),
        });
        tracing::debug!("Subscribed to '{}' (id: {})", namespace, id);

        DialogSubscription {
            id,
            namespace,
            channels: Arc::downgrade(&self.channels),
        }
    }

    /// Publish a request on `namespace`.
    pub fn publish(&self, namespace: &str, request: DialogRequest) -> Delivery {
        // Snapshot handlers so they can publish or unsubscribe re-entrantly.
        let handlers: Vec<DialogHandler> = {
            let channels = self.channels.read();
            channels
                .get(namespace)
                .map(|subscribers| subscribers.iter().map(|s| s.handler.clone()).collect())
                .unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::warn!(
                "No subscriber on '{}'; dropping dialog '{}' for '{}'",
                namespace,
                request.dialog_id,
                request.entity_id
            );
            return Delivery::Dropped;
        }

        tracing::debug!(
            "Publishing dialog '{}' for '{}' on '{}'",
            request.dialog_id,
            request.entity_id,
            namespace
        );
        for handler in &handlers {
            handler(&request);
        }
        Delivery::Delivered(handlers.len())
    }

    pub fn subscriber_count(&self, namespace: &str) -> usize {
        self.channels.read().get(namespace).map_or(0, Vec::len)
    }
}

impl fmt::Debug for DialogBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.read();
        let counts: HashMap<&str, usize> = channels.iter().map(|(ns, subs)| (ns.as_str(), subs.len())).collect();
        f.debug_struct("DialogBus").field("subscribers", &counts).finish()
    }
}

// =============================================================================
// DialogSubscription
// =============================================================================

/// Registration handle; unsubscribes on drop.
#[derive(Debug)]
pub struct DialogSubscription {
    id: String,
    namespace: String,
    channels: Weak<Channels>,
}

impl DialogSubscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Unsubscribe now.
    pub fn unsubscribe(self) {}
}

impl Drop for DialogSubscription {
    fn drop(&mut self) {
        let Some(channels) = self.channels.upgrade() else {
            return;
        };
        let mut channels = channels.write();
        if let Some(subscribers) = channels.get_mut(&self.namespace) {
            subscribers.retain(|s| s.id != self.id);
            if subscribers.is_empty() {
                channels.remove(&self.namespace);
            }
        }
        tracing::debug!("Unsubscribed from '{}' (id: {})", self.namespace, self.id);
    }
}

// =============================================================================
// DialogHost
// =============================================================================

/// Owner of "which dialog is open" for one namespace.
///
/// Subscribes on creation and unsubscribes when dropped, so it lives exactly
/// as long as the screen that renders the dialogs.
pub struct DialogHost {
    rx: watch::Receiver<Option<DialogRequest>>,
    tx: Arc<watch::Sender<Option<DialogRequest>>>,
    subscription: DialogSubscription,
}

impl DialogHost {
    pub fn attach(bus: &DialogBus, namespace: impl Into<String>) -> Self {
        let (tx, rx) = watch::channel(None);
        let tx = Arc::new(tx);

        let subscription = {
            let tx = tx.clone();
            bus.subscribe(namespace, move |request| {
                tx.send_replace(Some(request.clone()));
            })
        };

        Self { rx, tx, subscription }
    }

    pub fn namespace(&self) -> &str {
        self.subscription.namespace()
    }

    /// The currently open dialog, if any.
    pub fn current(&self) -> Option<DialogRequest> {
        self.rx.borrow().clone()
    }

    pub fn is_open(&self, dialog_id: &str) -> bool {
        self.rx
            .borrow()
            .as_ref()
            .is_some_and(|request| request.dialog_id == dialog_id)
    }

    /// Close whatever dialog is open.
    pub fn close(&self) {
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DialogRequest>> {
        self.rx.clone()
    }
}
