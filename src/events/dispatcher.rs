//! # Event Dispatcher
//!
//! Delivers entity lifecycle events to tagged listener services and
//! mirrors them to passive observers.
//!
//! ## Overview
//!
//! The dispatcher is the event-manager side of the lifecycle system. It
//! does not hold subscribers itself: at dispatch time it asks the service
//! container for every service carrying the subscriber tag, resolves each
//! (which triggers the lazy listener factories on first dispatch), filters
//! by the listener's subscribed event names, and invokes the survivors in
//! registration order. Listeners mutate the event's entity payload, so
//! delivery is sequential.
//!
//! After listener delivery the final event is mirrored on a broadcast
//! channel. Observers are optional; mirroring with no observers is not an
//! error.

use crate::constants::services;
use crate::container::{ContainerError, ContainerResult, ServiceContainer};
use crate::events::types::EntityEvent;
use crate::listeners::{EntityListener, ListenerError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default capacity of the observer broadcast channel.
const DEFAULT_OBSERVER_CAPACITY: usize = 1000;

/// Errors raised while dispatching an event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A subscriber service could not be resolved from the container.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A listener failed while handling the event.
    #[error("Listener '{listener}' failed to handle '{event}': {source}")]
    Listener {
        listener: String,
        event: String,
        source: ListenerError,
    },
}

/// Dispatcher for entity lifecycle events.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    observers: broadcast::Sender<EntityEvent>,
}

impl EventDispatcher {
    /// Create a dispatcher with the given observer channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(capacity);
        Self { observers }
    }

    /// Install this dispatcher in the container under its well-known
    /// service identifier, returning the shared handle.
    pub fn register(self, container: &ServiceContainer) -> ContainerResult<Arc<EventDispatcher>> {
        let dispatcher = Arc::new(self);
        container.set_shared_instance(services::EVENT_DISPATCHER, &[], dispatcher.clone())?;
        Ok(dispatcher)
    }

    /// Dispatch an event to every tagged listener subscribed to its name,
    /// in registration order. Returns the number of listeners notified.
    pub async fn dispatch(
        &self,
        container: &ServiceContainer,
        event: &mut EntityEvent,
    ) -> Result<usize, DispatchError> {
        let event_name = event.name.clone();
        let mut notified = 0;

        for service_id in container.tagged(services::SUBSCRIBER_TAG) {
            let listener = container.resolve_typed::<Arc<dyn EntityListener>>(&service_id)?;

            if !listener.subscribed_events().contains(&event_name.as_str()) {
                trace!(
                    listener = listener.name(),
                    event = %event_name,
                    "Listener not subscribed to event, skipping"
                );
                continue;
            }

            let result = listener.handle_event(event).await;
            if let Err(source) = result {
                return Err(DispatchError::Listener {
                    listener: listener.name().to_string(),
                    event: event_name,
                    source,
                });
            }
            notified += 1;
        }

        // Mirror to observers; nobody listening is acceptable.
        if self.observers.send(event.clone()).is_err() {
            trace!(event = %event_name, "No observers for mirrored event");
        }

        debug!(event = %event_name, notified, "Dispatched entity event");
        Ok(notified)
    }

    /// Subscribe to the observer mirror of dispatched events.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.observers.subscribe()
    }

    /// Number of active observers.
    pub fn observer_count(&self) -> usize {
        self.observers.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_CAPACITY)
    }
}
