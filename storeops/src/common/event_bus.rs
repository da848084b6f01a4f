use crate::common::CHANGES_EVENT;
use crate::errors::{ErrorKind, OpsError, OpsResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Publishes events to registered listeners.
///
/// Thin wrapper over a `basu` event bus with a single topic. Stores use it to
/// fan change notifications out to their observers; the bus itself does not
/// know anything about tables or transactions.
///
/// Publishing with no registered listener is a cheap no-op.
///
/// # Example
///
/// ```ignore
/// let bus: NotificationBus<Changes, ChangesListener> = NotificationBus::new();
/// let subscriber = bus.register(listener)?;
/// bus.publish(Changes::new_instance(["users"]))?;
/// bus.deregister(subscriber.unwrap())?;
/// ```
#[derive(Clone)]
pub struct NotificationBus<E, L> {
    inner: Arc<NotificationBusInner<E, L>>,
}

impl<E, L> Default for NotificationBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> NotificationBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub fn new() -> Self {
        NotificationBus {
            inner: Arc::new(NotificationBusInner::new()),
        }
    }

    /// Registers a listener with the bus.
    pub fn register(&self, listener: L) -> OpsResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> OpsResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: E) -> OpsResult<()> {
        self.inner.publish(event)
    }

    /// Drops every registered listener.
    pub fn close(&self) -> OpsResult<()> {
        self.inner.close()
    }

    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

/// Handle returned on registration, used to deregister a listener.
#[derive(Debug)]
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

struct NotificationBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> NotificationBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        NotificationBusInner {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    fn register(&self, listener: L) -> OpsResult<Option<SubscriberRef>> {
        match self.event_bus.subscribe(CHANGES_EVENT, Box::new(listener)) {
            Ok(handler_id) => Ok(Some(SubscriberRef::new(handler_id))),
            Err(e) => Err(Self::ops_error(e)),
        }
    }

    #[inline]
    fn deregister(&self, subscriber: SubscriberRef) -> OpsResult<()> {
        self.event_bus
            .unsubscribe(CHANGES_EVENT, &subscriber.inner)
            .map_err(Self::ops_error)
    }

    #[inline]
    fn publish(&self, event: E) -> OpsResult<()> {
        let handler_count = match self.event_bus.get_handler_count(CHANGES_EVENT) {
            Ok(count) => count,
            Err(BasuError::EventTypeNotFOUND) => return Ok(()),
            Err(e) => return Err(Self::ops_error(e)),
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        self.event_bus
            .publish(CHANGES_EVENT, &basu_event)
            .map_err(Self::ops_error)
    }

    #[inline]
    fn close(&self) -> OpsResult<()> {
        self.event_bus.clear().map_err(Self::ops_error)
    }

    #[inline]
    fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(CHANGES_EVENT) {
            Ok(count) => count > 0,
            Err(BasuError::EventTypeNotFOUND) => false,
            Err(e) => {
                log::warn!("Failed to check listeners: {}, defaulting to false", e);
                false
            }
        }
    }

    fn ops_error(e: BasuError) -> OpsError {
        match e {
            BasuError::EventTypeNotFOUND => OpsError::new(
                "Notification bus error: no listener was ever registered for change events",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => OpsError::new(
                "Notification bus error: internal mutex poisoned",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| e.to_string());
                OpsError::new(
                    &format!("Change listener error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}
