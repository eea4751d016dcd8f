use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::trace;

use crate::Event;

pub type Handler = Arc<dyn Fn(Event) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct Listener {
    id: u64,
    event: String,
    handler: Handler,
}

#[derive(Default)]
struct ChannelState {
    next_id: u64,
    listeners: Vec<Listener>,
}

fn lock(state: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named-event publish/subscribe channel.
///
/// Cloning a channel yields another handle to the same set of listeners, so a
/// channel placed in a [`crate::Pipe`] can be shared by every plugin that
/// holds the pipe.
#[derive(Clone, Default)]
pub struct Channel {
    state: Arc<Mutex<ChannelState>>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events named `event`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// disposed. Dropping the subscription does not unsubscribe.
    pub fn on<F, Fut>(&self, event: impl ToString, handler: F) -> Subscription
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler: Handler =
            Arc::new(move |event: Event| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(handler(event))
            });

        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state
            .listeners
            .push(Listener { id, event: event.to_string(), handler });

        Subscription { state: Arc::downgrade(&self.state), id }
    }

    /// Delivers an event to every handler registered for `event`, in
    /// registration order, awaiting each one before the next.
    ///
    /// The first handler error stops delivery and is returned as is.
    pub async fn emit<V: Into<Value>>(
        &self,
        event: impl ToString,
        value: V,
    ) -> anyhow::Result<()> {
        let event = Event::new(event, value);
        let handlers: Vec<Handler> = lock(&self.state)
            .listeners
            .iter()
            .filter(|listener| listener.event == event.name)
            .map(|listener| listener.handler.clone())
            .collect();

        trace!(event = %event.name, handlers = handlers.len(), "Emitting event");

        for handler in handlers {
            handler(event.clone()).await?;
        }
        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.state)
            .listeners
            .iter()
            .filter(|listener| listener.event == event)
            .count()
    }

    /// Returns true when both handles point at the same channel.
    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Channel")
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Handle to one registered handler.
#[derive(Debug)]
pub struct Subscription {
    state: Weak<Mutex<ChannelState>>,
    id: u64,
}

impl Subscription {
    /// Removes the handler from its channel. Returns false if it was already
    /// gone or the channel no longer exists.
    pub fn dispose(&self) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut state = lock(&state);
        let before = state.listeners.len();
        state.listeners.retain(|listener| listener.id != self.id);
        state.listeners.len() != before
    }

    pub fn is_active(&self) -> bool {
        self.state.upgrade().is_some_and(|state| {
            lock(&state)
                .listeners
                .iter()
                .any(|listener| listener.id == self.id)
        })
    }
}
