use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::Channel;

/// Shared holder of named channels that plugins use to talk to each other
/// without holding references to one another.
///
/// `Pipe` is a handle: clones observe the same channels.
#[derive(Clone, Default)]
pub struct Pipe {
    channels: Arc<Mutex<HashMap<String, Channel>>>,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_channel(self, name: impl ToString, channel: Channel) -> Self {
        self.insert(name, channel);
        self
    }

    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.channels().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels().contains_key(name)
    }

    /// Places `channel` under `name`, returning the channel it replaced.
    pub fn insert(&self, name: impl ToString, channel: Channel) -> Option<Channel> {
        self.channels().insert(name.to_string(), channel)
    }

    /// Returns the channel under `name`, creating an empty one first if the
    /// pipe has none.
    pub fn get_or_create(&self, name: &str) -> Channel {
        self.channels()
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(channel = name, "Creating channel");
                Channel::new()
            })
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.channels().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns true when both handles point at the same pipe.
    pub fn ptr_eq(&self, other: &Pipe) -> bool {
        Arc::ptr_eq(&self.channels, &other.channels)
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("channels", &self.names())
            .finish()
    }
}
