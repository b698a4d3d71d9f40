//! Registry of the channels known to a connection

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;

use super::Channel;

/// Maps channel ids to their handles. Channel 0 is always present.
#[derive(Debug)]
pub struct ChannelRegistry {
    channels: Mutex<BTreeMap<u16, Arc<Channel>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Creates a registry holding only channel 0
    pub fn new() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(0, Arc::new(Channel::new(0)));
        Self {
            channels: Mutex::new(channels),
        }
    }

    /// Looks up a channel
    pub fn get(&self, id: u16) -> Option<Arc<Channel>> {
        self.channels.lock().get(&id).cloned()
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: u16) -> bool {
        self.channels.lock().contains_key(&id)
    }

    /// Registers a channel, returning the handle already registered under the
    /// same id if there is one
    pub fn insert(&self, channel: Arc<Channel>) -> Arc<Channel> {
        self.channels
            .lock()
            .entry(channel.id())
            .or_insert(channel)
            .clone()
    }

    /// Removes a channel. Channel 0 cannot be removed.
    pub fn remove(&self, id: u16) -> Option<Arc<Channel>> {
        match id {
            0 => None,
            id => self.channels.lock().remove(&id),
        }
    }

    /// Ids of every registered channel other than 0, in ascending order
    pub fn channel_ids(&self) -> Vec<u16> {
        self.channels
            .lock()
            .keys()
            .copied()
            .filter(|id| *id != 0)
            .collect()
    }

    /// Number of registered channels other than 0
    pub fn len(&self) -> usize {
        self.channels.lock().len() - 1
    }

    /// Whether no channel other than 0 is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every channel other than 0 and marks them closed
    pub fn clear(&self) {
        let mut channels = self.channels.lock();
        channels.retain(|id, channel| {
            if *id != 0 {
                channel.set_open(false);
            }
            *id == 0
        });
    }
}
