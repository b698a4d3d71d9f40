//! Channels multiplexed over a connection

pub mod allocator;
pub mod registry;

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

pub use allocator::{AllocError, ChannelIdAllocator};
pub use registry::ChannelRegistry;

/// Handle to one channel of a [`crate::Connection`]
///
/// Channel 0 stands for the connection itself and is always present in the
/// registry. It is never opened with `channel.open`.
#[derive(Debug)]
pub struct Channel {
    id: u16,
    open: AtomicBool,
    frameset_lock: Mutex<()>,
}

impl Channel {
    pub(crate) fn new(id: u16) -> Self {
        Self {
            id,
            open: AtomicBool::new(id == 0),
            frameset_lock: Mutex::new(()),
        }
    }

    /// Channel number
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Whether the broker has confirmed the channel and it has not been closed since
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub(crate) fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
    }

    /// Held while the frames of one content-carrying method are written so that
    /// no other frame on this channel interleaves with them
    pub(crate) async fn lock_frameset(&self) -> MutexGuard<'_, ()> {
        self.frameset_lock.lock().await
    }
}
