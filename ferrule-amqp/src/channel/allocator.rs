//! Channel id allocation

use parking_lot::Mutex;

/// Largest channel id the protocol can address
pub const MAX_CHANNEL_ID: u16 = u16::MAX;

/// Errors associated with channel id allocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// Every id below the limit is in use
    #[error("No free channel id below {max}")]
    Exhausted {
        /// Exclusive upper bound of the id space
        max: u16,
    },

    /// Channel 0 belongs to the connection
    #[error("Channel 0 is reserved for the connection")]
    Reserved,

    /// The id is outside of the id space
    #[error("Channel id {id} is outside of [1, {max})")]
    OutOfRange {
        /// Requested id
        id: u16,
        /// Exclusive upper bound of the id space
        max: u16,
    },

    /// The id is not currently allocated
    #[error("Channel id {0} is not allocated")]
    NotAllocated(u16),

    /// The id is already allocated
    #[error("Channel id {0} is already in use")]
    InUse(u16),
}

#[derive(Debug)]
struct Inner {
    max: u16,
    words: Vec<u64>,
    count: usize,
}

impl Inner {
    fn new(max: u16) -> Self {
        let words = (max as usize + 63) / 64;
        let mut inner = Self {
            max,
            words: vec![0; words.max(1)],
            count: 0,
        };
        // 0 is never handed out
        inner.words[0] |= 1;
        inner
    }

    fn is_set(&self, id: u16) -> bool {
        let (word, bit) = (id as usize / 64, id as usize % 64);
        self.words
            .get(word)
            .map(|w| w & (1 << bit) != 0)
            .unwrap_or(false)
    }

    fn set(&mut self, id: u16) {
        self.words[id as usize / 64] |= 1 << (id as usize % 64);
        self.count += 1;
    }

    fn clear(&mut self, id: u16) {
        self.words[id as usize / 64] &= !(1 << (id as usize % 64));
        self.count -= 1;
    }

    fn check_range(&self, id: u16) -> Result<(), AllocError> {
        match id {
            0 => Err(AllocError::Reserved),
            id if id >= self.max => Err(AllocError::OutOfRange { id, max: self.max }),
            _ => Ok(()),
        }
    }

    fn lowest_free(&self) -> Option<u16> {
        self.words.iter().enumerate().find_map(|(i, word)| {
            if *word == u64::MAX {
                return None;
            }
            let id = i * 64 + (!word).trailing_zeros() as usize;
            (id < self.max as usize).then_some(id as u16)
        })
    }
}

/// Hands out channel ids in `[1, max)`, always the lowest free one.
///
/// All operations take `&self` and are safe to call from multiple tasks.
#[derive(Debug)]
pub struct ChannelIdAllocator {
    inner: Mutex<Inner>,
}

impl Default for ChannelIdAllocator {
    fn default() -> Self {
        Self::new(MAX_CHANNEL_ID)
    }
}

impl ChannelIdAllocator {
    /// Creates an allocator over `[1, max)`
    pub fn new(max: u16) -> Self {
        Self {
            inner: Mutex::new(Inner::new(max)),
        }
    }

    /// Creates an allocator for a negotiated channel-max, which is the highest
    /// usable id. A channel-max of 0 means no limit.
    pub fn with_channel_max(channel_max: u16) -> Self {
        Self::new(exclusive_bound(channel_max))
    }

    /// Exclusive upper bound of the id space
    pub fn max(&self) -> u16 {
        self.inner.lock().max
    }

    /// Returns the lowest free id and marks it allocated
    pub fn allocate(&self) -> Result<u16, AllocError> {
        let mut inner = self.inner.lock();
        let id = inner
            .lowest_free()
            .ok_or(AllocError::Exhausted { max: inner.max })?;
        inner.set(id);
        Ok(id)
    }

    /// Marks a caller chosen id as allocated
    pub fn reserve(&self, id: u16) -> Result<(), AllocError> {
        let mut inner = self.inner.lock();
        inner.check_range(id)?;
        if inner.is_set(id) {
            return Err(AllocError::InUse(id));
        }
        inner.set(id);
        Ok(())
    }

    /// Returns an id to the pool
    pub fn release(&self, id: u16) -> Result<(), AllocError> {
        let mut inner = self.inner.lock();
        inner.check_range(id)?;
        if !inner.is_set(id) {
            return Err(AllocError::NotAllocated(id));
        }
        inner.clear(id);
        Ok(())
    }

    /// Whether `id` is currently allocated
    pub fn is_allocated(&self, id: u16) -> bool {
        let inner = self.inner.lock();
        id != 0 && inner.is_set(id)
    }

    /// Number of ids currently allocated
    pub fn allocated_count(&self) -> usize {
        self.inner.lock().count
    }

    /// Releases every id
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let max = inner.max;
        *inner = Inner::new(max);
    }

    /// Replaces the id space with one sized for a negotiated channel-max. Every
    /// id is released.
    pub fn set_channel_max(&self, channel_max: u16) {
        *self.inner.lock() = Inner::new(exclusive_bound(channel_max));
    }
}

fn exclusive_bound(channel_max: u16) -> u16 {
    match channel_max {
        0 => MAX_CHANNEL_ID,
        n => n.saturating_add(1),
    }
}
