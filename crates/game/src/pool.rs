//! Pooled send buffers

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

/// Default size of one send buffer
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 65536;

/// Free list of send buffers
///
/// # Purpose
/// Outbound frames are serialized into rented buffers that the host keeps
/// until its asynchronous send completes. A buffer goes back to the pool
/// when the last owner drops it.
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    buffer_size: usize,
    outstanding: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_size: usize) -> Arc<Self> {
        Arc::new(Self {
            free: Mutex::new(Vec::new()),
            buffer_size,
            outstanding: AtomicUsize::new(0),
        })
    }

    /// Take an empty buffer with at least `buffer_size` bytes of capacity
    pub fn rent(self: &Arc<Self>) -> PooledBuffer {
        let buffer = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size));
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        PooledBuffer {
            buffer,
            pool: self.clone(),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers rented and not yet returned
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Buffers waiting in the free list
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    fn give_back(&self, mut buffer: BytesMut) {
        buffer.clear();
        if buffer.capacity() < self.buffer_size {
            buffer.reserve(self.buffer_size);
        }
        self.free.lock().push(buffer);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// A rented buffer, returned to its pool on drop
pub struct PooledBuffer {
    buffer: BytesMut,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buffer));
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_rent_and_return() {
        let pool = BufferPool::new(1024);
        {
            let mut buffer = pool.rent();
            assert!(buffer.capacity() >= 1024);
            buffer.put_slice(&[1, 2, 3]);
            assert_eq!(pool.outstanding(), 1);
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);

        let buffer = pool.rent();
        assert!(buffer.is_empty());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_buffer_outlives_renter() {
        let pool = BufferPool::new(64);
        let held = {
            let mut buffer = pool.rent();
            buffer.put_u8(9);
            buffer
        };
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(&held[..], &[9]);
        drop(held);
        assert_eq!(pool.outstanding(), 0);
    }
}
