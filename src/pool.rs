use parking_lot::Mutex;

/// Number of idle events an [`EventPool`] keeps by default.
pub const DEFAULT_RETAIN: usize = 64;

/// Concurrent reuse cache for boxed events.
///
/// Each adapter owns its own pool, so independent loggers (and tests) never
/// share reuse state. Acquisition allocates a fresh `T::default()` when the
/// pool is empty; returned values beyond the retention bound are dropped.
pub struct EventPool<T> {
    idle: Mutex<Vec<Box<T>>>,
    retain: usize,
}

impl<T: Default> EventPool<T> {
    pub fn new() -> Self {
        Self::with_retain(DEFAULT_RETAIN)
    }

    pub fn with_retain(retain: usize) -> Self {
        EventPool {
            idle: Mutex::new(Vec::new()),
            retain,
        }
    }

    pub fn get(&self) -> Box<T> {
        if let Some(value) = self.idle.lock().pop() {
            return value;
        }
        tracing::debug!("event pool empty, allocating");
        Box::default()
    }

    /// Return a value. The caller is responsible for resetting it first.
    pub fn put(&self, value: Box<T>) {
        let mut idle = self.idle.lock();
        if idle.len() < self.retain {
            idle.push(value);
        } else {
            tracing::trace!(retain = self.retain, "event pool full, dropping event");
        }
    }

    pub fn len(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Default> Default for EventPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Default)]
    struct Slot {
        values: Vec<u32>,
    }

    #[test]
    fn reuses_returned_allocation() {
        let pool: EventPool<Slot> = EventPool::new();
        let mut slot = pool.get();
        slot.values.reserve(32);
        let ptr = &*slot as *const Slot;
        slot.values.clear();
        pool.put(slot);
        assert_eq!(pool.len(), 1);

        let again = pool.get();
        assert_eq!(&*again as *const Slot, ptr);
        assert!(again.values.capacity() >= 32);
        assert!(pool.is_empty());
    }

    #[test]
    fn retention_is_bounded() {
        let pool: EventPool<Slot> = EventPool::with_retain(2);
        for _ in 0..5 {
            pool.put(Box::default());
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn concurrent_get_and_put() {
        let pool: Arc<EventPool<Slot>> = Arc::new(EventPool::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for n in 0..200 {
                        let mut slot = pool.get();
                        slot.values.push(i * 1000 + n);
                        slot.values.clear();
                        pool.put(slot);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert!(pool.len() <= DEFAULT_RETAIN);
        assert!(!pool.is_empty());
    }
}
