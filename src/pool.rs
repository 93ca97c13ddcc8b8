//! Memory pools
//!
//! Buffers never allocate directly: every owned region comes from a [`Pool`] and goes back to
//! the same pool when the buffer is torn down. Views over borrowed memory are never released.
use std::cell::Cell;
use std::fmt;

/// Allocation contract used by the owning buffers
pub trait Pool {
    /// Allocate `size` zeroed bytes, or `None` if the pool cannot serve the request
    fn allocate(&self, size: usize) -> Option<Box<[u8]>>;

    /// Give back a region obtained from `allocate`
    fn release(&self, mem: Box<[u8]>) {
        drop(mem);
    }
}

impl fmt::Debug for dyn Pool + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pool")
    }
}

/// The default pool: the global heap, with allocation failures reported instead of aborting
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapPool;

impl Pool for HeapPool {
    fn allocate(&self, size: usize) -> Option<Box<[u8]>> {
        let mut v = Vec::new();
        v.try_reserve_exact(size).ok()?;
        v.resize(size, 0);
        Some(v.into_boxed_slice())
    }
}

/// A pool with a byte budget, keeping track of what is outstanding
///
/// Useful to check that buffers do not leak, and to force allocation failures.
#[derive(Debug)]
pub struct CountingPool {
    limit: usize,
    outstanding: Cell<usize>,
    allocations: Cell<usize>,
    releases: Cell<usize>,
}

impl CountingPool {
    pub fn new(limit: usize) -> Self {
        CountingPool {
            limit,
            outstanding: Cell::new(0),
            allocations: Cell::new(0),
            releases: Cell::new(0),
        }
    }

    pub fn unlimited() -> Self {
        CountingPool::new(usize::MAX)
    }

    /// Bytes allocated and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub fn releases(&self) -> usize {
        self.releases.get()
    }
}

impl Pool for CountingPool {
    fn allocate(&self, size: usize) -> Option<Box<[u8]>> {
        let total = self.outstanding.get().checked_add(size)?;
        if total > self.limit {
            return None;
        }
        let mem = HeapPool.allocate(size)?;
        self.outstanding.set(total);
        self.allocations.set(self.allocations.get() + 1);
        Some(mem)
    }

    fn release(&self, mem: Box<[u8]>) {
        debug_assert!(mem.len() <= self.outstanding.get());
        self.outstanding
            .set(self.outstanding.get().saturating_sub(mem.len()));
        self.releases.set(self.releases.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_pool_budget() {
        let pool = CountingPool::new(10);
        let a = pool.allocate(6).expect("allocation failed");
        assert!(pool.allocate(5).is_none());
        assert_eq!(pool.outstanding(), 6);
        pool.release(a);
        assert_eq!(pool.outstanding(), 0);
        assert!(pool.allocate(10).is_some());
        assert_eq!(pool.allocations(), 2);
        assert_eq!(pool.releases(), 1);
    }

    #[test]
    fn test_heap_pool_zeroed() {
        let mem = HeapPool.allocate(4).expect("allocation failed");
        assert_eq!(&mem[..], &[0, 0, 0, 0]);
    }
}
