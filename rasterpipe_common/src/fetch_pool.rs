// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A pool of reference-counted fetch data.
//!
//! Fetch data is shared by every command of a batch that uses the same style.
//! Slots are allocated in chunks and recycled through a free list as soon as
//! their reference count drops to zero, so a batch that keeps changing styles
//! doesn't hit the allocator for every style.

use crate::error::Result;
use crate::fetch::FetchData;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Number of slots allocated at once when the pool runs out of free slots.
pub const FETCH_DATA_POOL_CHUNK: usize = 32;

/// Identifies a slot of a [`FetchDataPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchDataId(u32);

impl FetchDataId {
    #[inline]
    fn chunk(self) -> usize {
        self.0 as usize / FETCH_DATA_POOL_CHUNK
    }

    #[inline]
    fn slot(self) -> usize {
        self.0 as usize % FETCH_DATA_POOL_CHUNK
    }
}

/// A fetch data together with its reference count.
#[derive(Debug, Default)]
pub struct RenderFetchData {
    ref_count: AtomicUsize,
    data: Option<FetchData>,
}

impl RenderFetchData {
    /// The resolved style.
    ///
    /// # Panics
    ///
    /// Panics if the slot was released.
    pub fn data(&self) -> &FetchData {
        self.data
            .as_ref()
            .expect("fetch data was accessed after it was released")
    }

    /// The current reference count.
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }
}

/// Slab allocator for [`RenderFetchData`].
#[derive(Debug, Default)]
pub struct FetchDataPool {
    chunks: Vec<Box<[RenderFetchData]>>,
    free: Vec<FetchDataId>,
    live: usize,
}

impl FetchDataPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` with an initial reference count of `refs`.
    ///
    /// A count of zero is allowed for data that is retained right away by the
    /// commands using it.
    pub fn alloc(&mut self, data: FetchData, refs: usize) -> Result<FetchDataId> {
        if self.free.is_empty() {
            self.grow()?;
        }
        let Some(id) = self.free.pop() else {
            unreachable!("the pool was just grown");
        };

        let slot = &mut self.chunks[id.chunk()][id.slot()];
        debug_assert!(slot.data.is_none());
        slot.data = Some(data);
        *slot.ref_count.get_mut() = refs;
        self.live += 1;
        Ok(id)
    }

    fn grow(&mut self) -> Result<()> {
        let base = self.chunks.len() * FETCH_DATA_POOL_CHUNK;
        self.chunks.try_reserve(1)?;
        self.free.try_reserve(FETCH_DATA_POOL_CHUNK)?;

        let mut chunk = Vec::new();
        chunk.try_reserve_exact(FETCH_DATA_POOL_CHUNK)?;
        chunk.resize_with(FETCH_DATA_POOL_CHUNK, RenderFetchData::default);
        self.chunks.push(chunk.into_boxed_slice());

        // Hand out lower slots first.
        self.free
            .extend((0..FETCH_DATA_POOL_CHUNK).rev().map(|i| FetchDataId((base + i) as u32)));
        Ok(())
    }

    /// Accesses a slot.
    #[inline]
    pub fn get(&self, id: FetchDataId) -> &RenderFetchData {
        &self.chunks[id.chunk()][id.slot()]
    }

    /// Increments the reference count.
    ///
    /// Takes `&self`, so it can be called while the pool is shared.
    pub fn retain(&self, id: FetchDataId) {
        self.get(id).ref_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the reference count, recycling the slot when it reaches zero.
    ///
    /// Returns `true` if the slot was recycled.
    ///
    /// # Panics
    ///
    /// Panics if the reference count is already zero.
    pub fn release(&mut self, id: FetchDataId) -> bool {
        let slot = &mut self.chunks[id.chunk()][id.slot()];
        let prev = slot.ref_count.fetch_sub(1, Ordering::AcqRel);
        assert!(prev > 0, "fetch data released more times than retained");
        if prev != 1 {
            return false;
        }

        slot.data = None;
        self.free.push(id);
        self.live -= 1;
        true
    }

    /// Number of slots holding data.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of allocated slots, free or not.
    pub fn capacity(&self) -> usize {
        self.chunks.len() * FETCH_DATA_POOL_CHUNK
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchDataPool, FETCH_DATA_POOL_CHUNK};
    use crate::fetch::FetchData;

    #[test]
    fn slots_are_recycled_when_released() {
        let mut pool = FetchDataPool::new();
        let a = pool.alloc(FetchData::Solid(0xFF00_0000), 1).unwrap();
        assert_eq!(pool.capacity(), FETCH_DATA_POOL_CHUNK);

        pool.retain(a);
        pool.retain(a);
        assert_eq!(pool.get(a).ref_count(), 3);
        assert!(!pool.release(a));
        assert!(!pool.release(a));
        assert_eq!(pool.live_count(), 1);
        assert!(pool.release(a));
        assert_eq!(pool.live_count(), 0);

        let b = pool.alloc(FetchData::Solid(0xFFFF_FFFF), 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.get(b).data(), &FetchData::Solid(0xFFFF_FFFF));
    }

    #[test]
    fn pool_grows_in_chunks() {
        let mut pool = FetchDataPool::new();
        let ids: Vec<_> = (0..FETCH_DATA_POOL_CHUNK + 1)
            .map(|i| pool.alloc(FetchData::Solid(i as u32), 1).unwrap())
            .collect();
        assert_eq!(pool.capacity(), 2 * FETCH_DATA_POOL_CHUNK);
        assert_eq!(pool.live_count(), ids.len());
        for id in ids {
            assert!(pool.release(id));
        }
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "released more times")]
    fn double_release_panics() {
        let mut pool = FetchDataPool::new();
        let a = pool.alloc(FetchData::Solid(0), 1).unwrap();
        pool.release(a);
        pool.release(a);
    }
}
