//! The two-level storage layer: an owning array of chunk handles plus the
//! active-window cursors that mark which chunks the deque currently reaches.

use alloc::alloc::{alloc, dealloc};
use alloc::vec::Vec;
use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use crate::{AllocError, CHUNK_CAP};

/// An owning, resizable array of chunk handles bracketed by the active
/// window `[lo, hi]`.
///
/// A handle is `null` until its chunk is first needed. Every handle inside
/// the window is non-null; the `hi` chunk may hold no live elements yet (it
/// backs the one-past-end position). Handles outside the window may be null
/// or stale: stale chunks stay owned, are reused as-is when the window
/// re-advances over them, and are freed only when the map itself goes away.
pub(crate) struct ChunkMap<T> {
    handles: Vec<*mut T>,
    pub(crate) lo: usize,
    pub(crate) hi: usize,
    _marker: PhantomData<T>,
}

impl<T> ChunkMap<T> {
    /// A pristine map: no handle array, no chunks. The window invariant
    /// starts to apply with the first allocation.
    pub(crate) const fn new() -> Self {
        ChunkMap {
            handles: Vec::new(),
            lo: 0,
            hi: 0,
            _marker: PhantomData,
        }
    }

    /// Builds a map with storage for `n` elements already allocated: the
    /// handle array sized for the chunks `n` elements occupy plus the
    /// end-position slot, and those chunks eagerly backed. The window starts
    /// minimal (`lo == hi == 0`) and advances over the pre-allocated handles
    /// as elements arrive.
    ///
    /// On a mid-construction allocation failure every chunk allocated so far
    /// and the handle array are freed before the error is returned.
    pub(crate) fn try_construct(n: usize) -> Result<Self, AllocError> {
        let end_chunk = n / CHUNK_CAP;
        let slots = end_chunk
            .checked_add(2)
            .ok_or_else(AllocError::capacity_overflow)?;
        let mut map = ChunkMap::new();
        if map.handles.try_reserve_exact(slots).is_err() {
            return Err(handle_array_error::<T>(slots));
        }
        map.handles.resize(slots, ptr::null_mut());
        for i in 0..=end_chunk {
            // on failure the partially built map is dropped, which frees
            // every handle filled in so far
            map.handles[i] = alloc_chunk::<T>()?;
        }
        Ok(map)
    }

    /// True until the first allocation.
    #[inline]
    pub(crate) fn is_unallocated(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of slots in the handle array.
    #[inline]
    pub(crate) fn slots(&self) -> usize {
        self.handles.len()
    }

    /// Total element capacity across allocated chunks, stale ones included.
    pub(crate) fn allocated_slots(&self) -> usize {
        self.handles.iter().filter(|handle| !handle.is_null()).count() * CHUNK_CAP
    }

    /// The handle of chunk `i`.
    ///
    /// # Safety
    ///
    /// `i` must be less than `self.slots()`.
    #[inline]
    pub(crate) unsafe fn chunk(&self, i: usize) -> *mut T {
        debug_assert!(i < self.handles.len());
        *self.handles.get_unchecked(i)
    }

    /// The active window as a slice of handles, `lo ..= hi`.
    #[inline]
    pub(crate) fn window(&self) -> &[*mut T] {
        if self.handles.is_empty() {
            &[]
        } else {
            &self.handles[self.lo..=self.hi]
        }
    }

    /// Backs chunk `i` with storage if its handle is still null. A stale
    /// handle left behind by earlier pops is reused without allocating.
    pub(crate) fn ensure(&mut self, i: usize) -> Result<(), AllocError> {
        if self.handles[i].is_null() {
            self.handles[i] = alloc_chunk::<T>()?;
        }
        Ok(())
    }

    /// Re-establishes headroom once the window has hit an edge of the handle
    /// array: recenters when the window occupies less than a third of the
    /// array, regrows otherwise.
    pub(crate) fn update(&mut self) -> Result<(), AllocError> {
        if 3 * (self.hi - self.lo + 1) < self.handles.len() {
            self.recenter();
            Ok(())
        } else {
            self.regrow()
        }
    }

    /// Swap-shifts the window handles into the middle third of the array.
    /// Swapping rather than overwriting keeps every stale handle owned
    /// somewhere in the array.
    fn recenter(&mut self) {
        let width = self.hi - self.lo;
        let new_lo = self.handles.len() / 3;
        // the update trigger plus the window sitting at an edge make the
        // source and target ranges disjoint
        debug_assert!(new_lo + width < self.lo || self.lo + width < new_lo);
        if new_lo < self.lo {
            for i in 0..=width {
                self.handles.swap(new_lo + i, self.lo + i);
            }
        } else {
            for i in (0..=width).rev() {
                self.handles.swap(new_lo + i, self.lo + i);
            }
        }
        self.lo = new_lo;
        self.hi = new_lo + width;
    }

    /// Replaces the handle array with one of three times the slots plus one,
    /// moving the existing handles, and with them chunk ownership, into the
    /// middle third. Elements never move.
    fn regrow(&mut self) -> Result<(), AllocError> {
        let old = self.handles.len();
        debug_assert!(old > 0);
        let slots = old
            .checked_mul(3)
            .and_then(|slots| slots.checked_add(1))
            .ok_or_else(AllocError::capacity_overflow)?;
        let mut handles: Vec<*mut T> = Vec::new();
        if handles.try_reserve_exact(slots).is_err() {
            return Err(handle_array_error::<T>(slots));
        }
        handles.resize(slots, ptr::null_mut());
        handles[old..2 * old].copy_from_slice(&self.handles);
        self.handles = handles;
        self.lo += old;
        self.hi += old;
        Ok(())
    }
}

impl<T> Drop for ChunkMap<T> {
    fn drop(&mut self) {
        // frees storage only; live elements were destroyed by the deque
        // before the map goes away
        for &handle in &self.handles {
            if !handle.is_null() {
                // SAFETY: non-null handles all came out of `alloc_chunk`.
                unsafe { free_chunk(handle) };
            }
        }
    }
}

/// Allocates one chunk of `CHUNK_CAP` uninitialized element slots. For
/// zero-sized element types the handle is dangling and nothing is allocated;
/// dangling is non-null, so the null-means-unallocated convention still
/// holds.
fn alloc_chunk<T>() -> Result<*mut T, AllocError> {
    if mem::size_of::<T>() == 0 {
        return Ok(NonNull::dangling().as_ptr());
    }
    let layout =
        Layout::array::<T>(CHUNK_CAP).map_err(|_| AllocError::capacity_overflow())?;
    // SAFETY: `layout` has non-zero size here.
    let ptr = unsafe { alloc(layout) };
    if ptr.is_null() {
        return Err(AllocError::alloc(layout));
    }
    Ok(ptr.cast())
}

/// Releases one chunk.
///
/// # Safety
///
/// `handle` must have come out of [`alloc_chunk`] and not been freed since.
unsafe fn free_chunk<T>(handle: *mut T) {
    if mem::size_of::<T>() == 0 {
        return;
    }
    // SAFETY: the layout was validated when the chunk was allocated.
    let layout = Layout::from_size_align_unchecked(
        mem::size_of::<T>() * CHUNK_CAP,
        mem::align_of::<T>(),
    );
    dealloc(handle.cast(), layout);
}

/// Maps a failed handle-array reservation onto [`AllocError`].
fn handle_array_error<T>(slots: usize) -> AllocError {
    match Layout::array::<*mut T>(slots) {
        Ok(layout) => AllocError::alloc(layout),
        Err(_) => AllocError::capacity_overflow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocated(map: &ChunkMap<u64>) -> Vec<*mut u64> {
        let mut handles: Vec<_> = map
            .handles
            .iter()
            .copied()
            .filter(|handle| !handle.is_null())
            .collect();
        handles.sort();
        handles
    }

    #[test]
    fn construct_empty() {
        let map = ChunkMap::<u64>::try_construct(0).unwrap();
        assert_eq!(map.slots(), 2);
        assert_eq!((map.lo, map.hi), (0, 0));
        assert_eq!(map.allocated_slots(), CHUNK_CAP);
    }

    #[test]
    fn construct_eager() {
        // three chunks cover 20 elements at the test chunk size of 8
        let map = ChunkMap::<u64>::try_construct(20).unwrap();
        assert_eq!(map.slots(), 4);
        assert_eq!((map.lo, map.hi), (0, 0));
        assert_eq!(map.allocated_slots(), 3 * CHUNK_CAP);
    }

    #[test]
    fn construct_boundary() {
        // 16 elements end exactly on a chunk edge; the end-position chunk is
        // allocated as well
        let map = ChunkMap::<u64>::try_construct(2 * CHUNK_CAP).unwrap();
        assert_eq!(map.slots(), 4);
        assert_eq!(map.allocated_slots(), 3 * CHUNK_CAP);
    }

    #[test]
    fn ensure_reuses_stale_handles() {
        let mut map = ChunkMap::<u64>::try_construct(20).unwrap();
        let first = unsafe { map.chunk(1) };
        assert!(!first.is_null());
        map.ensure(1).unwrap();
        assert_eq!(unsafe { map.chunk(1) }, first);
        assert!(unsafe { map.chunk(3) }.is_null());
        map.ensure(3).unwrap();
        assert!(!unsafe { map.chunk(3) }.is_null());
    }

    #[test]
    fn update_regrows_at_bootstrap_size() {
        let mut map = ChunkMap::<u64>::try_construct(0).unwrap();
        let chunk = unsafe { map.chunk(0) };
        map.update().unwrap();
        assert_eq!(map.slots(), 7);
        assert_eq!((map.lo, map.hi), (2, 2));
        // the old window chunk moved with its handle
        assert_eq!(unsafe { map.chunk(2) }, chunk);
    }

    #[test]
    fn update_recenters_a_sparse_window() {
        let mut map = ChunkMap::<u64>::try_construct(100).unwrap();
        assert_eq!(map.slots(), 14);
        // pretend the deque has advanced the window to the low edge
        map.hi = 3;
        let before = allocated(&map);
        let window: Vec<_> = map.handles[0..=3].to_vec();
        map.update().unwrap();
        assert_eq!(map.slots(), 14);
        assert_eq!((map.lo, map.hi), (4, 7));
        assert_eq!(&map.handles[4..=7], &window[..]);
        // recentering moved handles around but kept every chunk owned
        assert_eq!(allocated(&map), before);
    }

    #[test]
    fn regrow_preserves_chunk_ownership() {
        let mut map = ChunkMap::<u64>::try_construct(40).unwrap();
        map.hi = map.slots() - 1;
        let before = allocated(&map);
        let window: Vec<_> = map.handles[map.lo..=map.hi].to_vec();
        map.update().unwrap();
        assert_eq!(map.slots(), 7 * 3 + 1);
        assert_eq!(&map.handles[map.lo..=map.hi], &window[..]);
        assert_eq!(allocated(&map), before);
    }
}
