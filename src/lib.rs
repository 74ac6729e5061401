//! A `VecDeque` variant whose elements never move once they have been pushed.
//!
//! Most of the time, when you need a growable double-ended queue, you reach
//! for [`VecDeque`], and most of the time that is the right call. It keeps
//! every element in a single contiguous ring buffer, which keeps iteration
//! fast and indexing trivial. The catch is the word "single": when the ring
//! fills up, `VecDeque` allocates a larger buffer and moves every element
//! across to it.
//!
//! That move has two costs. The visible one is latency: the push that
//! triggers it takes time proportional to the entire collection, which is why
//! a mostly-steady queue occasionally produces a push that is thousands of
//! times slower than its neighbors. The quieter one is that every element
//! changes address, which invalidates any pointer held into the collection
//! from outside it. If your elements are the targets of raw pointers, say
//! because an intrusive structure or a foreign library points at them, a
//! single unlucky push silently breaks every one of those pointers.
//!
//! `Deque` spends a little of `VecDeque`'s raw speed to get rid of both
//! costs. Elements live in fixed-capacity chunks. A chunk is allocated once
//! and released only when the deque is dropped, and no operation ever copies
//! elements between chunks to grow the collection. Growth replaces the small
//! table of chunk pointers instead, so the worst-case push cost is bounded by
//! the table length (a few pointers per chunk's worth of elements), not by
//! the number of elements.
//!
//! # What "never moves" means
//!
//! From the moment a value is pushed until the moment it leaves the deque,
//! its address is stable across every push and pop at either end, no matter
//! how much the deque grows or shrinks around it.
//!
//! Two operations are excepted. [`insert`] and [`remove`] open or close a gap
//! in the middle by shifting the values on the shorter side over by one slot,
//! so they move the values they shift. The slots themselves stay put; an old
//! pointer keeps pointing at a valid element, just possibly a different one.
//! [`swap`] and [`reverse`] likewise permute values between fixed slots.
//!
//! Note that this is a guarantee about addresses, not about borrows: the
//! borrow checker still will not let you hold a `&T` into the deque across a
//! `push_back`. It is raw pointers, and the data structures built on them,
//! that stay valid.
//!
//! # Performance
//!
//! Pushes at either end are amortized O(1), and the amortized part covers
//! only pointer-table maintenance: when the table runs out of headroom, the
//! deque either re-centers the active pointers within it or allocates a table
//! three times as large and copies the pointers over. Either way it touches
//! one pointer per chunk, never the elements. Indexing costs one extra
//! pointer dereference compared to `Vec`. `insert` and `remove` at position
//! `i` cost `O(min(i, len - i))` value moves. Iteration walks each chunk
//! linearly and hops to the next chunk at its edge.
//!
//! # Example
//!
//! ```
//! use holdfast::Deque;
//!
//! let mut deque = Deque::new();
//! deque.push_back(String::from("anchored"));
//! let p: *const String = &deque[0];
//!
//! // Grow the deque well past plenty of chunk and table boundaries.
//! for i in 0..10_000 {
//!     deque.push_back(i.to_string());
//! }
//! for i in 0..10_000 {
//!     deque.push_front(i.to_string());
//! }
//!
//! // The first element never moved.
//! assert!(core::ptr::eq(p, &deque[10_000]));
//! assert_eq!(unsafe { &*p }, "anchored");
//! ```
//!
//! # Why `holdfast`?
//!
//! A holdfast is the structure a kelp grows to anchor itself to the sea
//! floor. Storms may batter the fronds above, but the anchor does not let
//! go. The elements of this deque hold fast in the same way: the collection
//! around them may grow and churn, while every element stays exactly where
//! it was first written.
//!
//! [`VecDeque`]: alloc::collections::VecDeque
//! [`insert`]: Deque::insert
//! [`remove`]: Deque::remove
//! [`swap`]: Deque::swap
//! [`reverse`]: Deque::reverse
#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// The number of element slots in each chunk. Test and Miri builds use a small
// chunk so that modest test cases already cross chunk edges and grow the
// chunk table.
#[cfg(any(test, miri))]
pub(crate) const CHUNK_CAP: usize = 8;
#[cfg(not(any(test, miri)))]
pub(crate) const CHUNK_CAP: usize = 32;

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg_attr(test, macro_use)]
extern crate alloc;

use core::alloc::Layout;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FromIterator;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr;

use alloc::vec::Vec;

mod iter;
mod map;

/// A double-ended queue whose elements never move once they have been pushed.
pub mod deque {
    pub use super::iter::*;
}

use crate::iter::{IntoIter, Iter, IterMut};
use crate::map::ChunkMap;

/// The error returned by the deque's fallible operations when the memory they
/// need cannot be had.
///
/// Mirrors the two ways an allocation request dies: either a size computation
/// overflowed before the allocator was ever asked, or the allocator itself
/// declined.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AllocError {
    kind: AllocErrorKind,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum AllocErrorKind {
    CapacityOverflow,
    Alloc { layout: Layout },
}

impl AllocError {
    pub(crate) fn capacity_overflow() -> Self {
        Self {
            kind: AllocErrorKind::CapacityOverflow,
        }
    }

    pub(crate) fn alloc(layout: Layout) -> Self {
        Self {
            kind: AllocErrorKind::Alloc { layout },
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AllocErrorKind::CapacityOverflow => f.write_str(
                "memory allocation failed because the computed capacity exceeded the collection's maximum",
            ),
            AllocErrorKind::Alloc { .. } => {
                f.write_str("memory allocation failed because the memory allocator returned an error")
            }
        }
    }
}

impl core::error::Error for AllocError {}

/// A double-ended queue whose elements never move once they have been pushed.
///
/// See the [crate-level documentation] for details.
///
/// [crate-level documentation]: index.html
pub struct Deque<T> {
    // The chunk handles and the active window `lo ..= hi` within them.
    map: ChunkMap<T>,
    // Slot of the front element within chunk `lo`. Always less than
    // `CHUNK_CAP`, except transiently inside `insert`.
    head: usize,
    // Live element count.
    len: usize,
}

// The deque owns its chunks uniquely; the raw handles in the map never alias
// another deque's storage.
unsafe impl<T: Send> Send for Deque<T> {}
unsafe impl<T: Sync> Sync for Deque<T> {}

impl<T: Clone> Clone for Deque<T> {
    fn clone(&self) -> Deque<T> {
        self.iter().cloned().collect()
    }

    fn clone_from(&mut self, other: &Self) {
        // The copy is built in full before the old contents are torn down, so
        // a panicking `T::clone` leaves `self` untouched.
        let mut fresh = other.clone();
        mem::swap(self, &mut fresh);
    }
}

impl<T> Default for Deque<T> {
    /// Creates an empty `Deque<T>`.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deque<T> {
    /// Creates an empty deque.
    ///
    /// No memory is allocated until the first push.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque: Deque<u32> = Deque::new();
    /// assert_eq!(deque.capacity(), 0);
    /// ```
    pub const fn new() -> Self {
        Self {
            map: ChunkMap::new(),
            head: 0,
            len: 0,
        }
    }

    /// Creates an empty deque with pre-allocated chunks for at least
    /// `capacity` elements pushed at the back.
    ///
    /// `with_capacity(0)` allocates nothing, same as [`new`](Deque::new).
    ///
    /// # Panics
    ///
    /// Panics if the chunk table or one of the chunks cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque: Deque<u32> = Deque::with_capacity(10);
    /// assert!(deque.capacity() >= 10);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(deque) => deque,
            Err(err) => handle_alloc(err),
        }
    }

    /// Fallible version of [`with_capacity`](Deque::with_capacity): returns
    /// an error instead of panicking or aborting when memory is exhausted.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque = Deque::<u32>::try_with_capacity(64).unwrap();
    /// assert!(deque.capacity() >= 64);
    ///
    /// assert!(Deque::<u32>::try_with_capacity(usize::MAX).is_err());
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let mut deque = Self::new();
        if capacity != 0 {
            deque.map = ChunkMap::try_construct(capacity - 1)?;
        }
        Ok(deque)
    }

    /// Creates a deque holding `n` default-constructed elements.
    ///
    /// # Panics
    ///
    /// Panics if the chunks cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque: Deque<u32> = Deque::with_len(5);
    /// assert_eq!(deque.len(), 5);
    /// assert!(deque.iter().all(|&x| x == 0));
    /// ```
    pub fn with_len(n: usize) -> Self
    where
        T: Default,
    {
        let mut deque = Self::with_capacity(n);
        for _ in 0..n {
            deque.push_back(T::default());
        }
        deque
    }

    /// Creates a deque holding `n` copies of `elem`.
    ///
    /// With `n > 0` the final element is `elem` itself, so only `n - 1`
    /// clones are made.
    ///
    /// # Panics
    ///
    /// Panics if the chunks cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque = Deque::from_elem(7, 4);
    /// assert_eq!(deque.len(), 4);
    /// assert!(deque.iter().all(|&x| x == 7));
    /// ```
    pub fn from_elem(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut deque = Self::with_capacity(n);
        for _ in 1..n {
            deque.push_back(elem.clone());
        }
        if n != 0 {
            deque.push_back(elem);
        }
        deque
    }

    /// Provides a reference to the element at the given index.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(3);
    /// buf.push_back(4);
    /// buf.push_back(5);
    /// assert_eq!(buf.get(1), Some(&4));
    /// assert_eq!(buf.get(3), None);
    /// ```
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(unsafe { &*self.pos_ptr(index) })
        } else {
            None
        }
    }

    /// Provides a mutable reference to the element at the given index.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(3);
    /// buf.push_back(4);
    /// buf.push_back(5);
    /// if let Some(elem) = buf.get_mut(1) {
    ///     *elem = 7;
    /// }
    ///
    /// assert_eq!(buf[1], 7);
    /// ```
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(unsafe { &mut *self.pos_ptr(index) })
        } else {
            None
        }
    }

    /// Swaps the values at indices `i` and `j`.
    ///
    /// Both slots keep their addresses; only the values trade places.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(3);
    /// buf.push_back(4);
    /// buf.push_back(5);
    /// buf.swap(0, 2);
    /// assert_eq!(buf, vec![5, 4, 3]);
    /// ```
    pub fn swap(&mut self, i: usize, j: usize) {
        if i >= self.len {
            assert_failed(i, self.len);
        }
        if j >= self.len {
            assert_failed(j, self.len);
        }
        unsafe { ptr::swap(self.pos_ptr(i), self.pos_ptr(j)) };
    }

    /// Returns the number of elements the allocated chunks can hold.
    ///
    /// Chunks abandoned by pops at either end still count here: the deque
    /// keeps them and reuses their storage when the ends grow back into
    /// them.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let deque: Deque<i32> = Deque::with_capacity(10);
    /// assert!(deque.capacity() >= 10);
    /// ```
    pub fn capacity(&self) -> usize {
        self.map.allocated_slots()
    }

    /// Shortens the deque, keeping the first `len` elements and dropping the
    /// rest from the back.
    ///
    /// If `len` is greater than or equal to the deque's current length, this
    /// has no effect.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(5);
    /// buf.push_back(10);
    /// buf.push_back(15);
    /// buf.truncate(1);
    /// assert_eq!(buf, vec![5]);
    /// ```
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            let _ = self.pop_back();
        }
    }

    /// Returns a front-to-back iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(5);
    /// buf.push_back(3);
    /// buf.push_back(4);
    /// let b: &[_] = &[&5, &3, &4];
    /// let c: Vec<&i32> = buf.iter().collect();
    /// assert_eq!(&c[..], b);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.map.window(), self.head, self.len)
    }

    /// Returns a front-to-back iterator that yields mutable references.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(5);
    /// buf.push_back(3);
    /// buf.push_back(4);
    /// for num in buf.iter_mut() {
    ///     *num = *num - 2;
    /// }
    /// let b: &[_] = &[&mut 3, &mut 1, &mut 2];
    /// assert_eq!(&buf.iter_mut().collect::<Vec<&mut i32>>()[..], b);
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.map.window(), self.head, self.len)
    }

    /// Returns the number of elements in the deque.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut deque = Deque::new();
    /// assert_eq!(deque.len(), 0);
    /// deque.push_back(1);
    /// assert_eq!(deque.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut deque = Deque::new();
    /// assert!(deque.is_empty());
    /// deque.push_front(1);
    /// assert!(!deque.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all elements.
    ///
    /// The allocated chunks are kept and later pushes reuse them.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut deque = Deque::new();
    /// deque.push_back(1);
    /// deque.clear();
    /// assert!(deque.is_empty());
    /// ```
    pub fn clear(&mut self) {
        let len = mem::take(&mut self.len);
        // The count and window are emptied before any destructor runs, so a
        // panicking destructor leaks the remaining elements rather than
        // exposing them to a second drop.
        self.map.hi = self.map.lo;
        if !mem::needs_drop::<T>() || len == 0 {
            return;
        }
        let mut at = self.head;
        let end = self.head + len;
        while at < end {
            let run = (CHUNK_CAP - at % CHUNK_CAP).min(end - at);
            unsafe {
                let first = self.at_ptr(at);
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, run));
            }
            at += run;
        }
    }

    /// Returns `true` if the deque contains an element equal to the given
    /// value.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut deque = Deque::new();
    /// deque.push_back(0);
    /// deque.push_back(1);
    /// assert_eq!(deque.contains(&1), true);
    /// assert_eq!(deque.contains(&10), false);
    /// ```
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq<T>,
    {
        self.iter().any(|e| e == x)
    }

    /// Provides a reference to the front element, or `None` if the deque is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// assert_eq!(d.front(), None);
    ///
    /// d.push_back(1);
    /// d.push_back(2);
    /// assert_eq!(d.front(), Some(&1));
    /// ```
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Provides a mutable reference to the front element, or `None` if the
    /// deque is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.push_back(1);
    /// d.push_back(2);
    /// match d.front_mut() {
    ///     Some(x) => *x = 9,
    ///     None => (),
    /// }
    /// assert_eq!(d.front(), Some(&9));
    /// ```
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Provides a reference to the back element, or `None` if the deque is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// assert_eq!(d.back(), None);
    ///
    /// d.push_back(1);
    /// d.push_back(2);
    /// assert_eq!(d.back(), Some(&2));
    /// ```
    pub fn back(&self) -> Option<&T> {
        self.get(self.len.checked_sub(1)?)
    }

    /// Provides a mutable reference to the back element, or `None` if the
    /// deque is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.push_back(1);
    /// d.push_back(2);
    /// match d.back_mut() {
    ///     Some(x) => *x = 9,
    ///     None => (),
    /// }
    /// assert_eq!(d.back(), Some(&9));
    /// ```
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.get_mut(self.len.checked_sub(1)?)
    }

    /// Removes the first element and returns it, or `None` if the deque is
    /// empty.
    ///
    /// The chunk the element occupied is kept for reuse once it empties out.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.push_back(1);
    /// d.push_back(2);
    ///
    /// assert_eq!(d.pop_front(), Some(1));
    /// assert_eq!(d.pop_front(), Some(2));
    /// assert_eq!(d.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = unsafe { ptr::read(self.pos_ptr(0)) };
        self.head += 1;
        self.len -= 1;
        if self.head == CHUNK_CAP {
            self.head = 0;
            self.map.lo += 1;
        }
        Some(value)
    }

    /// Removes the last element and returns it, or `None` if the deque is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// assert_eq!(buf.pop_back(), None);
    /// buf.push_back(1);
    /// buf.push_back(3);
    /// assert_eq!(buf.pop_back(), Some(3));
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = unsafe { ptr::read(self.pos_ptr(self.len - 1)) };
        if (self.head + self.len) % CHUNK_CAP == 0 {
            self.map.hi -= 1;
        }
        self.len -= 1;
        Some(value)
    }

    /// Prepends an element to the deque.
    ///
    /// Every element already in the deque keeps its address.
    ///
    /// # Panics
    ///
    /// Panics if a chunk or a larger chunk table cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.push_front(1);
    /// d.push_front(2);
    /// assert_eq!(d.front(), Some(&2));
    /// ```
    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            handle_alloc(err)
        }
    }

    /// Prepends an element to the deque, returning an error instead of
    /// panicking or aborting when memory is exhausted.
    ///
    /// On error the deque is unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.try_push_front(1)?;
    /// d.try_push_front(2)?;
    /// assert_eq!(d.front(), Some(&2));
    /// # Ok::<(), holdfast::AllocError>(())
    /// ```
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        if self.map.is_unallocated() {
            self.map = ChunkMap::try_construct(0)?;
        }
        if self.head == 0 {
            self.grow_front()?;
            unsafe {
                ptr::write(self.map.chunk(self.map.lo - 1).add(CHUNK_CAP - 1), value);
            }
            self.map.lo -= 1;
            self.head = CHUNK_CAP - 1;
        } else {
            self.head -= 1;
            unsafe { ptr::write(self.pos_ptr(0), value) };
        }
        self.len += 1;
        Ok(())
    }

    /// Appends an element to the back of the deque.
    ///
    /// Every element already in the deque keeps its address.
    ///
    /// # Panics
    ///
    /// Panics if a chunk or a larger chunk table cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(1);
    /// buf.push_back(3);
    /// assert_eq!(buf.back(), Some(&3));
    /// ```
    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            handle_alloc(err)
        }
    }

    /// Appends an element to the back of the deque, returning an error
    /// instead of panicking or aborting when memory is exhausted.
    ///
    /// On error the deque is unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut d = Deque::new();
    /// d.try_push_back(1)?;
    /// d.try_push_back(3)?;
    /// assert_eq!(d.back(), Some(&3));
    /// # Ok::<(), holdfast::AllocError>(())
    /// ```
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        if self.map.is_unallocated() {
            self.map = ChunkMap::try_construct(0)?;
        }
        let end = self.head + self.len;
        // The write below lands in the last slot of chunk `hi` exactly when
        // the position one past it spills into a new chunk.
        let crosses = (end + 1) % CHUNK_CAP == 0;
        if crosses {
            self.grow_back()?;
        }
        unsafe { ptr::write(self.at_ptr(end), value) };
        self.len += 1;
        if crosses {
            self.map.hi += 1;
        }
        Ok(())
    }

    /// Inserts an element at `index` within the deque.
    ///
    /// Whichever side of `index` holds fewer elements is shifted over by one
    /// slot to make room, so the values on that side move; everything on the
    /// longer side keeps both its slot and its value.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the deque's length, or if a needed
    /// chunk cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back('a');
    /// buf.push_back('b');
    /// buf.push_back('c');
    ///
    /// buf.insert(1, 'd');
    /// assert_eq!(buf, vec!['a', 'd', 'b', 'c']);
    /// ```
    pub fn insert(&mut self, index: usize, value: T) {
        if index > self.len {
            assert_failed(index, self.len);
        }
        if index == 0 {
            return self.push_front(value);
        }
        if index == self.len {
            return self.push_back(value);
        }
        if index < self.len - index {
            // Fewer elements in front of `index`: shift them one slot toward
            // the front.
            if self.head == 0 {
                if let Err(err) = self.grow_front() {
                    handle_alloc(err)
                }
                self.map.lo -= 1;
                self.head = CHUNK_CAP;
            }
            unsafe {
                for at in self.head..self.head + index {
                    ptr::copy_nonoverlapping(self.at_ptr(at), self.at_ptr(at - 1), 1);
                }
                ptr::write(self.at_ptr(self.head + index - 1), value);
            }
            self.head -= 1;
            self.len += 1;
        } else {
            // Fewer elements behind `index`, or a tie: shift them one slot
            // toward the back.
            let end = self.head + self.len;
            let crosses = (end + 1) % CHUNK_CAP == 0;
            if crosses {
                if let Err(err) = self.grow_back() {
                    handle_alloc(err)
                }
            }
            unsafe {
                for at in (self.head + index..end).rev() {
                    ptr::copy_nonoverlapping(self.at_ptr(at), self.at_ptr(at + 1), 1);
                }
                ptr::write(self.at_ptr(self.head + index), value);
            }
            self.len += 1;
            if crosses {
                self.map.hi += 1;
            }
        }
    }

    /// Removes and returns the element at `index` from the deque.
    ///
    /// Whichever side of `index` holds fewer elements is shifted over by one
    /// slot to close the gap.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf = Deque::new();
    /// buf.push_back(1);
    /// buf.push_back(2);
    /// buf.push_back(3);
    ///
    /// assert_eq!(buf.remove(1), 2);
    /// assert_eq!(buf, vec![1, 3]);
    /// ```
    pub fn remove(&mut self, index: usize) -> T {
        if index >= self.len {
            assert_failed(index, self.len);
        }
        let value = unsafe { ptr::read(self.pos_ptr(index)) };
        if index < self.len - index - 1 {
            // Close the gap from the front.
            unsafe {
                for at in (self.head..self.head + index).rev() {
                    ptr::copy_nonoverlapping(self.at_ptr(at), self.at_ptr(at + 1), 1);
                }
            }
            self.head += 1;
            self.len -= 1;
            if self.head == CHUNK_CAP {
                self.head = 0;
                self.map.lo += 1;
            }
        } else {
            // Close the gap from the back.
            let end = self.head + self.len;
            unsafe {
                for at in self.head + index + 1..end {
                    ptr::copy_nonoverlapping(self.at_ptr(at), self.at_ptr(at - 1), 1);
                }
            }
            if end % CHUNK_CAP == 0 {
                self.map.hi -= 1;
            }
            self.len -= 1;
        }
        value
    }

    /// Reverses the order of the elements in place.
    ///
    /// Values trade places between fixed slots; no slot's address changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::Deque;
    ///
    /// let mut buf: Deque<_> = (1..=3).collect();
    /// buf.reverse();
    /// assert_eq!(buf, vec![3, 2, 1]);
    /// ```
    pub fn reverse(&mut self) {
        if self.len < 2 {
            return;
        }
        let mut i = 0;
        let mut j = self.len - 1;
        while i < j {
            unsafe { ptr::swap(self.pos_ptr(i), self.pos_ptr(j)) };
            i += 1;
            j -= 1;
        }
    }

    // Address of the slot at absolute offset `at`, counted in slots from the
    // start of chunk `lo`. The caller guarantees `lo + at / CHUNK_CAP` is an
    // allocated chunk.
    #[inline]
    unsafe fn at_ptr(&self, at: usize) -> *mut T {
        self.map
            .chunk(self.map.lo + at / CHUNK_CAP)
            .add(at % CHUNK_CAP)
    }

    // Address of the element at logical position `pos`.
    #[inline]
    unsafe fn pos_ptr(&self, pos: usize) -> *mut T {
        self.at_ptr(self.head + pos)
    }

    // Makes the slot just before the front writable, growing the chunk table
    // first if the window is flush against its low edge. Only the map is
    // touched; `lo`, `head`, and `len` are the caller's to update.
    fn grow_front(&mut self) -> Result<(), AllocError> {
        if self.map.lo == 0 {
            self.map.update()?;
        }
        let lo = self.map.lo;
        self.map.ensure(lo - 1)
    }

    // Makes chunk `hi + 1` allocated so that it can back the slot one past
    // the end, growing the chunk table first if the window is flush against
    // its high edge.
    fn grow_back(&mut self) -> Result<(), AllocError> {
        if self.map.hi + 1 == self.map.slots() {
            self.map.update()?;
        }
        let hi = self.map.hi;
        self.map.ensure(hi + 1)
    }
}

impl<T> Drop for Deque<T> {
    fn drop(&mut self) {
        self.clear();
        // Chunk storage itself is freed by the map's destructor.
    }
}

////////////////////////////////////////////////////////////////////////////////
// Allocation failure plumbing
////////////////////////////////////////////////////////////////////////////////

#[cold]
#[inline(never)]
fn handle_alloc(err: AllocError) -> ! {
    match err.kind {
        AllocErrorKind::CapacityOverflow => panic!("capacity overflow"),
        AllocErrorKind::Alloc { layout } => alloc::alloc::handle_alloc_error(layout),
    }
}

#[cold]
#[inline(never)]
fn assert_failed(index: usize, len: usize) -> ! {
    panic!(
        "index out of bounds: the len is {} but the index is {}",
        len, index
    );
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations
////////////////////////////////////////////////////////////////////////////////

impl<A: PartialEq> PartialEq for Deque<A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<A: Eq> Eq for Deque<A> {}

macro_rules! __impl_slice_eq1 {
    ($lhs:ty, $rhs:ty, $($constraints:tt)*) => {
        impl<A, B> PartialEq<$rhs> for $lhs
        where
            A: PartialEq<B>,
            $($constraints)*
        {
            fn eq(&self, other: &$rhs) -> bool {
                self.len() == other.len() && self.iter().eq(other.iter())
            }
        }
    }
}

__impl_slice_eq1! { Deque<A>, Vec<B>, }
__impl_slice_eq1! { Deque<A>, &[B], }
__impl_slice_eq1! { Deque<A>, &mut [B], }

// For symmetry:

macro_rules! __impl_slice_eq2 {
    ($lhs:ty, $rhs:ty, $($constraints:tt)*) => {
        impl<A, B> PartialEq<$lhs> for $rhs
        where
            A: PartialEq<B>,
            $($constraints)*
        {
            fn eq(&self, other: &$lhs) -> bool {
                other.len() == self.len() && other.iter().eq(self.iter())
            }
        }
    }
}

__impl_slice_eq2! { Deque<A>, Vec<B>, }
__impl_slice_eq2! { Deque<A>, &[B], }
__impl_slice_eq2! { Deque<A>, &mut [B], }

impl<A: PartialOrd> PartialOrd for Deque<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<A: Ord> Ord for Deque<A> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<A: Hash> Hash for Deque<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        // Equal deques hash equal no matter where `head` happens to sit.
        for element in self {
            element.hash(state);
        }
    }
}

impl<A> Index<usize> for Deque<A> {
    type Output = A;

    #[inline]
    fn index(&self, index: usize) -> &A {
        self.get(index).expect("Out of bounds access")
    }
}

impl<A> IndexMut<usize> for Deque<A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut A {
        self.get_mut(index).expect("Out of bounds access")
    }
}

impl<A> FromIterator<A> for Deque<A> {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let iterator = iter.into_iter();
        let (lower, _) = iterator.size_hint();
        let mut deque = Self::with_capacity(lower);
        deque.extend(iterator);
        deque
    }
}

impl<T> IntoIterator for Deque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Deque<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<A> Extend<A> for Deque<A> {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        for element in iter {
            self.push_back(element);
        }
    }
}

impl<'a, T: 'a + Copy> Extend<&'a T> for Deque<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> From<Vec<T>> for Deque<T> {
    /// Moves each element of the vector into chunked storage, front to back.
    fn from(other: Vec<T>) -> Self {
        other.into_iter().collect()
    }
}

impl<T> From<Deque<T>> for Vec<T> {
    /// Moves each element out of the deque into a vector, front to back.
    fn from(other: Deque<T>) -> Self {
        other.into_iter().collect()
    }
}
