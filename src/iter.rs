//! Double-ended, exact-size iterators over the deque's chunked storage.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::{Deque, CHUNK_CAP};

/// An iterator over the elements of a [`Deque`].
///
/// This `struct` is created by the [`iter`](Deque::iter) method on
/// [`Deque`]. See its documentation for more.
pub struct Iter<'a, T> {
    chunks: &'a [*mut T],
    front_chunk: usize,
    front: *mut T,
    back_chunk: usize,
    back: *mut T,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

/// A mutable iterator over the elements of a [`Deque`].
///
/// This `struct` is created by the [`iter_mut`](Deque::iter_mut) method on
/// [`Deque`]. See its documentation for more.
pub struct IterMut<'a, T> {
    chunks: &'a [*mut T],
    front_chunk: usize,
    front: *mut T,
    back_chunk: usize,
    back: *mut T,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

// The cursors only hand out references derived from the deque borrow they
// were created from, so the usual container iterator matrix applies.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}
unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

unsafe fn raw_to_ref<'a, T>(ptr: *mut T) -> &'a T {
    &*ptr
}

unsafe fn raw_to_mut<'a, T>(ptr: *mut T) -> &'a mut T {
    &mut *ptr
}

macro_rules! _cursor {
    ($name:ident) => {
        impl<'a, T> $name<'a, T> {
            /// Builds a cursor pair over a window slice. `head` is the slot
            /// of the first live element inside the window's first chunk;
            /// the chunk holding position `head + len` is in the window too.
            pub(crate) fn new(chunks: &'a [*mut T], head: usize, len: usize) -> Self {
                if chunks.is_empty() {
                    debug_assert_eq!(len, 0);
                    let dangling = NonNull::<T>::dangling().as_ptr();
                    return Self {
                        chunks,
                        front_chunk: 0,
                        front: dangling,
                        back_chunk: 0,
                        back: dangling,
                        remaining: 0,
                        _marker: PhantomData,
                    };
                }
                debug_assert!(head < CHUNK_CAP);
                let end = head + len;
                debug_assert!(end / CHUNK_CAP < chunks.len());
                Self {
                    chunks,
                    front_chunk: 0,
                    // SAFETY: the first window chunk is allocated and `head`
                    // lies inside it.
                    front: unsafe { chunks[0].add(head) },
                    back_chunk: end / CHUNK_CAP,
                    // SAFETY: the end-position chunk is allocated; its slot
                    // is at worst one-past the last live element.
                    back: unsafe { chunks[end / CHUNK_CAP].add(end % CHUNK_CAP) },
                    remaining: len,
                    _marker: PhantomData,
                }
            }

            /// Jumps the front cursor forward `n` positions without
            /// yielding. `n` must not exceed the remaining count.
            fn advance_front(&mut self, n: usize) {
                self.remaining -= n;
                if mem::size_of::<T>() == 0 {
                    return;
                }
                // SAFETY: the target position is at or before the back
                // cursor, so its chunk lies inside the window.
                unsafe {
                    let base = *self.chunks.get_unchecked(self.front_chunk);
                    let pos = self.front_chunk * CHUNK_CAP
                        + self.front.offset_from(base) as usize
                        + n;
                    self.front_chunk = pos / CHUNK_CAP;
                    self.front =
                        (*self.chunks.get_unchecked(self.front_chunk)).add(pos % CHUNK_CAP);
                }
            }

            /// Pulls the back cursor backward `n` positions without
            /// yielding. `n` must not exceed the remaining count.
            fn retreat_back(&mut self, n: usize) {
                self.remaining -= n;
                if mem::size_of::<T>() == 0 {
                    return;
                }
                // SAFETY: the target position is at or after the front
                // cursor.
                unsafe {
                    let base = *self.chunks.get_unchecked(self.back_chunk);
                    let pos = self.back_chunk * CHUNK_CAP
                        + self.back.offset_from(base) as usize
                        - n;
                    self.back_chunk = pos / CHUNK_CAP;
                    self.back =
                        (*self.chunks.get_unchecked(self.back_chunk)).add(pos % CHUNK_CAP);
                }
            }
        }
    };
}

_cursor!(Iter);
_cursor!(IterMut);

macro_rules! _impl {
    (fw, $turn:ident) => {
        #[inline]
        fn next(&mut self) -> Option<Self::Item> {
            if self.remaining == 0 {
                return None;
            }
            let item = self.front;
            self.remaining -= 1;
            // SAFETY: `item` is a live element. Stepping either stays inside
            // the current chunk or hops to the next window chunk, which is
            // allocated; the hop lands at most on the back cursor's chunk.
            unsafe {
                self.front = self.front.add(1);
                if self.front_chunk < self.back_chunk {
                    let base = *self.chunks.get_unchecked(self.front_chunk);
                    if self.front == base.add(CHUNK_CAP) {
                        self.front_chunk += 1;
                        self.front = *self.chunks.get_unchecked(self.front_chunk);
                    }
                }
                Some($turn(item))
            }
        }

        #[inline]
        fn size_hint(&self) -> (usize, Option<usize>) {
            (self.remaining, Some(self.remaining))
        }

        fn nth(&mut self, n: usize) -> Option<Self::Item> {
            if n >= self.remaining {
                self.remaining = 0;
                return None;
            }
            if n > 0 {
                self.advance_front(n);
            }
            self.next()
        }

        fn count(self) -> usize {
            self.remaining
        }

        #[inline]
        fn last(mut self) -> Option<Self::Item> {
            self.next_back()
        }
    };

    (bw, $turn:ident) => {
        #[inline]
        fn next_back(&mut self) -> Option<Self::Item> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            // SAFETY: a live element precedes the back cursor; a cursor
            // sitting at a chunk's first slot hops to the previous window
            // chunk before stepping.
            unsafe {
                if self.front_chunk < self.back_chunk
                    && self.back == *self.chunks.get_unchecked(self.back_chunk)
                {
                    self.back_chunk -= 1;
                    self.back =
                        (*self.chunks.get_unchecked(self.back_chunk)).add(CHUNK_CAP);
                }
                self.back = self.back.sub(1);
                Some($turn(self.back))
            }
        }

        fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
            if n >= self.remaining {
                self.remaining = 0;
                return None;
            }
            if n > 0 {
                self.retreat_back(n);
            }
            self.next_back()
        }
    };
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    _impl!(fw, raw_to_ref);
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    _impl!(bw, raw_to_ref);
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;
    _impl!(fw, raw_to_mut);
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    _impl!(bw, raw_to_mut);
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            chunks: self.chunks,
            front_chunk: self.front_chunk,
            front: self.front,
            back_chunk: self.back_chunk,
            back: self.back,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, T> From<IterMut<'a, T>> for Iter<'a, T> {
    /// Narrows a mutable cursor into a read-only one. There is no conversion
    /// back the other way.
    fn from(iter: IterMut<'a, T>) -> Iter<'a, T> {
        Iter {
            chunks: iter.chunks,
            front_chunk: iter.front_chunk,
            front: iter.front,
            back_chunk: iter.back_chunk,
            back: iter.back,
            remaining: iter.remaining,
            _marker: PhantomData,
        }
    }
}

/// An owning iterator over the elements of a [`Deque`].
///
/// This `struct` is created by the `into_iter` method on [`Deque`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
#[derive(Clone)]
pub struct IntoIter<T> {
    deque: Deque<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(deque: Deque<T>) -> Self {
        IntoIter { deque }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}
