//! KVec: growable array with an explicit capacity/size split.
//!
//! Storage is an owned boxed slice of `capacity` slots, every one of them
//! initialized. Only `[0, len)` are live elements; the tail holds default
//! or stale values. Index access is bounded by capacity, not by size, so
//! owners that manage their own occupancy (the bucket array of `KMap`) can
//! address every slot.

use core::fmt;
use core::ops::{Index, IndexMut};

/// Capacity of a freshly constructed or cleared array.
pub const INIT_CAPACITY: usize = 2;

#[derive(Clone)]
pub struct KVec<T> {
    data: Box<[T]>,
    len: usize,
}

impl<T: Default> KVec<T> {
    pub fn new() -> Self {
        Self::with_capacity(INIT_CAPACITY)
    }

    /// Allocate `capacity` default slots with no live elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: default_slots(capacity),
            len: 0,
        }
    }

    /// Reallocate to exactly `n` slots and make all of them live.
    ///
    /// The first `min(capacity, n)` slots are carried over; new slots are
    /// default-constructed. Note that the logical size becomes `n` even when
    /// the array previously held fewer live elements. Use
    /// [`KVec::set_capacity`] to change capacity while keeping the size.
    pub fn resize(&mut self, n: usize) {
        self.reallocate(n);
        self.len = n;
    }

    /// Reallocate to exactly `n` slots, preserving the logical size
    /// (truncated to `n` when shrinking).
    pub fn set_capacity(&mut self, n: usize) {
        self.reallocate(n);
        self.len = self.len.min(n);
    }

    /// Drop everything and collapse to an empty array of the initial capacity.
    pub fn clear(&mut self) {
        self.data = default_slots(INIT_CAPACITY);
        self.len = 0;
    }

    /// Drop everything but keep the current capacity.
    pub fn clean(&mut self) {
        self.data = default_slots(self.data.len());
        self.len = 0;
    }

    /// Append `value`, doubling capacity when full.
    pub fn push_back(&mut self, value: T) {
        if self.len == self.data.len() {
            let grown = match self.data.len() {
                0 => INIT_CAPACITY,
                n => n * 2,
            };
            self.reallocate(grown);
        }
        self.data[self.len] = value;
        self.len += 1;
    }

    fn reallocate(&mut self, n: usize) {
        let mut slots = core::mem::take(&mut self.data).into_vec();
        if n <= slots.len() {
            slots.truncate(n);
        } else {
            slots.resize_with(n, T::default);
        }
        self.data = slots.into_boxed_slice();
    }
}

impl<T: Clone> KVec<T> {
    /// `n` live copies of `value`.
    pub fn filled(n: usize, value: T) -> Self {
        Self {
            data: vec![value; n].into_boxed_slice(),
            len: n,
        }
    }
}

impl<T> KVec<T> {
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forget the last live element. The slot keeps its value and no memory
    /// is released.
    pub fn pop_back(&mut self) {
        if self.len != 0 {
            self.len -= 1;
        }
    }

    /// Live element at `i`, if `i < len`.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.as_slice().get(i)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(i)
    }

    /// Slot `i` without a bounds check.
    ///
    /// # Safety
    ///
    /// `i` must be less than [`KVec::capacity`].
    pub unsafe fn get_unchecked(&self, i: usize) -> &T {
        self.data.get_unchecked(i)
    }

    /// Mutable slot `i` without a bounds check.
    ///
    /// # Safety
    ///
    /// `i` must be less than [`KVec::capacity`].
    pub unsafe fn get_unchecked_mut(&mut self, i: usize) -> &mut T {
        self.data.get_unchecked_mut(i)
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }

    /// Every slot up to capacity, live or not.
    pub fn slots(&self) -> &[T] {
        &self.data
    }
    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Exchange storage and bookkeeping with `other` without touching elements.
    pub fn swap(&mut self, other: &mut KVec<T>) {
        core::mem::swap(&mut self.data, &mut other.data);
        core::mem::swap(&mut self.len, &mut other.len);
    }
}

fn default_slots<T: Default>(n: usize) -> Box<[T]> {
    core::iter::repeat_with(T::default).take(n).collect()
}

impl<T: Default> Default for KVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for KVec<T> {
    type Output = T;

    /// Panics if `i >= capacity`.
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for KVec<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: fmt::Debug> fmt::Debug for KVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KVec")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("items", &self.as_slice())
            .finish()
    }
}
