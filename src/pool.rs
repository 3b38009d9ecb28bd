// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-excerpt.
//
// tracing-excerpt is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-excerpt is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-excerpt.  If
// not, see <http://www.gnu.org/licenses/>.

//! Allocation pools.
//!
//! Each record written needs a scratch attribute map & a couple of byte buffers. Rather than
//! allocate them afresh every time, an [`Encoder`](crate::encoder::Encoder) keeps a [`Pool`] of
//! each. A [`Pool`] hands out [`Pooled`] guards; when a guard is dropped (on success, on an
//! early `?` return, or while unwinding) its object is [`Reset`] & returned to the pool.
//!
//! Pools make no promises about which object a caller gets, or in what order; they exist only to
//! cut allocations.

use parking_lot::Mutex;

use std::ops::{Deref, DerefMut};

/// Objects that can be emptied for re-use without giving up their allocations.
pub trait Reset {
    fn reset(&mut self);
}

impl<T> Reset for Vec<T> {
    fn reset(&mut self) {
        self.clear()
    }
}

/// A bounded, thread-safe free list.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    max: usize,
}

impl<T: Default + Reset> Pool<T> {
    /// Construct a [`Pool`] that will retain at most `max` idle objects.
    pub fn new(max: usize) -> Pool<T> {
        Pool {
            free: Mutex::new(Vec::new()),
            max,
        }
    }
    /// Borrow an object, allocating a fresh one if none are idle.
    pub fn get(&self) -> Pooled<'_, T> {
        let item = self.free.lock().pop().unwrap_or_default();
        Pooled { pool: self, item }
    }
    /// The number of idle objects.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
    fn put(&self, mut item: T) {
        item.reset();
        let mut free = self.free.lock();
        if free.len() < self.max {
            free.push(item);
        }
    }
}

impl<T: Default + Reset> std::default::Default for Pool<T> {
    fn default() -> Self {
        Pool::new(16)
    }
}

/// An object on loan from a [`Pool`].
pub struct Pooled<'a, T: Default + Reset> {
    pool: &'a Pool<T>,
    item: T,
}

impl<T: Default + Reset> Deref for Pooled<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Default + Reset> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Default + Reset> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.item));
    }
}
