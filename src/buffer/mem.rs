use core::{fmt::Debug, ops::Deref};
use libc::size_t;
use crate::context::Context;
use crate::error::Result;
use crate::event::Event;
use crate::queue::CommandQueue;
use super::{MemFlags, RawBuffer};

/// A typed, bounds-checked buffer. Transfers are blocking and the host slice
/// borrows are checked against the buffer length before anything reaches the
/// driver, so the raw operations underneath are sound to call.
///
/// Out-of-bounds accesses panic, like slice indexing does.
#[derive(Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Buffer<T: Copy> (pub(super) RawBuffer<T>);

impl<T: Copy> Buffer<T> {
    /// Allocates a buffer initialized by copying `src`.
    #[inline(always)]
    pub fn new (ctx: &Context, flags: impl Into<Option<MemFlags>>, src: &[T]) -> Result<Self> {
        RawBuffer::from_slice(ctx, flags, src).map(Self)
    }

    /// Allocates a buffer of `len` elements with undefined contents.
    ///
    /// # Safety
    /// The contents must be written before they are read.
    #[inline(always)]
    pub unsafe fn uninit (ctx: &Context, len: size_t, flags: impl Into<Option<MemFlags>>) -> Result<Self> {
        RawBuffer::uninit(ctx, len, flags).map(Self)
    }

    /// Reads `dst.len()` elements starting at `offset`, blocking until the
    /// data is in `dst`.
    pub fn read_into<'a> (&self, queue: &CommandQueue, offset: size_t, dst: &mut [T], wait: impl IntoIterator<Item = &'a Event>) -> Result<()> {
        self.check_bounds(offset, dst.len());
        unsafe {
            self.0.read_into(queue, true, offset, dst, wait)?;
        }

        Ok(())
    }

    /// Reads `len` elements starting at `offset` into a new vector.
    pub fn read<'a> (&self, queue: &CommandQueue, offset: size_t, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<Vec<T>> {
        self.check_bounds(offset, len);

        // No slice over the spare capacity; it is uninitialized until the
        // driver fills it.
        let mut result = Vec::<T>::with_capacity(len);
        unsafe {
            self.0.read_into_raw(queue, true, offset, result.as_mut_ptr(), len, wait)?;
            result.set_len(len);
        }

        Ok(result)
    }

    /// Reads the whole buffer into a new vector.
    #[inline(always)]
    pub fn to_vec<'a> (&self, queue: &CommandQueue, wait: impl IntoIterator<Item = &'a Event>) -> Result<Vec<T>> {
        let len = self.0.len()?;
        self.read(queue, 0, len, wait)
    }

    /// Writes `src` into the buffer starting at `offset`, blocking until the
    /// data has been consumed.
    pub fn write<'a> (&mut self, queue: &CommandQueue, offset: size_t, src: &[T], wait: impl IntoIterator<Item = &'a Event>) -> Result<()> {
        self.check_bounds(offset, src.len());
        unsafe {
            self.0.write_from(queue, true, offset, src, wait)?;
        }

        Ok(())
    }

    /// Fills `len` elements starting at `offset` with copies of `pattern`.
    pub fn fill<'a> (&mut self, queue: &CommandQueue, pattern: T, offset: size_t, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        self.check_bounds(offset, len);
        self.0.fill(queue, pattern, offset, len, wait)
    }

    #[inline(always)]
    pub fn raw (&self) -> &RawBuffer<T> {
        &self.0
    }

    fn check_bounds (&self, offset: size_t, len: size_t) {
        let buffer_len = match self.0.len() {
            Ok(x) => x,
            Err(err) => panic!("{err}")
        };

        let end = offset.checked_add(len);
        match end {
            Some(end) if end <= buffer_len => {},
            _ => panic!("Range out of bounds. Tried to access elements {offset}..{} of a buffer of size {buffer_len}", offset.wrapping_add(len))
        }
    }
}

impl<T: Copy> Deref for Buffer<T> {
    type Target = RawBuffer<T>;

    #[inline(always)]
    fn deref (&self) -> &RawBuffer<T> {
        &self.0
    }
}

impl<T: Copy> Debug for Buffer<T> {
    #[inline(always)]
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
