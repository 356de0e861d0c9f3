use core::{marker::PhantomData, mem::MaybeUninit, ops::{Deref, DerefMut}, ptr::{addr_of, NonNull}, fmt::Debug};
use libc::size_t;
use opencl_sys::{cl_bool, cl_event, cl_mem, cl_mem_flags, cl_mem_info, cl_uint, cl_buffer_region, clCreateBuffer, clCreateSubBuffer, clRetainMemObject, clReleaseMemObject, clGetMemObjectInfo, clEnqueueReadBuffer, clEnqueueWriteBuffer, clEnqueueCopyBuffer, clEnqueueFillBuffer, clEnqueueMapBuffer, clEnqueueUnmapMemObject, clRetainContext, CL_BUFFER_CREATE_TYPE_REGION, CL_MEM_SIZE, CL_MEM_FLAGS, CL_MEM_OFFSET, CL_MEM_REFERENCE_COUNT, CL_MEM_CONTEXT};
use crate::context::Context;
use crate::error::{check, Error, Result};
use crate::event::Event;
use crate::queue::CommandQueue;
use crate::wait_list;
use super::{MapFlags, MemFlags};

/// An OpenCL buffer of `len * size_of::<T>()` bytes with no host-side
/// bookkeeping. Sizes and offsets are in elements of `T`, converted to bytes
/// at the call boundary.
///
/// The non-blocking transfer operations are `unsafe`: the driver keeps using
/// the host memory until the returned event completes, which the borrow
/// checker cannot see. [`Buffer`](super::Buffer) layers the checked variants
/// on top.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawBuffer<T: Copy> (pub(crate) cl_mem, PhantomData<T>);

impl<T: Copy> RawBuffer<T> {
    /// Allocates a buffer of `len` elements with undefined contents.
    ///
    /// # Safety
    /// The contents must be written (by a kernel, a transfer or a fill)
    /// before they are read.
    #[inline(always)]
    pub unsafe fn uninit (ctx: &Context, len: size_t, flags: impl Into<Option<MemFlags>>) -> Result<Self> {
        Self::create(ctx, len, flags.into().unwrap_or_default(), None)
    }

    /// Allocates a buffer initialized by copying `src`.
    #[inline(always)]
    pub fn from_slice (ctx: &Context, flags: impl Into<Option<MemFlags>>, src: &[T]) -> Result<Self> {
        let flags = flags.into().unwrap_or_default() | MemFlags::COPY_HOST_PTR;
        unsafe {
            Self::create(ctx, src.len(), flags, NonNull::new(src.as_ptr() as *mut T))
        }
    }

    /// # Safety
    /// With `USE_HOST_PTR` the driver may keep referencing `host_ptr` for
    /// the lifetime of the buffer.
    pub unsafe fn create (ctx: &Context, len: size_t, flags: MemFlags, host_ptr: Option<NonNull<T>>) -> Result<Self> {
        let host_ptr = match host_ptr {
            Some(x) => x.as_ptr().cast(),
            None => core::ptr::null_mut()
        };

        let size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let mut err = 0;
        let id = clCreateBuffer(ctx.0, flags.bits(), size, host_ptr, &mut err);

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id, PhantomData))
    }

    /// Creates a sub-buffer aliasing `len` elements starting at `origin`.
    /// The origin must meet the device's base address alignment.
    pub fn sub_buffer (&self, flags: impl Into<Option<MemFlags>>, origin: size_t, len: size_t) -> Result<Self> {
        let region = cl_buffer_region {
            origin: origin.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?,
            size: len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?
        };

        let flags = flags.into().unwrap_or_else(MemFlags::empty);
        let mut err = 0;
        let id = unsafe {
            clCreateSubBuffer(self.0, flags.bits(), CL_BUFFER_CREATE_TYPE_REGION, addr_of!(region).cast(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id, PhantomData))
    }

    #[inline(always)]
    pub fn id (&self) -> cl_mem {
        self.0
    }

    /// Enqueues a read of `dst.len()` elements starting at `offset`.
    ///
    /// # Safety
    /// Unless `blocking`, `dst` must stay alive and unaliased until the
    /// returned event completes.
    pub unsafe fn read_into<'a> (&self, queue: &CommandQueue, blocking: bool, offset: size_t, dst: &mut [T], wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        self.read_into_raw(queue, blocking, offset, dst.as_mut_ptr(), dst.len(), wait)
    }

    /// Pointer-based variant of [`read_into`](Self::read_into), for
    /// destinations that must not be materialized as a slice yet (fresh
    /// `Vec` capacity).
    ///
    /// # Safety
    /// `dst` must be valid for `len` writes and, unless `blocking`, stay so
    /// until the returned event completes.
    pub(crate) unsafe fn read_into_raw<'a> (&self, queue: &CommandQueue, blocking: bool, offset: size_t, dst: *mut T, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let offset = offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        check(clEnqueueReadBuffer(queue.0, self.0, cl_bool::from(blocking), offset, size, dst.cast(), wait_len, wait_ptr, &mut event))?;
        Ok(Event::from_id(event))
    }

    /// Enqueues a write of `src` into the buffer starting at `offset`.
    ///
    /// # Safety
    /// Unless `blocking`, `src` must stay alive until the returned event
    /// completes.
    pub unsafe fn write_from<'a> (&self, queue: &CommandQueue, blocking: bool, offset: size_t, src: &[T], wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let offset = offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let size = src.len().checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        check(clEnqueueWriteBuffer(queue.0, self.0, cl_bool::from(blocking), offset, size, src.as_ptr().cast(), wait_len, wait_ptr, &mut event))?;
        Ok(Event::from_id(event))
    }

    /// Enqueues a device-side copy of `len` elements into `dst`.
    pub fn copy_to<'a> (&self, queue: &CommandQueue, src_offset: size_t, dst: &RawBuffer<T>, dst_offset: size_t, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let src_offset = src_offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let dst_offset = dst_offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueCopyBuffer(queue.0, self.0, dst.0, src_offset, dst_offset, size, wait_len, wait_ptr, &mut event))?;
        }

        Ok(Event::from_id(event))
    }

    /// Enqueues a fill of `len` elements with copies of `pattern`.
    pub fn fill<'a> (&self, queue: &CommandQueue, pattern: T, offset: size_t, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let offset = offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueFillBuffer(queue.0, self.0, addr_of!(pattern).cast(), core::mem::size_of::<T>(), offset, size, wait_len, wait_ptr, &mut event))?;
        }

        Ok(Event::from_id(event))
    }

    /// Maps `len` elements starting at `offset` into host memory, blocking
    /// until the mapping is ready. The region unmaps itself on drop.
    pub fn map_blocking<'a> (&self, queue: &CommandQueue, flags: impl Into<Option<MapFlags>>, offset: size_t, len: size_t, wait: impl IntoIterator<Item = &'a Event>) -> Result<MappedRegion<T>> {
        let flags = flags.into().unwrap_or_default();
        let byte_offset = offset.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidBufferSize)?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut err = 0;
        let ptr = unsafe {
            clEnqueueMapBuffer(queue.0, self.0, cl_bool::from(true), flags.bits(), byte_offset, size, wait_len, wait_ptr, core::ptr::null_mut(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(MappedRegion {
            ptr: ptr.cast(),
            len,
            queue: queue.clone(),
            buffer: self.clone()
        })
    }

    /// Size of the buffer in bytes, exactly as requested at creation.
    #[inline(always)]
    pub fn size (&self) -> Result<size_t> {
        self.get_info_bits(CL_MEM_SIZE)
    }

    /// Number of elements of `T` in the buffer.
    #[inline(always)]
    pub fn len (&self) -> Result<size_t> {
        Ok(self.size()? / core::mem::size_of::<T>())
    }

    #[inline(always)]
    pub fn is_empty (&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    #[inline(always)]
    pub fn flags (&self) -> Result<MemFlags> {
        let bits = self.get_info_bits::<cl_mem_flags>(CL_MEM_FLAGS)?;
        Ok(MemFlags::from_bits_truncate(bits))
    }

    /// For sub-buffers, the byte offset into the parent buffer. Zero
    /// otherwise.
    #[inline(always)]
    pub fn offset (&self) -> Result<size_t> {
        self.get_info_bits(CL_MEM_OFFSET)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_MEM_REFERENCE_COUNT)
    }

    /// The context the buffer belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_info_bits::<opencl_sys::cl_context>(CL_MEM_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    /// Raw bytes of any `clGetMemObjectInfo` selector.
    pub fn info_raw (&self, param: cl_mem_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetMemObjectInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetMemObjectInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    #[inline]
    fn get_info_bits<V: Copy> (&self, param: cl_mem_info) -> Result<V> {
        unsafe {
            let mut value = MaybeUninit::<V>::uninit();
            check(clGetMemObjectInfo(self.0, param, core::mem::size_of::<V>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl<T: Copy> Clone for RawBuffer<T> {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainMemObject(self.0));
        }

        Self(self.0, PhantomData)
    }
}

impl<T: Copy> Drop for RawBuffer<T> {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseMemObject(self.0));
        }
    }
}

impl<T: Copy> Debug for RawBuffer<T> {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawBuffer")
        .field("id", &self.0)
        .field("size", &self.size())
        .finish()
    }
}

unsafe impl<T: Send + Copy> Send for RawBuffer<T> {}
unsafe impl<T: Sync + Copy> Sync for RawBuffer<T> {}

/// A host-visible window into a buffer, produced by
/// [`RawBuffer::map_blocking`]. Unmaps on drop; use
/// [`unmap`](MappedRegion::unmap) to observe unmap failures.
pub struct MappedRegion<T: Copy> {
    ptr: *mut T,
    len: size_t,
    queue: CommandQueue,
    buffer: RawBuffer<T>
}

impl<T: Copy> MappedRegion<T> {
    #[inline(always)]
    pub fn len (&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty (&self) -> bool {
        self.len == 0
    }

    /// Unmaps the region, blocking until the driver is done with it.
    #[inline(always)]
    pub fn unmap (mut self) -> Result<()> {
        self.do_unmap()
    }

    fn do_unmap (&mut self) -> Result<()> {
        if self.ptr.is_null() {
            return Ok(());
        }

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueUnmapMemObject(self.queue.0, self.buffer.0, self.ptr.cast(), 0, core::ptr::null(), &mut event))?;
        }

        self.ptr = core::ptr::null_mut();
        Event::from_id(event).wait()
    }
}

impl<T: Copy> Deref for MappedRegion<T> {
    type Target = [T];

    #[inline(always)]
    fn deref (&self) -> &[T] {
        unsafe {
            core::slice::from_raw_parts(self.ptr, self.len)
        }
    }
}

impl<T: Copy> DerefMut for MappedRegion<T> {
    #[inline(always)]
    fn deref_mut (&mut self) -> &mut [T] {
        unsafe {
            core::slice::from_raw_parts_mut(self.ptr, self.len)
        }
    }
}

impl<T: Copy> Drop for MappedRegion<T> {
    fn drop (&mut self) {
        if let Err(err) = self.do_unmap() {
            log::error!("failed to unmap buffer region: {err}");
        }
    }
}

unsafe impl<T: Send + Copy> Send for MappedRegion<T> {}
