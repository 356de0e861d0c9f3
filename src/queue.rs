use core::{mem::MaybeUninit, fmt::Debug};
use libc::size_t;
use opencl_sys::{cl_command_queue, cl_command_queue_info, cl_command_queue_properties, cl_context, cl_event, cl_uint, clCreateCommandQueue, clRetainCommandQueue, clReleaseCommandQueue, clGetCommandQueueInfo, clRetainContext, clFlush, clFinish, clEnqueueMarkerWithWaitList, clEnqueueBarrierWithWaitList, CL_QUEUE_CONTEXT, CL_QUEUE_DEVICE, CL_QUEUE_REFERENCE_COUNT, CL_QUEUE_PROPERTIES, CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE, CL_QUEUE_PROFILING_ENABLE};
use crate::error::{check, Result, Error};
use crate::context::Context;
use crate::device::Device;
use crate::event::Event;
use crate::wait_list;

/// OpenCL command queue
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CommandQueue (pub(crate) cl_command_queue);

impl CommandQueue {
    pub fn new (ctx: &Context, device: Device, props: Option<CommandQueueProps>) -> Result<Self> {
        let props = props.unwrap_or_else(CommandQueueProps::empty);

        let mut err = 0;
        #[allow(deprecated)]
        let id = unsafe {
            clCreateCommandQueue(ctx.0, device.id(), props.bits(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id))
    }

    #[inline(always)]
    pub fn id (&self) -> cl_command_queue {
        self.0
    }

    /// Issues all previously queued commands to the device without waiting
    /// for them.
    #[inline(always)]
    pub fn flush (&self) -> Result<()> {
        unsafe { check(clFlush(self.0)) }
    }

    /// Blocks until all previously queued commands have completed.
    #[inline(always)]
    pub fn finish (&self) -> Result<()> {
        unsafe { check(clFinish(self.0)) }
    }

    /// Enqueues a marker that completes once every event in `wait` has, or
    /// once all previously enqueued commands have if `wait` is empty.
    pub fn marker<'a> (&self, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueMarkerWithWaitList(self.0, wait_len, wait_ptr, &mut event))?;
        }

        Ok(Event::from_id(event))
    }

    /// Enqueues a barrier: commands enqueued after it do not start until the
    /// barrier completes.
    pub fn barrier<'a> (&self, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueBarrierWithWaitList(self.0, wait_len, wait_ptr, &mut event))?;
        }

        Ok(Event::from_id(event))
    }

    /// The context this queue was created against. The returned wrapper owns
    /// a fresh retain.
    pub fn context (&self) -> Result<Context> {
        let id : cl_context = self.get_info_bits(CL_QUEUE_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    #[inline(always)]
    pub fn device (&self) -> Result<Device> {
        self.get_info_bits(CL_QUEUE_DEVICE)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_QUEUE_REFERENCE_COUNT)
    }

    #[inline(always)]
    pub fn properties (&self) -> Result<CommandQueueProps> {
        let bits = self.get_info_bits::<cl_command_queue_properties>(CL_QUEUE_PROPERTIES)?;
        Ok(CommandQueueProps::from_bits_truncate(bits))
    }

    /// Raw bytes of any `clGetCommandQueueInfo` selector.
    pub fn info_raw (&self, param: cl_command_queue_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetCommandQueueInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetCommandQueueInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_command_queue_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetCommandQueueInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Clone for CommandQueue {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainCommandQueue(self.0));
        }

        Self(self.0)
    }
}

impl Drop for CommandQueue {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseCommandQueue(self.0));
        }
    }
}

impl Debug for CommandQueue {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandQueue")
        .field("id", &self.0)
        .field("device", &self.device())
        .field("properties", &self.properties())
        .finish()
    }
}

unsafe impl Send for CommandQueue {}
unsafe impl Sync for CommandQueue {}

bitflags::bitflags! {
    /// Command-queue properties.
    #[repr(transparent)]
    pub struct CommandQueueProps : cl_command_queue_properties {
        const OUT_OF_ORDER_EXEC_MODE_ENABLE = CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE;
        const PROFILING_ENABLE = CL_QUEUE_PROFILING_ENABLE;
    }
}

impl Default for CommandQueueProps {
    #[inline(always)]
    fn default () -> Self {
        Self::empty()
    }
}
