use core::{mem::MaybeUninit, ptr::addr_of, fmt::Debug};
use std::ffi::CString;
use libc::size_t;
use opencl_sys::{cl_kernel, cl_kernel_info, cl_kernel_work_group_info, cl_mem, cl_sampler, cl_uint, cl_ulong, cl_event, clCreateKernel, clCreateKernelsInProgram, clRetainKernel, clReleaseKernel, clSetKernelArg, clGetKernelInfo, clGetKernelWorkGroupInfo, clEnqueueNDRangeKernel, clRetainContext, clRetainProgram, CL_KERNEL_FUNCTION_NAME, CL_KERNEL_NUM_ARGS, CL_KERNEL_REFERENCE_COUNT, CL_KERNEL_CONTEXT, CL_KERNEL_PROGRAM, CL_KERNEL_WORK_GROUP_SIZE, CL_KERNEL_LOCAL_MEM_SIZE, CL_KERNEL_PREFERRED_WORK_GROUP_SIZE_MULTIPLE};
use crate::buffer::RawBuffer;
use crate::context::Context;
use crate::device::Device;
use crate::error::{check, Error, Result};
use crate::event::Event;
use crate::image::Image;
use crate::program::Program;
use crate::queue::CommandQueue;
use crate::sampler::Sampler;
use crate::wait_list;

/// OpenCL kernel. Argument setting takes `&mut self`: the argument table
/// lives inside the kernel object and is not safe to mutate concurrently.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Kernel (pub(crate) cl_kernel);

impl Kernel {
    pub fn new (program: &Program, name: &str) -> Result<Self> {
        let name = CString::new(name).map_err(|_| Error::InvalidKernelName)?;

        let mut err = 0;
        let id = unsafe {
            clCreateKernel(program.0, name.as_ptr(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id))
    }

    /// One kernel per `__kernel` function of a built program.
    pub fn all_in_program (program: &Program) -> Result<Vec<Kernel>> {
        let mut cnt = 0;
        unsafe {
            check(clCreateKernelsInProgram(program.0, 0, core::ptr::null_mut(), &mut cnt))?;
        }

        let cnt_size = usize::try_from(cnt).unwrap();
        let mut result = Vec::<Kernel>::with_capacity(cnt_size);
        unsafe {
            check(clCreateKernelsInProgram(program.0, cnt, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(cnt_size);
        }

        Ok(result)
    }

    #[inline(always)]
    pub fn id (&self) -> cl_kernel {
        self.0
    }

    /// Sets a scalar or plain-old-data argument by value.
    #[inline(always)]
    pub fn set_arg<T: Copy> (&mut self, idx: cl_uint, v: T) -> Result<()> {
        unsafe {
            check(clSetKernelArg(self.0, idx, core::mem::size_of::<T>(), addr_of!(v).cast()))
        }
    }

    /// Binds a buffer to a `__global`/`__constant` pointer argument.
    #[inline(always)]
    pub fn set_buffer_arg<T: Copy> (&mut self, idx: cl_uint, v: &RawBuffer<T>) -> Result<()> {
        unsafe {
            check(clSetKernelArg(self.0, idx, core::mem::size_of::<cl_mem>(), addr_of!(v.0).cast()))
        }
    }

    /// Binds an image to an image argument.
    #[inline(always)]
    pub fn set_image_arg (&mut self, idx: cl_uint, v: &Image) -> Result<()> {
        unsafe {
            check(clSetKernelArg(self.0, idx, core::mem::size_of::<cl_mem>(), addr_of!(v.0).cast()))
        }
    }

    /// Binds a sampler argument.
    #[inline(always)]
    pub fn set_sampler_arg (&mut self, idx: cl_uint, v: &Sampler) -> Result<()> {
        unsafe {
            check(clSetKernelArg(self.0, idx, core::mem::size_of::<cl_sampler>(), addr_of!(v.0).cast()))
        }
    }

    /// Reserves `len` elements of `__local` memory for a local pointer
    /// argument. No host data is passed.
    #[inline(always)]
    pub fn set_local_arg<T> (&mut self, idx: cl_uint, len: usize) -> Result<()> {
        let arg_size = len.checked_mul(core::mem::size_of::<T>()).ok_or(Error::InvalidArgSize)?;
        unsafe {
            check(clSetKernelArg(self.0, idx, arg_size, core::ptr::null()))
        }
    }

    /// Enqueues an N-dimensional range execution of the kernel. The work
    /// dimension is the array length `N`; OpenCL allows 1 to 3.
    pub fn enqueue<'a, const N: usize> (&mut self, queue: &CommandQueue, global: &[size_t; N], local: Option<&[size_t; N]>, offset: Option<&[size_t; N]>, wait: impl IntoIterator<Item = &'a Event>) -> Result<Event> {
        // Rejected locally; the driver would report the same thing later and
        // with less context.
        if N == 0 || N > 3 {
            return Err(Error::InvalidWorkDimension);
        }

        let local_ptr = match local {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };
        let offset_ptr = match offset {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };

        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueNDRangeKernel(queue.0, self.0, N as cl_uint, offset_ptr, global.as_ptr(), local_ptr, wait_len, wait_ptr, &mut event))?;
        }

        Ok(Event::from_id(event))
    }

    /// The kernel function name.
    #[inline(always)]
    pub fn function_name (&self) -> Result<String> {
        self.get_info_string(CL_KERNEL_FUNCTION_NAME)
    }

    #[inline(always)]
    pub fn num_args (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_KERNEL_NUM_ARGS)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_KERNEL_REFERENCE_COUNT)
    }

    /// The context the kernel belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_info_bits::<opencl_sys::cl_context>(CL_KERNEL_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    /// The program the kernel was created from. The returned wrapper owns a
    /// fresh retain.
    pub fn program (&self) -> Result<Program> {
        let id = self.get_info_bits::<opencl_sys::cl_program>(CL_KERNEL_PROGRAM)?;
        unsafe {
            check(clRetainProgram(id))?;
        }

        Ok(Program(id))
    }

    /// Maximum work-group size usable for this kernel on `device`.
    #[inline(always)]
    pub fn work_group_size (&self, device: Device) -> Result<size_t> {
        self.get_work_group_info(device, CL_KERNEL_WORK_GROUP_SIZE)
    }

    /// Bytes of `__local` memory the kernel uses on `device`.
    #[inline(always)]
    pub fn local_mem_size (&self, device: Device) -> Result<cl_ulong> {
        self.get_work_group_info(device, CL_KERNEL_LOCAL_MEM_SIZE)
    }

    /// Preferred work-group size multiple for `device`, a launch-tuning hint.
    #[inline(always)]
    pub fn preferred_work_group_size_multiple (&self, device: Device) -> Result<size_t> {
        self.get_work_group_info(device, CL_KERNEL_PREFERRED_WORK_GROUP_SIZE_MULTIPLE)
    }

    /// Raw bytes of any `clGetKernelInfo` selector.
    pub fn info_raw (&self, param: cl_kernel_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetKernelInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetKernelInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    fn get_info_string (&self, param: cl_kernel_info) -> Result<String> {
        let mut bytes = self.info_raw(param)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_kernel_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetKernelInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }

    #[inline]
    fn get_work_group_info<T: Copy> (&self, device: Device, param: cl_kernel_work_group_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetKernelWorkGroupInfo(self.0, device.id(), param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Clone for Kernel {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainKernel(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Kernel {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseKernel(self.0));
        }
    }
}

impl Debug for Kernel {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernel")
        .field("id", &self.0)
        .field("function_name", &self.function_name())
        .field("num_args", &self.num_args())
        .finish()
    }
}

unsafe impl Send for Kernel {}
