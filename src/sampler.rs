use core::{mem::MaybeUninit, fmt::Debug};
use opencl_sys::{cl_addressing_mode, cl_bool, cl_filter_mode, cl_sampler, cl_sampler_info, cl_uint, clCreateSampler, clRetainSampler, clReleaseSampler, clGetSamplerInfo, clRetainContext, CL_ADDRESS_NONE, CL_ADDRESS_CLAMP_TO_EDGE, CL_ADDRESS_CLAMP, CL_ADDRESS_REPEAT, CL_ADDRESS_MIRRORED_REPEAT, CL_FILTER_NEAREST, CL_FILTER_LINEAR, CL_SAMPLER_REFERENCE_COUNT, CL_SAMPLER_CONTEXT, CL_SAMPLER_NORMALIZED_COORDS, CL_SAMPLER_ADDRESSING_MODE, CL_SAMPLER_FILTER_MODE, CL_TRUE};
use crate::context::Context;
use crate::error::{check, Error, Result};

/// What happens when a kernel samples outside the image.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum AddressingMode {
    None = CL_ADDRESS_NONE,
    ClampToEdge = CL_ADDRESS_CLAMP_TO_EDGE,
    Clamp = CL_ADDRESS_CLAMP,
    Repeat = CL_ADDRESS_REPEAT,
    MirroredRepeat = CL_ADDRESS_MIRRORED_REPEAT
}

impl AddressingMode {
    pub fn from_raw (raw: cl_addressing_mode) -> Option<Self> {
        let v = match raw {
            CL_ADDRESS_NONE => Self::None,
            CL_ADDRESS_CLAMP_TO_EDGE => Self::ClampToEdge,
            CL_ADDRESS_CLAMP => Self::Clamp,
            CL_ADDRESS_REPEAT => Self::Repeat,
            CL_ADDRESS_MIRRORED_REPEAT => Self::MirroredRepeat,
            _ => return None
        };

        Some(v)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum FilterMode {
    Nearest = CL_FILTER_NEAREST,
    Linear = CL_FILTER_LINEAR
}

impl FilterMode {
    pub fn from_raw (raw: cl_filter_mode) -> Option<Self> {
        let v = match raw {
            CL_FILTER_NEAREST => Self::Nearest,
            CL_FILTER_LINEAR => Self::Linear,
            _ => return None
        };

        Some(v)
    }
}

/// Describes how kernels sample an image.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Sampler (pub(crate) cl_sampler);

impl Sampler {
    pub fn new (ctx: &Context, normalized_coords: bool, addressing: AddressingMode, filter: FilterMode) -> Result<Self> {
        let mut err = 0;
        // clCreateSamplerWithProperties needs 2.0. Deprecated, not gone.
        #[allow(deprecated)]
        let id = unsafe {
            clCreateSampler(ctx.0, cl_bool::from(normalized_coords), addressing as cl_addressing_mode, filter as cl_filter_mode, &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id))
    }

    #[inline(always)]
    pub fn id (&self) -> cl_sampler {
        self.0
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_SAMPLER_REFERENCE_COUNT)
    }

    /// The context the sampler belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_info_bits::<opencl_sys::cl_context>(CL_SAMPLER_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    #[inline(always)]
    pub fn normalized_coords (&self) -> Result<bool> {
        Ok(self.get_info_bits::<cl_bool>(CL_SAMPLER_NORMALIZED_COORDS)? == CL_TRUE)
    }

    pub fn addressing_mode (&self) -> Result<AddressingMode> {
        let raw = self.get_info_bits::<cl_addressing_mode>(CL_SAMPLER_ADDRESSING_MODE)?;
        AddressingMode::from_raw(raw).ok_or(Error::InvalidValue)
    }

    pub fn filter_mode (&self) -> Result<FilterMode> {
        let raw = self.get_info_bits::<cl_filter_mode>(CL_SAMPLER_FILTER_MODE)?;
        FilterMode::from_raw(raw).ok_or(Error::InvalidValue)
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_sampler_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetSamplerInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Clone for Sampler {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainSampler(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Sampler {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseSampler(self.0));
        }
    }
}

impl Debug for Sampler {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sampler")
        .field("id", &self.0)
        .field("normalized_coords", &self.normalized_coords())
        .finish()
    }
}

unsafe impl Send for Sampler {}
unsafe impl Sync for Sampler {}
