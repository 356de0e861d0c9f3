use core::{mem::MaybeUninit, fmt::Debug};
use libc::size_t;
use opencl_sys::{cl_context, cl_context_info, cl_context_properties, cl_device_id, cl_uint, clCreateContext, clRetainContext, clReleaseContext, clGetContextInfo, CL_CONTEXT_PLATFORM, CL_CONTEXT_INTEROP_USER_SYNC, CL_CONTEXT_REFERENCE_COUNT, CL_CONTEXT_NUM_DEVICES, CL_CONTEXT_DEVICES};
use crate::error::{check, Result, Error};
use crate::platform::Platform;
use crate::device::Device;

/// OpenCL context
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Context (pub(crate) cl_context);

impl Context {
    pub fn new (props: Option<ContextProps>, devices: &[Device]) -> Result<Self> {
        // The property list must stay alive across the call.
        let props = props.map(ContextProps::build);
        let props_ptr = match &props {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };

        let len = cl_uint::try_from(devices.len()).expect("too many devices");
        let mut err = 0;

        let id = unsafe {
            clCreateContext(props_ptr, len, devices.as_ptr().cast(), None, core::ptr::null_mut(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Context(id))
    }

    #[inline(always)]
    pub fn id (&self) -> cl_context {
        self.0
    }

    /// The driver-side reference count. Meaningful only as a before/after
    /// comparison; other owners may change it at any time.
    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_CONTEXT_REFERENCE_COUNT)
    }

    #[inline(always)]
    pub fn num_devices (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_CONTEXT_NUM_DEVICES)
    }

    /// The devices the context was created against.
    pub fn devices (&self) -> Result<Vec<Device>> {
        let n = usize::try_from(self.num_devices()?).unwrap();
        let len = n.checked_mul(core::mem::size_of::<cl_device_id>()).unwrap();

        let mut devices = Vec::<Device>::with_capacity(n);
        unsafe {
            check(clGetContextInfo(self.0, CL_CONTEXT_DEVICES, len, devices.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            devices.set_len(n);
        }

        Ok(devices)
    }

    /// Raw bytes of any `clGetContextInfo` selector.
    pub fn info_raw (&self, param: cl_context_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetContextInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetContextInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_context_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetContextInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Clone for Context {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainContext(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Context {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseContext(self.0));
        }
    }
}

impl Debug for Context {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
        .field("id", &self.0)
        .field("num_devices", &self.num_devices())
        .finish()
    }
}

unsafe impl Send for Context {}
unsafe impl Sync for Context {}

/// OpenCL context properties, built into the `(key, value, ..., 0)` list
/// `clCreateContext` expects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextProps {
    pub platform: Option<Platform>,
    pub interop_user_sync: bool
}

impl ContextProps {
    #[inline(always)]
    pub fn new () -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn with_platform (platform: Platform) -> Self {
        Self { platform: Some(platform), interop_user_sync: false }
    }

    #[inline]
    pub fn build (self) -> Vec<cl_context_properties> {
        let mut result = Vec::<cl_context_properties>::with_capacity(5);

        result.extend([
            CL_CONTEXT_INTEROP_USER_SYNC as cl_context_properties,
            self.interop_user_sync as cl_context_properties
        ]);

        if let Some(platform) = self.platform {
            result.extend([
                CL_CONTEXT_PLATFORM as cl_context_properties,
                platform.id() as cl_context_properties
            ]);
        }

        result.push(0);
        result
    }
}

unsafe impl Send for ContextProps {}
unsafe impl Sync for ContextProps {}
