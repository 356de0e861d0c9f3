use core::{mem::MaybeUninit, fmt::Debug};
use std::ffi::CString;
use libc::{c_char, c_void, size_t};
use opencl_sys::{cl_program, cl_program_info, cl_program_build_info, cl_build_status, cl_device_id, cl_int, cl_uint, clCreateProgramWithSource, clCreateProgramWithBinary, clRetainProgram, clReleaseProgram, clBuildProgram, clGetProgramInfo, clGetProgramBuildInfo, clRetainContext, CL_PROGRAM_SOURCE, CL_PROGRAM_REFERENCE_COUNT, CL_PROGRAM_NUM_DEVICES, CL_PROGRAM_DEVICES, CL_PROGRAM_CONTEXT, CL_PROGRAM_BINARY_SIZES, CL_PROGRAM_BINARIES, CL_PROGRAM_BUILD_STATUS, CL_PROGRAM_BUILD_OPTIONS, CL_PROGRAM_BUILD_LOG, CL_BUILD_SUCCESS, CL_BUILD_ERROR, CL_BUILD_IN_PROGRESS};
use crate::bridge::{CallbackHub, HubHandle};
use crate::context::Context;
use crate::device::Device;
use crate::error::{check, Error, Result};

/// OpenCL program
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Program (pub(crate) cl_program);

impl Program {
    /// Creates an unbuilt program from OpenCL C source. The driver keeps the
    /// text; it round-trips through [`Program::source`].
    pub fn from_source (ctx: &Context, source: &str) -> Result<Self> {
        let lengths : [size_t; 1] = [source.len()];
        let strings : [*const c_char; 1] = [source.as_ptr().cast()];

        let mut err = 0;
        let id = unsafe {
            clCreateProgramWithSource(ctx.0, 1, strings.as_ptr(), lengths.as_ptr(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id))
    }

    /// Creates a program from a device-specific binary previously obtained
    /// through [`Program::binaries`].
    pub fn from_binary (ctx: &Context, device: Device, binary: &[u8]) -> Result<Self> {
        let device_id : [cl_device_id; 1] = [device.id()];
        let lengths : [size_t; 1] = [binary.len()];
        let binaries : [*const u8; 1] = [binary.as_ptr()];

        let mut status : cl_int = 0;
        let mut err = 0;
        let id = unsafe {
            clCreateProgramWithBinary(ctx.0, 1, device_id.as_ptr(), lengths.as_ptr(), binaries.as_ptr(), &mut status, &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        check(status)?;
        Ok(Self(id))
    }

    /// Convenience: create from source and build for every context device.
    #[inline]
    pub fn build_from_source (ctx: &Context, source: &str) -> Result<Self> {
        let this = Self::from_source(ctx, source)?;
        this.build(None, None)?;
        Ok(this)
    }

    /// Builds (compiles and links) the program, blocking until the compiler
    /// finishes. `devices` of `None` builds for every device of the context.
    pub fn build (&self, devices: Option<&[Device]>, options: Option<&str>) -> Result<()> {
        let options = match options {
            Some(x) => Some(CString::new(x).map_err(|_| Error::InvalidBuildOptions)?),
            None => None
        };
        let options_ptr = match &options {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };

        let (num_devices, devices_ptr) = split_devices(devices);
        unsafe {
            check(clBuildProgram(self.0, num_devices, devices_ptr, options_ptr, None, core::ptr::null_mut()))
        }
    }

    /// Builds without blocking. Once the compiler finishes, `f` is queued on
    /// `hub` with a retained handle to this program; inspect
    /// [`build_status`](Program::build_status)/[`build_log`](Program::build_log)
    /// from the callback. Fires exactly once.
    pub fn build_with_notify<F> (&self, devices: Option<&[Device]>, options: Option<&str>, hub: &CallbackHub, f: F) -> Result<()>
    where F: FnOnce(Program) + Send + 'static {
        let options = match options {
            Some(x) => Some(CString::new(x).map_err(|_| Error::InvalidBuildOptions)?),
            None => None
        };
        let options_ptr = match &options {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };

        let reg = Box::new(BuildRegistration {
            hub: hub.handle(),
            callback: Box::new(f)
        });
        let user_data = Box::into_raw(reg).cast::<c_void>();

        let (num_devices, devices_ptr) = split_devices(devices);
        let err = unsafe {
            clBuildProgram(self.0, num_devices, devices_ptr, options_ptr, Some(build_notify), user_data)
        };

        if err != 0 {
            // The driver never took the registration; reclaim it.
            unsafe {
                drop(Box::from_raw(user_data.cast::<BuildRegistration>()));
            }

            return Err(Error::from_code(err));
        }

        Ok(())
    }

    #[inline(always)]
    pub fn id (&self) -> cl_program {
        self.0
    }

    /// The concatenated source the program was created with.
    #[inline(always)]
    pub fn source (&self) -> Result<String> {
        self.get_info_string(CL_PROGRAM_SOURCE)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_PROGRAM_REFERENCE_COUNT)
    }

    #[inline(always)]
    pub fn num_devices (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_PROGRAM_NUM_DEVICES)
    }

    pub fn devices (&self) -> Result<Vec<Device>> {
        let n = usize::try_from(self.num_devices()?).unwrap();
        let len = n.checked_mul(core::mem::size_of::<cl_device_id>()).unwrap();

        let mut devices = Vec::<Device>::with_capacity(n);
        unsafe {
            check(clGetProgramInfo(self.0, CL_PROGRAM_DEVICES, len, devices.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            devices.set_len(n);
        }

        Ok(devices)
    }

    /// The context the program belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_info_bits::<opencl_sys::cl_context>(CL_PROGRAM_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    /// The device binaries of a built program, one entry per program device
    /// (empty where no binary is available).
    pub fn binaries (&self) -> Result<Vec<Vec<u8>>> {
        let n = usize::try_from(self.num_devices()?).unwrap();

        let mut sizes = vec![0 as size_t; n];
        unsafe {
            check(clGetProgramInfo(self.0, CL_PROGRAM_BINARY_SIZES, n * core::mem::size_of::<size_t>(), sizes.as_mut_ptr().cast(), core::ptr::null_mut()))?;
        }

        let mut binaries = sizes.iter().map(|&s| vec![0u8; s]).collect::<Vec<_>>();
        let mut ptrs = binaries.iter_mut()
            .map(|b| if b.is_empty() { core::ptr::null_mut() } else { b.as_mut_ptr() })
            .collect::<Vec<*mut u8>>();

        unsafe {
            check(clGetProgramInfo(self.0, CL_PROGRAM_BINARIES, n * core::mem::size_of::<*mut u8>(), ptrs.as_mut_ptr().cast(), core::ptr::null_mut()))?;
        }

        Ok(binaries)
    }

    /// Build status of the program for `device`.
    pub fn build_status (&self, device: Device) -> Result<BuildStatus> {
        let raw = self.get_build_info_bits::<cl_build_status>(device, CL_PROGRAM_BUILD_STATUS)?;
        Ok(match raw {
            CL_BUILD_SUCCESS => BuildStatus::Success,
            CL_BUILD_ERROR => BuildStatus::Error,
            CL_BUILD_IN_PROGRESS => BuildStatus::InProgress,
            _ => BuildStatus::None
        })
    }

    /// Compiler output for `device`. The place to look when
    /// [`build`](Program::build) fails with `CL_BUILD_PROGRAM_FAILURE`.
    #[inline(always)]
    pub fn build_log (&self, device: Device) -> Result<String> {
        self.get_build_info_string(device, CL_PROGRAM_BUILD_LOG)
    }

    /// The options string of the last build for `device`.
    #[inline(always)]
    pub fn build_options (&self, device: Device) -> Result<String> {
        self.get_build_info_string(device, CL_PROGRAM_BUILD_OPTIONS)
    }

    /// Raw bytes of any `clGetProgramInfo` selector.
    pub fn info_raw (&self, param: cl_program_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetProgramInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetProgramInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    fn get_info_string (&self, param: cl_program_info) -> Result<String> {
        let mut bytes = self.info_raw(param)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_program_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetProgramInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }

    fn get_build_info_string (&self, device: Device, param: cl_program_build_info) -> Result<String> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetProgramBuildInfo(self.0, device.id(), param, 0, core::ptr::null_mut(), &mut len))?;

            let mut bytes = Vec::<u8>::with_capacity(len);
            check(clGetProgramBuildInfo(self.0, device.id(), param, len, bytes.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            bytes.set_len(len);

            while bytes.last() == Some(&0) {
                bytes.pop();
            }

            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    #[inline]
    fn get_build_info_bits<T: Copy> (&self, device: Device, param: cl_program_build_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetProgramBuildInfo(self.0, device.id(), param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

#[inline]
fn split_devices (devices: Option<&[Device]>) -> (cl_uint, *const cl_device_id) {
    match devices {
        Some(x) if !x.is_empty() => (
            cl_uint::try_from(x.len()).expect("too many devices"),
            x.as_ptr().cast()
        ),
        _ => (0, core::ptr::null())
    }
}

struct BuildRegistration {
    hub: HubHandle,
    callback: Box<dyn FnOnce(Program) + Send>
}

/// Native trampoline, invoked on a driver thread once the build finishes.
/// Retains the program for the callback, queues it on the hub and returns.
extern "C" fn build_notify (program: cl_program, user_data: *mut c_void) {
    let reg = unsafe { Box::from_raw(user_data.cast::<BuildRegistration>()) };
    let BuildRegistration { hub, callback } = *reg;

    let retained = unsafe { clRetainProgram(program) };
    if retained != 0 {
        log::warn!("dropping build notification: clRetainProgram failed with {retained}");
        return;
    }

    // Wrap before capturing: the raw handle is not `Send`, the wrapper is.
    let program = Program(program);
    hub.push(Box::new(move || callback(program)));
}

/// Per-device build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStatus {
    /// No build has been attempted for the device.
    None,
    Error,
    Success,
    InProgress
}

impl Clone for Program {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainProgram(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Program {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseProgram(self.0));
        }
    }
}

impl Debug for Program {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Program")
        .field("id", &self.0)
        .field("num_devices", &self.num_devices())
        .finish()
    }
}

unsafe impl Send for Program {}
unsafe impl Sync for Program {}
