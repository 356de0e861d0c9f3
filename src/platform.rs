use core::fmt::Debug;
use libc::size_t;
use once_cell::sync::Lazy;
use opencl_sys::{clGetPlatformIDs, clGetPlatformInfo, cl_platform_id, cl_platform_info, CL_PLATFORM_PROFILE, CL_PLATFORM_VERSION, CL_PLATFORM_NAME, CL_PLATFORM_VENDOR, CL_PLATFORM_EXTENSIONS};
use crate::error::{check, Result};

static PLATFORMS : Lazy<Vec<Platform>> = Lazy::new(|| unsafe {
    let mut cnt = 0;
    tri_panic!(clGetPlatformIDs(0, core::ptr::null_mut(), &mut cnt));
    let cnt_size = usize::try_from(cnt).unwrap();

    let mut result = Vec::<Platform>::with_capacity(cnt_size);
    tri_panic!(clGetPlatformIDs(cnt, result.as_mut_ptr().cast(), core::ptr::null_mut()));
    result.set_len(cnt_size);

    result
});

/// OpenCL platform. Platforms are owned by the ICD loader and carry no
/// retain/release pair, so the wrapper is `Copy`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform (pub(crate) cl_platform_id);

impl Platform {
    /// Every platform reported by the ICD loader, enumerated once per process.
    #[inline(always)]
    pub fn all () -> &'static [Platform] {
        &PLATFORMS
    }

    #[inline(always)]
    pub fn id (&self) -> cl_platform_id {
        self.0
    }

    /// OpenCL profile string.
    #[inline(always)]
    pub fn profile (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_PROFILE)
    }

    /// OpenCL version string.
    #[inline(always)]
    pub fn version (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_VERSION)
    }

    /// Platform name string.
    #[inline(always)]
    pub fn name (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_NAME)
    }

    /// Platform vendor string.
    #[inline(always)]
    pub fn vendor (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_VENDOR)
    }

    /// Extension names supported by all devices of this platform.
    #[inline]
    pub fn extensions (&self) -> Result<Vec<String>> {
        let list = self.get_info_string(CL_PLATFORM_EXTENSIONS)?;
        Ok(list.split_whitespace().map(String::from).collect())
    }

    /// Raw bytes of any `clGetPlatformInfo` selector.
    pub fn info_raw (&self, param: cl_platform_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetPlatformInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetPlatformInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    #[inline(always)]
    pub(crate) fn get_by_id (id: cl_platform_id) -> Option<Platform> {
        PLATFORMS.iter().copied().find(|p| p.0 == id)
    }

    fn get_info_string (&self, param: cl_platform_info) -> Result<String> {
        let mut bytes = self.info_raw(param)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Debug for Platform {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Platform")
        .field("id", &self.0)
        .field("name", &self.name())
        .field("vendor", &self.vendor())
        .field("profile", &self.profile())
        .field("version", &self.version())
        .finish()
    }
}

unsafe impl Send for Platform {}
unsafe impl Sync for Platform {}
