use core::{mem::MaybeUninit, fmt::Debug, ops::Deref};
use libc::size_t;
use once_cell::sync::Lazy;
use opencl_sys::{cl_device_id, cl_device_info, cl_device_type, cl_device_fp_config, cl_device_partition_property, cl_bool, cl_uint, cl_ulong, clGetDeviceIDs, clGetDeviceInfo, clCreateSubDevices, clRetainDevice, clReleaseDevice, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_CUSTOM, CL_DEVICE_TYPE, CL_DEVICE_NAME, CL_DEVICE_VENDOR, CL_DEVICE_VENDOR_ID, CL_DEVICE_PROFILE, CL_DEVICE_VERSION, CL_DRIVER_VERSION, CL_DEVICE_EXTENSIONS, CL_DEVICE_AVAILABLE, CL_DEVICE_ADDRESS_BITS, CL_DEVICE_ENDIAN_LITTLE, CL_DEVICE_GLOBAL_MEM_SIZE, CL_DEVICE_LOCAL_MEM_SIZE, CL_DEVICE_MAX_COMPUTE_UNITS, CL_DEVICE_MAX_WORK_GROUP_SIZE, CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS, CL_DEVICE_MAX_WORK_ITEM_SIZES, CL_DEVICE_MAX_MEM_ALLOC_SIZE, CL_DEVICE_MAX_PARAMETER_SIZE, CL_DEVICE_IMAGE_SUPPORT, CL_DEVICE_QUEUE_PROPERTIES, CL_DEVICE_SINGLE_FP_CONFIG, CL_DEVICE_PLATFORM, CL_DEVICE_PARTITION_EQUALLY, CL_FP_DENORM, CL_FP_INF_NAN, CL_FP_ROUND_TO_NEAREST, CL_FP_ROUND_TO_ZERO, CL_FP_ROUND_TO_INF};
use crate::error::{check, Result};
use crate::platform::Platform;
use crate::queue::CommandQueueProps;

static DEVICES : Lazy<Vec<Device>> = Lazy::new(|| unsafe {
    let mut result = Vec::<Device>::new();

    for platform in Platform::all() {
        let mut cnt = 0;
        tri_panic!(clGetDeviceIDs(platform.id(), CL_DEVICE_TYPE_ALL, 0, core::ptr::null_mut(), &mut cnt));
        let cnt_size = usize::try_from(cnt).unwrap();

        result.reserve(cnt_size);
        tri_panic!(clGetDeviceIDs(platform.id(), CL_DEVICE_TYPE_ALL, cnt, result.as_mut_ptr().add(result.len()).cast(), core::ptr::null_mut()));
        result.set_len(result.len() + cnt_size);
    }

    result
});

/// OpenCL root device. Root devices are owned by the platform and carry no
/// retain/release pair, so the wrapper is `Copy`. Partitioned devices are
/// wrapped in [`SubDevice`] instead.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Device (pub(crate) cl_device_id);

impl Device {
    /// Every device of every platform, enumerated once per process.
    #[inline(always)]
    pub fn all () -> &'static [Device] {
        &DEVICES
    }

    #[inline(always)]
    pub fn first () -> Option<Device> {
        DEVICES.first().copied()
    }

    #[inline(always)]
    pub fn from_platform (platform: Platform) -> impl Iterator<Item = Device> {
        DEVICES.iter().copied().filter(move |x| x.raw_platform_id() == platform.id())
    }

    #[inline(always)]
    pub fn id (&self) -> cl_device_id {
        self.0
    }

    /// Device name string.
    #[inline(always)]
    pub fn name (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_NAME)
    }

    /// Vendor name string.
    #[inline(always)]
    pub fn vendor (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_VENDOR)
    }

    /// A unique device vendor identifier, e.g. a PCIe ID.
    #[inline(always)]
    pub fn vendor_id (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_DEVICE_VENDOR_ID)
    }

    /// OpenCL profile string.
    #[inline(always)]
    pub fn profile (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_PROFILE)
    }

    /// OpenCL version string.
    #[inline(always)]
    pub fn version (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_VERSION)
    }

    /// OpenCL software driver version string.
    #[inline(always)]
    pub fn driver_version (&self) -> Result<String> {
        self.get_info_string(CL_DRIVER_VERSION)
    }

    /// Extension names supported by the device.
    #[inline]
    pub fn extensions (&self) -> Result<Vec<String>> {
        let list = self.get_info_string(CL_DEVICE_EXTENSIONS)?;
        Ok(list.split_whitespace().map(String::from).collect())
    }

    /// The OpenCL device type.
    #[inline(always)]
    pub fn ty (&self) -> Result<DeviceType> {
        let bits = self.get_info_bits::<cl_device_type>(CL_DEVICE_TYPE)?;
        Ok(DeviceType::from_bits_truncate(bits))
    }

    /// Is `true` if the device is currently available.
    #[inline(always)]
    pub fn available (&self) -> Result<bool> {
        Ok(self.get_info_bits::<cl_bool>(CL_DEVICE_AVAILABLE)? != 0)
    }

    /// Address space size in bits, 32 or 64.
    #[inline(always)]
    pub fn address_bits (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_DEVICE_ADDRESS_BITS)
    }

    /// Is `true` on little-endian devices.
    #[inline(always)]
    pub fn endian_little (&self) -> Result<bool> {
        Ok(self.get_info_bits::<cl_bool>(CL_DEVICE_ENDIAN_LITTLE)? != 0)
    }

    /// Size of global device memory in bytes.
    #[inline(always)]
    pub fn global_mem_size (&self) -> Result<cl_ulong> {
        self.get_info_bits(CL_DEVICE_GLOBAL_MEM_SIZE)
    }

    /// Size of the local memory arena in bytes.
    #[inline(always)]
    pub fn local_mem_size (&self) -> Result<cl_ulong> {
        self.get_info_bits(CL_DEVICE_LOCAL_MEM_SIZE)
    }

    /// The number of parallel compute units on the device.
    #[inline(always)]
    pub fn max_compute_units (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_DEVICE_MAX_COMPUTE_UNITS)
    }

    /// Maximum number of work-items in a work-group.
    #[inline(always)]
    pub fn max_work_group_size (&self) -> Result<size_t> {
        self.get_info_bits(CL_DEVICE_MAX_WORK_GROUP_SIZE)
    }

    /// Maximum number of work-item dimensions, at least 3.
    #[inline(always)]
    pub fn max_work_item_dimensions (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS)
    }

    /// Maximum work-items per dimension, one entry per dimension.
    pub fn max_work_item_sizes (&self) -> Result<Vec<size_t>> {
        let n = usize::try_from(self.max_work_item_dimensions()?).unwrap();
        let len = n.checked_mul(core::mem::size_of::<size_t>()).expect("work item dimension count overflow");

        let mut sizes = Vec::<size_t>::with_capacity(n);
        unsafe {
            check(clGetDeviceInfo(self.0, CL_DEVICE_MAX_WORK_ITEM_SIZES, len, sizes.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            sizes.set_len(n);
        }

        Ok(sizes)
    }

    /// Maximum size of a single memory object allocation in bytes.
    #[inline(always)]
    pub fn max_mem_alloc_size (&self) -> Result<cl_ulong> {
        self.get_info_bits(CL_DEVICE_MAX_MEM_ALLOC_SIZE)
    }

    /// Maximum size in bytes of the arguments passed to a kernel.
    #[inline(always)]
    pub fn max_parameter_size (&self) -> Result<size_t> {
        self.get_info_bits(CL_DEVICE_MAX_PARAMETER_SIZE)
    }

    /// Is `true` if the device supports images.
    #[inline(always)]
    pub fn image_support (&self) -> Result<bool> {
        Ok(self.get_info_bits::<cl_bool>(CL_DEVICE_IMAGE_SUPPORT)? != 0)
    }

    /// Command-queue properties supported by the device.
    #[inline(always)]
    pub fn queue_properties (&self) -> Result<CommandQueueProps> {
        let bits = self.get_info_bits(CL_DEVICE_QUEUE_PROPERTIES)?;
        Ok(CommandQueueProps::from_bits_truncate(bits))
    }

    /// Single precision floating-point capability of the device.
    #[inline(always)]
    pub fn single_fp_config (&self) -> Result<FpConfig> {
        let bits = self.get_info_bits::<cl_device_fp_config>(CL_DEVICE_SINGLE_FP_CONFIG)?;
        Ok(FpConfig::from_bits_truncate(bits))
    }

    /// The platform this device belongs to.
    #[inline(always)]
    pub fn platform (&self) -> Result<Platform> {
        let id = self.get_info_bits(CL_DEVICE_PLATFORM)?;
        Ok(Platform::get_by_id(id).unwrap_or(Platform(id)))
    }

    /// Partitions the device into sub-devices of `units` compute units each.
    pub fn partition_equally (&self, units: cl_uint) -> Result<Vec<SubDevice>> {
        let props : [cl_device_partition_property; 3] = [
            CL_DEVICE_PARTITION_EQUALLY as cl_device_partition_property,
            units as cl_device_partition_property,
            0
        ];

        let mut cnt = 0;
        unsafe {
            check(clCreateSubDevices(self.0, props.as_ptr(), 0, core::ptr::null_mut(), &mut cnt))?;
        }

        let cnt_size = usize::try_from(cnt).unwrap();
        let mut result = Vec::<SubDevice>::with_capacity(cnt_size);
        unsafe {
            check(clCreateSubDevices(self.0, props.as_ptr(), cnt, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(cnt_size);
        }

        Ok(result)
    }

    /// Raw bytes of any `clGetDeviceInfo` selector.
    pub fn info_raw (&self, param: cl_device_info) -> Result<Vec<u8>> {
        unsafe {
            let mut len : size_t = 0;
            check(clGetDeviceInfo(self.0, param, 0, core::ptr::null_mut(), &mut len))?;

            let mut result = Vec::<u8>::with_capacity(len);
            check(clGetDeviceInfo(self.0, param, len, result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            result.set_len(len);
            Ok(result)
        }
    }

    #[inline(always)]
    fn raw_platform_id (&self) -> opencl_sys::cl_platform_id {
        self.get_info_bits(CL_DEVICE_PLATFORM).unwrap_or(core::ptr::null_mut())
    }

    fn get_info_string (&self, param: cl_device_info) -> Result<String> {
        let mut bytes = self.info_raw(param)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_device_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetDeviceInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Debug for Device {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
        .field("id", &self.0)
        .field("name", &self.name())
        .field("vendor", &self.vendor())
        .field("type", &self.ty())
        .field("version", &self.version())
        .field("driver_version", &self.driver_version())
        .field("max_compute_units", &self.max_compute_units())
        .field("max_work_group_size", &self.max_work_group_size())
        .field("global_mem_size", &self.global_mem_size())
        .finish()
    }
}

unsafe impl Send for Device {}
unsafe impl Sync for Device {}

/// A partitioned device. Unlike root devices, sub-devices are reference
/// counted by the driver.
#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct SubDevice (Device);

impl SubDevice {
    #[inline(always)]
    pub fn device (&self) -> Device {
        self.0
    }
}

impl Deref for SubDevice {
    type Target = Device;

    #[inline(always)]
    fn deref (&self) -> &Device {
        &self.0
    }
}

impl Clone for SubDevice {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainDevice(self.0.0));
        }

        Self(self.0)
    }
}

impl Drop for SubDevice {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseDevice(self.0.0));
        }
    }
}

impl Debug for SubDevice {
    #[inline(always)]
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

bitflags::bitflags! {
    /// The OpenCL device type.
    #[repr(transparent)]
    pub struct DeviceType : cl_device_type {
        const CPU = CL_DEVICE_TYPE_CPU;
        const GPU = CL_DEVICE_TYPE_GPU;
        const ACCELERATOR = CL_DEVICE_TYPE_ACCELERATOR;
        const CUSTOM = CL_DEVICE_TYPE_CUSTOM;
    }

    /// Floating-point capability of the device.
    #[repr(transparent)]
    pub struct FpConfig : cl_device_fp_config {
        const DENORM = CL_FP_DENORM;
        const INF_NAN = CL_FP_INF_NAN;
        const ROUND_TO_NEAREST = CL_FP_ROUND_TO_NEAREST;
        const ROUND_TO_ZERO = CL_FP_ROUND_TO_ZERO;
        const ROUND_TO_INF = CL_FP_ROUND_TO_INF;
    }
}
