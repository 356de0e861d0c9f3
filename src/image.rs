use core::{mem::MaybeUninit, ptr::addr_of, fmt::Debug};
use libc::size_t;
use opencl_sys::{cl_bool, cl_channel_order, cl_channel_type, cl_event, cl_image_desc, cl_image_format, cl_image_info, cl_mem, cl_mem_info, cl_mem_object_type, cl_uint, clCreateImage, clRetainMemObject, clReleaseMemObject, clGetImageInfo, clGetMemObjectInfo, clGetSupportedImageFormats, clEnqueueReadImage, clEnqueueWriteImage, clRetainContext, CL_R, CL_A, CL_RG, CL_RA, CL_RGB, CL_RGBA, CL_BGRA, CL_ARGB, CL_INTENSITY, CL_LUMINANCE, CL_SNORM_INT8, CL_SNORM_INT16, CL_UNORM_INT8, CL_UNORM_INT16, CL_UNORM_SHORT_565, CL_UNORM_SHORT_555, CL_UNORM_INT_101010, CL_SIGNED_INT8, CL_SIGNED_INT16, CL_SIGNED_INT32, CL_UNSIGNED_INT8, CL_UNSIGNED_INT16, CL_UNSIGNED_INT32, CL_HALF_FLOAT, CL_FLOAT, CL_MEM_OBJECT_IMAGE1D, CL_MEM_OBJECT_IMAGE1D_BUFFER, CL_MEM_OBJECT_IMAGE1D_ARRAY, CL_MEM_OBJECT_IMAGE2D, CL_MEM_OBJECT_IMAGE2D_ARRAY, CL_MEM_OBJECT_IMAGE3D, CL_IMAGE_FORMAT, CL_IMAGE_ELEMENT_SIZE, CL_IMAGE_ROW_PITCH, CL_IMAGE_SLICE_PITCH, CL_IMAGE_WIDTH, CL_IMAGE_HEIGHT, CL_IMAGE_DEPTH, CL_MEM_REFERENCE_COUNT, CL_MEM_CONTEXT, CL_MEM_SIZE};
use crate::buffer::MemFlags;
use crate::context::Context;
use crate::error::{check, Error, Result};
use crate::event::Event;
use crate::queue::CommandQueue;
use crate::wait_list;

/// Order of the channels within a pixel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum ChannelOrder {
    R = CL_R,
    A = CL_A,
    RG = CL_RG,
    RA = CL_RA,
    RGB = CL_RGB,
    RGBA = CL_RGBA,
    BGRA = CL_BGRA,
    ARGB = CL_ARGB,
    Intensity = CL_INTENSITY,
    Luminance = CL_LUMINANCE
}

impl ChannelOrder {
    pub fn from_raw (raw: cl_channel_order) -> Option<Self> {
        let v = match raw {
            CL_R => Self::R,
            CL_A => Self::A,
            CL_RG => Self::RG,
            CL_RA => Self::RA,
            CL_RGB => Self::RGB,
            CL_RGBA => Self::RGBA,
            CL_BGRA => Self::BGRA,
            CL_ARGB => Self::ARGB,
            CL_INTENSITY => Self::Intensity,
            CL_LUMINANCE => Self::Luminance,
            _ => return None
        };

        Some(v)
    }
}

/// In-memory type of each channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum ChannelType {
    SnormInt8 = CL_SNORM_INT8,
    SnormInt16 = CL_SNORM_INT16,
    UnormInt8 = CL_UNORM_INT8,
    UnormInt16 = CL_UNORM_INT16,
    UnormShort565 = CL_UNORM_SHORT_565,
    UnormShort555 = CL_UNORM_SHORT_555,
    UnormInt101010 = CL_UNORM_INT_101010,
    SignedInt8 = CL_SIGNED_INT8,
    SignedInt16 = CL_SIGNED_INT16,
    SignedInt32 = CL_SIGNED_INT32,
    UnsignedInt8 = CL_UNSIGNED_INT8,
    UnsignedInt16 = CL_UNSIGNED_INT16,
    UnsignedInt32 = CL_UNSIGNED_INT32,
    HalfFloat = CL_HALF_FLOAT,
    Float = CL_FLOAT
}

impl ChannelType {
    pub fn from_raw (raw: cl_channel_type) -> Option<Self> {
        let v = match raw {
            CL_SNORM_INT8 => Self::SnormInt8,
            CL_SNORM_INT16 => Self::SnormInt16,
            CL_UNORM_INT8 => Self::UnormInt8,
            CL_UNORM_INT16 => Self::UnormInt16,
            CL_UNORM_SHORT_565 => Self::UnormShort565,
            CL_UNORM_SHORT_555 => Self::UnormShort555,
            CL_UNORM_INT_101010 => Self::UnormInt101010,
            CL_SIGNED_INT8 => Self::SignedInt8,
            CL_SIGNED_INT16 => Self::SignedInt16,
            CL_SIGNED_INT32 => Self::SignedInt32,
            CL_UNSIGNED_INT8 => Self::UnsignedInt8,
            CL_UNSIGNED_INT16 => Self::UnsignedInt16,
            CL_UNSIGNED_INT32 => Self::UnsignedInt32,
            CL_HALF_FLOAT => Self::HalfFloat,
            CL_FLOAT => Self::Float,
            _ => return None
        };

        Some(v)
    }
}

/// Pixel format of an image.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ImageFormat {
    pub order: ChannelOrder,
    pub ty: ChannelType
}

impl ImageFormat {
    #[inline(always)]
    pub const fn new (order: ChannelOrder, ty: ChannelType) -> Self {
        Self { order, ty }
    }

    #[inline(always)]
    pub(crate) fn raw (self) -> cl_image_format {
        cl_image_format {
            image_channel_order: self.order as cl_channel_order,
            image_channel_data_type: self.ty as cl_channel_type
        }
    }

    #[inline(always)]
    pub(crate) fn from_raw (raw: cl_image_format) -> Option<Self> {
        Some(Self {
            order: ChannelOrder::from_raw(raw.image_channel_order)?,
            ty: ChannelType::from_raw(raw.image_channel_data_type)?
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum ImageType {
    Image1D = CL_MEM_OBJECT_IMAGE1D,
    Image1DBuffer = CL_MEM_OBJECT_IMAGE1D_BUFFER,
    Image1DArray = CL_MEM_OBJECT_IMAGE1D_ARRAY,
    Image2D = CL_MEM_OBJECT_IMAGE2D,
    Image2DArray = CL_MEM_OBJECT_IMAGE2D_ARRAY,
    Image3D = CL_MEM_OBJECT_IMAGE3D
}

/// Shape of an image. Pitches of zero let the driver compute them from the
/// width and the pixel size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ImageDesc {
    pub ty: ImageType,
    pub width: size_t,
    pub height: size_t,
    pub depth: size_t,
    pub array_size: size_t,
    pub row_pitch: size_t,
    pub slice_pitch: size_t
}

impl ImageDesc {
    #[inline(always)]
    pub const fn new_1d (width: size_t) -> Self {
        Self { ty: ImageType::Image1D, width, height: 1, depth: 1, array_size: 1, row_pitch: 0, slice_pitch: 0 }
    }

    #[inline(always)]
    pub const fn new_2d (width: size_t, height: size_t) -> Self {
        Self { ty: ImageType::Image2D, width, height, depth: 1, array_size: 1, row_pitch: 0, slice_pitch: 0 }
    }

    #[inline(always)]
    pub const fn new_3d (width: size_t, height: size_t, depth: size_t) -> Self {
        Self { ty: ImageType::Image3D, width, height, depth, array_size: 1, row_pitch: 0, slice_pitch: 0 }
    }

    fn raw (&self) -> cl_image_desc {
        let mut desc = unsafe { MaybeUninit::<cl_image_desc>::zeroed().assume_init() };
        desc.image_type = self.ty as cl_mem_object_type;
        desc.image_width = self.width;
        desc.image_height = self.height;
        desc.image_depth = self.depth;
        desc.image_array_size = self.array_size;
        desc.image_row_pitch = self.row_pitch;
        desc.image_slice_pitch = self.slice_pitch;
        desc
    }
}

/// An OpenCL image. Transfers address pixels by `[x, y, z]` origin and
/// `[width, height, depth]` region; unused dimensions must be 0 and 1
/// respectively.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Image (pub(crate) cl_mem);

impl Image {
    /// Creates an image with undefined contents.
    pub fn new (ctx: &Context, flags: impl Into<Option<MemFlags>>, format: ImageFormat, desc: ImageDesc) -> Result<Self> {
        let flags = flags.into().unwrap_or_default();
        let format = format.raw();
        let desc = desc.raw();

        let mut err = 0;
        let id = unsafe {
            clCreateImage(ctx.0, flags.bits(), addr_of!(format), addr_of!(desc), core::ptr::null_mut(), &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(id))
    }

    /// The formats a context supports for images of the given type, skipping
    /// any vendor format this crate has no name for.
    pub fn supported_formats (ctx: &Context, flags: impl Into<Option<MemFlags>>, ty: ImageType) -> Result<Vec<ImageFormat>> {
        let flags = flags.into().unwrap_or_default();

        let mut cnt : cl_uint = 0;
        unsafe {
            check(clGetSupportedImageFormats(ctx.0, flags.bits(), ty as cl_mem_object_type, 0, core::ptr::null_mut(), &mut cnt))?;
        }

        let cnt_size = usize::try_from(cnt).unwrap();
        let mut raw = Vec::<cl_image_format>::with_capacity(cnt_size);
        unsafe {
            check(clGetSupportedImageFormats(ctx.0, flags.bits(), ty as cl_mem_object_type, cnt, raw.as_mut_ptr(), core::ptr::null_mut()))?;
            raw.set_len(cnt_size);
        }

        Ok(raw.into_iter().filter_map(ImageFormat::from_raw).collect())
    }

    #[inline(always)]
    pub fn id (&self) -> cl_mem {
        self.0
    }

    /// Reads a region into `dst`, blocking until the data is in place.
    /// Panics if `dst` is smaller than the region.
    pub fn read<'a> (&self, queue: &CommandQueue, origin: [size_t; 3], region: [size_t; 3], dst: &mut [u8], wait: impl IntoIterator<Item = &'a Event>) -> Result<()> {
        self.check_region(region, dst.len())?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueReadImage(queue.0, self.0, cl_bool::from(true), origin.as_ptr(), region.as_ptr(), 0, 0, dst.as_mut_ptr().cast(), wait_len, wait_ptr, &mut event))?;
        }

        drop(Event::from_id(event));
        Ok(())
    }

    /// Writes a region from `src`, blocking until the data has been consumed.
    /// Panics if `src` is smaller than the region.
    pub fn write<'a> (&mut self, queue: &CommandQueue, origin: [size_t; 3], region: [size_t; 3], src: &[u8], wait: impl IntoIterator<Item = &'a Event>) -> Result<()> {
        self.check_region(region, src.len())?;
        let (_hold, wait_len, wait_ptr) = wait_list::collect(wait);

        let mut event : cl_event = core::ptr::null_mut();
        unsafe {
            check(clEnqueueWriteImage(queue.0, self.0, cl_bool::from(true), origin.as_ptr(), region.as_ptr(), 0, 0, src.as_ptr().cast(), wait_len, wait_ptr, &mut event))?;
        }

        drop(Event::from_id(event));
        Ok(())
    }

    pub fn format (&self) -> Result<ImageFormat> {
        let raw = self.get_image_info::<cl_image_format>(CL_IMAGE_FORMAT)?;
        ImageFormat::from_raw(raw).ok_or(Error::ImageFormatNotSupported)
    }

    /// Bytes per pixel.
    #[inline(always)]
    pub fn element_size (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_ELEMENT_SIZE)
    }

    #[inline(always)]
    pub fn row_pitch (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_ROW_PITCH)
    }

    #[inline(always)]
    pub fn slice_pitch (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_SLICE_PITCH)
    }

    #[inline(always)]
    pub fn width (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_WIDTH)
    }

    #[inline(always)]
    pub fn height (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_HEIGHT)
    }

    /// Depth in pixels. 1 for 2D images.
    #[inline(always)]
    pub fn depth (&self) -> Result<size_t> {
        self.get_image_info(CL_IMAGE_DEPTH)
    }

    /// Total allocation size in bytes.
    #[inline(always)]
    pub fn size (&self) -> Result<size_t> {
        self.get_mem_info(CL_MEM_SIZE)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_mem_info(CL_MEM_REFERENCE_COUNT)
    }

    /// The context the image belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_mem_info::<opencl_sys::cl_context>(CL_MEM_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    fn check_region (&self, region: [size_t; 3], host_len: size_t) -> Result<()> {
        let element = self.element_size()?;
        let pixels = region.iter().try_fold(1 as size_t, |acc, &x| acc.checked_mul(x));
        let bytes = pixels.and_then(|x| x.checked_mul(element));

        match bytes {
            Some(bytes) if bytes <= host_len => Ok(()),
            _ => panic!("Region out of bounds. A {}x{}x{} region of {element}-byte pixels does not fit in {host_len} host bytes", region[0], region[1], region[2])
        }
    }

    #[inline]
    fn get_image_info<T: Copy> (&self, param: cl_image_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetImageInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }

    #[inline]
    fn get_mem_info<T: Copy> (&self, param: cl_mem_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetMemObjectInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }
}

impl Clone for Image {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainMemObject(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Image {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseMemObject(self.0));
        }
    }
}

impl Debug for Image {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Image")
        .field("id", &self.0)
        .field("width", &self.width())
        .field("height", &self.height())
        .finish()
    }
}

unsafe impl Send for Image {}
unsafe impl Sync for Image {}
