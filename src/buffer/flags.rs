use opencl_sys::{cl_map_flags, cl_mem_flags, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY, CL_MEM_READ_ONLY, CL_MEM_USE_HOST_PTR, CL_MEM_ALLOC_HOST_PTR, CL_MEM_COPY_HOST_PTR, CL_MEM_HOST_WRITE_ONLY, CL_MEM_HOST_READ_ONLY, CL_MEM_HOST_NO_ACCESS, CL_MAP_READ, CL_MAP_WRITE, CL_MAP_WRITE_INVALIDATE_REGION};

bitflags::bitflags! {
    /// Allocation and usage flags for memory objects.
    #[repr(transparent)]
    pub struct MemFlags : cl_mem_flags {
        /// Readable and writable from kernels. The default.
        const READ_WRITE = CL_MEM_READ_WRITE;
        /// Write-only inside kernels; reading is undefined.
        const WRITE_ONLY = CL_MEM_WRITE_ONLY;
        /// Read-only inside kernels; writing is undefined.
        const READ_ONLY = CL_MEM_READ_ONLY;
        /// Use the given host allocation as backing store.
        const USE_HOST_PTR = CL_MEM_USE_HOST_PTR;
        /// Allocate from host-accessible memory.
        const ALLOC_HOST_PTR = CL_MEM_ALLOC_HOST_PTR;
        /// Initialize the allocation by copying from the given host pointer.
        const COPY_HOST_PTR = CL_MEM_COPY_HOST_PTR;
        const HOST_WRITE_ONLY = CL_MEM_HOST_WRITE_ONLY;
        const HOST_READ_ONLY = CL_MEM_HOST_READ_ONLY;
        const HOST_NO_ACCESS = CL_MEM_HOST_NO_ACCESS;
    }

    /// Access flags for [`RawBuffer::map_blocking`](super::RawBuffer::map_blocking).
    #[repr(transparent)]
    pub struct MapFlags : cl_map_flags {
        const READ = CL_MAP_READ;
        const WRITE = CL_MAP_WRITE;
        /// The mapped region may be left uninitialized; the whole region is
        /// considered overwritten on unmap.
        const WRITE_INVALIDATE_REGION = CL_MAP_WRITE_INVALIDATE_REGION;
    }
}

impl Default for MemFlags {
    #[inline(always)]
    fn default () -> Self {
        Self::READ_WRITE
    }
}

impl Default for MapFlags {
    #[inline(always)]
    fn default () -> Self {
        Self::READ | Self::WRITE
    }
}
