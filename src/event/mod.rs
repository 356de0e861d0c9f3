use opencl_sys::{cl_command_type, cl_int, CL_COMMAND_NDRANGE_KERNEL, CL_COMMAND_TASK, CL_COMMAND_NATIVE_KERNEL, CL_COMMAND_READ_BUFFER, CL_COMMAND_WRITE_BUFFER, CL_COMMAND_COPY_BUFFER, CL_COMMAND_READ_IMAGE, CL_COMMAND_WRITE_IMAGE, CL_COMMAND_COPY_IMAGE, CL_COMMAND_COPY_IMAGE_TO_BUFFER, CL_COMMAND_COPY_BUFFER_TO_IMAGE, CL_COMMAND_MAP_BUFFER, CL_COMMAND_MAP_IMAGE, CL_COMMAND_UNMAP_MEM_OBJECT, CL_COMMAND_MARKER, CL_COMMAND_BARRIER, CL_COMMAND_FILL_BUFFER, CL_COMMAND_USER, CL_COMPLETE, CL_RUNNING, CL_SUBMITTED, CL_QUEUED};
use crate::error::{Error, Result};

flat_mod!(base, user);

/// The command an event tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandType {
    NdRangeKernel = CL_COMMAND_NDRANGE_KERNEL,
    Task = CL_COMMAND_TASK,
    NativeKernel = CL_COMMAND_NATIVE_KERNEL,
    ReadBuffer = CL_COMMAND_READ_BUFFER,
    WriteBuffer = CL_COMMAND_WRITE_BUFFER,
    CopyBuffer = CL_COMMAND_COPY_BUFFER,
    FillBuffer = CL_COMMAND_FILL_BUFFER,
    ReadImage = CL_COMMAND_READ_IMAGE,
    WriteImage = CL_COMMAND_WRITE_IMAGE,
    CopyImage = CL_COMMAND_COPY_IMAGE,
    CopyImageToBuffer = CL_COMMAND_COPY_IMAGE_TO_BUFFER,
    CopyBufferToImage = CL_COMMAND_COPY_BUFFER_TO_IMAGE,
    MapBuffer = CL_COMMAND_MAP_BUFFER,
    MapImage = CL_COMMAND_MAP_IMAGE,
    UnmapMemObject = CL_COMMAND_UNMAP_MEM_OBJECT,
    Marker = CL_COMMAND_MARKER,
    Barrier = CL_COMMAND_BARRIER,
    User = CL_COMMAND_USER
}

impl CommandType {
    pub fn from_raw (raw: cl_command_type) -> Option<Self> {
        Some(match raw {
            CL_COMMAND_NDRANGE_KERNEL => Self::NdRangeKernel,
            CL_COMMAND_TASK => Self::Task,
            CL_COMMAND_NATIVE_KERNEL => Self::NativeKernel,
            CL_COMMAND_READ_BUFFER => Self::ReadBuffer,
            CL_COMMAND_WRITE_BUFFER => Self::WriteBuffer,
            CL_COMMAND_COPY_BUFFER => Self::CopyBuffer,
            CL_COMMAND_FILL_BUFFER => Self::FillBuffer,
            CL_COMMAND_READ_IMAGE => Self::ReadImage,
            CL_COMMAND_WRITE_IMAGE => Self::WriteImage,
            CL_COMMAND_COPY_IMAGE => Self::CopyImage,
            CL_COMMAND_COPY_IMAGE_TO_BUFFER => Self::CopyImageToBuffer,
            CL_COMMAND_COPY_BUFFER_TO_IMAGE => Self::CopyBufferToImage,
            CL_COMMAND_MAP_BUFFER => Self::MapBuffer,
            CL_COMMAND_MAP_IMAGE => Self::MapImage,
            CL_COMMAND_UNMAP_MEM_OBJECT => Self::UnmapMemObject,
            CL_COMMAND_MARKER => Self::Marker,
            CL_COMMAND_BARRIER => Self::Barrier,
            CL_COMMAND_USER => Self::User,
            _ => return None
        })
    }
}

/// Execution status of an enqueued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EventStatus {
    Complete = CL_COMPLETE,
    Running = CL_RUNNING,
    Submitted = CL_SUBMITTED,
    Queued = CL_QUEUED
}

impl EventStatus {
    /// Maps a raw execution status. Negative values are the status codes the
    /// driver uses to report an abnormally terminated command.
    pub fn from_raw (raw: cl_int) -> Result<Self> {
        match raw {
            CL_COMPLETE => Ok(Self::Complete),
            CL_RUNNING => Ok(Self::Running),
            CL_SUBMITTED => Ok(Self::Submitted),
            CL_QUEUED => Ok(Self::Queued),
            err if err < 0 => Err(Error::from_code(err)),
            _ => Err(Error::InvalidValue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_status_mapping () {
        assert_eq!(EventStatus::from_raw(0), Ok(EventStatus::Complete));
        assert_eq!(EventStatus::from_raw(3), Ok(EventStatus::Queued));
        assert_eq!(EventStatus::from_raw(-5), Err(Error::OutOfResources));
        assert_eq!(EventStatus::from_raw(17), Err(Error::InvalidValue));
    }

    #[test]
    fn command_type_mapping_rejects_junk () {
        assert_eq!(CommandType::from_raw(CL_COMMAND_NDRANGE_KERNEL), Some(CommandType::NdRangeKernel));
        assert_eq!(CommandType::from_raw(0xdead), None);
    }
}
