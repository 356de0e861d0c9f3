use core::fmt::{self, Display};
use opencl_sys::cl_int;

pub type Result<T> = core::result::Result<T, Error>;

/// Maps a native return code onto `Result`. Every fallible call site in the
/// crate goes through here; non-success codes are surfaced verbatim.
#[inline]
pub(crate) fn check (err: cl_int) -> Result<()> {
    match err {
        0 => Ok(()),
        err => Err(Error::from_code(err))
    }
}

macro_rules! cl_errors {
    ($($variant:ident = $code:literal, $name:literal, $msg:literal;)+) => {
        /// An OpenCL status code, one variant per standard error of the 1.x/2.0
        /// headers. Codes outside the standard enum (vendor extensions) land in
        /// [`Error::Unknown`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Error {
            $($variant,)+
            Unknown(i32)
        }

        impl Error {
            /// The numeric status code as returned by the driver.
            #[inline]
            pub fn code (&self) -> i32 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => *code
                }
            }

            /// The symbolic `CL_*` name of the code.
            #[inline]
            pub fn name (&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Unknown(_) => "CL_UNKNOWN"
                }
            }

            #[inline]
            pub fn message (&self) -> &'static str {
                match self {
                    $(Self::$variant => $msg,)+
                    Self::Unknown(_) => "unrecognized status code"
                }
            }

            #[inline]
            pub fn from_code (code: cl_int) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other)
                }
            }
        }
    };
}

cl_errors! {
    DeviceNotFound = -1, "CL_DEVICE_NOT_FOUND", "Device not found";
    DeviceNotAvailable = -2, "CL_DEVICE_NOT_AVAILABLE", "Device not available";
    CompilerNotAvailable = -3, "CL_COMPILER_NOT_AVAILABLE", "Compiler not available";
    MemObjectAllocationFailure = -4, "CL_MEM_OBJECT_ALLOCATION_FAILURE", "Memory object allocation failure";
    OutOfResources = -5, "CL_OUT_OF_RESOURCES", "Out of resources";
    OutOfHostMemory = -6, "CL_OUT_OF_HOST_MEMORY", "Out of host memory";
    ProfilingInfoNotAvailable = -7, "CL_PROFILING_INFO_NOT_AVAILABLE", "Profiling info not available";
    MemCopyOverlap = -8, "CL_MEM_COPY_OVERLAP", "Memory copy overlap";
    ImageFormatMismatch = -9, "CL_IMAGE_FORMAT_MISMATCH", "Image format mismatch";
    ImageFormatNotSupported = -10, "CL_IMAGE_FORMAT_NOT_SUPPORTED", "Image format not supported";
    BuildProgramFailure = -11, "CL_BUILD_PROGRAM_FAILURE", "Build program failure";
    MapFailure = -12, "CL_MAP_FAILURE", "Map failure";
    MisalignedSubBufferOffset = -13, "CL_MISALIGNED_SUB_BUFFER_OFFSET", "Misaligned sub-buffer offset";
    ExecStatusErrorForEventsInWaitList = -14, "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST", "Execution status error for events in wait list";
    CompileProgramFailure = -15, "CL_COMPILE_PROGRAM_FAILURE", "Program compilation failure";
    LinkerNotAvailable = -16, "CL_LINKER_NOT_AVAILABLE", "Linker not available";
    LinkProgramFailure = -17, "CL_LINK_PROGRAM_FAILURE", "Program linking failure";
    DevicePartitionFailed = -18, "CL_DEVICE_PARTITION_FAILED", "Device partition failure";
    KernelArgInfoNotAvailable = -19, "CL_KERNEL_ARG_INFO_NOT_AVAILABLE", "Kernel argument info not available";
    InvalidValue = -30, "CL_INVALID_VALUE", "Invalid value";
    InvalidDeviceType = -31, "CL_INVALID_DEVICE_TYPE", "Invalid device type";
    InvalidPlatform = -32, "CL_INVALID_PLATFORM", "Invalid platform";
    InvalidDevice = -33, "CL_INVALID_DEVICE", "Invalid device";
    InvalidContext = -34, "CL_INVALID_CONTEXT", "Invalid context";
    InvalidQueueProperties = -35, "CL_INVALID_QUEUE_PROPERTIES", "Invalid queue properties";
    InvalidCommandQueue = -36, "CL_INVALID_COMMAND_QUEUE", "Invalid command queue";
    InvalidHostPtr = -37, "CL_INVALID_HOST_PTR", "Invalid host pointer";
    InvalidMemObject = -38, "CL_INVALID_MEM_OBJECT", "Invalid memory object";
    InvalidImageFormatDescriptor = -39, "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR", "Invalid image format descriptor";
    InvalidImageSize = -40, "CL_INVALID_IMAGE_SIZE", "Invalid image size";
    InvalidSampler = -41, "CL_INVALID_SAMPLER", "Invalid sampler";
    InvalidBinary = -42, "CL_INVALID_BINARY", "Invalid binary";
    InvalidBuildOptions = -43, "CL_INVALID_BUILD_OPTIONS", "Invalid build options";
    InvalidProgram = -44, "CL_INVALID_PROGRAM", "Invalid program";
    InvalidProgramExecutable = -45, "CL_INVALID_PROGRAM_EXECUTABLE", "Invalid program executable";
    InvalidKernelName = -46, "CL_INVALID_KERNEL_NAME", "Invalid kernel name";
    InvalidKernelDefinition = -47, "CL_INVALID_KERNEL_DEFINITION", "Invalid kernel definition";
    InvalidKernel = -48, "CL_INVALID_KERNEL", "Invalid kernel";
    InvalidArgIndex = -49, "CL_INVALID_ARG_INDEX", "Invalid argument index";
    InvalidArgValue = -50, "CL_INVALID_ARG_VALUE", "Invalid argument value";
    InvalidArgSize = -51, "CL_INVALID_ARG_SIZE", "Invalid argument size";
    InvalidKernelArgs = -52, "CL_INVALID_KERNEL_ARGS", "Invalid kernel arguments";
    InvalidWorkDimension = -53, "CL_INVALID_WORK_DIMENSION", "Invalid work dimension";
    InvalidWorkGroupSize = -54, "CL_INVALID_WORK_GROUP_SIZE", "Invalid work group size";
    InvalidWorkItemSize = -55, "CL_INVALID_WORK_ITEM_SIZE", "Invalid work item size";
    InvalidGlobalOffset = -56, "CL_INVALID_GLOBAL_OFFSET", "Invalid global offset";
    InvalidEventWaitList = -57, "CL_INVALID_EVENT_WAIT_LIST", "Invalid event wait list";
    InvalidEvent = -58, "CL_INVALID_EVENT", "Invalid event";
    InvalidOperation = -59, "CL_INVALID_OPERATION", "Invalid operation";
    InvalidGlObject = -60, "CL_INVALID_GL_OBJECT", "Invalid GL object";
    InvalidBufferSize = -61, "CL_INVALID_BUFFER_SIZE", "Invalid buffer size";
    InvalidMipLevel = -62, "CL_INVALID_MIP_LEVEL", "Invalid mip level";
    InvalidGlobalWorkSize = -63, "CL_INVALID_GLOBAL_WORK_SIZE", "Invalid global work size";
    InvalidProperty = -64, "CL_INVALID_PROPERTY", "Invalid property";
    InvalidImageDescriptor = -65, "CL_INVALID_IMAGE_DESCRIPTOR", "Invalid image descriptor";
    InvalidCompilerOptions = -66, "CL_INVALID_COMPILER_OPTIONS", "Invalid compiler options";
    InvalidLinkerOptions = -67, "CL_INVALID_LINKER_OPTIONS", "Invalid linker options";
    InvalidDevicePartitionCount = -68, "CL_INVALID_DEVICE_PARTITION_COUNT", "Invalid device partition count";
    InvalidPipeSize = -69, "CL_INVALID_PIPE_SIZE", "Invalid pipe size";
    InvalidDeviceQueue = -70, "CL_INVALID_DEVICE_QUEUE", "Invalid device queue";
}

impl Display for Error {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes_round_trip () {
        for code in (-70..=-1).filter(|c| !matches!(c, -29..=-20)) {
            let err = Error::from_code(code);
            assert_eq!(err.code(), code);
            assert!(err.name().starts_with("CL_"), "{err}");
            assert!(!matches!(err, Error::Unknown(_)), "code {code} should be standard");
        }
    }

    #[test]
    fn vendor_codes_are_preserved () {
        let err = Error::from_code(-9999);
        assert_eq!(err, Error::Unknown(-9999));
        assert_eq!(err.code(), -9999);
    }

    #[test]
    fn display_names_the_symbol () {
        let msg = Error::BuildProgramFailure.to_string();
        assert!(msg.contains("CL_BUILD_PROGRAM_FAILURE"));
        assert!(msg.contains("-11"));
    }
}
