//! Safe wrappers for the OpenCL 1.2 host API.
//!
//! Every OpenCL object kind gets its own `#[repr(transparent)]` newtype over
//! the raw handle, so a [`Kernel`](kernel::Kernel) can never be passed where
//! a [`Buffer`](buffer::Buffer) is expected. `Clone` maps to the native
//! `clRetain*` and `Drop` to `clRelease*`; reference counting stays inside
//! the driver.
//!
//! Driver-thread callbacks (program builds, event status changes) are never
//! run in place. They are routed through a [`CallbackHub`](bridge::CallbackHub)
//! that the host drains on its own thread.

macro_rules! flat_mod {
    ($($i:ident),+) => {
        $(
            mod $i;
            pub use $i::*;
        )+
    }
}

// For Drop impls only. Fallible paths go through `error::check`.
macro_rules! tri_panic {
    ($i:expr) => {
        match $i {
            0 => {},
            err => panic!("{}", crate::error::Error::from_code(err))
        }
    };
}

pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::platform::Platform;
    pub use crate::device::Device;
    pub use crate::context::Context;
    pub use crate::queue::CommandQueue;
    pub use crate::program::Program;
    pub use crate::kernel::Kernel;
    pub use crate::buffer::{Buffer, MemFlags};
    pub use crate::event::{Event, EventStatus, UserEvent};
    pub use crate::bridge::CallbackHub;
}

pub mod error;
pub mod platform;
pub mod device;
pub mod context;
pub mod queue;
pub mod program;
pub mod kernel;
pub mod buffer;
pub mod image;
pub mod sampler;
pub mod event;
pub mod bridge;
pub mod registry;

pub(crate) mod wait_list {
    use opencl_sys::cl_event;
    use crate::event::Event;

    /// Collects a wait list into the `(len, ptr)` pair the enqueue entry
    /// points expect. An empty list must be passed as `(0, NULL)`.
    pub fn collect<'a> (wait: impl IntoIterator<Item = &'a Event>) -> (Vec<cl_event>, u32, *const cl_event) {
        let ids = wait.into_iter().map(Event::id).collect::<Vec<_>>();
        let len = u32::try_from(ids.len()).expect("too many events in wait list");
        let ptr = match len {
            0 => core::ptr::null(),
            _ => ids.as_ptr()
        };

        (ids, len, ptr)
    }
}
