use core::{mem::MaybeUninit, ptr::addr_of, fmt::Debug};
use libc::c_void;
use opencl_sys::{cl_event, cl_event_info, cl_int, cl_uint, cl_ulong, cl_profiling_info, cl_command_type, clRetainEvent, clReleaseEvent, clWaitForEvents, clGetEventInfo, clGetEventProfilingInfo, clSetEventCallback, clRetainCommandQueue, clRetainContext, CL_EVENT_COMMAND_QUEUE, CL_EVENT_COMMAND_TYPE, CL_EVENT_COMMAND_EXECUTION_STATUS, CL_EVENT_REFERENCE_COUNT, CL_EVENT_CONTEXT, CL_PROFILING_COMMAND_QUEUED, CL_PROFILING_COMMAND_SUBMIT, CL_PROFILING_COMMAND_START, CL_PROFILING_COMMAND_END};
use crate::bridge::{CallbackHub, HubHandle};
use crate::context::Context;
use crate::error::{check, Error, Result};
use crate::queue::CommandQueue;
use super::{CommandType, EventStatus};

/// OpenCL event. Tracks the completion state of one enqueued command.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Event (pub(crate) cl_event);

impl Event {
    #[inline(always)]
    pub(crate) fn from_id (id: cl_event) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub fn id (&self) -> cl_event {
        self.0
    }

    /// Blocks the calling thread until the command completes.
    #[inline(always)]
    pub fn wait (&self) -> Result<()> {
        unsafe {
            check(clWaitForEvents(1, addr_of!(self.0)))
        }
    }

    /// Blocks until every event in the list completes.
    pub fn wait_all (events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let len = cl_uint::try_from(events.len()).expect("too many events");
        unsafe {
            // `Event` is a transparent wrapper over `cl_event`.
            check(clWaitForEvents(len, events.as_ptr().cast()))
        }
    }

    /// Registers `f` to run once the event reaches `status` (or terminates
    /// abnormally, in which case it receives the error).
    ///
    /// The driver fires the native callback on a thread it owns; the
    /// invocation is queued on `hub` and `f` runs on whichever host thread
    /// drains it. Fires at most once per registration.
    pub fn on_status<F> (&self, hub: &CallbackHub, status: EventStatus, f: F) -> Result<()>
    where F: FnOnce(Result<EventStatus>) + Send + 'static {
        let reg = Box::new(Registration {
            hub: hub.handle(),
            callback: Box::new(f)
        });
        let user_data = Box::into_raw(reg).cast::<c_void>();

        let err = unsafe {
            clSetEventCallback(self.0, status as cl_int, Some(notify), user_data)
        };

        if err != 0 {
            // The driver never took the registration; reclaim it.
            unsafe {
                drop(Box::from_raw(user_data.cast::<Registration>()));
            }

            return Err(Error::from_code(err));
        }

        Ok(())
    }

    /// Registers `f` for completion. See [`Event::on_status`].
    #[inline(always)]
    pub fn on_complete<F> (&self, hub: &CallbackHub, f: F) -> Result<()>
    where F: FnOnce(Result<EventStatus>) + Send + 'static {
        self.on_status(hub, EventStatus::Complete, f)
    }

    /// The queue the command was enqueued on. `None` for user events. The
    /// returned wrapper owns a fresh retain.
    pub fn command_queue (&self) -> Result<Option<CommandQueue>> {
        let id = self.get_info_bits::<opencl_sys::cl_command_queue>(CL_EVENT_COMMAND_QUEUE)?;
        if id.is_null() {
            return Ok(None);
        }

        unsafe {
            check(clRetainCommandQueue(id))?;
        }

        Ok(Some(CommandQueue(id)))
    }

    /// The context the event belongs to. The returned wrapper owns a fresh
    /// retain.
    pub fn context (&self) -> Result<Context> {
        let id = self.get_info_bits::<opencl_sys::cl_context>(CL_EVENT_CONTEXT)?;
        unsafe {
            check(clRetainContext(id))?;
        }

        Ok(Context(id))
    }

    #[inline(always)]
    pub fn command_type (&self) -> Result<Option<CommandType>> {
        let raw = self.get_info_bits::<cl_command_type>(CL_EVENT_COMMAND_TYPE)?;
        Ok(CommandType::from_raw(raw))
    }

    /// Current execution status, or the status code of an abnormally
    /// terminated command.
    #[inline(always)]
    pub fn status (&self) -> Result<EventStatus> {
        let raw = self.get_info_bits::<cl_int>(CL_EVENT_COMMAND_EXECUTION_STATUS)?;
        EventStatus::from_raw(raw)
    }

    #[inline(always)]
    pub fn reference_count (&self) -> Result<cl_uint> {
        self.get_info_bits(CL_EVENT_REFERENCE_COUNT)
    }

    /// Device counter when the command was enqueued, in nanoseconds. Needs a
    /// queue created with profiling enabled.
    #[inline(always)]
    pub fn time_queued (&self) -> Result<cl_ulong> {
        self.get_profiling_info(CL_PROFILING_COMMAND_QUEUED)
    }

    #[inline(always)]
    pub fn time_submitted (&self) -> Result<cl_ulong> {
        self.get_profiling_info(CL_PROFILING_COMMAND_SUBMIT)
    }

    #[inline(always)]
    pub fn time_started (&self) -> Result<cl_ulong> {
        self.get_profiling_info(CL_PROFILING_COMMAND_START)
    }

    #[inline(always)]
    pub fn time_ended (&self) -> Result<cl_ulong> {
        self.get_profiling_info(CL_PROFILING_COMMAND_END)
    }

    #[inline]
    fn get_info_bits<T: Copy> (&self, param: cl_event_info) -> Result<T> {
        unsafe {
            let mut value = MaybeUninit::<T>::uninit();
            check(clGetEventInfo(self.0, param, core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
            Ok(value.assume_init())
        }
    }

    #[inline]
    fn get_profiling_info (&self, param: cl_profiling_info) -> Result<cl_ulong> {
        unsafe {
            let mut value : cl_ulong = 0;
            check(clGetEventProfilingInfo(self.0, param, core::mem::size_of::<cl_ulong>(), (&mut value as *mut cl_ulong).cast(), core::ptr::null_mut()))?;
            Ok(value)
        }
    }
}

struct Registration {
    hub: HubHandle,
    callback: Box<dyn FnOnce(Result<EventStatus>) + Send>
}

/// Native trampoline. Runs on a driver thread: moves the registration into
/// the hub and returns without touching user code.
extern "C" fn notify (_event: cl_event, status: cl_int, user_data: *mut c_void) {
    let reg = unsafe { Box::from_raw(user_data.cast::<Registration>()) };
    let Registration { hub, callback } = *reg;
    hub.push(Box::new(move || callback(EventStatus::from_raw(status))));
}

impl Clone for Event {
    #[inline(always)]
    fn clone (&self) -> Self {
        unsafe {
            tri_panic!(clRetainEvent(self.0));
        }

        Self(self.0)
    }
}

impl Drop for Event {
    #[inline(always)]
    fn drop (&mut self) {
        unsafe {
            tri_panic!(clReleaseEvent(self.0));
        }
    }
}

impl Debug for Event {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
        .field("id", &self.0)
        .field("command_type", &self.command_type())
        .field("status", &self.status())
        .finish()
    }
}

unsafe impl Send for Event {}
unsafe impl Sync for Event {}
