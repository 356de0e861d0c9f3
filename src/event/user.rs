use core::ops::Deref;
use opencl_sys::{clCreateUserEvent, clSetUserEventStatus, CL_COMPLETE};
use crate::context::Context;
use crate::error::{check, Error, Result};
use super::Event;

/// A host-controlled event. Commands may wait on it; the host decides when
/// it completes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct UserEvent (Event);

impl UserEvent {
    pub fn new (ctx: &Context) -> Result<Self> {
        let mut err = 0;
        let id = unsafe {
            clCreateUserEvent(ctx.0, &mut err)
        };

        if err != 0 {
            return Err(Error::from_code(err));
        }

        Ok(Self(Event::from_id(id)))
    }

    /// Marks the event complete, releasing anything waiting on it. May be
    /// set exactly once per event.
    #[inline(always)]
    pub fn complete (&self) -> Result<()> {
        unsafe {
            check(clSetUserEventStatus(self.0.0, CL_COMPLETE))
        }
    }

    /// Terminates the event abnormally with a negative status code. Commands
    /// waiting on it will not run.
    #[inline(always)]
    pub fn fail (&self, status: Error) -> Result<()> {
        unsafe {
            check(clSetUserEventStatus(self.0.0, status.code()))
        }
    }

    #[inline(always)]
    pub fn event (&self) -> &Event {
        &self.0
    }
}

impl Deref for UserEvent {
    type Target = Event;

    #[inline(always)]
    fn deref (&self) -> &Event {
        &self.0
    }
}

impl AsRef<Event> for UserEvent {
    #[inline(always)]
    fn as_ref (&self) -> &Event {
        &self.0
    }
}
