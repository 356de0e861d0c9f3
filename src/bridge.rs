//! Hand-off point between driver worker threads and the host.
//!
//! The driver invokes build and event callbacks on threads it owns. User
//! code must never run there, so the native trampolines (see
//! [`program`](crate::program) and [`event`](crate::event)) only move a
//! boxed closure into a [`CallbackHub`] and return. The host runs the
//! closures whenever it drains the hub on a thread of its choosing.

use std::{collections::VecDeque, sync::Arc, time::Duration};
use parking_lot::{Condvar, Mutex};

pub(crate) type Completion = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct HubInner {
    queue: Mutex<VecDeque<Completion>>,
    ready: Condvar
}

/// A thread-safe FIFO of pending callback invocations.
///
/// Cloning a hub yields another handle to the same queue. Each registered
/// callback is queued at most once (the registration box is consumed when
/// the driver fires it) and runs at most once, on the thread that drains it.
#[derive(Clone, Default)]
pub struct CallbackHub {
    inner: Arc<HubInner>
}

impl CallbackHub {
    #[inline(always)]
    pub fn new () -> Self {
        Self::default()
    }

    /// Number of fired callbacks not yet drained.
    #[inline]
    pub fn pending (&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Runs every queued callback on the calling thread and returns how many
    /// ran. Callbacks queued while draining are picked up too.
    pub fn drain (&self) -> usize {
        let mut ran = 0;

        loop {
            // The callback itself runs outside the lock so it may touch the hub.
            let job = self.inner.queue.lock().pop_front();
            match job {
                Some(f) => {
                    f();
                    ran += 1;
                },
                None => return ran
            }
        }
    }

    /// Blocks until at least one callback is queued or the timeout elapses,
    /// then drains. Returns how many callbacks ran.
    pub fn wait_timeout (&self, timeout: Duration) -> usize {
        {
            let mut queue = self.inner.queue.lock();
            if queue.is_empty() {
                self.inner.ready.wait_for(&mut queue, timeout);
            }
        }

        self.drain()
    }

    pub(crate) fn handle (&self) -> HubHandle {
        HubHandle(self.inner.clone())
    }
}

/// The driver-thread side of a hub, held inside registration boxes.
pub(crate) struct HubHandle (Arc<HubInner>);

impl HubHandle {
    /// Called from driver threads. Only queues and signals; never runs user
    /// code.
    pub(crate) fn push (&self, f: Completion) {
        log::trace!("completion queued from driver thread");
        self.0.queue.lock().push_back(f);
        self.0.ready.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn drain_runs_each_completion_once () {
        let hub = CallbackHub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            hub.handle().push(Box::new(move || { hits.fetch_add(1, Ordering::SeqCst); }));
        }

        assert_eq!(hub.pending(), 3);
        assert_eq!(hub.drain(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        // Nothing left to run.
        assert_eq!(hub.drain(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn wait_timeout_observes_foreign_thread_push () {
        let hub = CallbackHub::new();
        let handle = hub.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let thread_hits = hits.clone();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.push(Box::new(move || { thread_hits.fetch_add(1, Ordering::SeqCst); }));
        });

        assert_eq!(hub.wait_timeout(Duration::from_secs(5)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        worker.join().unwrap();
    }

    #[test]
    fn wait_timeout_returns_empty_on_deadline () {
        let hub = CallbackHub::new();
        assert_eq!(hub.wait_timeout(Duration::from_millis(10)), 0);
    }

    #[test]
    fn callbacks_may_requeue_while_draining () {
        let hub = CallbackHub::new();
        let handle = hub.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_hits = hits.clone();
        let outer_hits = hits.clone();
        hub.handle().push(Box::new(move || {
            outer_hits.fetch_add(1, Ordering::SeqCst);
            handle.push(Box::new(move || { inner_hits.fetch_add(1, Ordering::SeqCst); }));
        }));

        assert_eq!(hub.drain(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
