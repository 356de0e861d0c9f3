use core::any::Any;
use core::fmt::Debug;
use parking_lot::Mutex;

struct Entry {
    kind: &'static str,
    object: Box<dyn Any + Send>
}

/// Keeps OpenCL wrappers alive until an explicit teardown point.
///
/// Handles normally release themselves on drop. Code that hands raw ids to
/// foreign callers (FFI surfaces, long-lived caches) can park the owning
/// wrapper here instead, then release everything at once when the surface
/// shuts down. Each registry is independent; create one per surface rather
/// than sharing a global.
#[derive(Default)]
pub struct Registry {
    items: Mutex<Vec<Entry>>
}

impl Registry {
    #[inline(always)]
    pub fn new () -> Self {
        Self::default()
    }

    /// Parks `object` until [`release_all`](Self::release_all). `kind` is a
    /// label for logging, usually the wrapper type name.
    pub fn register<T: Any + Send> (&self, kind: &'static str, object: T) {
        let mut items = self.items.lock();
        items.push(Entry { kind, object: Box::new(object) });
    }

    /// Number of currently parked objects.
    #[inline(always)]
    pub fn len (&self) -> usize {
        self.items.lock().len()
    }

    #[inline(always)]
    pub fn is_empty (&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every parked object, releasing its handle. Returns how many
    /// were released. Objects registered concurrently with the call end up
    /// in either this batch or the next.
    pub fn release_all (&self) -> usize {
        let items = {
            let mut lock = self.items.lock();
            core::mem::take(&mut *lock)
        };

        let count = items.len();
        for entry in items {
            log::debug!("registry: releasing {}", entry.kind);
            drop(entry.object);
        }

        count
    }
}

impl Drop for Registry {
    #[inline(always)]
    fn drop (&mut self) {
        self.release_all();
    }
}

impl Debug for Registry {
    fn fmt (&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
        .field("len", &self.len())
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use super::Registry;

    struct Counted (Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop (&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn release_all_drops_everything_once () {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new();

        for _ in 0..3 {
            registry.register("counted", Counted(drops.clone()));
        }

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.release_all(), 3);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.release_all(), 0);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dropping_the_registry_releases () {
        let drops = Arc::new(AtomicUsize::new(0));

        {
            let registry = Registry::new();
            registry.register("counted", Counted(drops.clone()));
            registry.register("counted", Counted(drops.clone()));
        }

        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
