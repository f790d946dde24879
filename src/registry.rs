//! Per-thread registry of the active fake constructor for a shape.

use once_cell::sync::OnceCell;

use core::{cell::RefCell, fmt, marker::PhantomData};
use std::sync::{Arc, Weak};

use crate::{fake::Record, FakeConstructor, Shape};

/// Registry of the active static namespace for a [`Shape`].
///
/// Static trait methods have no receiver, so the implementation generated by `#[fake]`
/// needs another way to find the mock they belong to. Creating a [`Mock`](crate::Mock)
/// registers it as active for the current thread; the registry only holds a weak reference,
/// so dropping all handles to the mock deactivates it.
///
/// This type rarely needs to be used directly; `#[fake]` declares a `static` registry
/// for each generated shape.
///
/// As with thread-local mocks in general, if a thread is spawned during a test, static
/// members called from this thread will not see the mock (and will panic).
pub struct Registry<S> {
    cell: OnceCell<thread_local::ThreadLocal<RefCell<Weak<Record>>>>,
    _shape: PhantomData<fn() -> S>,
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registry")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Registry<S> {
    /// Creates a new instance.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            _shape: PhantomData,
        }
    }

    fn slot(&self) -> &RefCell<Weak<Record>> {
        self.cell
            .get_or_init(thread_local::ThreadLocal::new)
            .get_or_default()
    }

    pub(crate) fn activate(&self, record: &Arc<Record>) {
        *self.slot().borrow_mut() = Arc::downgrade(record);
    }

    pub(crate) fn active(&self) -> Option<Arc<Record>> {
        self.slot().borrow().upgrade()
    }
}

impl<S: Shape> Registry<S> {
    /// Returns the active fake constructor for the current thread, if any.
    pub fn constructor(&self) -> Option<FakeConstructor<S>> {
        self.active().map(FakeConstructor::from_record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dynamic;

    use static_assertions::assert_impl_all;

    assert_impl_all!(Registry<Dynamic>: Send, Sync);

    #[test]
    fn registry_holds_weak_references() {
        let registry = Registry::<Dynamic>::new();
        assert!(registry.active().is_none());

        let record = Record::new();
        registry.activate(&record);
        assert!(Arc::ptr_eq(&registry.active().unwrap(), &record));

        drop(record);
        assert!(registry.active().is_none());
    }

    #[test]
    fn registry_is_thread_local() {
        static REGISTRY: Registry<Dynamic> = Registry::new();

        let record = Record::new();
        REGISTRY.activate(&record);
        std::thread::scope(|scope| {
            scope.spawn(|| assert!(REGISTRY.active().is_none()));
        });
        assert!(REGISTRY.active().is_some());
    }
}
