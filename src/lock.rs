//! Reentrant execution guard of the container state

use parking_lot::ReentrantMutex;
use std::{cell::RefCell, fmt::{Debug, Formatter}};

/// A reentrant lock that owns a piece of state.
///
/// Only one thread at a time can execute inside [`ArbitraryLock::execute_exclusively`],
/// however the thread that holds the lock may enter it again, e.g. when a factory
/// resolves another dependency from the same container.
///
/// The state is handed out as a [`RefCell`]: borrows must be kept short and must
/// never be held while calling back into user code, otherwise a nested call
/// would find the state already borrowed.
pub struct ArbitraryLock<T> {
    inner: ReentrantMutex<RefCell<T>>,
}

impl<T> ArbitraryLock<T> {
    /// Creates a new lock that owns the `state`
    #[inline]
    pub fn new(state: T) -> Self {
        Self { inner: ReentrantMutex::new(RefCell::new(state)) }
    }

    /// Executes `f` while holding the lock.
    ///
    /// The lock is released when `f` returns, fails or panics.
    #[inline]
    pub fn execute_exclusively<R>(&self, f: impl FnOnce(&RefCell<T>) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }
}

impl<T> Debug for ArbitraryLock<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ArbitraryLock(..)")
    }
}
