//! Observation of registration events

use crate::{Container, error::Error, key::KeyGuard, registry::Entity};
use indexmap::IndexMap;
use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, atomic::{AtomicU64, Ordering}}
};

/// A callback invoked with the registered path, the registered definition and the container
pub type ObserverFn = Arc<
    dyn Fn(&str, &Entity, &Container) -> Result<(), Error>
    + Send
    + Sync
>;

#[inline]
pub(crate) fn callback<F>(f: F) -> ObserverFn
where
    F: Fn(&str, &Entity, &Container) -> Result<(), Error> + Send + Sync + 'static
{
    Arc::new(f)
}

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an observer, unique for the whole process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    #[inline]
    fn next() -> Self {
        Self(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle of a subscription created by [`Container::observe`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observer {
    id: ObserverId,
    path: String,
}

impl Observer {
    #[inline]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// The observed path
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }
}

struct Subscription {
    id: ObserverId,
    callback: ObserverFn,
}

/// Subscription table of a container: observed path -> observers in subscription order
#[derive(Default)]
pub struct DependencyWatcher {
    subscriptions: IndexMap<String, Vec<Subscription>>,
}

impl Debug for DependencyWatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (path, subscriptions) in &self.subscriptions {
            map.entry(path, &subscriptions.iter().map(|s| s.id).collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl DependencyWatcher {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Subscribes `callback` to registrations at the exact `path`
    pub fn watch(&mut self, path: &str, callback: ObserverFn) -> Result<Observer, Error> {
        KeyGuard::split(path)?;

        let id = ObserverId::next();
        self.subscriptions
            .entry(path.to_owned())
            .or_default()
            .push(Subscription { id, callback });

        Ok(Observer { id, path: path.to_owned() })
    }

    /// Removes the observer and returns its callback,
    /// or `None` if it has already been removed.
    pub fn unwatch(&mut self, observer: &Observer) -> Option<ObserverFn> {
        let subscriptions = self.subscriptions.get_mut(observer.path())?;
        let index = subscriptions.iter().position(|s| s.id == observer.id)?;
        let removed = subscriptions.remove(index);
        if subscriptions.is_empty() {
            self.subscriptions.shift_remove(observer.path());
        }
        Some(removed.callback)
    }

    /// Removes all observers of `path`, or every observer if `path` is `None`.
    ///
    /// Returns the removed callbacks.
    pub fn clear(&mut self, path: Option<&str>) -> Result<Vec<ObserverFn>, Error> {
        let removed: Vec<Subscription> = match path {
            Some(path) => {
                KeyGuard::split(path)?;
                self.subscriptions.shift_remove(path).unwrap_or_default()
            }
            None => std::mem::take(&mut self.subscriptions)
                .into_values()
                .flatten()
                .collect(),
        };
        Ok(removed.into_iter().map(|s| s.callback).collect())
    }

    /// Number of observers of `path`
    #[inline]
    pub fn count(&self, path: &str) -> usize {
        self.subscriptions.get(path).map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Callbacks currently subscribed to `path`, in subscription order
    #[inline]
    pub(crate) fn listeners(&self, path: &str) -> Vec<ObserverFn> {
        self.subscriptions
            .get(path)
            .map(|subscriptions| subscriptions.iter().map(|s| s.callback.clone()).collect())
            .unwrap_or_default()
    }

    /// Invokes the observers of `path` with the registered `entity`.
    ///
    /// Callbacks run with the container lock held but without the state borrowed,
    /// so they may resolve or register. The first failing callback stops the
    /// notification and its error is returned.
    pub(crate) fn notify(container: &Container, path: &str, entity: &Entity) -> Result<(), Error> {
        container.execute_exclusively(|state| {
            let listeners = state.borrow().watcher.listeners(path);
            for callback in listeners {
                if let Err(err) = callback(path, entity, container) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(path, "observer failed: {err}");
                    return Err(err);
                }
            }
            Ok(())
        })
    }
}
