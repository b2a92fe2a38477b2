//! Dependency Injection container and tools

use crate::{
    config::ContainerConfig,
    error::Error,
    inject::Inject,
    key::KeyGuard,
    lock::ArbitraryLock,
    registry::{
        Dependencies, DependencyItem, DependencySlot, Entity, Instance, Keys,
        NamespaceNode, Producer, Registered, Registry, RegistryBuilder, TreeNode,
        producer, tree,
    },
    resolver::DependencyResolver,
    watcher::{self, DependencyWatcher, Observer},
};
use indexmap::IndexMap;
use std::{cell::RefCell, sync::Arc};

pub use self::{factory::GenericFactory, scope::NamespaceScope};

pub mod factory;
pub mod scope;

/// Everything a container guards with its lock
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) registry: Registry,
    pub(crate) watcher: DependencyWatcher,
}

impl State {
    #[inline]
    fn new() -> Self {
        let (registry, watcher) = RegistryBuilder::build();
        Self { registry, watcher }
    }
}

#[derive(Debug)]
struct Inner {
    lock: ArbitraryLock<State>,
    config: ContainerConfig,
}

#[inline]
fn make_producer<T, F, Args>(factory: F) -> Producer
where
    T: Send + Sync + 'static,
    F: GenericFactory<Args, Output = T>
{
    producer(move |c| factory.call(c).map(|t| Arc::new(t) as Instance))
}

/// Represents a thread-safe dependency container that resolves
/// dependencies by their dotted paths.
///
/// Cloning a container is cheap, every clone refers to the same registry.
///
/// # Example
/// ```
/// use trellis::Container;
///
/// let container = Container::new();
/// container.register("db", || String::from("postgres://localhost")).unwrap();
/// container.namespace("services", |services| {
///     services.register_transient("greeting", || "hello")
/// }).unwrap();
///
/// let db: String = container.resolve("db").unwrap();
/// assert_eq!(db, "postgres://localhost");
/// assert!(container.is_namespace("services").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container with a specific configuration
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                lock: ArbitraryLock::new(State::new()),
                config,
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Registers a dependency, memoized according to [`ContainerConfig::memoize`]
    pub fn register<T, F, Args>(&self, path: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.register_with(path, self.inner.config.memoize(), factory)
    }

    /// Registers a dependency with an explicit memoization mode.
    ///
    /// Missing namespaces along the `path` are created.
    pub fn register_with<T, F, Args>(&self, path: &str, memoize: bool, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        let producer = make_producer(factory);
        let slot_producer = producer.clone();
        self.insert(path, move |name, path| DependencySlot::new(name, path, memoize, slot_producer))?;
        drop(producer);
        Ok(())
    }

    /// Registers a dependency that is produced once and then shared
    pub fn register_memoized<T, F, Args>(&self, path: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.register_with(path, true, factory)
    }

    /// Registers a dependency that is produced on every resolution
    pub fn register_transient<T, F, Args>(&self, path: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.register_with(path, false, factory)
    }

    /// Registers a ready value
    pub fn register_instance<T: Send + Sync + 'static>(&self, path: &str, instance: T) -> Result<(), Error> {
        let instance: Instance = Arc::new(instance);
        let slot_instance = instance.clone();
        self.insert(path, move |name, path| DependencySlot::with_instance(name, path, slot_instance))?;
        drop(instance);
        Ok(())
    }

    /// Registers a dependency that is constructed with [`Inject`]
    pub fn register_injectable<T: Inject + 'static>(&self, path: &str, memoize: bool) -> Result<(), Error> {
        self.register_with(path, memoize, |c: Container| T::inject(&c))
    }

    /// Creates a namespace, or reopens an existing one, and runs `definitions` in it.
    ///
    /// Registrations made by `definitions` before a failure are kept.
    ///
    /// # Example
    /// ```
    /// use trellis::Container;
    ///
    /// let container = Container::new();
    /// container.namespace("services", |services| {
    ///     services.register("mailer", || "smtp")?;
    ///     services.namespace("queue", |queue| queue.register_transient("size", || 10))
    /// }).unwrap();
    ///
    /// assert_eq!(container.resolve::<&str>("services.mailer").unwrap(), "smtp");
    /// assert!(container.is_dependency("services.queue.size", Some(false)).unwrap());
    /// ```
    pub fn namespace<F>(&self, path: &str, definitions: F) -> Result<(), Error>
    where
        F: FnOnce(&NamespaceScope<'_>) -> Result<(), Error>
    {
        self.execute_exclusively(|state| {
            let Registered { entities, .. } = state.borrow_mut().registry.register_namespace(path)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(path, created = entities.len(), "namespace opened");

            self.notify_all(&entities)?;
            definitions(&NamespaceScope::new(self, path))
        })
    }

    /// Resolves a dependency and returns a cloned instance.
    /// `T` must implement [`Clone`] otherwise use [`Container::resolve_shared`]
    /// that returns a shared pointer.
    #[inline]
    pub fn resolve<T: Send + Sync + Clone + 'static>(&self, path: &str) -> Result<T, Error> {
        self.resolve_shared::<T>(path)
            .map(|s| s.as_ref().clone())
    }

    /// Same as [`Container::resolve`]
    #[inline]
    pub fn fetch<T: Send + Sync + Clone + 'static>(&self, path: &str) -> Result<T, Error> {
        self.resolve(path)
    }

    /// Resolves a dependency and returns a shared pointer
    pub fn resolve_shared<T: Send + Sync + 'static>(&self, path: &str) -> Result<Arc<T>, Error> {
        self.resolve_instance(path)?
            .downcast::<T>()
            .map_err(|_| Error::ResolveFailed {
                path: path.into(),
                type_name: std::any::type_name::<T>()
            })
    }

    /// Resolves a dependency without downcasting it
    #[inline]
    pub fn resolve_instance(&self, path: &str) -> Result<Instance, Error> {
        DependencyResolver::resolve(self, path)
    }

    /// Forbids any further registration. Resolution keeps working.
    pub fn freeze(&self) {
        self.execute_exclusively(|state| state.borrow_mut().registry.freeze());

        #[cfg(feature = "tracing")]
        tracing::debug!("container frozen");
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.execute_exclusively(|state| state.borrow().registry.is_frozen())
    }

    /// Drops every dependency, namespace, memoized value and observer.
    ///
    /// Fails if the container is frozen.
    pub fn reload(&self) -> Result<(), Error> {
        let previous = self.execute_exclusively(|state| {
            let mut state = state.borrow_mut();
            if state.registry.is_frozen() {
                return Err(Error::Frozen(String::new()));
            }
            Ok(std::mem::replace(&mut *state, State::new()))
        })?;
        // user values are dropped once the state is no longer borrowed
        drop(previous);

        #[cfg(feature = "tracing")]
        tracing::debug!("container reloaded");

        Ok(())
    }

    /// Returns registered keys.
    ///
    /// With `all_variants == false` yields the names of top-level entries,
    /// otherwise yields fully-qualified paths of every dependency, depth-first.
    #[inline]
    pub fn keys(&self, all_variants: bool) -> Keys {
        Keys::new(self.snapshot(), all_variants)
    }

    /// Checks whether a dependency or a namespace is registered at `path`.
    ///
    /// Fails only if the `path` is malformed.
    #[inline]
    pub fn contains_key(&self, path: &str) -> Result<bool, Error> {
        self.inspect(|root| DependencyResolver::contains_key(root, path))
    }

    /// Checks whether a namespace is registered at `path`
    #[inline]
    pub fn is_namespace(&self, path: &str) -> Result<bool, Error> {
        self.inspect(|root| DependencyResolver::is_namespace(root, path))
    }

    /// Checks whether a dependency is registered at `path`.
    ///
    /// If `memoized` is set, the dependency must also have the same memoization mode.
    #[inline]
    pub fn is_dependency(&self, path: &str, memoized: Option<bool>) -> Result<bool, Error> {
        self.inspect(|root| DependencyResolver::is_dependency(root, path, memoized))
    }

    /// Returns a lazy iterator over `(name, item)` pairs.
    ///
    /// With `yield_all == false` yields top-level entries, namespaces included,
    /// otherwise yields every dependency with its fully-qualified path.
    #[inline]
    pub fn dependencies(&self, yield_all: bool) -> Dependencies {
        Dependencies::new(self.clone(), self.snapshot(), yield_all)
    }

    /// Calls `visitor` for every item of [`Container::dependencies`]
    pub fn each_dependency<F>(&self, yield_all: bool, mut visitor: F) -> Result<(), Error>
    where
        F: FnMut(&str, DependencyItem)
    {
        for item in self.dependencies(yield_all) {
            let (name, item) = item?;
            visitor(&name, item);
        }
        Ok(())
    }

    /// Builds an ordered mapping that mirrors the registry tree.
    ///
    /// With `resolve_dependencies == false` no factory runs and
    /// dependencies are reported as [`TreeNode::Slot`].
    pub fn hash_tree(&self, resolve_dependencies: bool) -> Result<IndexMap<String, TreeNode>, Error> {
        self.execute_exclusively(|state| {
            let root = state.borrow().registry.snapshot();
            tree::build(self, &root, resolve_dependencies)
        })
    }

    /// Subscribes `callback` to registrations of the exact `path`.
    ///
    /// The callback runs right after a dependency or a new namespace is registered
    /// at the `path` and receives the registered [`Entity`]. Inspecting the entity
    /// never runs a producer. Its error is returned from the registration call.
    ///
    /// # Example
    /// ```
    /// use trellis::Container;
    /// use std::sync::{Arc, Mutex};
    ///
    /// let container = Container::new();
    /// let log = Arc::new(Mutex::new(Vec::new()));
    ///
    /// let sink = log.clone();
    /// container.observe("db", move |path, entity, c| {
    ///     let memoized = entity.as_dependency().is_some_and(|slot| slot.is_memoized());
    ///     sink.lock().unwrap().push((c.resolve::<i32>(path)?, memoized));
    ///     Ok(())
    /// }).unwrap();
    ///
    /// container.register("db", || 42).unwrap();
    /// assert_eq!(*log.lock().unwrap(), vec![(42, true)]);
    /// ```
    pub fn observe<F>(&self, path: &str, callback: F) -> Result<Observer, Error>
    where
        F: Fn(&str, &Entity, &Container) -> Result<(), Error> + Send + Sync + 'static
    {
        // a rejected callback must not be dropped while the state is borrowed
        KeyGuard::split(path)?;
        let observer = self.execute_exclusively(|state| {
            state.borrow_mut().watcher.watch(path, watcher::callback(callback))
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path, id = ?observer.id(), "observer added");

        Ok(observer)
    }

    /// Removes the observer. Returns `false` if it is not subscribed anymore.
    pub fn unobserve(&self, observer: &Observer) -> bool {
        // the callback is dropped here, after the state borrow is released
        let removed = self
            .execute_exclusively(|state| state.borrow_mut().watcher.unwatch(observer))
            .is_some();

        #[cfg(feature = "tracing")]
        tracing::debug!(path = observer.path(), id = ?observer.id(), removed, "observer removed");

        removed
    }

    /// Removes the observers of `path`, or all observers if `path` is `None`
    pub fn clear_observers(&self, path: Option<&str>) -> Result<(), Error> {
        let removed = self.execute_exclusively(|state| state.borrow_mut().watcher.clear(path))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path, removed = removed.len(), "observers cleared");

        drop(removed);
        Ok(())
    }

    /// Runs `f` while holding the container lock
    #[inline]
    pub(crate) fn execute_exclusively<R>(&self, f: impl FnOnce(&RefCell<State>) -> R) -> R {
        self.inner.lock.execute_exclusively(f)
    }

    #[inline]
    fn snapshot(&self) -> Arc<NamespaceNode> {
        self.execute_exclusively(|state| state.borrow().registry.snapshot())
    }

    #[inline]
    fn inspect<R>(&self, f: impl FnOnce(&NamespaceNode) -> R) -> R {
        self.execute_exclusively(|state| f(state.borrow().registry.root()))
    }

    /// Registers the slot built by `make_slot`.
    ///
    /// `make_slot` is dropped under the state borrow when the registration fails,
    /// so it must only capture clones of values the caller keeps alive.
    fn insert<F>(&self, path: &str, make_slot: F) -> Result<(), Error>
    where
        F: FnOnce(&str, String) -> DependencySlot
    {
        let policy = self.inner.config.duplicate_policy();
        self.execute_exclusively(|state| {
            let Registered { entities, replaced } = state
                .borrow_mut()
                .registry
                .register_dependency(path, policy, make_slot)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(path, replaced = replaced.is_some(), "dependency registered");

            // the replaced slot and its cached value are dropped with no state borrowed
            drop(replaced);
            self.notify_all(&entities)
        })
    }

    #[inline]
    fn notify_all(&self, entities: &[(String, Entity)]) -> Result<(), Error> {
        entities
            .iter()
            .try_for_each(|(path, entity)| DependencyWatcher::notify(self, path, entity))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, atomic::{AtomicUsize, Ordering}};
    use super::{Container, Inject};
    use crate::{config::{ContainerConfig, DuplicatePolicy}, error::Error};

    trait Cache: Send + Sync {
        fn get(&self, key: &str) -> Option<String>;
        fn set(&self, key: &str, value: &str);
    }

    #[derive(Clone, Default)]
    struct InMemoryCache {
        inner: Arc<Mutex<HashMap<String, String>>>
    }

    impl Cache for InMemoryCache {
        fn get(&self, key: &str) -> Option<String> {
            self.inner
                .lock()
                .unwrap()
                .get(key)
                .cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.inner
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    #[derive(Clone)]
    struct CacheWrapper {
        inner: InMemoryCache
    }

    impl Inject for CacheWrapper {
        fn inject(container: &Container) -> Result<Self, Error> {
            let inner = container.resolve::<InMemoryCache>("cache")?;
            Ok(Self { inner })
        }
    }

    #[test]
    fn it_registers_instance() {
        let container = Container::new();
        container.register_instance("cache", InMemoryCache::default()).unwrap();

        let cache = container.resolve::<InMemoryCache>("cache").unwrap();
        cache.set("key", "value");

        let cache = container.resolve::<InMemoryCache>("cache").unwrap();
        let key = cache.get("key").unwrap();

        assert_eq!(key, "value");
    }

    #[test]
    fn it_registers_transient() {
        let container = Container::new();
        container.register_transient("cache", InMemoryCache::default).unwrap();

        let cache = container.resolve::<InMemoryCache>("cache").unwrap();
        cache.set("key", "value");

        let cache = container.resolve::<InMemoryCache>("cache").unwrap();
        let key = cache.get("key");

        assert!(key.is_none());
    }

    #[test]
    fn it_registers_memoized() {
        let container = Container::new();
        container.register_memoized("cache", InMemoryCache::default).unwrap();

        let first = container.resolve_shared::<InMemoryCache>("cache").unwrap();
        let second = container.resolve_shared::<InMemoryCache>("cache").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn it_uses_configured_memoization() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let container = Container::with_config(ContainerConfig::new().with_memoization(false));
        container.register("counter", move || counter.fetch_add(1, Ordering::SeqCst)).unwrap();

        assert_eq!(container.resolve::<usize>("counter").unwrap(), 0);
        assert_eq!(container.resolve::<usize>("counter").unwrap(), 1);
        assert!(container.is_dependency("counter", Some(false)).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn it_resolves_inner_dependencies() {
        let container = Container::new();
        container.register_instance("cache", InMemoryCache::default()).unwrap();
        container.register_injectable::<CacheWrapper>("wrapper", false).unwrap();

        let wrapper = container.resolve::<CacheWrapper>("wrapper").unwrap();
        wrapper.inner.set("key", "value 1");

        let cache = container.resolve::<InMemoryCache>("cache").unwrap();
        let key = cache.get("key").unwrap();

        assert_eq!(key, "value 1");
    }

    #[test]
    fn it_registers_default_injectable() {
        let container = Container::new();
        container.register_injectable::<InMemoryCache>("cache", true).unwrap();

        assert!(container.is_dependency("cache", Some(true)).unwrap());
        assert!(container.resolve::<InMemoryCache>("cache").unwrap().get("key").is_none());
    }

    #[test]
    fn it_fetches_like_resolve() {
        let container = Container::new();
        container.register("answer", || 42).unwrap();

        assert_eq!(container.fetch::<i32>("answer").unwrap(), 42);
        assert_eq!(
            container.fetch::<i32>("question").unwrap_err(),
            container.resolve::<i32>("question").unwrap_err()
        );
    }

    #[test]
    fn it_returns_error_when_type_mismatches() {
        let container = Container::new();
        container.register("answer", || 42).unwrap();

        let err = container.resolve::<String>("answer").unwrap_err();

        assert_eq!(err, Error::ResolveFailed {
            path: "answer".into(),
            type_name: std::any::type_name::<String>()
        });
    }

    #[test]
    fn it_returns_error_when_resolve_unregistered() {
        let container = Container::new();

        let cache = container.resolve::<CacheWrapper>("wrapper");

        assert!(matches!(cache, Err(Error::DependencyNotFound(_))));
    }

    #[test]
    fn it_rejects_duplicates() {
        let container = Container::new();
        container.register("db", || 1).unwrap();

        assert_eq!(container.register("db", || 2).unwrap_err(), Error::AlreadyRegistered("db".into()));
        assert_eq!(container.resolve::<i32>("db").unwrap(), 1);
    }

    #[test]
    fn it_overrides_duplicates_when_configured() {
        let container = Container::with_config(
            ContainerConfig::new().with_duplicate_policy(DuplicatePolicy::Override));
        container.register("db", || 1).unwrap();
        assert_eq!(container.resolve::<i32>("db").unwrap(), 1);

        container.register("db", || 2).unwrap();

        assert_eq!(container.resolve::<i32>("db").unwrap(), 2);
        assert_eq!(container.keys(true).count(), 1);
    }

    #[test]
    fn it_shares_state_between_clones() {
        let container = Container::new();
        let clone = container.clone();

        clone.register("db", || 1).unwrap();

        assert!(container.contains_key("db").unwrap());
    }

    #[test]
    fn it_fails_to_reload_frozen_container() {
        let container = Container::new();
        container.register("db", || 1).unwrap();
        container.freeze();

        assert_eq!(container.reload().unwrap_err(), Error::Frozen(String::new()));
        assert_eq!(container.resolve::<i32>("db").unwrap(), 1);
    }

    #[test]
    fn it_visits_each_dependency() {
        let container = Container::new();
        container.register("a", || 1).unwrap();
        container.register("b.c", || 2).unwrap();

        let mut visited = Vec::new();
        container.each_dependency(true, |name, item| {
            visited.push((name.to_string(), *item.downcast::<i32>().unwrap()));
        }).unwrap();

        assert_eq!(visited, vec![("a".to_string(), 1), ("b.c".to_string(), 2)]);
    }

    #[test]
    fn it_allows_reentrant_registration_from_factory() {
        let container = Container::new();
        container.register_transient("lazy", |c: Container| {
            if !c.contains_key("registered")? {
                c.register_instance("registered", true)?;
            }
            c.resolve::<bool>("registered")
        }).unwrap();

        assert!(container.resolve::<bool>("lazy").unwrap());
        assert!(container.resolve::<bool>("lazy").unwrap());
    }

    #[test]
    fn it_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }
}
