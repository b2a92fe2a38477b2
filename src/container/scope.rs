//! Registrations scoped to a namespace

use super::{Container, GenericFactory};
use crate::{error::Error, inject::Inject, key::join};

/// A handle passed to the definitions of [`Container::namespace`].
///
/// Every path given to a scope is relative to its namespace.
#[derive(Debug)]
pub struct NamespaceScope<'a> {
    container: &'a Container,
    path: String,
}

impl<'a> NamespaceScope<'a> {
    #[inline]
    pub(super) fn new(container: &'a Container, path: &str) -> Self {
        Self { container, path: path.to_owned() }
    }

    /// Fully-qualified path of the namespace
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Registers a dependency, see [`Container::register`]
    pub fn register<T, F, Args>(&self, name: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.container.register(&join(&self.path, name), factory)
    }

    /// Registers a dependency, see [`Container::register_with`]
    pub fn register_with<T, F, Args>(&self, name: &str, memoize: bool, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.container.register_with(&join(&self.path, name), memoize, factory)
    }

    /// Registers a memoized dependency
    pub fn register_memoized<T, F, Args>(&self, name: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.register_with(name, true, factory)
    }

    /// Registers a dependency that is produced on every resolution
    pub fn register_transient<T, F, Args>(&self, name: &str, factory: F) -> Result<(), Error>
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>
    {
        self.register_with(name, false, factory)
    }

    /// Registers a ready value
    pub fn register_instance<T: Send + Sync + 'static>(&self, name: &str, instance: T) -> Result<(), Error> {
        self.container.register_instance(&join(&self.path, name), instance)
    }

    /// Registers a dependency constructed with [`Inject`]
    pub fn register_injectable<T: Inject + 'static>(&self, name: &str, memoize: bool) -> Result<(), Error> {
        self.container.register_injectable::<T>(&join(&self.path, name), memoize)
    }

    /// Opens a nested namespace
    pub fn namespace<F>(&self, name: &str, definitions: F) -> Result<(), Error>
    where
        F: FnOnce(&NamespaceScope<'_>) -> Result<(), Error>
    {
        self.container.namespace(&join(&self.path, name), definitions)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Container, error::Error};

    #[test]
    fn it_registers_relative_to_namespace() {
        let container = Container::new();

        container.namespace("services", |services| {
            assert_eq!(services.path(), "services");
            services.register_instance("name", "mailer")?;
            services.namespace("queue", |queue| {
                assert_eq!(queue.path(), "services.queue");
                queue.register_transient("size", || 10usize)
            })
        }).unwrap();

        assert_eq!(container.resolve::<&str>("services.name").unwrap(), "mailer");
        assert_eq!(container.resolve::<usize>("services.queue.size").unwrap(), 10);
    }

    #[test]
    fn it_validates_relative_names() {
        let container = Container::new();

        let err = container.namespace("services", |services| {
            services.register("", || 1)
        }).unwrap_err();

        assert!(matches!(err, Error::InvalidKey { .. }));
        assert!(container.is_namespace("services").unwrap());
    }

    #[test]
    fn it_resolves_from_scope_container() {
        let container = Container::new();
        container.register_instance("base", 40).unwrap();

        container.namespace("math", |math| {
            let base: i32 = math.container().resolve("base")?;
            math.register_instance("answer", base + 2)
        }).unwrap();

        assert_eq!(container.resolve::<i32>("math.answer").unwrap(), 42);
    }
}
