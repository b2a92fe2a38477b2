//! Utilities to construct dependencies from other dependencies

use crate::Container;
use crate::error::Error;

/// A trait that adds the ability to build a type from the dependencies
/// registered in a container, see [`Container::register_injectable`]
///
/// If there is no need to inject other dependencies, the `struct` must implement the `Default` trait
///
/// # Example
/// ```
/// use trellis::Container;
///
/// #[derive(Default, Clone)]
/// struct Mailer;
///
/// let container = Container::new();
/// container.register_injectable::<Mailer>("mailer", true).unwrap();
///
/// let mailer: Mailer = container.resolve("mailer").unwrap();
/// ```
///
/// If it's required to construct a `struct` from other dependencies, the `Inject` can be implemented manually
///
/// # Example
/// ```
/// use trellis::{Container, Error, Inject};
///
/// #[derive(Clone)]
/// struct Mailer {
///     host: String
/// }
///
/// impl Inject for Mailer {
///     fn inject(container: &Container) -> Result<Self, Error> {
///         let host = container.resolve::<String>("config.smtp_host")?;
///         Ok(Self { host })
///     }
/// }
///
/// let container = Container::new();
/// container.register_instance("config.smtp_host", String::from("localhost")).unwrap();
/// container.register_injectable::<Mailer>("services.mailer", false).unwrap();
///
/// let mailer: Mailer = container.resolve("services.mailer").unwrap();
/// assert_eq!(mailer.host, "localhost");
/// ```
pub trait Inject: Sized + Send + Sync {
    fn inject(container: &Container) -> Result<Self, Error>;
}

impl<T: Default + Send + Sync> Inject for T {
    #[inline]
    fn inject(_: &Container) -> Result<Self, Error> {
        Ok(Self::default())
    }
}
