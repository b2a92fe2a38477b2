//! Generic factory for producing dependencies

use super::{Container, Error};

/// A trait that describes a generic factory function
/// that produces objects registered in the container
pub trait GenericFactory<Args>: Send + Sync + 'static {
    /// A type of object that will be produced
    type Output;

    /// Calls a generic function and returns either produced object or error
    fn call(&self, container: &Container) -> Result<Self::Output, Error>;
}

impl<F, R> GenericFactory<()> for F
where
    F: Fn() -> R + Send + Sync + 'static
{
    type Output = R;

    #[inline]
    fn call(&self, _: &Container) -> Result<Self::Output, Error> {
        Ok(self())
    }
}

impl<F, R> GenericFactory<(Container,)> for F
where
    F: Fn(Container) -> Result<R, Error> + Send + Sync + 'static
{
    type Output = R;

    #[inline]
    fn call(&self, container: &Container) -> Result<Self::Output, Error> {
        (self)(container.clone())
    }
}
