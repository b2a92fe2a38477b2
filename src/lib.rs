//! # Trellis
//!
//! > Thread-safe hierarchical dependency container: register producers under dotted
//! > paths, group them into namespaces and resolve them from any thread.
//!
//! ## Features
//! * Namespaces addressed by dotted paths
//! * Memoized or transient producers
//! * Freezing and reloading
//! * Lazy enumeration of keys and dependencies
//! * Observers of registration events
//! * Structured logging behind the `tracing` feature
//!
//! ## Example
//! ```toml
//! [dependencies]
//! trellis = "0.1.0"
//! ```
//! ```
//! use trellis::{Container, Error};
//!
//! #[derive(Clone)]
//! struct Mailer {
//!     host: String
//! }
//!
//! fn main() -> Result<(), Error> {
//!     let container = Container::new();
//!
//!     container.register("config.smtp_host", || String::from("localhost"))?;
//!     container.namespace("services", |services| {
//!         services.register_transient("mailer", |c: Container| {
//!             let host = c.resolve::<String>("config.smtp_host")?;
//!             Ok(Mailer { host })
//!         })
//!     })?;
//!
//!     let mailer: Mailer = container.resolve("services.mailer")?;
//!     assert_eq!(mailer.host, "localhost");
//!
//!     container.freeze();
//!     assert!(container.register("late", || 1).is_err());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub use crate::{
    config::{ContainerConfig, DuplicatePolicy},
    container::{Container, GenericFactory, NamespaceScope},
    error::Error,
    inject::Inject,
    key::KeyGuard,
    lock::ArbitraryLock,
    registry::{
        Dependencies, DependencyItem, DependencySlot, Entity, Instance, Keys,
        NamespaceNode, NamespaceView, TreeNode,
    },
    watcher::{Observer, ObserverId},
};

pub mod config;
pub mod container;
pub mod error;
pub mod inject;
pub mod key;
pub mod lock;
pub mod registry;
pub mod resolver;
pub mod watcher;
