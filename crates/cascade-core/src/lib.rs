//! cascade-core: Cascading property resolution for job configuration
//!
//! Jobs form a tree through named cascading parents. Each job may override
//! individual properties; everything else is inherited from the nearest
//! ancestor that overrides it, or from the configured defaults.
//!
//! # Example
//!
//! ```rust
//! use cascade_core::{CascadingConfigResolver, PropertyDefaults, ResolverOptions, Value};
//!
//! let defaults = PropertyDefaults::new().with("logRotator", "off");
//! let mut jobs = CascadingConfigResolver::with_config(defaults, ResolverOptions::default());
//! jobs.create_node("parent", None).unwrap();
//! jobs.create_node("child", Some("parent")).unwrap();
//!
//! jobs.set_override("child", "logRotator", Value::mapping([("days", 2)])).unwrap();
//! assert!(jobs.is_locally_overridden("child", "logRotator").unwrap());
//!
//! jobs.reset_override("child", "logRotator").unwrap();
//! assert_eq!(
//!     jobs.resolve("child", "logRotator").unwrap().value(),
//!     Some(&Value::from("off"))
//! );
//! ```

pub mod error;
pub mod node;
pub mod options;
pub mod property;
pub mod snapshot;
pub mod value;

mod cascade;
mod shared;

pub use cascade::CascadingConfigResolver;
pub use error::{Error, ErrorKind, Result};
pub use node::ConfigNode;
pub use options::{PropertyDefaults, ResolverOptions};
pub use property::{EffectiveValue, PropertyValue, ValueSource};
pub use shared::SharedResolver;
pub use snapshot::{NodeRecord, Snapshot};
pub use value::Value;
