//! Weft Serialization Support
//!
//! Runtime side of the serialization hooks woven into generated wrappers.
//! Persisted entities referenced by an object are stored as placeholders
//! and fetched again after loading instead of being serialized with it.
//!
//! # Core Concepts
//!
//! - [`ObjectState`]: Fields of a proxied object over the dynamic [`Value`] model
//! - [`SerializationContext`]: Persistence manager and object registry passed to each call
//! - [`RelatedEntity`]: Placeholder recorded for a persisted entity
//! - [`weave_serialization_hooks`]: Adds the `__sleep` / `__wakeup` advice to a wrapper
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_serialization::{ObjectState, SerializationContext};
//!
//! let context = SerializationContext::new(&persistence, &objects);
//! let fields = state.prepare_for_storage(&["cache"], &context)?;
//! let stored = state.stored(&fields);
//!
//! let mut loaded = ObjectState::from_stored(stored);
//! loaded.restore_after_load(&context)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod context;
mod error;
mod serializer;
mod value;
mod weave;

pub use context::{ObjectRegistry, PersistenceManager, SerializationContext};
pub use error::SerializationError;
pub use serializer::{ObjectState, RelatedEntity, StoredObject, INTERNAL_FIELDS};
pub use value::{escape_segment, ObjectRef, Value};
pub use weave::{weave_serialization_hooks, OBJECT_SERIALIZATION_TRAIT};

/// Serialization support version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
