//! Weft Proxy Models
//!
//! Structured models of generated proxy classes and the renderers that turn
//! them into source text.
//!
//! # Core Concepts
//!
//! - [`MetadataProvider`]: Structural queries about original classes
//! - [`StaticMetadata`]: In-memory metadata snapshot
//! - [`ProxyClass`]: One generated wrapper class (constants, properties, traits, methods)
//! - [`ProxyMethod`]: One advised member, including the constructor
//! - [`ConstructorGuard`]: Caller check protecting non-public original constructors
//! - [`render_attribute`] / [`render_annotation`]: Metadata value printers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_model::{ProxyClass, StaticMetadata};
//!
//! let metadata = Arc::new(StaticMetadata::new());
//! let mut proxy = ProxyClass::new("Acme\\Shop\\Cart", metadata);
//! proxy.method("checkout").add_pre_parent_call_code("        $this->audit();\n");
//!
//! let code = proxy.render()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod annotation;
mod class;
mod constructor;
mod error;
mod literal;
mod metadata;
mod method;
mod snapshot;

pub use annotation::{render_annotation, render_attribute, Annotation, AnnotationValue};
pub use class::{ProxyClass, ProxyProperty};
pub use constructor::ConstructorGuard;
pub use error::{AccessViolation, BuildError};
pub use literal::{quote_single, ArrayKey, LiteralValue};
pub use metadata::{MetadataProvider, ParameterInfo, Parameters, Visibility};
pub use method::{MethodKind, ProxyMethod};
pub use snapshot::{ClassMetadata, MethodMetadata, StaticMetadata};

/// Suffix appended to the original class name once its source is rewritten
pub const ORIGINAL_CLASSNAME_SUFFIX: &str = "_Original";

/// Reserved member name of constructors
pub const CONSTRUCTOR_NAME: &str = "__construct";

/// Marker interface implemented by every generated proxy class
pub const PROXY_INTERFACE: &str = "\\Weft\\ObjectManagement\\Proxy\\ProxyInterface";

/// Directive appended to copied class documentation
pub const CODE_COVERAGE_IGNORE: &str = "@codeCoverageIgnore";

/// Imports repeated in front of every proxy class so copied annotations resolve
pub const ANNOTATION_IMPORTS: &[&str] = &["Weft\\Annotations as Weft"];

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
