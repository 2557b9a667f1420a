//! Metadata provider contract
//!
//! The synthesizer never reflects on classes itself. Every structural
//! question about an original class goes through [`MetadataProvider`].

use crate::annotation::Annotation;
use crate::literal::LiteralValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Keyword used in source text
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reflected parameter of a method
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterInfo {
    /// Zero based position in the signature
    pub position: usize,
    /// Declared scalar type (`int`, `string`, ...)
    pub type_name: Option<String>,
    /// Declared class type
    pub class: Option<String>,
    /// Declared as `array`
    pub array: bool,
    /// Has a scalar type declaration
    pub scalar_declaration: bool,
    pub allows_null: bool,
    pub optional: bool,
    pub default_value: Option<LiteralValue>,
    pub by_reference: bool,
    pub variadic: bool,
}

impl ParameterInfo {
    /// Parameter without type declaration
    #[must_use]
    pub fn untyped(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Parameter with scalar type declaration
    #[must_use]
    pub fn scalar(position: usize, type_name: impl Into<String>) -> Self {
        Self {
            position,
            type_name: Some(type_name.into()),
            scalar_declaration: true,
            ..Self::default()
        }
    }

    /// Parameter with class type declaration
    #[must_use]
    pub fn class(position: usize, class: impl Into<String>) -> Self {
        Self {
            position,
            class: Some(class.into()),
            ..Self::default()
        }
    }

    /// Parameter declared as `array`
    #[must_use]
    pub fn array(position: usize) -> Self {
        Self {
            position,
            array: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.allows_null = true;
        self
    }

    /// Optional parameter with a `NULL` default
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Optional parameter with the given default
    #[must_use]
    pub fn with_default(mut self, value: LiteralValue) -> Self {
        self.optional = true;
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Type declaration as written in a signature, without nullability marker
    #[must_use]
    pub fn type_declaration(&self) -> Option<String> {
        if self.array {
            Some("array".to_string())
        } else if self.scalar_declaration {
            self.type_name.clone()
        } else {
            self.class
                .as_deref()
                .map(|class| format!("\\{}", class.trim_start_matches('\\')))
        }
    }
}

/// Ordered parameter name to parameter info mapping
pub type Parameters = IndexMap<String, ParameterInfo>;

/// Structural queries about original classes
///
/// Method queries are inheritance aware: a method declared by any ancestor
/// counts as existing on the class.
pub trait MetadataProvider: Debug + Send + Sync {
    /// Class or interface is known
    fn class_exists(&self, class_name: &str) -> bool;

    fn is_interface(&self, class_name: &str) -> bool;

    /// Built into the runtime, so its source cannot be rewritten
    fn is_internal(&self, class_name: &str) -> bool;

    /// Ancestors, nearest first
    fn parent_class_names(&self, class_name: &str) -> Vec<String>;

    /// All implemented interfaces, including inherited ones
    fn interface_names(&self, class_name: &str) -> Vec<String>;

    /// Class extends or implements `parent_name`
    fn is_subclass_of(&self, class_name: &str, parent_name: &str) -> bool {
        self.parent_class_names(class_name)
            .iter()
            .chain(self.interface_names(class_name).iter())
            .any(|name| name == parent_name)
    }

    /// Proxy building switched off through metadata
    fn is_proxy_disabled(&self, class_name: &str) -> bool;

    fn is_abstract(&self, class_name: &str) -> bool;

    fn is_final(&self, class_name: &str) -> bool;

    fn is_readonly(&self, class_name: &str) -> bool;

    fn class_doc_comment(&self, class_name: &str) -> Option<String>;

    fn class_attributes(&self, class_name: &str) -> Vec<Annotation>;

    /// Path of the file declaring the class
    fn source_path(&self, class_name: &str) -> Option<PathBuf>;

    fn has_method(&self, class_name: &str, method_name: &str) -> bool;

    fn is_method_final(&self, class_name: &str, method_name: &str) -> bool;

    fn is_method_static(&self, class_name: &str, method_name: &str) -> bool;

    fn is_method_private(&self, class_name: &str, method_name: &str) -> bool {
        self.method_visibility(class_name, method_name) == Some(Visibility::Private)
    }

    fn is_method_protected(&self, class_name: &str, method_name: &str) -> bool {
        self.method_visibility(class_name, method_name) == Some(Visibility::Protected)
    }

    /// Visibility of a method, `None` if the method does not exist
    fn method_visibility(&self, class_name: &str, method_name: &str) -> Option<Visibility>;

    fn method_parameters(&self, class_name: &str, method_name: &str) -> Parameters;

    /// Declared return type, `None` if undeclared
    fn method_return_type(&self, class_name: &str, method_name: &str) -> Option<String>;

    fn method_doc_comment(&self, class_name: &str, method_name: &str) -> Option<String>;

    fn method_attributes(&self, class_name: &str, method_name: &str) -> Vec<Annotation>;
}
