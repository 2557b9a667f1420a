//! Error types for proxy model rendering
//!
//! - [`BuildError`]: fatal conditions which abort a proxy compilation run
//! - [`AccessViolation`]: rejection raised by a constructor guard

use crate::metadata::Visibility;
use std::path::PathBuf;

/// Fatal errors while building proxy code
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Declared class name differs from the one implied by the file name
    #[error(
        "the name of the class \"{declared}\" is not the same as the filename which is \"{expected}\" (path: {})",
        .path.display()
    )]
    ClassNameMismatch {
        declared: String,
        expected: String,
        path: PathBuf,
    },

    /// Source file contains no class or interface declaration
    #[error("no class or interface declaration found in {}", .path.display())]
    MissingClassDeclaration { path: PathBuf },

    /// An implemented interface declares a constructor with parameters
    #[error(
        "cannot build proxy for {class_name}: interface {interface_name} declares a parameterized constructor, which conflicts with the proxy constructor"
    )]
    ParameterizedInterfaceConstructor {
        class_name: String,
        interface_name: String,
    },
}

impl BuildError {
    /// Create class name mismatch error
    pub fn class_name_mismatch(
        declared: impl Into<String>,
        expected: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::ClassNameMismatch {
            declared: declared.into(),
            expected: expected.into(),
            path: path.into(),
        }
    }
}

/// Illegal call of a guarded proxy constructor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Call to {visibility} {class_name}::__construct() from {}", describe_scope(.caller.as_deref()))]
pub struct AccessViolation {
    /// Visibility of the original constructor
    pub visibility: Visibility,
    /// Guarded class
    pub class_name: String,
    /// Declaring class of the caller, `None` for the global scope
    pub caller: Option<String>,
}

fn describe_scope(caller: Option<&str>) -> String {
    match caller {
        Some(class_name) => format!("scope {class_name}"),
        None => "global scope".to_string(),
    }
}
