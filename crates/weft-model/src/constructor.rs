//! Proxy constructor rendering and the constructor guard
//!
//! The proxy constructor takes no declared parameters. It captures whatever
//! arguments it receives and forwards them to the original constructor, so
//! it stays compatible with constructors of any arity.

use crate::error::{AccessViolation, BuildError};
use crate::literal::quote_single;
use crate::metadata::{MetadataProvider, Visibility};
use crate::method::{MethodKind, ProxyMethod};
use crate::{CONSTRUCTOR_NAME, ORIGINAL_CLASSNAME_SUFFIX};
use std::sync::Arc;

impl ProxyMethod {
    /// Create the constructor model of `class_name`
    ///
    /// The visibility of the original constructor is captured from metadata,
    /// defaulting to public when the class declares none.
    #[must_use]
    pub fn constructor(class_name: impl Into<String>, metadata: Arc<dyn MetadataProvider>) -> Self {
        let class_name = class_name.into();
        let original_visibility = metadata
            .method_visibility(class_name.trim_start_matches('\\'), CONSTRUCTOR_NAME)
            .unwrap_or_default();
        Self::with_kind(
            class_name,
            CONSTRUCTOR_NAME.to_string(),
            MethodKind::Constructor {
                original_visibility,
            },
            metadata,
        )
    }

    /// Guard protecting a non-public original constructor
    #[must_use]
    pub fn constructor_guard(&self) -> Option<ConstructorGuard> {
        match self.kind() {
            MethodKind::Constructor {
                original_visibility,
            } if !original_visibility.is_public() => {
                Some(ConstructorGuard::new(self.class_name(), original_visibility))
            }
            _ => None,
        }
    }

    pub(crate) fn render_constructor(
        &self,
        original_visibility: Visibility,
    ) -> Result<String, BuildError> {
        if !self.will_be_rendered() {
            return Ok(String::new());
        }
        self.ensure_no_parameterized_interface_constructor()?;

        let calls_parent = self.metadata().has_method(self.class_name(), CONSTRUCTOR_NAME);

        let mut code = String::from("\n");
        code.push_str(&self.build_method_documentation());
        code.push_str("    public function __construct()\n    {\n");
        if calls_parent {
            if !original_visibility.is_public() {
                code.push_str(&ConstructorGuard::new(self.class_name(), original_visibility).render());
            }
            code.push_str("        $arguments = func_get_args();\n");
        }
        code.push_str(self.pre_parent_call_code());
        if calls_parent {
            code.push_str("        parent::__construct(...$arguments);\n");
        }
        code.push_str(self.post_parent_call_code());
        code.push_str("    }\n");
        Ok(code)
    }

    /// A parameterless proxy constructor cannot satisfy an interface which
    /// declares constructor parameters.
    fn ensure_no_parameterized_interface_constructor(&self) -> Result<(), BuildError> {
        let metadata = self.metadata();
        for interface_name in metadata.interface_names(self.class_name()) {
            if metadata.has_method(&interface_name, CONSTRUCTOR_NAME)
                && !metadata
                    .method_parameters(&interface_name, CONSTRUCTOR_NAME)
                    .is_empty()
            {
                return Err(BuildError::ParameterizedInterfaceConstructor {
                    class_name: self.class_name().to_string(),
                    interface_name,
                });
            }
        }
        Ok(())
    }
}

/// Caller check for a proxied class whose original constructor is not public
///
/// A caller is permitted if its class is the proxied class, the renamed
/// original class, a subclass of the proxied class, or one of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorGuard {
    class_name: String,
    visibility: Visibility,
}

impl ConstructorGuard {
    #[must_use]
    pub fn new(class_name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            class_name: class_name.into().trim_start_matches('\\').to_string(),
            visibility,
        }
    }

    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn original_class_name(&self) -> String {
        format!("{}{ORIGINAL_CLASSNAME_SUFFIX}", self.class_name)
    }

    /// Check a caller, `None` meaning the global scope
    pub fn check(
        &self,
        caller: Option<&str>,
        metadata: &dyn MetadataProvider,
    ) -> Result<(), AccessViolation> {
        if self.visibility.is_public() {
            return Ok(());
        }
        let permitted = caller.is_some_and(|caller| {
            let caller = caller.trim_start_matches('\\');
            caller == self.class_name
                || caller == self.original_class_name()
                || metadata.is_subclass_of(caller, &self.class_name)
                || metadata.is_subclass_of(&self.class_name, caller)
        });
        if permitted {
            Ok(())
        } else {
            Err(AccessViolation {
                visibility: self.visibility,
                class_name: self.class_name.clone(),
                caller: caller.map(|caller| caller.trim_start_matches('\\').to_string()),
            })
        }
    }

    /// Guard prologue placed at the top of the proxy constructor
    #[must_use]
    pub fn render(&self) -> String {
        let class_name = quote_single(&self.class_name);
        let original_class_name = quote_single(&self.original_class_name());
        let visibility = quote_single(self.visibility.as_str());
        format!(
            "        $callerClass = debug_backtrace(DEBUG_BACKTRACE_IGNORE_ARGS, 2)[1]['class'] ?? null;\n\
             \x20       if ($callerClass === null || ($callerClass !== {class_name} && $callerClass !== {original_class_name} && !is_subclass_of($callerClass, {class_name}) && !is_subclass_of({class_name}, $callerClass))) {{\n\
             \x20           throw new \\Error(sprintf('Call to %s %s::__construct() from %s', {visibility}, {class_name}, $callerClass === null ? 'global scope' : 'scope ' . $callerClass));\n\
             \x20       }}\n"
        )
    }
}
