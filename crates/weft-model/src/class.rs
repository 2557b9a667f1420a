//! Proxy class model
//!
//! A [`ProxyClass`] is the generated subclass of one original class. Weaving
//! code fills it with constants, properties, traits, interfaces and advised
//! methods; [`ProxyClass::render`] turns it into source text, or into nothing
//! when no member needs to be overridden.

use crate::annotation::render_attribute;
use crate::error::BuildError;
use crate::metadata::{MetadataProvider, Visibility};
use crate::method::ProxyMethod;
use crate::{
    ANNOTATION_IMPORTS, CODE_COVERAGE_IGNORE, CONSTRUCTOR_NAME, ORIGINAL_CLASSNAME_SUFFIX,
    PROXY_INTERFACE,
};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Property introduced by the proxy class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyProperty {
    pub visibility: Visibility,
    /// Initial value as source literal
    pub initial_value_code: String,
    /// Documentation placed above the property, may be empty
    pub doc_comment: String,
}

/// Code model of one proxy class
#[derive(Debug, Clone)]
pub struct ProxyClass {
    full_original_class_name: String,
    namespace: String,
    original_class_name: String,
    metadata: Arc<dyn MetadataProvider>,
    constants: IndexMap<String, String>,
    properties: IndexMap<String, ProxyProperty>,
    interfaces: Vec<String>,
    traits: Vec<String>,
    constructor: Option<ProxyMethod>,
    methods: IndexMap<String, ProxyMethod>,
}

impl ProxyClass {
    /// Create an empty proxy model for a fully qualified class name
    #[must_use]
    pub fn new(full_original_class_name: impl Into<String>, metadata: Arc<dyn MetadataProvider>) -> Self {
        let full_original_class_name = full_original_class_name
            .into()
            .trim_start_matches('\\')
            .to_string();
        let (namespace, original_class_name) = match full_original_class_name.rsplit_once('\\') {
            Some((namespace, short_name)) => (namespace.to_string(), short_name.to_string()),
            None => (String::new(), full_original_class_name.clone()),
        };

        Self {
            full_original_class_name,
            namespace,
            original_class_name,
            metadata,
            constants: IndexMap::new(),
            properties: IndexMap::new(),
            interfaces: vec![PROXY_INTERFACE.to_string()],
            traits: Vec::new(),
            constructor: None,
            methods: IndexMap::new(),
        }
    }

    /// Fully qualified name of the original class
    #[inline]
    #[must_use]
    pub fn full_original_class_name(&self) -> &str {
        &self.full_original_class_name
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Unqualified class name, shared by the original and the proxy class
    #[inline]
    #[must_use]
    pub fn original_class_name(&self) -> &str {
        &self.original_class_name
    }

    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &dyn MetadataProvider {
        self.metadata.as_ref()
    }

    /// Constructor model, created on first access
    pub fn constructor(&mut self) -> &mut ProxyMethod {
        let full_original_class_name = &self.full_original_class_name;
        let metadata = &self.metadata;
        self.constructor.get_or_insert_with(|| {
            ProxyMethod::constructor(full_original_class_name.clone(), Arc::clone(metadata))
        })
    }

    /// Method model, created on first access
    ///
    /// Method names are case-insensitive; the casing of the first request is
    /// rendered. Asking for `__construct` returns the constructor model.
    pub fn method(&mut self, method_name: &str) -> &mut ProxyMethod {
        if method_name.eq_ignore_ascii_case(CONSTRUCTOR_NAME) {
            return self.constructor();
        }
        let full_original_class_name = &self.full_original_class_name;
        let metadata = &self.metadata;
        self.methods
            .entry(method_name.to_ascii_lowercase())
            .or_insert_with(|| {
                ProxyMethod::new(full_original_class_name.clone(), method_name, Arc::clone(metadata))
            })
    }

    /// Whether a model for the method was requested already
    #[must_use]
    pub fn has_method(&self, method_name: &str) -> bool {
        if method_name.eq_ignore_ascii_case(CONSTRUCTOR_NAME) {
            self.constructor.is_some()
        } else {
            self.methods.contains_key(&method_name.to_ascii_lowercase())
        }
    }

    /// Add a class constant; `value_code` is the literal source of its value
    pub fn add_constant(&mut self, name: impl Into<String>, value_code: impl Into<String>) {
        self.constants.insert(name.into(), value_code.into());
    }

    /// Add a property
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        initial_value_code: impl Into<String>,
        visibility: Visibility,
        doc_comment: impl Into<String>,
    ) {
        self.properties.insert(
            name.into(),
            ProxyProperty {
                visibility,
                initial_value_code: initial_value_code.into(),
                doc_comment: doc_comment.into(),
            },
        );
    }

    /// Add interfaces to implement; duplicates are dropped when rendering
    pub fn add_interfaces<I, S>(&mut self, interface_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces
            .extend(interface_names.into_iter().map(Into::into));
    }

    /// Add traits to use
    pub fn add_traits<I, S>(&mut self, trait_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits.extend(trait_names.into_iter().map(Into::into));
    }

    /// Render the proxy class
    ///
    /// Returns an empty string if neither constants nor any rendered member
    /// would end up in the class.
    pub fn render(&self) -> Result<String, BuildError> {
        let constants_code = self.render_constants_code();
        let properties_code = self.render_properties_code();
        let traits_code = self.render_traits_code();

        let mut methods_code = match &self.constructor {
            Some(constructor) => constructor.render()?,
            None => String::new(),
        };
        for method in self.methods.values() {
            methods_code.push_str(&method.render()?);
        }

        if constants_code.is_empty() && methods_code.is_empty() {
            return Ok(String::new());
        }

        let mut code = String::new();
        if !self.namespace.is_empty() {
            code.push_str(&format!("namespace {};\n\n", self.namespace));
        }
        for import in ANNOTATION_IMPORTS {
            code.push_str(&format!("use {import};\n"));
        }
        code.push('\n');
        code.push_str(&self.build_class_documentation());
        code.push_str(&format!(
            "{}class {} extends {}{ORIGINAL_CLASSNAME_SUFFIX} implements {}\n{{\n",
            self.class_modifiers(),
            self.original_class_name,
            self.original_class_name,
            self.unique_interfaces().join(", ")
        ));
        code.push_str(&constants_code);
        code.push_str(&properties_code);
        code.push_str(&traits_code);
        code.push_str(&methods_code);
        code.push('}');
        Ok(code)
    }

    fn class_modifiers(&self) -> String {
        let class_name = &self.full_original_class_name;
        let mut modifiers = String::new();
        if self.metadata.is_abstract(class_name) {
            modifiers.push_str("abstract ");
        } else if self.metadata.is_final(class_name) {
            modifiers.push_str("final ");
        }
        if self.metadata.is_readonly(class_name) {
            modifiers.push_str("readonly ");
        }
        modifiers
    }

    fn unique_interfaces(&self) -> Vec<&str> {
        self.interfaces
            .iter()
            .map(String::as_str)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Original class documentation marked as excluded from coverage,
    /// followed by the original attributes
    fn build_class_documentation(&self) -> String {
        let mut documentation = match self.metadata.class_doc_comment(&self.full_original_class_name) {
            Some(comment) => {
                let body = comment.trim_end();
                let body = body.strip_suffix("*/").unwrap_or(body).trim_end();
                format!("{body}\n * {CODE_COVERAGE_IGNORE}\n */\n")
            }
            None => format!("/**\n * {CODE_COVERAGE_IGNORE}\n */\n"),
        };
        for attribute in self.metadata.class_attributes(&self.full_original_class_name) {
            documentation.push_str(&render_attribute(&attribute));
            documentation.push('\n');
        }
        documentation
    }

    fn render_constants_code(&self) -> String {
        self.constants
            .iter()
            .map(|(name, value_code)| format!("    const {name} = {value_code};\n\n"))
            .collect()
    }

    fn render_properties_code(&self) -> String {
        let mut code = String::new();
        for (name, property) in &self.properties {
            if !property.doc_comment.is_empty() {
                code.push_str(&format!("    {}\n", property.doc_comment));
            }
            code.push_str(&format!(
                "    {} ${name} = {};\n\n",
                property.visibility, property.initial_value_code
            ));
        }
        code
    }

    fn render_traits_code(&self) -> String {
        if self.traits.is_empty() {
            String::new()
        } else {
            format!("    use {};\n\n", self.traits.join(", "))
        }
    }
}
