//! In-memory metadata snapshot
//!
//! [`StaticMetadata`] answers [`MetadataProvider`] queries from plain records.
//! An external reflection step can hand the records over as JSON.

use crate::annotation::Annotation;
use crate::metadata::{MetadataProvider, ParameterInfo, Parameters, Visibility};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reflected class or interface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassMetadata {
    pub name: String,
    #[serde(rename = "interface")]
    pub is_interface: bool,
    pub parent: Option<String>,
    /// Directly implemented (or, for interfaces, extended) interfaces
    pub interfaces: Vec<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(rename = "readonly")]
    pub is_readonly: bool,
    #[serde(rename = "internal")]
    pub is_internal: bool,
    pub proxy_disabled: bool,
    pub doc_comment: Option<String>,
    pub attributes: Vec<Annotation>,
    pub source_path: Option<PathBuf>,
    pub methods: Vec<MethodMetadata>,
}

impl ClassMetadata {
    /// Create class record
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: normalize(&name.into()).to_string(),
            ..Self::default()
        }
    }

    /// Create interface record
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::class(name)
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(normalize(&parent.into()).to_string());
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(normalize(&interface.into()).to_string());
        self
    }

    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn final_class(mut self) -> Self {
        self.is_final = true;
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }

    #[must_use]
    pub fn proxy_disabled(mut self) -> Self {
        self.proxy_disabled = true;
        self
    }

    #[must_use]
    pub fn with_doc_comment(mut self, doc_comment: impl Into<String>) -> Self {
        self.doc_comment = Some(doc_comment.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Annotation) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    fn method(&self, method_name: &str) -> Option<&MethodMetadata> {
        self.methods
            .iter()
            .find(|method| method.name.eq_ignore_ascii_case(method_name))
    }
}

/// Reflected method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodMetadata {
    pub name: String,
    pub visibility: Visibility,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub parameters: Parameters,
    pub return_type: Option<String>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<Annotation>,
}

impl MethodMetadata {
    /// Create public method record
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    #[must_use]
    pub fn final_method(mut self) -> Self {
        self.is_final = true;
        self
    }

    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Append a parameter; its position is assigned from the current count
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, mut parameter: ParameterInfo) -> Self {
        parameter.position = self.parameters.len();
        self.parameters.insert(name.into(), parameter);
        self
    }

    #[must_use]
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    #[must_use]
    pub fn with_doc_comment(mut self, doc_comment: impl Into<String>) -> Self {
        self.doc_comment = Some(doc_comment.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Annotation) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Metadata snapshot keyed by class name
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    classes: IndexMap<String, ClassMetadata>,
}

impl StaticMetadata {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build snapshot from a JSON array of class records
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let classes: Vec<ClassMetadata> = serde_json::from_str(json)?;
        Ok(classes.into_iter().collect())
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassMetadata) -> Self {
        self.insert(class);
        self
    }

    /// Add or replace a class record
    pub fn insert(&mut self, class: ClassMetadata) {
        self.classes.insert(normalize(&class.name).to_string(), class);
    }

    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<&ClassMetadata> {
        self.classes.get(normalize(class_name))
    }

    /// Names of all known classes and interfaces
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class followed by its ancestors
    fn lineage(&self, class_name: &str) -> Vec<&ClassMetadata> {
        let mut lineage: Vec<&ClassMetadata> = Vec::new();
        let mut next = self.get(class_name);
        while let Some(class) = next {
            if lineage.iter().any(|seen| seen.name == class.name) {
                break;
            }
            lineage.push(class);
            next = class.parent.as_deref().and_then(|parent| self.get(parent));
        }
        lineage
    }

    fn collect_interfaces(&self, class: &ClassMetadata, into: &mut IndexSet<String>) {
        for interface in &class.interfaces {
            if into.insert(interface.clone()) {
                if let Some(extended) = self.get(interface) {
                    self.collect_interfaces(extended, into);
                }
            }
        }
    }

    /// Nearest declaration of a method
    fn find_method(&self, class_name: &str, method_name: &str) -> Option<&MethodMetadata> {
        if let Some(method) = self
            .lineage(class_name)
            .into_iter()
            .find_map(|class| class.method(method_name))
        {
            return Some(method);
        }
        if self.is_interface(class_name) {
            return self
                .interface_names(class_name)
                .iter()
                .filter_map(|name| self.get(name))
                .find_map(|interface| interface.method(method_name));
        }
        None
    }
}

impl FromIterator<ClassMetadata> for StaticMetadata {
    fn from_iter<I: IntoIterator<Item = ClassMetadata>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for class in iter {
            metadata.insert(class);
        }
        metadata
    }
}

impl MetadataProvider for StaticMetadata {
    fn class_exists(&self, class_name: &str) -> bool {
        self.get(class_name).is_some()
    }

    fn is_interface(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.is_interface)
    }

    fn is_internal(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.is_internal)
    }

    fn parent_class_names(&self, class_name: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut next = self.get(class_name).and_then(|class| class.parent.clone());
        while let Some(parent) = next {
            if names.contains(&parent) {
                break;
            }
            next = self.get(&parent).and_then(|class| class.parent.clone());
            names.push(parent);
        }
        names
    }

    fn interface_names(&self, class_name: &str) -> Vec<String> {
        let mut names = IndexSet::new();
        for class in self.lineage(class_name) {
            self.collect_interfaces(class, &mut names);
        }
        names.into_iter().collect()
    }

    fn is_proxy_disabled(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.proxy_disabled)
    }

    fn is_abstract(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.is_abstract)
    }

    fn is_final(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.is_final)
    }

    fn is_readonly(&self, class_name: &str) -> bool {
        self.get(class_name).is_some_and(|class| class.is_readonly)
    }

    fn class_doc_comment(&self, class_name: &str) -> Option<String> {
        self.get(class_name).and_then(|class| class.doc_comment.clone())
    }

    fn class_attributes(&self, class_name: &str) -> Vec<Annotation> {
        self.get(class_name)
            .map(|class| class.attributes.clone())
            .unwrap_or_default()
    }

    fn source_path(&self, class_name: &str) -> Option<PathBuf> {
        self.get(class_name).and_then(|class| class.source_path.clone())
    }

    fn has_method(&self, class_name: &str, method_name: &str) -> bool {
        self.find_method(class_name, method_name).is_some()
    }

    fn is_method_final(&self, class_name: &str, method_name: &str) -> bool {
        self.find_method(class_name, method_name)
            .is_some_and(|method| method.is_final)
    }

    fn is_method_static(&self, class_name: &str, method_name: &str) -> bool {
        self.find_method(class_name, method_name)
            .is_some_and(|method| method.is_static)
    }

    fn method_visibility(&self, class_name: &str, method_name: &str) -> Option<Visibility> {
        self.find_method(class_name, method_name)
            .map(|method| method.visibility)
    }

    fn method_parameters(&self, class_name: &str, method_name: &str) -> Parameters {
        self.find_method(class_name, method_name)
            .map(|method| method.parameters.clone())
            .unwrap_or_default()
    }

    fn method_return_type(&self, class_name: &str, method_name: &str) -> Option<String> {
        self.find_method(class_name, method_name)
            .and_then(|method| method.return_type.clone())
    }

    fn method_doc_comment(&self, class_name: &str, method_name: &str) -> Option<String> {
        self.find_method(class_name, method_name)
            .and_then(|method| method.doc_comment.clone())
    }

    fn method_attributes(&self, class_name: &str, method_name: &str) -> Vec<Annotation> {
        self.find_method(class_name, method_name)
            .map(|method| method.attributes.clone())
            .unwrap_or_default()
    }
}

fn normalize(class_name: &str) -> &str {
    class_name.trim_start_matches('\\')
}
