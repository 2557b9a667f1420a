//! Proxy method model
//!
//! A [`ProxyMethod`] collects the code woven around one member of the
//! original class and renders the overriding member of the proxy class.
//! Signature details (finality, static-ness, return type, parameters) are
//! looked up from the [`MetadataProvider`] at render time.

use crate::annotation::render_attribute;
use crate::error::BuildError;
use crate::metadata::{MetadataProvider, ParameterInfo, Visibility};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::Arc;

static DOC_OPENING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\*[ \t]*([^\n]*)\n").expect("valid doc opening pattern"));

/// Role of a proxy method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Any member except the constructor
    Regular,
    /// The constructor, remembering the visibility of the original one
    Constructor { original_visibility: Visibility },
}

/// Code model of one overriding member
#[derive(Debug, Clone)]
pub struct ProxyMethod {
    class_name: String,
    name: String,
    kind: MethodKind,
    metadata: Arc<dyn MetadataProvider>,
    pre_parent_call_code: String,
    post_parent_call_code: String,
    body: String,
    parameters_code: Option<String>,
    visibility: Option<Visibility>,
}

impl ProxyMethod {
    /// Create model for a regular method of `class_name`
    #[must_use]
    pub fn new(
        class_name: impl Into<String>,
        name: impl Into<String>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self::with_kind(class_name.into(), name.into(), MethodKind::Regular, metadata)
    }

    pub(crate) fn with_kind(
        class_name: String,
        name: String,
        kind: MethodKind,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            class_name: class_name.trim_start_matches('\\').to_string(),
            name,
            kind,
            metadata,
            pre_parent_call_code: String::new(),
            post_parent_call_code: String::new(),
            body: String::new(),
            parameters_code: None,
            visibility: None,
        }
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified name of the original class
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, MethodKind::Constructor { .. })
    }

    #[inline]
    #[must_use]
    pub fn pre_parent_call_code(&self) -> &str {
        &self.pre_parent_call_code
    }

    #[inline]
    #[must_use]
    pub fn post_parent_call_code(&self) -> &str {
        &self.post_parent_call_code
    }

    pub(crate) fn metadata(&self) -> &dyn MetadataProvider {
        self.metadata.as_ref()
    }

    /// Append code executed before the parent method is called
    pub fn add_pre_parent_call_code(&mut self, code: impl AsRef<str>) -> &mut Self {
        self.pre_parent_call_code.push_str(code.as_ref());
        self
    }

    /// Append code executed after the parent method is called
    pub fn add_post_parent_call_code(&mut self, code: impl AsRef<str>) -> &mut Self {
        self.post_parent_call_code.push_str(code.as_ref());
        self
    }

    /// Replace the generated body; pre and post code are ignored then
    pub fn set_method_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Replace the parameter list derived from the original signature
    pub fn override_method_parameters(&mut self, parameters_code: impl Into<String>) -> &mut Self {
        self.parameters_code = Some(parameters_code.into());
        self
    }

    /// Replace the visibility derived from the original method
    pub fn override_method_visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.visibility = Some(visibility);
        self
    }

    /// Whether [`render`](Self::render) will produce any code
    #[must_use]
    pub fn will_be_rendered(&self) -> bool {
        let advised = !self.pre_parent_call_code.is_empty() || !self.post_parent_call_code.is_empty();
        match self.kind {
            MethodKind::Regular => advised || !self.body.is_empty(),
            MethodKind::Constructor { .. } => advised,
        }
    }

    /// Render the overriding member, empty if nothing was woven in
    pub fn render(&self) -> Result<String, BuildError> {
        match self.kind {
            MethodKind::Regular => Ok(self.render_method()),
            MethodKind::Constructor { original_visibility } => {
                self.render_constructor(original_visibility)
            }
        }
    }

    fn render_method(&self) -> String {
        if !self.will_be_rendered() {
            return String::new();
        }

        let metadata = self.metadata();
        let final_keyword = if metadata.is_method_final(&self.class_name, &self.name) {
            "final "
        } else {
            ""
        };
        let static_keyword = if metadata.is_method_static(&self.class_name, &self.name) {
            "static "
        } else {
            ""
        };
        let visibility = self
            .visibility
            .map_or_else(|| self.method_visibility_string(), Visibility::as_str);
        let return_type = metadata.method_return_type(&self.class_name, &self.name);
        let returns_void = return_type.as_deref() == Some("void");
        let return_type_declaration = return_type
            .as_deref()
            .map(|return_type| format!(" : {return_type}"))
            .unwrap_or_default();
        let parameters_code = self
            .parameters_code
            .clone()
            .unwrap_or_else(|| self.build_method_parameters_code(true));

        let mut code = String::from("\n");
        code.push_str(&self.build_method_documentation());
        code.push_str(&format!(
            "    {final_keyword}{static_keyword}{visibility} function {}({parameters_code}){return_type_declaration}\n    {{\n",
            self.name
        ));

        if self.body.is_empty() {
            code.push_str(&self.build_body(returns_void));
        } else {
            code.push('\n');
            code.push_str(&self.body);
            code.push('\n');
        }
        code.push_str("    }\n");
        code
    }

    fn build_body(&self, returns_void: bool) -> String {
        let parent_call = self.build_call_parent_method_code();
        let mut body = self.pre_parent_call_code.clone();

        if !self.post_parent_call_code.is_empty() {
            if returns_void {
                if !parent_call.is_empty() {
                    body.push_str(&format!("        {parent_call};\n"));
                }
            } else if parent_call.is_empty() {
                body.push_str("        $result = NULL;\n");
            } else {
                body.push_str(&format!("        $result = {parent_call};\n"));
            }
            body.push_str(&self.post_parent_call_code);
            if !returns_void {
                body.push_str("        return $result;\n");
            }
        } else if !returns_void && !parent_call.is_empty() {
            body.push_str(&format!("        return {parent_call};\n"));
        }
        body
    }

    /// Documentation block of the overriding member
    ///
    /// Copies the original documentation with a normalized opening line and
    /// appends the original attributes.
    #[must_use]
    pub fn build_method_documentation(&self) -> String {
        let metadata = self.metadata();
        let mut documentation = String::from("    /**\n     * Autogenerated Proxy Method\n");
        if !metadata.has_method(&self.class_name, &self.name) {
            documentation.push_str("     */\n");
            return documentation;
        }

        match metadata.method_doc_comment(&self.class_name, &self.name) {
            Some(comment) if DOC_OPENING_LINE.is_match(&comment) => {
                let normalized = DOC_OPENING_LINE.replace(&comment, |captures: &Captures<'_>| {
                    match captures[1].trim() {
                        "" => "     *\n".to_string(),
                        summary => format!("     *\n     * {summary}\n"),
                    }
                });
                documentation.push_str(&normalized);
                documentation.push('\n');
            }
            Some(comment) => {
                let summary = comment
                    .trim()
                    .trim_start_matches("/**")
                    .trim_end_matches("*/")
                    .trim();
                if !summary.is_empty() {
                    documentation.push_str(&format!("     *\n     * {summary}\n"));
                }
                documentation.push_str("     */\n");
            }
            None => documentation.push_str("     */\n"),
        }

        for attribute in metadata.method_attributes(&self.class_name, &self.name) {
            documentation.push_str(&format!("    {}\n", render_attribute(&attribute)));
        }
        documentation
    }

    /// Parameter list of the original method
    ///
    /// With `add_type_and_default_value` the list repeats type declarations,
    /// nullability, by-reference markers and defaults; without it the result
    /// is a bare forwarding list like `$a, ...$rest`.
    #[must_use]
    pub fn build_method_parameters_code(&self, add_type_and_default_value: bool) -> String {
        self.metadata()
            .method_parameters(&self.class_name, &self.name)
            .iter()
            .map(|(name, parameter)| {
                if add_type_and_default_value {
                    declared_parameter(name, parameter)
                } else if parameter.variadic {
                    format!("...${name}")
                } else {
                    format!("${name}")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Call expression forwarding to the parent, empty if there is no parent method
    #[must_use]
    pub fn build_call_parent_method_code(&self) -> String {
        if !self.metadata().has_method(&self.class_name, &self.name) {
            return String::new();
        }
        format!(
            "parent::{}({})",
            self.name,
            self.build_method_parameters_code(false)
        )
    }

    fn method_visibility_string(&self) -> &'static str {
        let metadata = self.metadata();
        if metadata.is_method_protected(&self.class_name, &self.name) {
            "protected"
        } else if metadata.is_method_private(&self.class_name, &self.name) {
            "private"
        } else {
            "public"
        }
    }
}

fn declared_parameter(name: &str, parameter: &ParameterInfo) -> String {
    let mut code = String::new();
    if let Some(type_declaration) = parameter.type_declaration() {
        if parameter.allows_null {
            code.push('?');
        }
        code.push_str(&type_declaration);
        code.push(' ');
    }
    if parameter.by_reference {
        code.push('&');
    }
    if parameter.variadic {
        code.push_str("...");
    }
    code.push('$');
    code.push_str(name);
    if parameter.optional && !parameter.variadic {
        let default = parameter
            .default_value
            .as_ref()
            .map_or_else(|| "NULL".to_string(), |value| value.render());
        code.push_str(" = ");
        code.push_str(&default);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, AnnotationValue};
    use crate::literal::LiteralValue;
    use crate::snapshot::{ClassMetadata, MethodMetadata, StaticMetadata};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn metadata() -> Arc<StaticMetadata> {
        Arc::new(
            StaticMetadata::new().with_class(
                ClassMetadata::class("Acme\\Cart")
                    .with_method(
                        MethodMetadata::new("add")
                            .returns("void")
                            .with_parameter("product", ParameterInfo::class(0, "Acme\\Product"))
                            .with_parameter(
                                "quantity",
                                ParameterInfo::scalar(0, "int").with_default(LiteralValue::Int(1)),
                            ),
                    )
                    .with_method(
                        MethodMetadata::new("total")
                            .returns("float")
                            .with_doc_comment("/**\n     * Sum of all items\n     *\n     * @return float\n     */"),
                    )
                    .with_method(
                        MethodMetadata::new("merge")
                            .protected()
                            .final_method()
                            .with_parameter("options", ParameterInfo::array(0).nullable().optional())
                            .with_parameter("carts", ParameterInfo::class(0, "Acme\\Cart").variadic()),
                    )
                    .with_method(
                        MethodMetadata::new("create")
                            .static_method()
                            .returns("static")
                            .with_doc_comment("/** Factory */")
                            .with_attribute(
                                Annotation::new("Weft\\Annotations\\Signal")
                                    .with_argument("0", AnnotationValue::String("created".into())),
                            ),
                    )
                    .with_method(
                        MethodMetadata::new("swap")
                            .with_parameter("left", ParameterInfo::untyped(0).by_reference())
                            .with_parameter(
                                "labels",
                                ParameterInfo::array(0).with_default(LiteralValue::list([
                                    LiteralValue::String("a".into()),
                                ])),
                            ),
                    ),
            ),
        )
    }

    fn method(name: &str) -> ProxyMethod {
        ProxyMethod::new("Acme\\Cart", name, metadata())
    }

    #[test]
    fn unadvised_method_renders_nothing() {
        let method = method("total");
        assert!(!method.will_be_rendered());
        assert_eq!(method.render().unwrap(), "");
    }

    #[test]
    fn non_void_method_with_pre_code_returns_parent_result() {
        let mut method = method("total");
        method.add_pre_parent_call_code("        $this->log();\n");

        assert_eq!(
            method.render().unwrap(),
            "\n    /**\n     * Autogenerated Proxy Method\n     *\n     * Sum of all items\n     *\n     * @return float\n     */\n    public function total() : float\n    {\n        $this->log();\n        return parent::total();\n    }\n"
        );
    }

    #[test]
    fn void_method_with_post_code_discards_parent_result() {
        let mut method = method("add");
        method.add_post_parent_call_code("        $this->recalculate();\n");

        let code = method.render().unwrap();
        assert!(code.contains(
            "    public function add(\\Acme\\Product $product, int $quantity = 1) : void\n    {\n        parent::add($product, $quantity);\n        $this->recalculate();\n    }\n"
        ));
        assert!(!code.contains("$result"));
    }

    #[test]
    fn non_void_method_with_post_code_captures_parent_result() {
        let mut method = method("total");
        method
            .add_pre_parent_call_code("        $before = 1;\n")
            .add_post_parent_call_code("        $after = 2;\n");

        assert!(method.render().unwrap().contains(
            "        $before = 1;\n        $result = parent::total();\n        $after = 2;\n        return $result;\n    }\n"
        ));
    }

    #[test]
    fn missing_parent_method_yields_null_result() {
        let mut method = method("introduced");
        method.add_post_parent_call_code("        $after = 2;\n");

        let code = method.render().unwrap();
        assert!(code.contains("    /**\n     * Autogenerated Proxy Method\n     */\n    public function introduced()\n"));
        assert!(code.contains("        $result = NULL;\n        $after = 2;\n        return $result;\n"));
    }

    #[test]
    fn void_method_with_pre_code_only_skips_parent_call() {
        let mut method = method("add");
        method.add_pre_parent_call_code("        $this->check();\n");

        let code = method.render().unwrap();
        assert!(code.contains("    {\n        $this->check();\n    }\n"));
        assert!(!code.contains("parent::"));
    }

    #[test]
    fn body_override_wins() {
        let mut method = method("total");
        method
            .add_pre_parent_call_code("        ignored();\n")
            .set_method_body("        return 42.0;");

        assert!(method.will_be_rendered());
        let code = method.render().unwrap();
        assert!(code.contains("    {\n\n        return 42.0;\n    }\n"));
        assert!(!code.contains("ignored"));
    }

    #[test]
    fn modifiers_and_attributes_are_preserved() {
        let mut method = method("create");
        method.add_pre_parent_call_code("        self::$count++;\n");

        let code = method.render().unwrap();
        assert!(code.contains("     * Autogenerated Proxy Method\n     *\n     * Factory\n     */\n    #[\\Weft\\Annotations\\Signal('created')]\n"));
        assert!(code.contains("    static public function create() : static\n"));

        let mut merge = self::method("merge");
        merge.add_pre_parent_call_code("        x();\n");
        assert!(merge
            .render()
            .unwrap()
            .contains("    final protected function merge(?array $options = NULL, \\Acme\\Cart ...$carts)\n"));
    }

    #[test]
    fn parameter_lists() {
        let swap = method("swap");
        assert_eq!(
            swap.build_method_parameters_code(true),
            "&$left, array $labels = array(0 => 'a')"
        );
        assert_eq!(swap.build_method_parameters_code(false), "$left, $labels");
        assert_eq!(
            method("merge").build_call_parent_method_code(),
            "parent::merge($options, ...$carts)"
        );
        assert_eq!(method("introduced").build_call_parent_method_code(), "");
    }

    #[test]
    fn overrides_replace_derived_signature_parts() {
        let mut method = method("add");
        method
            .override_method_parameters("$product")
            .override_method_visibility(Visibility::Protected)
            .add_pre_parent_call_code("        x();\n");

        assert!(method
            .render()
            .unwrap()
            .contains("    protected function add($product) : void\n"));
    }

    proptest! {
        #[test]
        fn will_be_rendered_predicts_render(
            name in prop::sample::select(vec!["add", "total", "merge", "create", "introduced"]),
            pre in prop::option::of("[a-z]{1,8}"),
            post in prop::option::of("[a-z]{1,8}"),
            body in prop::option::of("[a-z]{1,8}"),
        ) {
            let mut method = method(name);
            if let Some(pre) = pre {
                method.add_pre_parent_call_code(pre);
            }
            if let Some(post) = post {
                method.add_post_parent_call_code(post);
            }
            if let Some(body) = body {
                method.set_method_body(body);
            }

            let predicted = method.will_be_rendered();
            prop_assert_eq!(predicted, !method.render().unwrap().is_empty());
        }
    }
}
