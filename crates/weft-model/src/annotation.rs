//! Annotation and attribute printers
//!
//! Turns reflected annotation values back into source text. Arguments equal
//! to their declared default are left out, so a re-rendered annotation stays
//! as short as the one written by hand.

use crate::literal::{float_literal, quote_single};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A reflected annotation or attribute
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    /// Fully qualified class name of the annotation
    pub name: String,
    /// Arguments in declaration order; numeric keys are positional
    pub arguments: IndexMap<String, AnnotationValue>,
    /// Declared defaults, used to suppress redundant arguments
    pub defaults: IndexMap<String, AnnotationValue>,
}

/// Value of an annotation argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<AnnotationValue>),
    Map(IndexMap<String, AnnotationValue>),
    Nested(Box<Annotation>),
}

impl Annotation {
    /// Create annotation without arguments
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an argument
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    /// Declare the default of an argument
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Arguments which differ from their declared default
    fn significant_arguments(&self) -> impl Iterator<Item = (&String, &AnnotationValue)> {
        self.arguments
            .iter()
            .filter(|(key, value)| self.defaults.get(*key) != Some(*value))
    }

    fn qualified_name(&self) -> &str {
        self.name.trim_start_matches('\\')
    }
}

fn is_positional(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Render as docblock annotation, e.g. `@\Acme\Scope("singleton", lazy=false)`
#[must_use]
pub fn render_annotation(annotation: &Annotation) -> String {
    let options: Vec<String> = annotation
        .significant_arguments()
        .map(|(key, value)| {
            let rendered = render_annotation_value(value);
            if key == "value" || is_positional(key) {
                rendered
            } else {
                format!("{key}={rendered}")
            }
        })
        .collect();

    let mut code = format!("@\\{}", annotation.qualified_name());
    if !options.is_empty() {
        code.push('(');
        code.push_str(&options.join(", "));
        code.push(')');
    }
    code
}

fn render_annotation_value(value: &AnnotationValue) -> String {
    match value {
        AnnotationValue::Null => "NULL".to_string(),
        AnnotationValue::Bool(value) => value.to_string(),
        AnnotationValue::Int(value) => value.to_string(),
        AnnotationValue::Float(value) => float_literal(*value),
        AnnotationValue::String(value) => format!("\"{}\"", value.replace('"', "\"\"")),
        AnnotationValue::List(values) => {
            let items: Vec<String> = values.iter().map(render_annotation_value).collect();
            format!("{{{}}}", items.join(", "))
        }
        AnnotationValue::Map(entries) => {
            let items: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("\"{key}\"={}", render_annotation_value(value)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
        AnnotationValue::Nested(annotation) => render_annotation(annotation),
    }
}

/// Render as attribute, e.g. `#[\Acme\Scope('singleton', lazy: false)]`
#[must_use]
pub fn render_attribute(annotation: &Annotation) -> String {
    format!("#[{}]", render_attribute_expression(annotation))
}

fn render_attribute_expression(annotation: &Annotation) -> String {
    let arguments: Vec<String> = annotation
        .significant_arguments()
        .map(|(key, value)| {
            let rendered = render_attribute_value(value);
            if is_positional(key) {
                rendered
            } else {
                format!("{key}: {rendered}")
            }
        })
        .collect();

    let mut code = format!("\\{}", annotation.qualified_name());
    if !arguments.is_empty() {
        code.push('(');
        code.push_str(&arguments.join(", "));
        code.push(')');
    }
    code
}

fn render_attribute_value(value: &AnnotationValue) -> String {
    match value {
        AnnotationValue::Null => "null".to_string(),
        AnnotationValue::Bool(value) => value.to_string(),
        AnnotationValue::Int(value) => value.to_string(),
        AnnotationValue::Float(value) => float_literal(*value),
        AnnotationValue::String(value) => quote_single(value),
        AnnotationValue::List(values) => {
            let items: Vec<String> = values.iter().map(render_attribute_value).collect();
            format!("[{}]", items.join(", "))
        }
        AnnotationValue::Map(entries) => {
            let items: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{} => {}", quote_single(key), render_attribute_value(value)))
                .collect();
            format!("[{}]", items.join(", "))
        }
        AnnotationValue::Nested(annotation) => {
            format!("new {}", render_attribute_expression(annotation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(value: &str) -> Annotation {
        Annotation::new("Weft\\Annotations\\Scope")
            .with_argument("value", AnnotationValue::String(value.into()))
            .with_default("value", AnnotationValue::String("prototype".into()))
    }

    #[test]
    fn annotation_without_arguments() {
        let annotation = Annotation::new("\\Weft\\Annotations\\Entity");
        assert_eq!(render_annotation(&annotation), "@\\Weft\\Annotations\\Entity");
        assert_eq!(render_attribute(&annotation), "#[\\Weft\\Annotations\\Entity]");
    }

    #[test]
    fn value_argument_is_positional() {
        assert_eq!(
            render_annotation(&scope("singleton")),
            "@\\Weft\\Annotations\\Scope(\"singleton\")"
        );
    }

    #[test]
    fn default_valued_arguments_are_suppressed() {
        assert_eq!(render_annotation(&scope("prototype")), "@\\Weft\\Annotations\\Scope");

        let session = Annotation::new("Weft\\Annotations\\Session")
            .with_argument("autoStart", AnnotationValue::Bool(false))
            .with_default("autoStart", AnnotationValue::Bool(false))
            .with_argument("lazy", AnnotationValue::Bool(true))
            .with_default("lazy", AnnotationValue::Bool(false));
        assert_eq!(render_annotation(&session), "@\\Weft\\Annotations\\Session(lazy=true)");
        assert_eq!(render_attribute(&session), "#[\\Weft\\Annotations\\Session(lazy: true)]");
    }

    #[test]
    fn nested_and_collection_values() {
        let validate = Annotation::new("Weft\\Annotations\\Validate")
            .with_argument("type", AnnotationValue::String("StringLength".into()))
            .with_argument(
                "options",
                AnnotationValue::Map(IndexMap::from([(
                    "maximum".to_string(),
                    AnnotationValue::Int(50),
                )])),
            );
        let wrapper = Annotation::new("Weft\\Annotations\\Group")
            .with_argument("0", AnnotationValue::Nested(Box::new(validate)))
            .with_argument(
                "tags",
                AnnotationValue::List(vec![
                    AnnotationValue::String("a".into()),
                    AnnotationValue::Null,
                ]),
            );

        assert_eq!(
            render_annotation(&wrapper),
            "@\\Weft\\Annotations\\Group(@\\Weft\\Annotations\\Validate(type=\"StringLength\", options={\"maximum\"=50}), tags={\"a\", NULL})"
        );
        assert_eq!(
            render_attribute(&wrapper),
            "#[\\Weft\\Annotations\\Group(new \\Weft\\Annotations\\Validate(type: 'StringLength', options: ['maximum' => 50]), tags: ['a', null])]"
        );
    }

    #[test]
    fn whole_floats_keep_fraction() {
        let cache = Annotation::new("Weft\\Annotations\\Cache").with_argument("lifetime", AnnotationValue::Float(2.0));
        assert_eq!(render_attribute(&cache), "#[\\Weft\\Annotations\\Cache(lifetime: 2.0)]");
        assert_eq!(render_annotation(&cache), "@\\Weft\\Annotations\\Cache(lifetime=2.0)");
    }

    #[test]
    fn attribute_strings_are_escaped() {
        let around = Annotation::new("Weft\\Annotations\\Around").with_argument(
            "pointcutExpression",
            AnnotationValue::String("method(Acme\\Cart->add())".into()),
        );
        assert_eq!(
            render_attribute(&around),
            "#[\\Weft\\Annotations\\Around(pointcutExpression: 'method(Acme\\\\Cart->add())')]"
        );
    }
}
