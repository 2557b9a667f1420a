//! Compiler configuration

use serde::{Deserialize, Serialize};

/// Banner placed between the renamed original class and the proxy class
pub const DEFAULT_PROXY_BANNER: &str = "\n#\n# Start of Weft generated Proxy code\n#\n";

/// Settings of a [`Compiler`](crate::Compiler) run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Framework namespaces whose classes are never proxied
    pub excluded_prefixes: Vec<String>,
    /// Number of leading characters compared against `excluded_prefixes`
    pub excluded_prefix_length: usize,
    /// Base class of test cases; it and its subclasses are never proxied
    pub test_base_class: String,
    pub proxy_banner: String,
}

impl CompilerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With excluded namespace prefixes
    #[must_use]
    pub fn with_excluded_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// With prefix comparison length
    #[inline]
    #[must_use]
    pub fn with_excluded_prefix_length(mut self, length: usize) -> Self {
        self.excluded_prefix_length = length;
        self
    }

    /// With test case base class
    #[inline]
    #[must_use]
    pub fn with_test_base_class(mut self, class_name: impl Into<String>) -> Self {
        self.test_base_class = class_name.into();
        self
    }

    /// With proxy banner
    #[inline]
    #[must_use]
    pub fn with_proxy_banner(mut self, banner: impl Into<String>) -> Self {
        self.proxy_banner = banner.into();
        self
    }

    /// Whether the first `excluded_prefix_length` characters of the class
    /// name match one of the excluded prefixes
    #[must_use]
    pub fn is_excluded(&self, class_name: &str) -> bool {
        let class_name = class_name.trim_start_matches('\\');
        let head: String = class_name.chars().take(self.excluded_prefix_length).collect();
        self.excluded_prefixes.iter().any(|prefix| {
            let prefix: String = prefix.chars().take(self.excluded_prefix_length).collect();
            head == prefix
        })
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: [
                "Weft\\Aop\\",
                "Weft\\Core",
                "Weft\\Obje",
                "Weft\\Pack",
                "Weft\\Refl",
                "Weft\\Util",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_prefix_length: 9,
            test_base_class: "Weft\\Tests\\BaseTestCase".to_string(),
            proxy_banner: DEFAULT_PROXY_BANNER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_framework_namespaces() {
        let config = CompilerConfig::new();
        assert!(config.is_excluded("Weft\\Aop\\Builder\\ProxyClassBuilder"));
        assert!(config.is_excluded("\\Weft\\ObjectManagement\\ObjectManager"));
        assert!(config.is_excluded("Weft\\Utility\\Files"));
        assert!(!config.is_excluded("Weft\\Mvc\\Controller"));
        assert!(!config.is_excluded("Acme\\Shop\\Cart"));
    }

    #[test]
    fn comparison_uses_fixed_length() {
        let config = CompilerConfig::new()
            .with_excluded_prefixes(["Acme\\Internal\\Deep"])
            .with_excluded_prefix_length(5);
        assert!(config.is_excluded("Acme\\Shop\\Cart"));
        assert!(!config.is_excluded("Other\\Cart"));
    }

    #[test]
    fn short_names_do_not_match_longer_prefixes() {
        let config = CompilerConfig::new();
        assert!(!config.is_excluded("Weft"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"test_base_class": "Acme\\TestCase"}"#).unwrap();
        assert_eq!(config.test_base_class, "Acme\\TestCase");
        assert_eq!(config.excluded_prefix_length, 9);
        assert_eq!(config.proxy_banner, DEFAULT_PROXY_BANNER);
    }
}
