//! Registry of original class names
//!
//! Provides [`ClassRegistry`], the package-grouped list of classes a compile
//! run walks through.

use indexmap::IndexMap;

/// Class names grouped by package key
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    packages: IndexMap<String, Vec<String>>,
}

impl ClassRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under a package
    pub fn register(&mut self, package_key: &str, class_name: &str) {
        let classes = self.packages.entry(package_key.to_string()).or_default();
        if !classes.iter().any(|known| known == class_name) {
            classes.push(class_name.to_string());
        }
    }

    /// Register several classes under a package
    #[must_use]
    pub fn with_package<I, S>(mut self, package_key: &str, class_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for class_name in class_names {
            self.register(package_key, class_name.as_ref());
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.class_names().any(|known| known == class_name)
    }

    /// Package keys in registration order
    #[must_use]
    pub fn package_keys(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    /// Classes of one package
    #[must_use]
    pub fn package_classes(&self, package_key: &str) -> &[String] {
        self.packages
            .get(package_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All class names, package by package
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.packages.values().flatten().map(String::as_str)
    }

    /// Total number of classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_keep_package_order() {
        let registry = ClassRegistry::new()
            .with_package("Acme.Shop", ["Acme\\Shop\\Cart", "Acme\\Shop\\Order"])
            .with_package("Acme.Blog", ["Acme\\Blog\\Post"]);

        assert_eq!(registry.package_keys(), vec!["Acme.Shop", "Acme.Blog"]);
        assert_eq!(
            registry.class_names().collect::<Vec<_>>(),
            vec!["Acme\\Shop\\Cart", "Acme\\Shop\\Order", "Acme\\Blog\\Post"]
        );
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("Acme\\Blog\\Post"));
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut registry = ClassRegistry::new();
        registry.register("Acme.Shop", "Acme\\Shop\\Cart");
        registry.register("Acme.Shop", "Acme\\Shop\\Cart");

        assert_eq!(registry.package_classes("Acme.Shop").len(), 1);
        assert!(registry.package_classes("Unknown").is_empty());
        assert!(!ClassRegistry::new().contains("Acme\\Shop\\Cart"));
        assert!(ClassRegistry::new().is_empty());
    }
}
