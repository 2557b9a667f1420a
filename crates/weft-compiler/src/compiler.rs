//! Proxy compiler
//!
//! [`Compiler`] hands out one [`ProxyClass`] per eligible class during
//! weaving and, at the end of the run, renders every populated model, stores
//! it together with the rewritten original source and records the stored
//! classes in the [`StoredClassManifest`].

use crate::cache::{cache_key, CacheStore};
use crate::config::CompilerConfig;
use crate::error::{CompilerResult, SourceError};
use crate::manifest::StoredClassManifest;
use crate::registry::ClassRegistry;
use crate::rewrite::rewrite_original_source;
use crate::source::{FsSourceReader, SourceReader};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use weft_model::{MetadataProvider, ProxyClass};

static ANNOTATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s?\*\s?@Annotation\s").expect("valid annotation marker pattern"));

/// Reason why a class cannot be proxied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    Interface,
    /// The test case base class or one of its subclasses
    TestCase,
    UnknownClass,
    /// Built into the runtime
    Internal,
    ProxyDisabled,
    ExcludedNamespace,
    /// Final annotation class; annotation readers rely on its identity
    AnnotationClass,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Interface => "is an interface",
            Self::TestCase => "is a test case",
            Self::UnknownClass => "does not exist",
            Self::Internal => "is an internal class",
            Self::ProxyDisabled => "has proxy building disabled",
            Self::ExcludedNamespace => "belongs to an excluded namespace",
            Self::AnnotationClass => "is a final annotation class",
        };
        f.write_str(reason)
    }
}

/// Builds and stores proxy classes for one compile run
pub struct Compiler {
    config: CompilerConfig,
    metadata: Arc<dyn MetadataProvider>,
    cache: Arc<dyn CacheStore>,
    sources: Arc<dyn SourceReader>,
    proxy_classes: IndexMap<String, ProxyClass>,
    stored_classes: StoredClassManifest,
}

impl Compiler {
    /// Create compiler reading sources from the filesystem
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            config: CompilerConfig::default(),
            metadata,
            cache,
            sources: Arc::new(FsSourceReader),
            proxy_classes: IndexMap::new(),
            stored_classes: StoredClassManifest::new(),
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// With source reader
    #[must_use]
    pub fn with_source_reader(mut self, sources: Arc<dyn SourceReader>) -> Self {
        self.sources = sources;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Check whether a class may be proxied
    pub fn check_eligibility(&self, class_name: &str) -> Result<(), Ineligible> {
        let class_name = class_name.trim_start_matches('\\');
        let metadata = self.metadata.as_ref();

        if metadata.is_interface(class_name) {
            return Err(Ineligible::Interface);
        }
        let test_base_class = self.config.test_base_class.trim_start_matches('\\');
        if !test_base_class.is_empty()
            && (class_name == test_base_class || metadata.is_subclass_of(class_name, test_base_class))
        {
            return Err(Ineligible::TestCase);
        }
        if !metadata.class_exists(class_name) {
            return Err(Ineligible::UnknownClass);
        }
        if metadata.is_internal(class_name) {
            return Err(Ineligible::Internal);
        }
        if metadata.is_proxy_disabled(class_name) {
            return Err(Ineligible::ProxyDisabled);
        }
        if self.config.is_excluded(class_name) {
            return Err(Ineligible::ExcludedNamespace);
        }
        if metadata.is_final(class_name)
            && metadata
                .class_doc_comment(class_name)
                .is_some_and(|doc| ANNOTATION_MARKER.is_match(&doc))
        {
            return Err(Ineligible::AnnotationClass);
        }
        Ok(())
    }

    /// Proxy model of a class, `None` if the class cannot be proxied
    ///
    /// Repeated calls for the same class return the same model.
    pub fn proxy_class(&mut self, class_name: &str) -> Option<&mut ProxyClass> {
        let class_name = class_name.trim_start_matches('\\');
        if let Err(reason) = self.check_eligibility(class_name) {
            tracing::trace!("Not building proxy for {}: class {}", class_name, reason);
            return None;
        }
        let metadata = &self.metadata;
        Some(
            self.proxy_classes
                .entry(class_name.to_string())
                .or_insert_with(|| ProxyClass::new(class_name, Arc::clone(metadata))),
        )
    }

    /// Proxy models requested so far
    pub fn proxy_classes(&self) -> impl Iterator<Item = &ProxyClass> {
        self.proxy_classes.values()
    }

    /// Whether the cache holds a usable entry for the class
    ///
    /// A class with a proxy model in progress will be rebuilt by this run,
    /// so its existing entry does not count.
    #[must_use]
    pub fn has_cache_entry(&self, class_name: &str) -> bool {
        let class_name = class_name.trim_start_matches('\\');
        if self.proxy_classes.contains_key(class_name) {
            return false;
        }
        self.cache.has(&cache_key(class_name))
    }

    /// Render and store the proxies of all registered classes
    ///
    /// Classes without a proxy model keep their existing cache entry.
    /// Returns the number of proxy classes written.
    pub fn compile(&mut self, registry: &ClassRegistry) -> CompilerResult<usize> {
        self.stored_classes.clear();
        let mut compiled = 0;

        for class_name in registry.class_names() {
            let class_name = class_name.trim_start_matches('\\');
            let key = cache_key(class_name);

            if let Some(proxy_class) = self.proxy_classes.get(class_name) {
                let proxy_code = proxy_class.render()?;
                if proxy_code.is_empty() {
                    tracing::debug!("No proxy code needed for {}", class_name);
                    continue;
                }
                self.rewrite_and_store(class_name, &proxy_code)?;
                self.stored_classes.insert(key);
                compiled += 1;
            } else if self.cache.has(&key) {
                tracing::debug!("Keeping cached proxy of {}", class_name);
                self.stored_classes.insert(key);
            }
        }

        tracing::info!("Compiled {} proxy classes", compiled);
        Ok(compiled)
    }

    /// Store rewritten original source and proxy code under the class key
    pub fn rewrite_and_store(&self, class_name: &str, proxy_code: &str) -> CompilerResult<()> {
        let class_name = class_name.trim_start_matches('\\');
        let Some(path) = self.metadata.source_path(class_name) else {
            tracing::warn!("No source path known for proxied class {}", class_name);
            return Err(SourceError::MissingSourcePath {
                class_name: class_name.to_string(),
            }
            .into());
        };

        let source = self.sources.read(&path)?;
        let entry = rewrite_original_source(&source, &path, proxy_code, &self.config.proxy_banner)?;
        self.cache.set(&cache_key(class_name), &entry)?;
        tracing::debug!("Built proxy class for {} from {}", class_name, path.display());
        Ok(())
    }

    /// Keys recorded by the last [`compile`](Self::compile)
    #[inline]
    #[must_use]
    pub fn stored_classes(&self) -> &StoredClassManifest {
        &self.stored_classes
    }

    /// Loadable manifest of all classes with a stored proxy
    #[must_use]
    pub fn stored_class_manifest(&self) -> String {
        self.stored_classes.render()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("proxy_classes", &self.proxy_classes.keys().collect::<Vec<_>>())
            .field("stored_classes", &self.stored_classes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStore, MockCacheStore};
    use crate::error::CompilerError;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use weft_model::{BuildError, ClassMetadata, MethodMetadata, StaticMetadata};

    #[derive(Debug, Default)]
    struct Sources(HashMap<PathBuf, String>);

    impl SourceReader for Sources {
        fn read(&self, path: &Path) -> Result<String, SourceError> {
            self.0.get(path).cloned().ok_or_else(|| {
                SourceError::io_error(path, std::io::Error::from(std::io::ErrorKind::NotFound))
            })
        }
    }

    fn metadata() -> Arc<StaticMetadata> {
        Arc::new(
            StaticMetadata::new()
                .with_class(ClassMetadata::interface("Acme\\Countable"))
                .with_class(ClassMetadata::class("Weft\\Tests\\BaseTestCase"))
                .with_class(ClassMetadata::class("Acme\\Tests\\CartTest").with_parent("Weft\\Tests\\BaseTestCase"))
                .with_class(ClassMetadata::class("ArrayObject").internal())
                .with_class(ClassMetadata::class("Acme\\Legacy").proxy_disabled())
                .with_class(ClassMetadata::class("Weft\\Core\\Bootstrap"))
                .with_class(
                    ClassMetadata::class("Acme\\Annotations\\Audit")
                        .final_class()
                        .with_doc_comment("/**\n * @Annotation\n * @Target(\"METHOD\")\n */"),
                )
                .with_class(
                    ClassMetadata::class("Acme\\FinalService")
                        .final_class()
                        .with_doc_comment("/**\n * Not an @Annotation marker line\n */"),
                )
                .with_class(
                    ClassMetadata::class("Acme\\Cart")
                        .with_source_path("/app/Acme/Cart.php")
                        .with_method(MethodMetadata::new("total").returns("int")),
                )
                .with_class(
                    ClassMetadata::class("Acme\\Order")
                        .with_source_path("/app/Acme/Basket.php")
                        .with_method(MethodMetadata::new("ship").returns("void")),
                )
                .with_class(ClassMetadata::class("Acme\\Orphan").with_method(MethodMetadata::new("run"))),
        )
    }

    fn sources() -> Arc<Sources> {
        let mut sources = HashMap::new();
        sources.insert(
            PathBuf::from("/app/Acme/Cart.php"),
            "<?php\nnamespace Acme;\n\nclass Cart\n{\n    public function total(): int\n    {\n        return 1;\n    }\n}\n".to_string(),
        );
        sources.insert(
            PathBuf::from("/app/Acme/Basket.php"),
            "<?php\nnamespace Acme;\n\nclass Order\n{\n}\n".to_string(),
        );
        Arc::new(Sources(sources))
    }

    fn compiler(cache: Arc<dyn CacheStore>) -> Compiler {
        Compiler::new(metadata(), cache).with_source_reader(sources())
    }

    #[test]
    fn eligibility_gate_rejects_in_order() {
        let compiler = compiler(Arc::new(MemoryCacheStore::new()));
        let cases = [
            ("Acme\\Countable", Ineligible::Interface),
            ("Weft\\Tests\\BaseTestCase", Ineligible::TestCase),
            ("Acme\\Tests\\CartTest", Ineligible::TestCase),
            ("Acme\\Missing", Ineligible::UnknownClass),
            ("ArrayObject", Ineligible::Internal),
            ("Acme\\Legacy", Ineligible::ProxyDisabled),
            ("Weft\\Core\\Bootstrap", Ineligible::ExcludedNamespace),
            ("Acme\\Annotations\\Audit", Ineligible::AnnotationClass),
        ];
        for (class_name, reason) in cases {
            assert_eq!(compiler.check_eligibility(class_name), Err(reason), "{class_name}");
        }
        assert_eq!(compiler.check_eligibility("Acme\\FinalService"), Ok(()));
        assert_eq!(compiler.check_eligibility("\\Acme\\Cart"), Ok(()));
    }

    #[test]
    fn proxy_models_are_memoized() {
        let mut compiler = compiler(Arc::new(MemoryCacheStore::new()));
        let first: *const ProxyClass = compiler.proxy_class("Acme\\Cart").unwrap();
        let second: *const ProxyClass = compiler.proxy_class("\\Acme\\Cart").unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(compiler.proxy_classes().count(), 1);
        assert!(compiler.proxy_class("Acme\\Countable").is_none());
    }

    #[test]
    fn cache_entry_ignored_while_proxy_is_in_progress() {
        let mut cache = MockCacheStore::new();
        cache.expect_has().times(1).returning(|key| key == "Acme_Order");

        let mut compiler = compiler(Arc::new(cache));
        compiler.proxy_class("Acme\\Cart");

        assert!(!compiler.has_cache_entry("Acme\\Cart"));
        assert!(compiler.has_cache_entry("Acme\\Order"));
    }

    #[test]
    fn compile_stores_rendered_proxies_and_keeps_cached_ones() {
        let cache = Arc::new(MemoryCacheStore::new());
        cache.set("Acme_Order", "stale").unwrap();
        let mut compiler = compiler(cache.clone());
        compiler
            .proxy_class("Acme\\Cart")
            .unwrap()
            .method("total")
            .add_pre_parent_call_code("        $this->log();\n");

        let registry = ClassRegistry::new().with_package("Acme", ["Acme\\Cart", "Acme\\Order", "Acme\\Orphan"]);
        assert_eq!(compiler.compile(&registry).unwrap(), 1);

        let entry = cache.get("Acme_Cart").unwrap();
        assert!(entry.starts_with("namespace Acme;\n\nclass Cart_Original\n"));
        assert!(entry.contains("# Start of Weft generated Proxy code"));
        assert!(entry.contains("        $this->log();\n        return parent::total();\n"));
        assert!(entry.ends_with("# PathAndFilename: /app/Acme/Cart.php"));

        assert_eq!(
            compiler.stored_classes().keys().collect::<Vec<_>>(),
            vec!["Acme_Cart", "Acme_Order"]
        );
        assert!(compiler.stored_class_manifest().contains("  'Acme_Order' => true,\n"));
    }

    #[test]
    fn empty_proxy_is_neither_stored_nor_listed() {
        let mut cache = MockCacheStore::new();
        cache.expect_set().never();
        cache.expect_has().never();

        let mut compiler = compiler(Arc::new(cache));
        compiler.proxy_class("Acme\\Cart").unwrap().method("total");

        let registry = ClassRegistry::new().with_package("Acme", ["Acme\\Cart"]);
        assert_eq!(compiler.compile(&registry).unwrap(), 0);
        assert!(compiler.stored_classes().is_empty());
    }

    #[test]
    fn file_name_mismatch_aborts_compile() {
        let mut compiler = compiler(Arc::new(MemoryCacheStore::new()));
        compiler
            .proxy_class("Acme\\Order")
            .unwrap()
            .method("ship")
            .add_post_parent_call_code("        $this->notify();\n");

        let registry = ClassRegistry::new().with_package("Acme", ["Acme\\Order"]);
        let err = compiler.compile(&registry).unwrap_err();
        assert!(matches!(err, CompilerError::Build(BuildError::ClassNameMismatch { .. })));
    }

    #[test]
    fn missing_source_path_aborts_compile() {
        let mut compiler = compiler(Arc::new(MemoryCacheStore::new()));
        compiler
            .proxy_class("Acme\\Orphan")
            .unwrap()
            .method("run")
            .add_pre_parent_call_code("        x();\n");

        let registry = ClassRegistry::new().with_package("Acme", ["Acme\\Orphan"]);
        let err = compiler.compile(&registry).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::Source(SourceError::MissingSourcePath { ref class_name }) if class_name == "Acme\\Orphan"
        ));
    }
}
