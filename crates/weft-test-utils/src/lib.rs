//! Testing utilities for Weft workspace
//!
//! Shared fixtures: a small shop domain as metadata snapshot, the matching
//! original sources, and an in-memory source reader.

#![allow(missing_docs)]

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use weft_compiler::{CacheStore, Compiler, SourceError, SourceReader};
use weft_model::{
    Annotation, AnnotationValue, ClassMetadata, LiteralValue, MethodMetadata, ParameterInfo,
    StaticMetadata,
};

pub const CART_PATH: &str = "/app/Packages/Acme.Shop/Classes/Cart.php";
pub const PRODUCT_PATH: &str = "/app/Packages/Acme.Shop/Classes/Product.php";
pub const REGISTRY_PATH: &str = "/app/Packages/Acme.Shop/Classes/PriceRegistry.php";

pub const CART_SOURCE: &str = r"<?php
namespace Acme\Shop;

use Acme\Shop\Product;

/**
 * Shopping cart
 */
class Cart
{
    protected $items = [];

    /**
     * Adds a product
     */
    final public function add(Product $product, int $quantity = 1): void
    {
        $this->items[] = [$product, $quantity];
    }

    public function total(): float
    {
        return 0.0;
    }

    final public function clear(): void
    {
        $this->items = [];
    }
}
";

pub const PRODUCT_SOURCE: &str = r"<?php
namespace Acme\Shop;

final class Product
{
    public function __construct(string $sku)
    {
    }
}
";

pub const REGISTRY_SOURCE: &str = r"<?php
namespace Acme\Shop;

class PriceRegistry
{
    private function __construct()
    {
    }
}
?>
";

/// Metadata of the shop fixture classes
pub fn sample_metadata() -> StaticMetadata {
    StaticMetadata::new()
        .with_class(ClassMetadata::interface("Acme\\Shop\\Sellable"))
        .with_class(
            ClassMetadata::class("Acme\\Shop\\Cart")
                .with_doc_comment("/**\n * Shopping cart\n */")
                .with_attribute(
                    Annotation::new("Weft\\Annotations\\Scope")
                        .with_argument("value", AnnotationValue::String("session".into()))
                        .with_default("value", AnnotationValue::String("prototype".into())),
                )
                .with_source_path(CART_PATH)
                .with_method(
                    MethodMetadata::new("add")
                        .final_method()
                        .returns("void")
                        .with_doc_comment("/**\n     * Adds a product\n     */")
                        .with_parameter("product", ParameterInfo::class(0, "Acme\\Shop\\Product"))
                        .with_parameter(
                            "quantity",
                            ParameterInfo::scalar(0, "int").with_default(LiteralValue::Int(1)),
                        ),
                )
                .with_method(MethodMetadata::new("total").returns("float"))
                .with_method(MethodMetadata::new("clear").final_method().returns("void")),
        )
        .with_class(
            ClassMetadata::class("Acme\\Shop\\Product")
                .final_class()
                .with_interface("Acme\\Shop\\Sellable")
                .with_source_path(PRODUCT_PATH)
                .with_method(
                    MethodMetadata::new("__construct")
                        .with_parameter("sku", ParameterInfo::scalar(0, "string")),
                ),
        )
        .with_class(
            ClassMetadata::class("Acme\\Shop\\PriceRegistry")
                .with_source_path(REGISTRY_PATH)
                .with_method(MethodMetadata::new("__construct").private()),
        )
}

/// Source reader over in-memory files
#[derive(Debug, Default)]
pub struct MemorySourceReader {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader holding the shop fixture sources
    pub fn with_samples() -> Self {
        let reader = Self::new();
        reader.insert(CART_PATH, CART_SOURCE);
        reader.insert(PRODUCT_PATH, PRODUCT_SOURCE);
        reader.insert(REGISTRY_PATH, REGISTRY_SOURCE);
        reader
    }

    pub fn insert(&self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.write().insert(path.into(), source.into());
    }
}

impl SourceReader for MemorySourceReader {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        self.files.read().get(path).cloned().ok_or_else(|| {
            SourceError::io_error(path, std::io::Error::from(std::io::ErrorKind::NotFound))
        })
    }
}

/// Compiler over the shop fixtures and the given cache
pub fn setup_compiler(cache: Arc<dyn CacheStore>) -> Compiler {
    Compiler::new(Arc::new(sample_metadata()), cache)
        .with_source_reader(Arc::new(MemorySourceReader::with_samples()))
}
