//! Mixing the serialization hooks into generated wrappers

use weft_model::{LiteralValue, ProxyClass};

/// Trait providing the runtime side of the hooks in generated code
pub const OBJECT_SERIALIZATION_TRAIT: &str = "\\Weft\\ObjectManagement\\Proxy\\ObjectSerializationTrait";

/// Add the serialization trait plus `__sleep` and `__wakeup` advice
///
/// Classes declaring their own `__sleep` handle serialization themselves
/// and are left alone. Returns whether the hooks were added.
pub fn weave_serialization_hooks(proxy: &mut ProxyClass, transient_fields: &[&str]) -> bool {
    if proxy
        .metadata()
        .has_method(proxy.full_original_class_name(), "__sleep")
    {
        tracing::debug!(
            "Not adding serialization hooks to {}, it declares __sleep",
            proxy.full_original_class_name()
        );
        return false;
    }

    let transient = LiteralValue::list(
        transient_fields
            .iter()
            .map(|name| LiteralValue::String((*name).to_string())),
    );

    proxy.add_traits([OBJECT_SERIALIZATION_TRAIT]);
    proxy.method("__sleep").add_post_parent_call_code(format!(
        "        $this->Weft_Object_PropertiesToSerialize = array();\n\n        $transientProperties = {};\n        $result = $this->Weft_serializeRelatedEntities($transientProperties);\n",
        transient.render()
    ));
    proxy
        .method("__wakeup")
        .add_pre_parent_call_code("\n        $this->Weft_setRelatedEntities();\n");
    true
}
