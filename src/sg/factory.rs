//! Node factory
//!
//! Maps subtype strings (`"float"`, `"camera_perspective"`, ...) to node
//! constructors. The registry is process-wide, filled with the built-in
//! subtypes on first use and open for extension through
//! [`register_node_factory`].

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::node::{NodeBuilder, NodePtr, NodeType};
use super::objects;
use super::value::{DataArray, Value};
use crate::error::{Result, SgError};

/// Builds a node called `name`
pub type NodeConstructor = fn(&str) -> Result<NodePtr>;

static REGISTRY: OnceLock<RwLock<HashMap<String, NodeConstructor>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, NodeConstructor>> {
    REGISTRY.get_or_init(|| {
        let builtins = objects::builtin_factories();
        log::debug!("registering {} built-in node subtypes", builtins.len());
        RwLock::new(
            builtins
                .into_iter()
                .map(|(subtype, ctor)| (subtype.to_string(), ctor))
                .collect(),
        )
    })
}

/// Registers `ctor` for `subtype`, returning the constructor it replaced
pub fn register_node_factory(subtype: &str, ctor: NodeConstructor) -> Option<NodeConstructor> {
    let previous = registry().write().insert(subtype.to_string(), ctor);
    if previous.is_some() {
        log::info!("node subtype '{subtype}' re-registered");
    }
    previous
}

pub fn is_registered(subtype: &str) -> bool {
    registry().read().contains_key(subtype)
}

/// All registered subtypes, sorted
pub fn registered_subtypes() -> Vec<String> {
    let mut subtypes: Vec<_> = registry().read().keys().cloned().collect();
    subtypes.sort();
    subtypes
}

/// Creates a node of `subtype` called `name`
pub fn create_node(name: &str, subtype: &str) -> Result<NodePtr> {
    // Copy the constructor out so nested creation does not re-enter the lock
    let ctor = registry()
        .read()
        .get(subtype)
        .copied()
        .ok_or_else(|| SgError::UnknownSubtype(subtype.to_string()))?;
    ctor(name)
}

/// Creates a node and assigns its initial value
///
/// The value must match the kind the subtype declares.
pub fn create_node_with_value(name: &str, subtype: &str, value: impl Into<Value>) -> Result<NodePtr> {
    let node = create_node(name, subtype)?;
    node.set_value(value)?;
    Ok(node)
}

/// Creates a renderer-visible data node, subtype `DataVector<element>`
pub fn create_data_node(name: &str, data: impl Into<DataArray>) -> NodePtr {
    let data = data.into();
    let subtype = data_subtype(&data);
    NodeBuilder::new(name, subtype, NodeType::Parameter)
        .with_value(data)
        .build()
}

pub(crate) fn data_subtype(data: &DataArray) -> &'static str {
    match data {
        DataArray::Float(_) => "DataVector1f",
        DataArray::UInt(_) => "DataVector1ui",
        DataArray::Vec2f(_) => "DataVector2f",
        DataArray::Vec3f(_) => "DataVector3f",
        DataArray::Vec4f(_) => "DataVector4f",
        DataArray::Vec3ui(_) => "DataVector3ui",
        DataArray::Objects(_) => "DataVectorObject",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::value::{DataKind, ValueKind};
    use cgmath::vec2;

    fn custom_marker(name: &str) -> Result<NodePtr> {
        Ok(NodeBuilder::new(name, "test_marker", NodeType::Generic)
            .with_value("marker")
            .build())
    }

    #[test]
    fn test_unknown_subtype_is_an_error() {
        assert!(matches!(
            create_node("x", "no_such_subtype"),
            Err(SgError::UnknownSubtype(s)) if s == "no_such_subtype"
        ));
    }

    #[test]
    fn test_builtin_parameters_have_declared_kind() {
        for (subtype, kind) in [
            ("bool", ValueKind::Bool),
            ("int", ValueKind::Int),
            ("float", ValueKind::Float),
            ("vec2i", ValueKind::Vec2i),
            ("vec3f", ValueKind::Vec3f),
            ("rgba", ValueKind::Vec4f),
            ("string", ValueKind::String),
            ("affine3f", ValueKind::Affine),
            ("DataVector4f", ValueKind::Data(DataKind::Vec4f)),
        ] {
            let node = create_node("p", subtype).unwrap();
            assert_eq!(node.value().kind(), kind, "subtype {subtype}");
            assert_eq!(node.node_type(), NodeType::Parameter);
        }
    }

    #[test]
    fn test_value_must_match_subtype() {
        let ok = create_node_with_value("size", "vec2i", vec2(640, 480)).unwrap();
        assert_eq!(ok.value_as::<cgmath::Vector2<i32>>().unwrap(), vec2(640, 480));
        assert!(matches!(
            create_node_with_value("size", "vec2i", 3.0f32),
            Err(SgError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_data_value_must_match_element_type() {
        let err = create_node_with_value("c", "DataVector4f", vec![1u32, 2]).unwrap_err();
        assert!(matches!(
            err,
            SgError::TypeMismatch {
                expected: ValueKind::Data(DataKind::Vec4f),
                actual: ValueKind::Data(DataKind::UInt),
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "node 'c': got a data<uint> value, expected data<vec4f>"
        );
    }

    #[test]
    fn test_data_nodes_pick_subtype_from_elements() {
        let node = create_data_node("index", vec![1u32, 2, 3]);
        assert_eq!(node.subtype(), "DataVector1ui");
        assert_eq!(node.value_as::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_custom_factories_can_be_registered() {
        assert!(register_node_factory("test_marker", custom_marker).is_none());
        assert!(is_registered("test_marker"));
        assert!(registered_subtypes().contains(&"test_marker".to_string()));
        let node = create_node("m", "test_marker").unwrap();
        assert_eq!(node.value_as::<String>().unwrap(), "marker");
    }
}
