//! Parameter and data node constructors

use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3, Vector4, Zero};

use crate::error::Result;
use crate::sg::factory::NodeConstructor;
use crate::sg::node::{Node, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::{DataArray, Value};

/// A parameter node holding `value`
pub(crate) fn parameter(name: &str, subtype: &str, value: impl Into<Value>) -> NodePtr {
    NodeBuilder::new(name, subtype, NodeType::Parameter)
        .with_value(value)
        .build()
}

/// Attaches a described parameter to `parent`
pub(crate) fn add_param(
    parent: &Node,
    name: &str,
    subtype: &str,
    value: impl Into<Value>,
    description: &str,
) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, subtype, NodeType::Parameter)
        .with_value(value)
        .with_description(description)
        .build();
    parent.add(node)
}

/// Like [`add_param`], with a UI range
pub(crate) fn add_ranged_param(
    parent: &Node,
    name: &str,
    subtype: &str,
    value: impl Into<Value>,
    range: (Value, Value),
    description: &str,
) -> Result<NodePtr> {
    let node = add_param(parent, name, subtype, value, description)?;
    node.set_min_max(range.0, range.1);
    Ok(node)
}

/// Like [`add_param`], hidden from the renderer
pub(crate) fn add_sg_param(
    parent: &Node,
    name: &str,
    subtype: &str,
    value: impl Into<Value>,
    description: &str,
) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, subtype, NodeType::Parameter)
        .with_value(value)
        .with_description(description)
        .sg_only()
        .build();
    parent.add(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("node", |name| {
        Ok(NodeBuilder::new(name, "node", NodeType::Generic).build())
    }));
    table.push(("bool", |name| Ok(parameter(name, "bool", false))));
    table.push(("int", |name| Ok(parameter(name, "int", 0))));
    table.push(("float", |name| Ok(parameter(name, "float", 0.0f32))));
    table.push(("vec2i", |name| {
        Ok(parameter(name, "vec2i", Vector2::<i32>::zero()))
    }));
    table.push(("vec2f", |name| {
        Ok(parameter(name, "vec2f", Vector2::<f32>::zero()))
    }));
    table.push(("vec3i", |name| {
        Ok(parameter(name, "vec3i", Vector3::<i32>::zero()))
    }));
    table.push(("vec3f", |name| {
        Ok(parameter(name, "vec3f", Vector3::<f32>::zero()))
    }));
    table.push(("vec4f", |name| {
        Ok(parameter(name, "vec4f", Vector4::<f32>::zero()))
    }));
    table.push(("rgb", |name| {
        Ok(parameter(name, "rgb", Vector3::new(1.0f32, 1.0, 1.0)))
    }));
    table.push(("rgba", |name| {
        Ok(parameter(name, "rgba", Vector4::new(1.0f32, 1.0, 1.0, 1.0)))
    }));
    table.push(("string", |name| Ok(parameter(name, "string", String::new()))));
    table.push(("affine3f", |name| {
        Ok(parameter(name, "affine3f", Matrix4::<f32>::identity()))
    }));
    table.push(("DataVector1f", |name| {
        Ok(parameter(name, "DataVector1f", DataArray::Float(Vec::new())))
    }));
    table.push(("DataVector1ui", |name| {
        Ok(parameter(name, "DataVector1ui", DataArray::UInt(Vec::new())))
    }));
    table.push(("DataVector2f", |name| {
        Ok(parameter(name, "DataVector2f", DataArray::Vec2f(Vec::new())))
    }));
    table.push(("DataVector3f", |name| {
        Ok(parameter(name, "DataVector3f", DataArray::Vec3f(Vec::new())))
    }));
    table.push(("DataVector4f", |name| {
        Ok(parameter(name, "DataVector4f", DataArray::Vec4f(Vec::new())))
    }));
    table.push(("DataVector3ui", |name| {
        Ok(parameter(name, "DataVector3ui", DataArray::Vec3ui(Vec::new())))
    }));
}
