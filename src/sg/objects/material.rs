//! Material nodes
//!
//! A geometry uses a material by holding it as a child node; the scene
//! assembly pass binds it to the geometry's model. `obj` works with every
//! renderer, `principled` is only shaded by the path tracer.

use cgmath::Vector3;

use super::parameters::{add_param, add_ranged_param};
use crate::device::ObjectKind;
use crate::error::{Result, SgError};
use crate::sg::factory::{self, NodeConstructor};
use crate::sg::node::{Node, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::Value;

fn unit_range() -> (Value, Value) {
    (Value::Float(0.0), Value::Float(1.0))
}

fn obj(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "material_obj", NodeType::Material)
        .with_object(ObjectKind::Material, "obj")
        .with_description("Wavefront OBJ style material")
        .build();
    add_param(&node, "kd", "rgb", Vector3::new(0.8f32, 0.8, 0.8), "diffuse color")?;
    add_param(&node, "ks", "rgb", Vector3::new(0.0f32, 0.0, 0.0), "specular color")?;
    add_ranged_param(
        &node,
        "ns",
        "float",
        10.0f32,
        (Value::Float(2.0), Value::Float(10000.0)),
        "specular exponent",
    )?;
    add_ranged_param(&node, "d", "float", 1.0f32, unit_range(), "opacity")?;
    Ok(node)
}

fn principled(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "material_principled", NodeType::Material)
        .with_object(ObjectKind::Material, "principled")
        .with_description("physically based material")
        .build();
    add_param(&node, "baseColor", "rgb", Vector3::new(0.8f32, 0.8, 0.8), "base color")?;
    add_ranged_param(&node, "metallic", "float", 0.0f32, unit_range(), "metallic amount")?;
    add_ranged_param(&node, "roughness", "float", 0.0f32, unit_range(), "surface roughness")?;
    add_ranged_param(&node, "opacity", "float", 1.0f32, unit_range(), "cut-out opacity")?;
    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("material_obj", obj));
    table.push(("material_principled", principled));
}

/// The material child of `geometry`, if it has one
pub fn material_of(geometry: &Node) -> Option<NodePtr> {
    geometry
        .children()
        .into_iter()
        .find(|c| c.node_type() == NodeType::Material)
}

/// Gives `geometry` a new material of `subtype`, replacing the previous one
pub fn assign_material(geometry: &Node, subtype: &str) -> Result<NodePtr> {
    if geometry.node_type() != NodeType::Geometry {
        return Err(SgError::WrongNodeType {
            node: geometry.name().to_string(),
            expected: NodeType::Geometry,
            actual: geometry.node_type(),
        });
    }
    let material = factory::create_node("material", subtype)?;
    if material.node_type() != NodeType::Material {
        return Err(SgError::WrongNodeType {
            node: material.name().to_string(),
            expected: NodeType::Material,
            actual: material.node_type(),
        });
    }
    if let Some(previous) = material_of(geometry) {
        geometry.remove(previous.name());
    }
    geometry.add(material)
}
