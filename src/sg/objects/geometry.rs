//! Geometry and volume nodes
//!
//! Geometries and volumes are renderer objects on their own; the scene
//! assembly pass wraps them into models, groups and instances. Their
//! `visible` flag and the model-level parameters are scene graph only; a
//! geometry's material is a child node, see [`super::material`].

use cgmath::Vector3;

use super::parameters::{add_param, add_ranged_param, add_sg_param};
use super::transfer_function::TransferFunction;
use crate::device::ObjectKind;
use crate::error::Result;
use crate::sg::factory::{create_data_node, NodeConstructor};
use crate::sg::node::{NodeBuilder, NodePtr, NodeType};
use crate::sg::value::{DataArray, Value};

fn triangles(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "geometry_triangles", NodeType::Geometry)
        .with_object(ObjectKind::Geometry, "mesh")
        .with_description("indexed triangle mesh")
        .build();
    node.add(create_data_node("vertex.position", DataArray::Vec3f(Vec::new())))?;
    node.add(create_data_node("index", DataArray::Vec3ui(Vec::new())))?;
    add_sg_param(&node, "visible", "bool", true, "include in the rendered scene")?;
    Ok(node)
}

fn spheres(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "geometry_spheres", NodeType::Geometry)
        .with_object(ObjectKind::Geometry, "sphere")
        .with_description("spheres of uniform radius")
        .build();
    node.add(create_data_node("sphere.position", DataArray::Vec3f(Vec::new())))?;
    add_ranged_param(
        &node,
        "radius",
        "float",
        1.0f32,
        (Value::Float(0.0), Value::Float(1000.0)),
        "sphere radius",
    )?;
    add_sg_param(&node, "visible", "bool", true, "include in the rendered scene")?;
    Ok(node)
}

fn structured_volume(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "volume_structured", NodeType::Volume)
        .with_object(ObjectKind::Volume, "structuredRegular")
        .with_description("regular grid of scalar samples")
        .build();
    node.add(create_data_node("data", DataArray::Float(Vec::new())))?;
    add_param(&node, "dimensions", "vec3i", Vector3::new(0, 0, 0), "grid size in samples")?;
    add_param(&node, "gridOrigin", "vec3f", Vector3::new(0.0f32, 0.0, 0.0), "position of the first sample")?;
    add_param(&node, "gridSpacing", "vec3f", Vector3::new(1.0f32, 1.0, 1.0), "distance between samples")?;

    add_sg_param(&node, "visible", "bool", true, "include in the rendered scene")?;
    add_sg_param(&node, "densityScale", "float", 1.0f32, "scales the volume's opacity")?
        .set_min_max(0.0f32, 100.0f32);

    // Belongs to the volumetric model, not the volume object
    let tfn = node.add(TransferFunction::new("transferFunction")?.into_node())?;
    tfn.set_sg_only(true);
    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("geometry_triangles", triangles));
    table.push(("geometry_spheres", spheres));
    table.push(("volume_structured", structured_volume));
}
