//! World, framebuffer and transform nodes

use cgmath::{Deg, Matrix4, SquareMatrix, Vector2, Vector3};

use super::parameters::{add_param, add_sg_param};
use crate::device::ObjectKind;
use crate::error::Result;
use crate::sg::factory::NodeConstructor;
use crate::sg::node::{Node, NodeBehavior, NodeBuilder, NodePtr, NodeType};

fn world(name: &str) -> Result<NodePtr> {
    Ok(NodeBuilder::new(name, "world", NodeType::World)
        .with_object(ObjectKind::World, "")
        .with_description("root of the renderable scene")
        .build())
}

fn framebuffer(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "framebuffer", NodeType::FrameBuffer)
        .with_object(ObjectKind::FrameBuffer, "")
        .build();
    add_param(&node, "size", "vec2i", Vector2::new(1024, 768), "framebuffer size in pixels")?
        .set_read_only(true);
    add_param(&node, "colorFormat", "string", "sRGB", "pixel format of the color channel")?;
    add_param(&node, "accumulation", "bool", true, "accumulate samples over frames")?;
    add_param(&node, "depth", "bool", false, "allocate a depth channel")?;
    Ok(node)
}

/// Recomposes the transform value from its TRS children when one of them
/// was set after the value itself
struct TransformBehavior;

impl NodeBehavior for TransformBehavior {
    fn pre_commit(&self, node: &Node) -> Result<()> {
        let parts = ["translation", "rotation", "scale"].map(|name| node.try_child(name));
        let newest_part = parts
            .iter()
            .flatten()
            .map(|c| c.last_value_edit())
            .max();
        match newest_part {
            Some(stamp) if stamp > node.last_value_edit() => {
                let xfm = compose_trs(
                    node.child_value_as("translation")?,
                    node.child_value_as("rotation")?,
                    node.child_value_as("scale")?,
                );
                node.set_value(xfm)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// `T * Rz * Ry * Rx * S`, rotation given as Euler angles in degrees
pub fn compose_trs(translation: Vector3<f32>, rotation: Vector3<f32>, scale: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(translation)
        * Matrix4::from_angle_z(Deg(rotation.z))
        * Matrix4::from_angle_y(Deg(rotation.y))
        * Matrix4::from_angle_x(Deg(rotation.x))
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

fn transform(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "transform", NodeType::Transform)
        .with_value(Matrix4::<f32>::identity())
        .with_behavior(TransformBehavior)
        .with_description("affine transform applied to everything below")
        .build();
    add_sg_param(&node, "translation", "vec3f", Vector3::new(0.0f32, 0.0, 0.0), "translation")?;
    add_sg_param(&node, "rotation", "vec3f", Vector3::new(0.0f32, 0.0, 0.0), "Euler angles in degrees")?;
    add_sg_param(&node, "scale", "vec3f", Vector3::new(1.0f32, 1.0, 1.0), "per-axis scale")?;
    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("world", world));
    table.push(("framebuffer", framebuffer));
    table.push(("transform", transform));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, RenderDevice};
    use crate::sg::factory::{create_node, create_node_with_value};
    use crate::sg::visitors::{CommitVisitor, MarkAllAsModified};
    use cgmath::{vec3, Vector4};
    use std::sync::Arc;

    #[test]
    fn test_trs_edit_recomposes_value() {
        let xfm = create_node("xfm", "transform").unwrap();
        xfm.set_child_value("translation", vec3(1.0f32, 2.0, 3.0)).unwrap();
        TransformBehavior.pre_commit(&xfm).unwrap();

        let m: Matrix4<f32> = xfm.value_as().unwrap();
        assert_eq!(m.w, Vector4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_explicit_value_survives_commit() {
        let explicit = Matrix4::from_scale(2.0f32);
        let xfm = create_node_with_value("xfm", "transform", explicit).unwrap();
        TransformBehavior.pre_commit(&xfm).unwrap();
        assert_eq!(xfm.value_as::<Matrix4<f32>>().unwrap(), explicit);

        let fresh = create_node("fresh", "transform").unwrap();
        TransformBehavior.pre_commit(&fresh).unwrap();
        assert_eq!(fresh.value_as::<Matrix4<f32>>().unwrap(), Matrix4::identity());
    }

    #[test]
    fn test_forced_recommit_keeps_explicit_value() {
        let device: Arc<dyn RenderDevice> = Arc::new(HeadlessDevice::new());
        let world = create_node("world", "world").unwrap();
        let explicit = Matrix4::from_scale(2.0f32);
        let xfm = world.create_child_with_value("xfm", "transform", explicit).unwrap();

        world.traverse(&mut CommitVisitor::new(device.clone())).unwrap();
        world.traverse(&mut MarkAllAsModified).unwrap();
        world.traverse(&mut CommitVisitor::new(device.clone())).unwrap();
        assert_eq!(xfm.value_as::<Matrix4<f32>>().unwrap(), explicit);

        // A later TRS edit still takes over, and survives the next forced commit
        xfm.set_child_value("translation", vec3(0.0f32, 5.0, 0.0)).unwrap();
        world.traverse(&mut CommitVisitor::new(device.clone())).unwrap();
        world.traverse(&mut MarkAllAsModified).unwrap();
        world.traverse(&mut CommitVisitor::new(device)).unwrap();
        let m: Matrix4<f32> = xfm.value_as().unwrap();
        assert_eq!(m.w, Vector4::new(0.0, 5.0, 0.0, 1.0));
        assert_eq!(m.x.x, 1.0);
    }

    #[test]
    fn test_compose_order_scales_before_translating() {
        let m = compose_trs(vec3(10.0, 0.0, 0.0), vec3(0.0, 0.0, 0.0), vec3(2.0, 2.0, 2.0));
        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vector4::new(12.0, 0.0, 0.0, 1.0));
    }
}
