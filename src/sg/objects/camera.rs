//! Camera nodes

use cgmath::{InnerSpace, Point3, Vector3};

use super::parameters::{add_param, add_ranged_param};
use crate::device::ObjectKind;
use crate::error::Result;
use crate::sg::factory::NodeConstructor;
use crate::sg::node::{Node, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::Value;

fn camera(name: &str, kind: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, &format!("camera_{kind}"), NodeType::Camera)
        .with_object(ObjectKind::Camera, kind)
        .with_description(&format!("{kind} camera"))
        .build();

    add_param(&node, "position", "vec3f", Vector3::new(0.0f32, 0.0, 0.0), "eye position")?;
    add_param(&node, "direction", "vec3f", Vector3::new(0.0f32, 0.0, 1.0), "viewing direction")?;
    add_param(&node, "up", "vec3f", Vector3::new(0.0f32, 1.0, 0.0), "up vector")?;
    add_ranged_param(
        &node,
        "aspect",
        "float",
        1.0f32,
        (Value::Float(0.01), Value::Float(100.0)),
        "width over height of the image",
    )?;

    match kind {
        "perspective" => {
            add_ranged_param(
                &node,
                "fovy",
                "float",
                60.0f32,
                (Value::Float(0.1), Value::Float(180.0)),
                "vertical field of view in degrees",
            )?;
            add_ranged_param(
                &node,
                "apertureRadius",
                "float",
                0.0f32,
                (Value::Float(0.0), Value::Float(10.0)),
                "lens aperture for depth of field",
            )?;
            add_param(&node, "focusDistance", "float", 1.0f32, "distance of the focal plane")?;
        }
        _ => {
            add_ranged_param(
                &node,
                "height",
                "float",
                1.0f32,
                (Value::Float(0.001), Value::Float(1000.0)),
                "height of the image plane in world units",
            )?;
        }
    }

    Ok(node)
}

/// Points a camera node at `target`
///
/// Sets `position`, `direction` and `up`; `up` is re-orthogonalized against
/// the view direction.
pub fn look_at(camera: &Node, eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Result<()> {
    let direction = (target - eye).normalize();
    let right = direction.cross(up);
    let up = if right.magnitude2() > f32::EPSILON {
        right.cross(direction).normalize()
    } else {
        up
    };
    camera.set_child_value("position", Vector3::new(eye.x, eye.y, eye.z))?;
    camera.set_child_value("direction", direction)?;
    camera.set_child_value("up", up)?;
    Ok(())
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("camera_perspective", |name| camera(name, "perspective")));
    table.push(("camera_orthographic", |name| camera(name, "orthographic")));
}
