//! Light nodes and the lights manager

use cgmath::Vector3;

use super::parameters::{add_param, add_ranged_param, add_sg_param};
use crate::device::ObjectKind;
use crate::error::{Result, SgError};
use crate::sg::factory::{self, NodeConstructor};
use crate::sg::node::{Node, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::Value;

/// Light types known to the factory, as used in `light_<type>` subtypes
pub const LIGHT_TYPES: [&str; 3] = ["ambient", "distant", "sphere"];

fn light(name: &str, kind: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, &format!("light_{kind}"), NodeType::Light)
        .with_object(ObjectKind::Light, kind)
        .with_description(&format!("{kind} light"))
        .build();

    add_ranged_param(
        &node,
        "intensity",
        "float",
        1.0f32,
        (Value::Float(0.0), Value::Float(100.0)),
        "radiance scale",
    )?;
    add_param(&node, "color", "rgb", Vector3::new(1.0f32, 1.0, 1.0), "light color")?;
    add_param(&node, "visible", "bool", true, "whether the light is seen by camera rays")?;

    match kind {
        "distant" => {
            add_param(&node, "direction", "vec3f", Vector3::new(0.0f32, 0.0, 1.0), "direction the light travels")?;
            add_ranged_param(
                &node,
                "angularDiameter",
                "float",
                0.0f32,
                (Value::Float(0.0), Value::Float(180.0)),
                "apparent size in degrees",
            )?;
        }
        "sphere" => {
            add_param(&node, "position", "vec3f", Vector3::new(0.0f32, 0.0, 0.0), "center of the light")?;
            add_ranged_param(
                &node,
                "radius",
                "float",
                0.0f32,
                (Value::Float(0.0), Value::Float(100.0)),
                "0 gives a point light",
            )?;
        }
        _ => {}
    }
    Ok(node)
}

fn lights(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "lights", NodeType::Lights)
        .with_description("lights attached to the world")
        .build();
    add_sg_param(&node, "enabled", "bool", true, "include these lights in the scene")?;
    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("light_ambient", |name| light(name, "ambient")));
    table.push(("light_distant", |name| light(name, "distant")));
    table.push(("light_sphere", |name| light(name, "sphere")));
    table.push(("lights", lights));
}

/// Typed view over a `lights` node
///
/// Lights are children of the manager node; attaching the manager under a
/// world makes them part of the rendered scene.
#[derive(Debug, Clone)]
pub struct LightsManager {
    node: NodePtr,
}

impl LightsManager {
    pub fn new() -> Result<Self> {
        Self::from_node(factory::create_node("lights", "lights")?)
    }

    pub fn from_node(node: NodePtr) -> Result<Self> {
        if node.node_type() != NodeType::Lights {
            return Err(SgError::WrongNodeType {
                node: node.name().to_string(),
                expected: NodeType::Lights,
                actual: node.node_type(),
            });
        }
        Ok(Self { node })
    }

    pub fn node(&self) -> &NodePtr {
        &self.node
    }

    /// Adds a light of `light_type`; false if a light called `name` exists
    pub fn add_light(&self, name: &str, light_type: &str) -> Result<bool> {
        if self.node.has_child(name) {
            log::warn!("light '{name}' already exists");
            return Ok(false);
        }
        self.node.create_child(name, &format!("light_{light_type}"))?;
        log::info!("added {light_type} light '{name}'");
        Ok(true)
    }

    pub fn remove_light(&self, name: &str) -> bool {
        let is_light = self
            .node
            .try_child(name)
            .is_some_and(|c| c.node_type() == NodeType::Light);
        is_light && self.node.remove(name).is_some()
    }

    pub fn light_names(&self) -> Vec<String> {
        self.node
            .children()
            .iter()
            .filter(|c| c.node_type() == NodeType::Light)
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Attaches the lights to `world`
    pub fn update_world(&self, world: &Node) -> Result<()> {
        if world.node_type() != NodeType::World {
            return Err(SgError::WrongNodeType {
                node: world.name().to_string(),
                expected: NodeType::World,
                actual: world.node_type(),
            });
        }
        world.add(self.node.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::factory::create_node;

    #[test]
    fn test_add_and_remove_lights() {
        let manager = LightsManager::new().unwrap();
        assert!(manager.add_light("sun", "distant").unwrap());
        assert!(manager.add_light("fill", "ambient").unwrap());
        assert!(!manager.add_light("sun", "ambient").unwrap());
        assert_eq!(manager.light_names(), vec!["sun", "fill"]);

        assert!(manager.add_light("bad", "laser").is_err());
        // The `enabled` flag is not a light
        assert!(!manager.remove_light("enabled"));
        assert!(manager.remove_light("sun"));
        assert!(!manager.remove_light("sun"));
        assert_eq!(manager.light_names(), vec!["fill"]);
    }

    #[test]
    fn test_update_world_attaches_once() {
        let manager = LightsManager::new().unwrap();
        let world = create_node("world", "world").unwrap();
        manager.update_world(&world).unwrap();
        manager.update_world(&world).unwrap();
        assert_eq!(world.num_children(), 1);

        let other = create_node("world2", "world").unwrap();
        assert!(matches!(
            manager.update_world(&other),
            Err(SgError::AlreadyParented { .. })
        ));
        assert!(matches!(
            manager.update_world(&create_node("x", "node").unwrap()),
            Err(SgError::WrongNodeType { .. })
        ));
    }
}
