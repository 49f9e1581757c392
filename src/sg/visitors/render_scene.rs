use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use super::{TraversalContext, Visitor};
use crate::device::{ObjectHandle, ObjectKind, ObjectRef, RenderDevice};
use crate::error::{Result, SgError};
use crate::sg::node::{Node, NodeType};
use crate::sg::objects::material_of;
use crate::sg::value::{DataArray, Value};

/// Assembles the renderable scene below a world node
///
/// Geometries and volumes are wrapped into models, models sharing the same
/// accumulated transform are gathered into a group, and every group gets an
/// instance carrying that transform. Leaving the world hands the instances
/// and the enabled lights to the world object and commits it.
///
/// Run after a [`CommitVisitor`](super::CommitVisitor) pass so every
/// geometry, volume and light already has a committed object. The objects
/// created here are owned by the visitor until taken with
/// [`into_objects`](RenderScene::into_objects).
pub struct RenderScene {
    device: Arc<dyn RenderDevice>,
    xfms: Vec<Matrix4<f32>>,
    geometric_models: Vec<ObjectRef>,
    volumetric_models: Vec<ObjectRef>,
    instances: Vec<ObjectRef>,
    lights: Vec<ObjectHandle>,
    retained: Vec<ObjectRef>,
}

impl RenderScene {
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        Self {
            device,
            xfms: vec![Matrix4::identity()],
            geometric_models: Vec::new(),
            volumetric_models: Vec::new(),
            instances: Vec::new(),
            lights: Vec::new(),
            retained: Vec::new(),
        }
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }

    /// Every object the pass created; dropping them releases them
    pub fn into_objects(mut self) -> Vec<ObjectRef> {
        self.retained.append(&mut self.instances);
        self.retained
    }

    fn current_xfm(&self) -> Matrix4<f32> {
        self.xfms.last().copied().unwrap_or_else(Matrix4::identity)
    }

    fn committed_handle(node: &Node) -> Result<ObjectHandle> {
        node.handle().ok_or_else(|| {
            SgError::Device(format!("'{}' has no committed object", node.name()))
        })
    }

    fn is_visible(node: &Node) -> bool {
        node.child_value_as::<bool>("visible").unwrap_or(true)
    }

    fn add_geometric_model(&mut self, geometry: &Node) -> Result<()> {
        let model = ObjectRef::create(&self.device, ObjectKind::GeometricModel, "")?;
        model.set_param("geometry", &Value::Object(Self::committed_handle(geometry)?))?;
        if let Some(material) = material_of(geometry) {
            model.set_param("material", &Value::Object(Self::committed_handle(&material)?))?;
        }
        model.commit()?;
        self.geometric_models.push(model);
        Ok(())
    }

    fn add_volumetric_model(&mut self, volume: &Node) -> Result<()> {
        let model = ObjectRef::create(&self.device, ObjectKind::VolumetricModel, "")?;
        model.set_param("volume", &Value::Object(Self::committed_handle(volume)?))?;
        let tfn = volume.child("transferFunction")?;
        model.set_param(
            "transferFunction",
            &Value::Object(Self::committed_handle(&tfn)?),
        )?;
        let density: f32 = volume.child_value_as("densityScale")?;
        model.set_param("densityScale", &Value::Float(density))?;
        model.commit()?;
        self.volumetric_models.push(model);
        Ok(())
    }

    /// Groups the pending models under one instance with the current transform
    fn flush(&mut self) -> Result<()> {
        if self.geometric_models.is_empty() && self.volumetric_models.is_empty() {
            return Ok(());
        }

        let group = ObjectRef::create(&self.device, ObjectKind::Group, "")?;
        if !self.geometric_models.is_empty() {
            let handles = self.geometric_models.iter().map(|m| m.handle()).collect();
            group.set_param("geometry", &Value::Data(DataArray::Objects(handles)))?;
        }
        if !self.volumetric_models.is_empty() {
            let handles = self.volumetric_models.iter().map(|m| m.handle()).collect();
            group.set_param("volume", &Value::Data(DataArray::Objects(handles)))?;
        }
        group.commit()?;

        let instance = ObjectRef::create(&self.device, ObjectKind::Instance, "")?;
        instance.set_param("group", &Value::Object(group.handle()))?;
        instance.set_param("xfm", &Value::Affine(self.current_xfm()))?;
        instance.commit()?;

        self.retained.append(&mut self.geometric_models);
        self.retained.append(&mut self.volumetric_models);
        self.retained.push(group);
        self.instances.push(instance);
        Ok(())
    }

    fn finish_world(&mut self, world: &Node) -> Result<()> {
        self.flush()?;
        let handle = Self::committed_handle(world)?;
        let instances = self.instances.iter().map(|i| i.handle()).collect();
        self.device
            .set_param(handle, "instance", &Value::Data(DataArray::Objects(instances)))?;
        if self.lights.is_empty() {
            self.device.remove_param(handle, "light")?;
        } else {
            self.device.set_param(
                handle,
                "light",
                &Value::Data(DataArray::Objects(self.lights.clone())),
            )?;
        }
        self.device.commit(handle)?;
        log::debug!(
            "world '{}' rendered with {} instances and {} lights",
            world.name(),
            self.instances.len(),
            self.lights.len()
        );
        Ok(())
    }
}

impl Visitor for RenderScene {
    fn visit(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<bool> {
        match node.node_type() {
            NodeType::World | NodeType::Generic => Ok(true),
            NodeType::Transform => {
                self.flush()?;
                let xfm: Matrix4<f32> = node.value_as()?;
                let top = self.current_xfm();
                self.xfms.push(top * xfm);
                Ok(true)
            }
            NodeType::Geometry => {
                if Self::is_visible(node) {
                    self.add_geometric_model(node)?;
                }
                Ok(false)
            }
            NodeType::Volume => {
                if Self::is_visible(node) {
                    self.add_volumetric_model(node)?;
                }
                Ok(false)
            }
            NodeType::Lights => Ok(node.child_value_as::<bool>("enabled").unwrap_or(true)),
            NodeType::Light => {
                self.lights.push(Self::committed_handle(node)?);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn post_children(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<()> {
        match node.node_type() {
            NodeType::Transform => {
                self.flush()?;
                self.xfms.pop();
                Ok(())
            }
            NodeType::World => self.finish_world(node),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::sg::factory::create_node;
    use crate::sg::objects::assign_material;
    use crate::sg::visitors::CommitVisitor;
    use cgmath::{vec3, Vector4};

    fn render(world: &Node, device: &Arc<dyn RenderDevice>) -> RenderScene {
        world.traverse(&mut CommitVisitor::new(device.clone())).unwrap();
        let mut scene = RenderScene::new(device.clone());
        world.traverse(&mut scene).unwrap();
        scene
    }

    #[test]
    fn test_models_grouped_per_transform() {
        let headless = Arc::new(HeadlessDevice::new());
        let device: Arc<dyn RenderDevice> = headless.clone();

        let world = create_node("world", "world").unwrap();
        world.create_child("ground", "geometry_triangles").unwrap();
        let xfm = world.create_child("xfm", "transform").unwrap();
        xfm.set_child_value("translation", vec3(0.0f32, 5.0, 0.0)).unwrap();
        xfm.create_child("ball", "geometry_spheres").unwrap();
        xfm.create_child("cloud", "volume_structured").unwrap();

        let scene = render(&world, &device);
        assert_eq!(scene.num_instances(), 2);

        let instances = headless.objects_of_kind(ObjectKind::Instance);
        let moved = instances
            .iter()
            .filter_map(|&h| match headless.param(h, "xfm") {
                Some(Value::Affine(m)) => Some(m),
                _ => None,
            })
            .find(|m| m.w != Vector4::new(0.0, 0.0, 0.0, 1.0))
            .unwrap();
        assert_eq!(moved.w, Vector4::new(0.0, 5.0, 0.0, 1.0));

        let world_instances = headless.param(world.handle().unwrap(), "instance");
        assert!(matches!(world_instances, Some(Value::Data(DataArray::Objects(v))) if v.len() == 2));
        assert_eq!(headless.objects_of_kind(ObjectKind::VolumetricModel).len(), 1);
    }

    #[test]
    fn test_hidden_geometry_and_disabled_lights_are_skipped() {
        let device: Arc<dyn RenderDevice> = Arc::new(HeadlessDevice::new());
        let world = create_node("world", "world").unwrap();
        let mesh = world.create_child("mesh", "geometry_triangles").unwrap();
        mesh.set_child_value("visible", false).unwrap();
        let lights = world.create_child("lights", "lights").unwrap();
        lights.create_child("sun", "light_distant").unwrap();

        let scene = render(&world, &device);
        assert_eq!(scene.num_instances(), 0);
        assert_eq!(scene.num_lights(), 1);

        lights.set_child_value("enabled", false).unwrap();
        let scene = render(&world, &device);
        assert_eq!(scene.num_lights(), 0);
    }

    #[test]
    fn test_geometry_material_is_bound_to_model() {
        let headless = Arc::new(HeadlessDevice::new());
        let device: Arc<dyn RenderDevice> = headless.clone();
        let world = create_node("world", "world").unwrap();
        let plain = world.create_child("plain", "geometry_triangles").unwrap();
        let shiny = world.create_child("shiny", "geometry_spheres").unwrap();
        let material = assign_material(&shiny, "material_principled").unwrap();
        material.set_child_value("metallic", 1.0f32).unwrap();

        render(&world, &device);
        let handle = material.handle().unwrap();
        assert_eq!(headless.object(handle).unwrap().kind, ObjectKind::Material);
        assert_eq!(headless.param(handle, "metallic"), Some(Value::Float(1.0)));

        let models = headless.objects_of_kind(ObjectKind::GeometricModel);
        let bound: Vec<_> = models
            .iter()
            .filter_map(|&m| headless.param(m, "material"))
            .collect();
        assert_eq!(bound, vec![Value::Object(handle)]);
        assert!(plain.handle().is_some());
    }

    #[test]
    fn test_dropping_objects_releases_them() {
        let headless = Arc::new(HeadlessDevice::new());
        let device: Arc<dyn RenderDevice> = headless.clone();
        let world = create_node("world", "world").unwrap();
        world.create_child("mesh", "geometry_triangles").unwrap();

        let objects = render(&world, &device).into_objects();
        // model, group and instance
        assert_eq!(objects.len(), 3);
        let before = headless.released_objects();
        drop(objects);
        assert_eq!(headless.released_objects(), before + 3);
    }
}
