use std::sync::Arc;

use super::{TraversalContext, Visitor};
use crate::device::RenderDevice;
use crate::error::Result;
use crate::sg::node::{Node, NodeType};

/// Pushes every modified subtree to the render device
///
/// Unmodified subtrees are skipped entirely. For a modified object node the
/// visitor runs the node's pre-commit hook, creates the backing object if
/// needed and stages all renderer-visible parameter children. Once the
/// children are done the object is committed and the node marked as
/// committed.
pub struct CommitVisitor {
    device: Arc<dyn RenderDevice>,
    committed: usize,
}

impl CommitVisitor {
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        Self {
            device,
            committed: 0,
        }
    }

    /// Number of renderer objects committed so far
    pub fn committed(&self) -> usize {
        self.committed
    }
}

impl Visitor for CommitVisitor {
    fn visit(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<bool> {
        if !node.is_modified() {
            return Ok(false);
        }

        node.behavior().pre_commit(node)?;

        if let Some(handle) = node.ensure_object(&self.device)? {
            for child in node.children() {
                if child.node_type() != NodeType::Parameter || child.is_sg_only() {
                    continue;
                }
                let value = child.value();
                if !value.is_none() {
                    self.device.set_param(handle, child.name(), &value)?;
                }
            }
        }
        Ok(true)
    }

    fn post_children(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<()> {
        if !node.is_modified() {
            return Ok(());
        }

        node.behavior().post_commit(node)?;
        if let Some(handle) = node.handle() {
            self.device.commit(handle)?;
            self.committed += 1;
            log::trace!("committed '{}'", node.name());
        }
        node.mark_as_committed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, ObjectKind};
    use crate::sg::factory::create_node;
    use crate::sg::value::Value;

    fn setup() -> (Arc<HeadlessDevice>, Arc<dyn RenderDevice>) {
        let headless = Arc::new(HeadlessDevice::new());
        let device: Arc<dyn RenderDevice> = headless.clone();
        (headless, device)
    }

    #[test]
    fn test_commit_pushes_params_and_clears_modified() {
        let (headless, device) = setup();
        let camera = create_node("camera", "camera_perspective").unwrap();

        let mut visitor = CommitVisitor::new(device);
        camera.traverse(&mut visitor).unwrap();

        assert_eq!(visitor.committed(), 1);
        assert!(!camera.is_modified());
        let handle = camera.handle().unwrap();
        assert_eq!(headless.object(handle).unwrap().kind, ObjectKind::Camera);
        assert_eq!(headless.param(handle, "fovy"), Some(Value::Float(60.0)));
        assert_eq!(headless.commit_count(handle), 1);
    }

    #[test]
    fn test_unmodified_subtree_is_skipped() {
        let (headless, device) = setup();
        let world = create_node("world", "world").unwrap();
        let mesh = world.create_child("mesh", "geometry_triangles").unwrap();
        let light = world.create_child("light", "light_ambient").unwrap();

        let mut visitor = CommitVisitor::new(device.clone());
        world.traverse(&mut visitor).unwrap();
        assert_eq!(visitor.committed(), 3);

        light.set_child_value("intensity", 2.0f32).unwrap();
        let mut visitor = CommitVisitor::new(device);
        world.traverse(&mut visitor).unwrap();

        // The light and the world above it, not the mesh
        assert_eq!(visitor.committed(), 2);
        assert_eq!(headless.commit_count(mesh.handle().unwrap()), 1);
        assert_eq!(headless.commit_count(light.handle().unwrap()), 2);
        assert_eq!(
            headless.param(light.handle().unwrap(), "intensity"),
            Some(Value::Float(2.0))
        );
    }

    #[test]
    fn test_sg_only_params_stay_in_the_graph() {
        let (headless, device) = setup();
        let volume = create_node("volume", "volume_structured").unwrap();
        volume.traverse(&mut CommitVisitor::new(device)).unwrap();

        let handle = volume.handle().unwrap();
        assert!(headless.param(handle, "gridSpacing").is_some());
        assert!(headless.param(handle, "densityScale").is_none());
        assert!(headless.param(handle, "visible").is_none());

        // The hidden transfer function is still an object of its own
        let tfn = volume.child("transferFunction").unwrap().handle().unwrap();
        assert!(matches!(
            headless.param(tfn, "opacity"),
            Some(Value::Data(_))
        ));
    }
}
