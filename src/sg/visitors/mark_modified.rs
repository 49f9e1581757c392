use super::{TraversalContext, Visitor};
use crate::error::Result;
use crate::sg::node::Node;

/// Marks every node of a subtree as modified, forcing a full recommit
#[derive(Debug, Default)]
pub struct MarkAllAsModified;

impl Visitor for MarkAllAsModified {
    fn visit(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<bool> {
        node.mark_as_modified();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, RenderDevice};
    use crate::sg::factory::create_node;
    use crate::sg::visitors::CommitVisitor;
    use std::sync::Arc;

    #[test]
    fn test_forces_recommit_of_every_object() {
        let device: Arc<dyn RenderDevice> = Arc::new(HeadlessDevice::new());
        let world = create_node("world", "world").unwrap();
        let mesh = world.create_child("mesh", "geometry_triangles").unwrap();
        world.traverse(&mut CommitVisitor::new(device.clone())).unwrap();
        assert!(!mesh.is_modified());

        world.traverse(&mut MarkAllAsModified).unwrap();
        assert!(mesh.is_modified());
        assert!(mesh.child("index").unwrap().is_modified());

        let mut commit = CommitVisitor::new(device);
        world.traverse(&mut commit).unwrap();
        assert_eq!(commit.committed(), 2);
    }
}
