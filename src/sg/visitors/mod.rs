//! # Visitors
//!
//! Traversal strategies applied to a scene graph with [`Node::traverse`].
//! A visitor is called on every node before its children and decides whether
//! to descend; its post-order hook runs once the children are done, which lets
//! visitors gather on the way down and finalize on the way up.
//!
//! ## Key Components
//!
//! - [`CommitVisitor`] - Pushes modified subtrees to the render device
//! - [`RenderScene`] - Assembles groups and instances for the world
//! - [`MarkAllAsModified`] - Forces a full recommit of a subtree
//! - [`PrintNodes`] - Indented text dump of a subtree
//!
//! The ImGui widget generator lives in [`crate::ui::widgets`].
//!
//! [`Node::traverse`]: crate::sg::node::Node::traverse

pub mod commit;
pub mod mark_modified;
pub mod print_nodes;
pub mod render_scene;

use crate::error::Result;
use crate::sg::node::Node;

pub use commit::CommitVisitor;
pub use mark_modified::MarkAllAsModified;
pub use print_nodes::PrintNodes;
pub use render_scene::RenderScene;

/// Per-node traversal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalContext {
    /// Depth below the node the traversal started from
    pub level: usize,
}

impl TraversalContext {
    pub fn descend(self) -> Self {
        Self {
            level: self.level + 1,
        }
    }
}

/// A traversal strategy
pub trait Visitor {
    /// Called before the node's children; return `true` to visit them
    fn visit(&mut self, node: &Node, ctx: &TraversalContext) -> Result<bool>;

    /// Called after the node's children, whether or not they were visited
    fn post_children(&mut self, _node: &Node, _ctx: &TraversalContext) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SgError;
    use crate::sg::factory::create_node;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: Option<&'static str>,
        fail: Option<&'static str>,
    }

    impl Visitor for Recorder {
        fn visit(&mut self, node: &Node, ctx: &TraversalContext) -> Result<bool> {
            self.events.push(format!("pre {} @{}", node.name(), ctx.level));
            if self.fail == Some(node.name()) {
                return Err(SgError::Device(format!("cannot visit {}", node.name())));
            }
            Ok(self.skip != Some(node.name()))
        }

        fn post_children(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<()> {
            self.events.push(format!("post {}", node.name()));
            Ok(())
        }
    }

    fn sample_tree() -> crate::sg::node::NodePtr {
        let root = create_node("root", "node").unwrap();
        let a = root.create_child("a", "node").unwrap();
        a.create_child("a1", "int").unwrap();
        root.create_child("b", "int").unwrap();
        root
    }

    #[test]
    fn test_parent_before_children_with_post_order() {
        let mut recorder = Recorder::default();
        sample_tree().traverse(&mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "pre root @0",
                "pre a @1",
                "pre a1 @2",
                "post a1",
                "post a",
                "pre b @1",
                "post b",
                "post root",
            ]
        );
    }

    #[test]
    fn test_declined_descent_still_runs_post_hook() {
        let mut recorder = Recorder {
            skip: Some("a"),
            ..Default::default()
        };
        sample_tree().traverse(&mut recorder).unwrap();
        assert!(recorder.events.contains(&"post a".to_string()));
        assert!(!recorder.events.iter().any(|e| e.contains("a1")));
    }

    #[test]
    fn test_error_aborts_traversal() {
        let mut recorder = Recorder {
            fail: Some("a1"),
            ..Default::default()
        };
        let err = sample_tree().traverse(&mut recorder).unwrap_err();
        assert!(matches!(err, SgError::Device(msg) if msg == "cannot visit a1"));

        // No post hooks for the failed branch, no later siblings
        assert_eq!(recorder.events, vec!["pre root @0", "pre a @1", "pre a1 @2"]);
    }
}
