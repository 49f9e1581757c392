use std::fmt::Write;

use super::{TraversalContext, Visitor};
use crate::error::Result;
use crate::sg::node::Node;

/// Indented text dump of a subtree, one node per line
///
/// Lines read `name : subtype = value`; the value is left out for nodes
/// that hold none.
#[derive(Debug, Default)]
pub struct PrintNodes {
    output: String,
}

impl PrintNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dumps `node` and everything below it
    pub fn render(node: &Node) -> String {
        let mut printer = Self::new();
        // Visiting never fails
        let _ = node.traverse(&mut printer);
        printer.output
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Visitor for PrintNodes {
    fn visit(&mut self, node: &Node, ctx: &TraversalContext) -> Result<bool> {
        let indent = "  ".repeat(ctx.level);
        let value = node.value();
        let _ = if value.is_none() {
            writeln!(self.output, "{indent}{} : {}", node.name(), node.subtype())
        } else {
            writeln!(self.output, "{indent}{} : {} = {value}", node.name(), node.subtype())
        };
        log::debug!("{indent}{}", node.name());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::factory::create_node;

    #[test]
    fn test_render_indents_by_depth() {
        let root = create_node("root", "node").unwrap();
        let group = root.create_child("group", "node").unwrap();
        group.create_child_with_value("count", "int", 3).unwrap();

        assert_eq!(
            PrintNodes::render(&root),
            "root : node\n  group : node\n    count : int = 3\n"
        );
    }
}
