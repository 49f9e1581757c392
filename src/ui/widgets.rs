//! ImGui widgets generated from the scene graph
//!
//! Nodes with children become tree nodes, parameters become widgets chosen
//! by value kind and subtype. Edits are written back with
//! [`Node::set_value`], so they are picked up by the next commit.

use imgui::{Drag, TreeNodeToken, Ui};

use crate::error::Result;
use crate::sg::node::{Node, NodeType};
use crate::sg::value::Value;
use crate::sg::visitors::{TraversalContext, Visitor};

/// Visitor drawing one widget per node into the current ImGui window
pub struct GenerateImGuiWidgets<'ui> {
    ui: &'ui Ui,
    /// One entry per visited node; `Some` for open tree nodes
    scopes: Vec<Option<TreeNodeToken<'ui>>>,
}

impl<'ui> GenerateImGuiWidgets<'ui> {
    pub fn new(ui: &'ui Ui) -> Self {
        Self {
            ui,
            scopes: Vec::new(),
        }
    }

    fn label(node: &Node) -> String {
        // Names repeat across the tree; the address keeps ImGui ids unique
        format!("{}##{:p}", node.name(), node)
    }

    fn tooltip(&self, node: &Node) {
        if self.ui.is_item_hovered() {
            let description = node.description();
            if !description.is_empty() {
                self.ui.tooltip_text(description);
            }
        }
    }

    fn widget(&self, node: &Node) -> Result<()> {
        let ui = self.ui;
        let label = Self::label(node);
        let value = node.value();

        if node.is_read_only() {
            ui.text(format!("{}: {value}", node.name()));
            self.tooltip(node);
            return Ok(());
        }

        let range = node.min_max();
        let edited: Option<Value> = match value {
            Value::Bool(mut v) => ui.checkbox(&label, &mut v).then_some(Value::Bool(v)),
            Value::Int(mut v) => {
                let changed = match range {
                    Some((Value::Int(min), Value::Int(max))) => ui.slider(&label, min, max, &mut v),
                    _ => ui.input_int(&label, &mut v).build(),
                };
                changed.then_some(Value::Int(v))
            }
            Value::Float(mut v) => {
                let changed = match range {
                    Some((Value::Float(min), Value::Float(max))) => ui.slider(&label, min, max, &mut v),
                    _ => Drag::new(&label).speed(0.01).build(ui, &mut v),
                };
                changed.then_some(Value::Float(v))
            }
            Value::Vec2i(v) => {
                let mut a: [i32; 2] = v.into();
                ui.input_int2(&label, &mut a)
                    .build()
                    .then(|| Value::Vec2i(a.into()))
            }
            Value::Vec2f(v) => {
                let mut a: [f32; 2] = v.into();
                ui.input_float2(&label, &mut a)
                    .build()
                    .then(|| Value::Vec2f(a.into()))
            }
            Value::Vec3i(v) => {
                let mut a: [i32; 3] = v.into();
                ui.input_int3(&label, &mut a)
                    .build()
                    .then(|| Value::Vec3i(a.into()))
            }
            Value::Vec3f(v) => {
                let mut a: [f32; 3] = v.into();
                let changed = if node.subtype() == "rgb" {
                    ui.color_edit3(&label, &mut a)
                } else {
                    ui.input_float3(&label, &mut a).build()
                };
                changed.then(|| Value::Vec3f(a.into()))
            }
            Value::Vec4f(v) => {
                let mut a: [f32; 4] = v.into();
                let changed = if node.subtype() == "rgba" {
                    ui.color_edit4(&label, &mut a)
                } else {
                    ui.input_float4(&label, &mut a).build()
                };
                changed.then(|| Value::Vec4f(a.into()))
            }
            Value::String(mut s) => ui
                .input_text(&label, &mut s)
                .enter_returns_true(true)
                .build()
                .then(|| Value::String(s)),
            other => {
                ui.text(format!("{}: {other}", node.name()));
                None
            }
        };
        self.tooltip(node);

        if let Some(value) = edited {
            node.set_value(value)?;
        }
        Ok(())
    }
}

impl Visitor for GenerateImGuiWidgets<'_> {
    fn visit(&mut self, node: &Node, _ctx: &TraversalContext) -> Result<bool> {
        if node.is_sg_no_ui() {
            self.scopes.push(None);
            return Ok(false);
        }

        let is_group = node.node_type() != NodeType::Parameter && node.num_children() > 0;
        if is_group {
            let token = self.ui.tree_node(Self::label(node));
            let open = token.is_some();
            self.scopes.push(token);
            return Ok(open);
        }

        self.widget(node)?;
        self.scopes.push(None);
        Ok(false)
    }

    fn post_children(&mut self, _node: &Node, _ctx: &TraversalContext) -> Result<()> {
        if let Some(Some(token)) = self.scopes.pop() {
            token.end();
        }
        Ok(())
    }
}

/// Draws widgets for `node` and its subtree
pub fn generate_widgets(ui: &Ui, node: &Node) -> Result<()> {
    node.traverse(&mut GenerateImGuiWidgets::new(ui))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::factory::create_node;

    #[test]
    fn test_widgets_for_a_whole_frame() {
        let mut ctx = imgui::Context::create();
        ctx.set_ini_filename(None);
        ctx.io_mut().display_size = [800.0, 600.0];
        ctx.fonts().build_rgba32_texture();

        let frame = create_node("frame", "frame").unwrap();
        let world = frame.child("world").unwrap();
        world.create_child("cloud", "volume_structured").unwrap();
        let before = frame.last_modified();

        let ui = ctx.new_frame();
        let mut visitor = GenerateImGuiWidgets::new(ui);
        frame.traverse(&mut visitor).unwrap();
        assert!(visitor.scopes.is_empty());
        drop(visitor);
        ctx.render();

        // Drawing alone never edits the graph
        assert_eq!(frame.last_modified(), before);
    }
}
