//! Renderer nodes
//!
//! One node subtype per renderer the device offers: `renderer_scivis`,
//! `renderer_pathtracer` and `renderer_debug`. Each exposes the parameters
//! shared by all renderers plus its own.

use std::fmt;
use std::str::FromStr;

use cgmath::Vector4;
use serde::Deserialize;

use super::parameters::{add_param, add_ranged_param};
use crate::device::ObjectKind;
use crate::error::{Result, SgError};
use crate::sg::factory::NodeConstructor;
use crate::sg::node::{NodeBuilder, NodePtr, NodeType};
use crate::sg::value::Value;

/// Renderers selectable in the studio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererType {
    #[default]
    SciVis,
    PathTracer,
    Debug,
}

impl RendererType {
    pub const ALL: [RendererType; 3] = [
        RendererType::SciVis,
        RendererType::PathTracer,
        RendererType::Debug,
    ];

    /// Name used by the device and in node subtypes
    pub fn as_str(self) -> &'static str {
        match self {
            RendererType::SciVis => "scivis",
            RendererType::PathTracer => "pathtracer",
            RendererType::Debug => "debug",
        }
    }

    /// Factory subtype of the renderer node
    pub fn node_subtype(self) -> String {
        format!("renderer_{}", self.as_str())
    }
}

impl fmt::Display for RendererType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererType {
    type Err = SgError;

    fn from_str(s: &str) -> Result<Self> {
        RendererType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SgError::UnknownSubtype(format!("renderer_{s}")))
    }
}

fn renderer(name: &str, renderer_type: RendererType) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, &renderer_type.node_subtype(), NodeType::Renderer)
        .with_object(ObjectKind::Renderer, renderer_type.as_str())
        .with_description(&format!("{renderer_type} renderer"))
        .build();

    add_ranged_param(
        &node,
        "pixelSamples",
        "int",
        1,
        (Value::Int(1), Value::Int(64)),
        "samples per pixel",
    )?;
    add_ranged_param(
        &node,
        "maxPathLength",
        "int",
        20,
        (Value::Int(0), Value::Int(64)),
        "maximum ray recursion depth",
    )?;
    add_ranged_param(
        &node,
        "minContribution",
        "float",
        0.001f32,
        (Value::Float(0.0), Value::Float(1.0)),
        "sample contributions below this value are ignored",
    )?;
    add_param(
        &node,
        "backgroundColor",
        "rgba",
        Vector4::new(0.1f32, 0.1, 0.1, 1.0),
        "background color and alpha",
    )?;

    match renderer_type {
        RendererType::SciVis => {
            add_ranged_param(
                &node,
                "aoSamples",
                "int",
                1,
                (Value::Int(0), Value::Int(100)),
                "ambient occlusion samples per hit",
            )?;
            add_param(&node, "shadows", "bool", false, "whether to trace shadow rays")?;
            add_param(&node, "visibleLights", "bool", false, "whether light sources are visible")?;
        }
        RendererType::PathTracer => {
            add_ranged_param(
                &node,
                "lightSamples",
                "int",
                -1,
                (Value::Int(-1), Value::Int(100)),
                "light samples per path vertex, -1 samples all lights",
            )?;
            add_ranged_param(
                &node,
                "roulettePathLength",
                "int",
                5,
                (Value::Int(0), Value::Int(64)),
                "path depth at which Russian roulette starts",
            )?;
            add_param(&node, "geometryLights", "bool", true, "whether emissive geometry lights the scene")?;
        }
        RendererType::Debug => {
            add_param(&node, "method", "string", "eyeLight", "debug visualization")?;
        }
    }

    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("renderer_scivis", |name| renderer(name, RendererType::SciVis)));
    table.push(("renderer_pathtracer", |name| renderer(name, RendererType::PathTracer)));
    table.push(("renderer_debug", |name| renderer(name, RendererType::Debug)));
}
