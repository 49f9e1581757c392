//! # Scene Objects
//!
//! Node subtypes known to the factory, grouped by what they describe.
//!
//! ## Key Components
//!
//! - [`parameters`] - Scalar, vector, string and data parameter nodes
//! - [`renderer`] - One renderer node per [`RendererType`]
//! - [`camera`] - Perspective and orthographic cameras
//! - [`world`] - World, framebuffer and transform nodes
//! - [`geometry`] - Triangle meshes, spheres and structured volumes
//! - [`light`] - Lights and the [`LightsManager`]
//! - [`material`] - OBJ and principled materials attached to geometries
//! - [`transfer_function`] - Piecewise-linear [`TransferFunction`]
//! - [`frame`] - The [`Frame`] tying everything together

pub mod camera;
pub mod frame;
pub mod geometry;
pub mod light;
pub mod material;
pub mod parameters;
pub mod renderer;
pub mod transfer_function;
pub mod world;

pub use camera::look_at;
pub use frame::Frame;
pub use light::{LightsManager, LIGHT_TYPES};
pub use material::{assign_material, material_of};
pub use renderer::RendererType;
pub use transfer_function::{ColorPoint, OpacityPoint, TransferFunction};
pub use world::compose_trs;

use crate::sg::factory::NodeConstructor;

/// Every built-in subtype with its constructor
pub(crate) fn builtin_factories() -> Vec<(&'static str, NodeConstructor)> {
    let mut table = Vec::new();
    parameters::register_builtins(&mut table);
    renderer::register_builtins(&mut table);
    camera::register_builtins(&mut table);
    world::register_builtins(&mut table);
    geometry::register_builtins(&mut table);
    light::register_builtins(&mut table);
    material::register_builtins(&mut table);
    transfer_function::register_builtins(&mut table);
    frame::register_builtins(&mut table);
    table
}
