//! # Studio Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use studio_sg::prelude::*;
//!
//! let world = create_node("world", "world").unwrap();
//! world.create_child("mesh", "geometry_triangles").unwrap();
//! assert!(world.is_modified());
//! ```

pub use crate::app::Studio;
pub use crate::config::{init_logging, StudioConfig};
pub use crate::device::{FrameChannel, HeadlessDevice, MappedFrame, ObjectHandle, ObjectKind, RenderDevice};
pub use crate::error::{Result, SgError};
pub use crate::jobs::{schedule_job, Job, JobScheduler};
pub use crate::sg::objects::{
    assign_material, look_at, Frame, LightsManager, RendererType, TransferFunction,
};
pub use crate::sg::visitors::{CommitVisitor, MarkAllAsModified, PrintNodes, RenderScene};
pub use crate::sg::{
    create_node, create_node_with_value, DataArray, Node, NodePtr, NodeType, Value, Visitor,
};
pub use crate::ui::{GenerateImGuiWidgets, TransferFunctionEditor};

pub use cgmath::{point3, vec2, vec3, vec4, Matrix4, Point3, Vector2, Vector3, Vector4};
pub use imgui::Ui;
