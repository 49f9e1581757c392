//! # User Interface Module
//!
//! Dear ImGui front end of the scene graph. Nothing here owns a window or a
//! renderer backend; every function draws into an [`imgui::Ui`] handed in by
//! the caller.
//!
//! ## Key Components
//!
//! - [`GenerateImGuiWidgets`] - Visitor turning a subtree into tree nodes and
//!   parameter widgets
//! - [`TransferFunctionEditor`] - Color map and opacity curve editing for
//!   volume transfer functions
//!
//! ## Usage
//!
//! ```no_run
//! use studio_sg::sg::create_node;
//! use studio_sg::ui::generate_widgets;
//!
//! fn scene_panel(ui: &imgui::Ui) -> studio_sg::Result<()> {
//!     let frame = create_node("frame", "frame")?;
//!     ui.window("Scene").build(|| generate_widgets(ui, &frame)).transpose()?;
//!     Ok(())
//! }
//! ```

pub mod transfer_function;
pub mod widgets;

pub use transfer_function::{ColorMap, TransferFunctionEditor};
pub use widgets::{generate_widgets, GenerateImGuiWidgets};
