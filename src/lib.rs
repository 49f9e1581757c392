//! Studio Scene Graph
//!
//! A scene graph for interactive ray-traced rendering: typed nodes with
//! modification tracking, visitors that commit only what changed to a render
//! device, and the studio loop and ImGui widgets built on top.

pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod jobs;
pub mod prelude;
pub mod sg;
pub mod ui;

// Re-export main types for convenience
pub use app::Studio;
pub use config::StudioConfig;
pub use error::{Result, SgError};

/// Creates a studio on a headless device with the default configuration
pub fn default() -> Result<Studio> {
    Studio::headless(StudioConfig::default())
}
