//! Builds a small scene by hand, renders it on the headless device and
//! prints the resulting graph.
//!
//! Run with `RUST_LOG=debug cargo run --example sg_tutorial` to follow the
//! commits, or pass a studio TOML config as the first argument.

use std::sync::Arc;

use anyhow::Result;
use studio_sg::prelude::*;

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };
    init_logging(&config);

    let device = Arc::new(HeadlessDevice::new());
    let frame = Frame::new(device.clone())?;
    frame.node().set_child_value("immediatelyWait", true)?;
    frame.set_window_size(Vector2::from(config.window_size))?;
    frame.set_renderer_type(RendererType::PathTracer)?;

    let camera = frame.camera()?;
    look_at(&camera, point3(1.0, 0.5, -0.5), point3(1.0, 0.5, 3.0), vec3(0.0, 1.0, 0.0))?;

    let world = frame.world()?;
    let xfm = world.create_child("xfm", "transform")?;
    let mesh = xfm.create_child("mesh", "geometry_triangles")?;
    mesh.set_child_value(
        "vertex.position",
        vec![
            vec3(0.0f32, 0.0, 3.5),
            vec3(0.0, 1.0, 3.0),
            vec3(1.0, 0.0, 3.0),
            vec3(1.0, 1.0, 2.5),
        ],
    )?;
    mesh.create_child_data("vertex.color", vec![vec4(0.0f32, 0.0, 1.0, 1.0); 4])?;
    mesh.set_child_value("index", vec![vec3(0u32, 1, 2), vec3(1, 2, 3)])?;
    assign_material(&mesh, "material_principled")?.set_child_value("roughness", 0.3f32)?;

    let lights = LightsManager::new()?;
    lights.add_light("ambientlight", "ambient")?;
    lights.update_world(&world)?;

    // The first frame renders at navigation resolution
    frame.set_navigation_mode(true)?;
    frame.start_new_frame()?;
    frame.set_navigation_mode(false)?;
    frame.start_new_frame()?;
    frame.wait_on_frame();

    let image = frame.map_frame(FrameChannel::Color)?;
    println!(
        "rendered {}x{} ({} bytes) with {} live device objects",
        image.width,
        image.height,
        image.pixels.len(),
        device.live_objects()
    );
    frame.unmap_frame(image);

    print!("{}", PrintNodes::render(frame.node()));
    Ok(())
}
