//! The frame: root of everything needed to render an image
//!
//! A `frame` node owns a framebuffer, a camera, a renderer and a world, plus
//! scene-graph-only settings for the window it is shown in. [`Frame`] drives
//! it: commit the graph, rebuild the scene if the world changed, start an
//! asynchronous render and hand out the finished pixels.

use std::sync::Arc;

use cgmath::Vector2;
use parking_lot::Mutex;

use super::parameters::add_sg_param;
use super::renderer::RendererType;
use crate::device::{FrameChannel, FrameTicket, MappedFrame, ObjectHandle, ObjectRef, RenderDevice};
use crate::error::{Result, SgError};
use crate::sg::factory::{create_node, NodeConstructor};
use crate::sg::node::{Node, NodeBehavior, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::Value;
use crate::sg::visitors::{CommitVisitor, RenderScene};

/// Framebuffer size for a window, never below one pixel per axis
pub fn scaled_size(window: Vector2<i32>, scale: f32) -> Vector2<i32> {
    Vector2::new(
        ((window.x as f32 * scale) as i32).max(1),
        ((window.y as f32 * scale) as i32).max(1),
    )
}

/// Sizes the framebuffer and camera aspect from the window settings
struct FrameBehavior;

impl NodeBehavior for FrameBehavior {
    fn pre_commit(&self, node: &Node) -> Result<()> {
        let window: Vector2<i32> = node.child_value_as("windowSize")?;
        let scale: f32 = if node.child_value_as::<bool>("navMode")? {
            node.child_value_as("scaleNav")?
        } else {
            node.child_value_as("scale")?
        };
        let size = scaled_size(window, scale);

        node.child("framebuffer")?.set_child_value("size", size)?;
        node.child("camera")?
            .set_child_value("aspect", size.x as f32 / size.y as f32)?;
        Ok(())
    }
}

fn frame(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "frame", NodeType::Frame)
        .with_behavior(FrameBehavior)
        .with_description("framebuffer, camera, renderer and world of one view")
        .build();

    node.create_child("framebuffer", "framebuffer")?;
    node.create_child("camera", "camera_perspective")?;
    node.create_child("renderer", &RendererType::default().node_subtype())?;
    node.create_child("world", "world")?;

    add_sg_param(&node, "windowSize", "vec2i", Vector2::new(1024, 768), "size of the window showing the frame")?;
    add_sg_param(&node, "scale", "float", 1.0f32, "framebuffer scale while still")?
        .set_min_max(Value::Float(0.1), Value::Float(2.0));
    add_sg_param(&node, "scaleNav", "float", 0.5f32, "framebuffer scale while navigating")?
        .set_min_max(Value::Float(0.1), Value::Float(2.0));
    add_sg_param(&node, "navMode", "bool", false, "camera is being moved")?;
    add_sg_param(&node, "immediatelyWait", "bool", false, "block until each frame is done")?;
    Ok(node)
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("frame", frame));
}

/// Drives a `frame` node on a render device
pub struct Frame {
    node: NodePtr,
    device: Arc<dyn RenderDevice>,
    in_flight: Mutex<Option<FrameTicket>>,
    /// Instances, groups and models of the last scene build
    scene: Mutex<Option<Vec<ObjectRef>>>,
}

impl Frame {
    pub fn new(device: Arc<dyn RenderDevice>) -> Result<Self> {
        Ok(Self {
            node: create_node("frame", "frame")?,
            device,
            in_flight: Mutex::new(None),
            scene: Mutex::new(None),
        })
    }

    pub fn node(&self) -> &NodePtr {
        &self.node
    }

    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }

    pub fn world(&self) -> Result<NodePtr> {
        self.node.child("world")
    }

    pub fn camera(&self) -> Result<NodePtr> {
        self.node.child("camera")
    }

    pub fn renderer(&self) -> Result<NodePtr> {
        self.node.child("renderer")
    }

    pub fn framebuffer(&self) -> Result<NodePtr> {
        self.node.child("framebuffer")
    }

    /// Commits every modified part of the frame; returns the object count
    pub fn commit(&self) -> Result<usize> {
        let mut visitor = CommitVisitor::new(self.device.clone());
        self.node.traverse(&mut visitor)?;
        Ok(visitor.committed())
    }

    pub fn set_window_size(&self, size: Vector2<i32>) -> Result<bool> {
        self.node.set_child_value("windowSize", size)
    }

    pub fn set_navigation_mode(&self, navigating: bool) -> Result<bool> {
        self.node.set_child_value("navMode", navigating)
    }

    /// Swaps the renderer node for one of `renderer_type`
    ///
    /// Returns false if that renderer is already in use.
    pub fn set_renderer_type(&self, renderer_type: RendererType) -> Result<bool> {
        if self.renderer()?.subtype() == renderer_type.node_subtype() {
            return Ok(false);
        }
        self.node
            .create_child("renderer", &renderer_type.node_subtype())?;
        log::info!("switched to the {renderer_type} renderer");
        Ok(true)
    }

    fn committed_handle(&self, name: &str) -> Result<ObjectHandle> {
        self.node.child(name)?.handle().ok_or_else(|| {
            SgError::Device(format!("frame part '{name}' has no committed object"))
        })
    }

    /// Commits, rebuilds the scene if needed and starts rendering
    ///
    /// A previous frame that is still running is cancelled first.
    pub fn start_new_frame(&self) -> Result<FrameTicket> {
        let mut in_flight = self.in_flight.lock();
        if let Some(previous) = in_flight.take() {
            if !self.device.is_ready(previous) {
                log::debug!("cancelling frame {}", previous.0);
                self.device.cancel(previous);
                self.device.wait(previous);
            }
        }

        let world = self.world()?;
        let mut scene = self.scene.lock();
        let rebuild = scene.is_none() || world.is_modified();

        self.commit()?;

        if rebuild {
            let mut builder = RenderScene::new(self.device.clone());
            world.traverse(&mut builder)?;
            // Replacing the old objects releases them
            *scene = Some(builder.into_objects());
        }

        let ticket = self.device.render_frame(
            self.committed_handle("framebuffer")?,
            self.committed_handle("renderer")?,
            self.committed_handle("camera")?,
            self.committed_handle("world")?,
        )?;
        log::trace!("started frame {}", ticket.0);

        if self.node.child_value_as::<bool>("immediatelyWait")? {
            self.device.wait(ticket);
        }
        *in_flight = Some(ticket);
        Ok(ticket)
    }

    /// True when no frame is in flight
    pub fn frame_is_ready(&self) -> bool {
        self.in_flight
            .lock()
            .map_or(true, |ticket| self.device.is_ready(ticket))
    }

    pub fn frame_progress(&self) -> f32 {
        self.in_flight
            .lock()
            .map_or(1.0, |ticket| self.device.progress(ticket))
    }

    pub fn wait_on_frame(&self) {
        if let Some(ticket) = *self.in_flight.lock() {
            self.device.wait(ticket);
        }
    }

    pub fn cancel_frame(&self) {
        if let Some(ticket) = *self.in_flight.lock() {
            self.device.cancel(ticket);
        }
    }

    /// Waits for the current frame and maps one of its channels
    pub fn map_frame(&self, channel: FrameChannel) -> Result<MappedFrame> {
        self.wait_on_frame();
        self.device
            .map_frame(self.committed_handle("framebuffer")?, channel)
    }

    pub fn unmap_frame(&self, frame: MappedFrame) {
        self.device.unmap_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, ObjectKind};

    fn headless_frame() -> (Arc<HeadlessDevice>, Frame) {
        let headless = Arc::new(HeadlessDevice::new());
        let frame = Frame::new(headless.clone()).unwrap();
        (headless, frame)
    }

    #[test]
    fn test_scaled_size_never_collapses() {
        assert_eq!(scaled_size(Vector2::new(200, 100), 0.5), Vector2::new(100, 50));
        assert_eq!(scaled_size(Vector2::new(1, 1), 0.1), Vector2::new(1, 1));
    }

    #[test]
    fn test_first_frame_renders_and_maps() {
        let (headless, frame) = headless_frame();
        assert!(frame.frame_is_ready());

        frame.start_new_frame().unwrap();
        assert_eq!(headless.frames_rendered(), 1);
        assert!(frame.frame_is_ready());
        assert_eq!(frame.frame_progress(), 1.0);

        let mapped = frame.map_frame(FrameChannel::Color).unwrap();
        assert_eq!((mapped.width, mapped.height), (1024, 768));
        frame.unmap_frame(mapped);
    }

    #[test]
    fn test_window_and_nav_mode_drive_framebuffer() {
        let (headless, frame) = headless_frame();
        frame.set_window_size(Vector2::new(400, 200)).unwrap();
        frame.set_navigation_mode(true).unwrap();
        frame.start_new_frame().unwrap();

        let fb = frame.framebuffer().unwrap().handle().unwrap();
        assert_eq!(headless.param(fb, "size"), Some(Value::Vec2i(Vector2::new(200, 100))));
        let aspect: f32 = frame.camera().unwrap().child_value_as("aspect").unwrap();
        assert_eq!(aspect, 2.0);

        frame.set_navigation_mode(false).unwrap();
        frame.start_new_frame().unwrap();
        assert_eq!(headless.param(fb, "size"), Some(Value::Vec2i(Vector2::new(400, 200))));
    }

    #[test]
    fn test_switching_renderer_replaces_object() {
        let (headless, frame) = headless_frame();
        frame.start_new_frame().unwrap();
        assert!(frame.set_renderer_type(RendererType::PathTracer).unwrap());
        assert!(!frame.set_renderer_type(RendererType::PathTracer).unwrap());
        frame.start_new_frame().unwrap();

        let renderers = headless.objects_of_kind(ObjectKind::Renderer);
        assert_eq!(renderers.len(), 1);
        assert_eq!(headless.object(renderers[0]).unwrap().subtype, "pathtracer");
        assert!(frame.renderer().unwrap().has_child("roulettePathLength"));
    }

    #[test]
    fn test_scene_rebuilt_only_when_world_changes() {
        let (headless, frame) = headless_frame();
        let world = frame.world().unwrap();
        world.create_child("mesh", "geometry_triangles").unwrap();
        frame.start_new_frame().unwrap();
        assert_eq!(headless.objects_of_kind(ObjectKind::Instance).len(), 1);

        let world_handle = world.handle().unwrap();
        let commits = headless.commit_count(world_handle);
        frame.start_new_frame().unwrap();
        assert_eq!(headless.commit_count(world_handle), commits);

        world.create_child("ball", "geometry_spheres").unwrap();
        frame.start_new_frame().unwrap();
        assert!(headless.commit_count(world_handle) > commits);
        assert_eq!(headless.objects_of_kind(ObjectKind::Instance).len(), 1);
        assert_eq!(headless.objects_of_kind(ObjectKind::GeometricModel).len(), 2);
    }
}
