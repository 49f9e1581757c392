//! # Render Device Boundary
//!
//! The scene graph never talks to a rendering library directly. Everything it
//! needs (creating objects, setting parameters, committing, rendering frames)
//! goes through the [`RenderDevice`] trait, so any ray tracer with an
//! object/parameter/commit API can sit behind it.
//!
//! ## Key Components
//!
//! - [`RenderDevice`] - Object/parameter/commit/frame API the SG consumes
//! - [`ObjectRef`] - Owned renderer object, released when dropped
//! - [`HeadlessDevice`] - In-memory device that records every call
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use studio_sg::device::{HeadlessDevice, ObjectKind, RenderDevice};
//!
//! let device = Arc::new(HeadlessDevice::new());
//! let camera = device.new_object(ObjectKind::Camera, "perspective").unwrap();
//! device.set_param(camera, "fovy", &60.0f32.into()).unwrap();
//! device.commit(camera).unwrap();
//! assert_eq!(device.commit_count(camera), 1);
//! ```

pub mod headless;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::sg::value::Value;

pub use headless::{HeadlessDevice, RecordedObject};

/// Opaque identifier of an object living on a render device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// Categories of renderer objects the scene graph creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    FrameBuffer,
    Renderer,
    Camera,
    World,
    Group,
    Instance,
    Geometry,
    GeometricModel,
    Volume,
    VolumetricModel,
    TransferFunction,
    Light,
    Material,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identifies one submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket(pub u64);

/// Framebuffer channel to read back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameChannel {
    Color,
    Depth,
    Albedo,
}

impl FrameChannel {
    /// Bytes per pixel in a mapped buffer of this channel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            FrameChannel::Color => 4,
            FrameChannel::Depth => 4,
            FrameChannel::Albedo => 12,
        }
    }
}

/// Pixels read back from a framebuffer
#[derive(Debug, Clone)]
pub struct MappedFrame {
    pub framebuffer: ObjectHandle,
    pub channel: FrameChannel,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Object/parameter/commit API of a rendering library
///
/// Parameters are staged with [`set_param`](RenderDevice::set_param) and only
/// take effect on [`commit`](RenderDevice::commit). Frame rendering is
/// asynchronous: [`render_frame`](RenderDevice::render_frame) returns a ticket
/// that can be polled, waited on or cancelled.
pub trait RenderDevice: Send + Sync {
    fn new_object(&self, kind: ObjectKind, subtype: &str) -> Result<ObjectHandle>;

    fn set_param(&self, object: ObjectHandle, name: &str, value: &Value) -> Result<()>;

    fn remove_param(&self, object: ObjectHandle, name: &str) -> Result<()>;

    fn commit(&self, object: ObjectHandle) -> Result<()>;

    /// Drops the device's reference to the object
    fn release(&self, object: ObjectHandle);

    fn render_frame(
        &self,
        framebuffer: ObjectHandle,
        renderer: ObjectHandle,
        camera: ObjectHandle,
        world: ObjectHandle,
    ) -> Result<FrameTicket>;

    fn is_ready(&self, ticket: FrameTicket) -> bool;

    /// Completion in `[0, 1]`
    fn progress(&self, ticket: FrameTicket) -> f32;

    fn wait(&self, ticket: FrameTicket);

    fn cancel(&self, ticket: FrameTicket);

    fn map_frame(&self, framebuffer: ObjectHandle, channel: FrameChannel) -> Result<MappedFrame>;

    fn unmap_frame(&self, _frame: MappedFrame) {}
}

/// A renderer object owned by a scene graph node
///
/// Releases the object on the device when dropped.
pub struct ObjectRef {
    device: Arc<dyn RenderDevice>,
    handle: ObjectHandle,
    kind: ObjectKind,
}

impl ObjectRef {
    /// Creates a new object on `device`
    pub fn create(device: &Arc<dyn RenderDevice>, kind: ObjectKind, subtype: &str) -> Result<Self> {
        let handle = device.new_object(kind, subtype)?;
        log::debug!("created {kind} '{subtype}' as object#{}", handle.0);
        Ok(Self {
            device: Arc::clone(device),
            handle,
            kind,
        })
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }

    /// True if this object lives on `device`
    pub fn is_on(&self, device: &Arc<dyn RenderDevice>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.device), Arc::as_ptr(device))
    }

    pub fn set_param(&self, name: &str, value: &Value) -> Result<()> {
        self.device.set_param(self.handle, name, value)
    }

    pub fn commit(&self) -> Result<()> {
        self.device.commit(self.handle)
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        self.device.release(self.handle);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .finish()
    }
}
