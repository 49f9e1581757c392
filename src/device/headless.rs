//! In-memory render device
//!
//! Records every object, parameter and commit so scene graph behavior can be
//! inspected without a native rendering library. Frames complete immediately
//! and map to zero-filled buffers sized from the framebuffer's `size`.

use std::collections::{BTreeMap, HashMap};

use cgmath::Vector2;
use parking_lot::Mutex;

use super::{FrameChannel, FrameTicket, MappedFrame, ObjectHandle, ObjectKind, RenderDevice};
use crate::error::{Result, SgError};
use crate::sg::value::Value;

/// Snapshot of an object as the device sees it
#[derive(Debug, Clone)]
pub struct RecordedObject {
    pub kind: ObjectKind,
    pub subtype: String,
    pub params: BTreeMap<String, Value>,
    pub commit_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStatus {
    Done,
    Cancelled,
}

#[derive(Default)]
struct HeadlessState {
    next_handle: u64,
    next_ticket: u64,
    objects: HashMap<ObjectHandle, RecordedObject>,
    // Only the newest frame keeps a status; older tickets are finished
    latest_frame: Option<(FrameTicket, FrameStatus)>,
    frames_rendered: usize,
    released: usize,
}

impl HeadlessState {
    fn object_mut(&mut self, handle: ObjectHandle) -> Result<&mut RecordedObject> {
        self.objects
            .get_mut(&handle)
            .ok_or_else(|| SgError::Device(format!("unknown object#{}", handle.0)))
    }

    fn committed(&self, handle: ObjectHandle, expected: ObjectKind) -> Result<&RecordedObject> {
        let object = self
            .objects
            .get(&handle)
            .ok_or_else(|| SgError::Device(format!("unknown object#{}", handle.0)))?;
        if object.kind != expected {
            return Err(SgError::Device(format!(
                "object#{} is a {}, expected a {}",
                handle.0, object.kind, expected
            )));
        }
        if object.commit_count == 0 {
            return Err(SgError::Device(format!(
                "{} object#{} was never committed",
                object.kind, handle.0
            )));
        }
        Ok(object)
    }

    fn issued(&self, ticket: FrameTicket) -> bool {
        (1..=self.next_ticket).contains(&ticket.0)
    }

    fn frame_status(&self, ticket: FrameTicket) -> Option<FrameStatus> {
        match self.latest_frame {
            Some((latest, status)) if latest == ticket => Some(status),
            _ if self.issued(ticket) => Some(FrameStatus::Done),
            _ => None,
        }
    }
}

/// Render device that keeps everything in memory
#[derive(Default)]
pub struct HeadlessDevice {
    state: Mutex<HeadlessState>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded object, if it is still alive
    pub fn object(&self, handle: ObjectHandle) -> Option<RecordedObject> {
        self.state.lock().objects.get(&handle).cloned()
    }

    /// Current value of a staged parameter
    pub fn param(&self, handle: ObjectHandle, name: &str) -> Option<Value> {
        self.state
            .lock()
            .objects
            .get(&handle)
            .and_then(|o| o.params.get(name).cloned())
    }

    pub fn commit_count(&self, handle: ObjectHandle) -> u32 {
        self.state
            .lock()
            .objects
            .get(&handle)
            .map_or(0, |o| o.commit_count)
    }

    /// Handles of all live objects of `kind`, oldest first
    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<ObjectHandle> {
        let state = self.state.lock();
        let mut handles: Vec<_> = state
            .objects
            .iter()
            .filter(|(_, o)| o.kind == kind)
            .map(|(h, _)| *h)
            .collect();
        handles.sort();
        handles
    }

    pub fn live_objects(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn released_objects(&self) -> usize {
        self.state.lock().released
    }

    pub fn frames_rendered(&self) -> usize {
        self.state.lock().frames_rendered
    }
}

impl RenderDevice for HeadlessDevice {
    fn new_object(&self, kind: ObjectKind, subtype: &str) -> Result<ObjectHandle> {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = ObjectHandle(state.next_handle);
        state.objects.insert(
            handle,
            RecordedObject {
                kind,
                subtype: subtype.to_string(),
                params: BTreeMap::new(),
                commit_count: 0,
            },
        );
        Ok(handle)
    }

    fn set_param(&self, object: ObjectHandle, name: &str, value: &Value) -> Result<()> {
        let mut state = self.state.lock();
        state
            .object_mut(object)?
            .params
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove_param(&self, object: ObjectHandle, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.object_mut(object)?.params.remove(name);
        Ok(())
    }

    fn commit(&self, object: ObjectHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.object_mut(object)?.commit_count += 1;
        Ok(())
    }

    fn release(&self, object: ObjectHandle) {
        let mut state = self.state.lock();
        if state.objects.remove(&object).is_some() {
            state.released += 1;
        } else {
            log::warn!("release of unknown object#{}", object.0);
        }
    }

    fn render_frame(
        &self,
        framebuffer: ObjectHandle,
        renderer: ObjectHandle,
        camera: ObjectHandle,
        world: ObjectHandle,
    ) -> Result<FrameTicket> {
        let mut state = self.state.lock();
        state.committed(framebuffer, ObjectKind::FrameBuffer)?;
        state.committed(renderer, ObjectKind::Renderer)?;
        state.committed(camera, ObjectKind::Camera)?;
        state.committed(world, ObjectKind::World)?;

        state.next_ticket += 1;
        let ticket = FrameTicket(state.next_ticket);
        state.latest_frame = Some((ticket, FrameStatus::Done));
        state.frames_rendered += 1;
        Ok(ticket)
    }

    fn is_ready(&self, ticket: FrameTicket) -> bool {
        self.state.lock().issued(ticket)
    }

    fn progress(&self, ticket: FrameTicket) -> f32 {
        match self.state.lock().frame_status(ticket) {
            Some(FrameStatus::Done) => 1.0,
            _ => 0.0,
        }
    }

    fn wait(&self, _ticket: FrameTicket) {}

    fn cancel(&self, ticket: FrameTicket) {
        if let Some((latest, status)) = self.state.lock().latest_frame.as_mut() {
            if *latest == ticket {
                *status = FrameStatus::Cancelled;
            }
        }
    }

    fn map_frame(&self, framebuffer: ObjectHandle, channel: FrameChannel) -> Result<MappedFrame> {
        let state = self.state.lock();
        let fb = state.committed(framebuffer, ObjectKind::FrameBuffer)?;
        let size = match fb.params.get("size") {
            Some(Value::Vec2i(size)) => *size,
            _ => Vector2::new(1, 1),
        };
        let width = size.x.max(0) as u32;
        let height = size.y.max(0) as u32;
        Ok(MappedFrame {
            framebuffer,
            channel,
            width,
            height,
            pixels: vec![0; width as usize * height as usize * channel.bytes_per_pixel()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_staged_per_object() {
        let device = HeadlessDevice::new();
        let a = device.new_object(ObjectKind::Light, "ambient").unwrap();
        let b = device.new_object(ObjectKind::Light, "distant").unwrap();
        device.set_param(a, "intensity", &Value::Float(2.0)).unwrap();

        assert_eq!(device.param(a, "intensity"), Some(Value::Float(2.0)));
        assert_eq!(device.param(b, "intensity"), None);
        assert_eq!(device.objects_of_kind(ObjectKind::Light), vec![a, b]);

        device.remove_param(a, "intensity").unwrap();
        assert_eq!(device.param(a, "intensity"), None);
    }

    #[test]
    fn test_render_requires_committed_objects() {
        let device = HeadlessDevice::new();
        let fb = device.new_object(ObjectKind::FrameBuffer, "").unwrap();
        let renderer = device.new_object(ObjectKind::Renderer, "scivis").unwrap();
        let camera = device.new_object(ObjectKind::Camera, "perspective").unwrap();
        let world = device.new_object(ObjectKind::World, "").unwrap();

        assert!(device.render_frame(fb, renderer, camera, world).is_err());

        for h in [fb, renderer, camera, world] {
            device.commit(h).unwrap();
        }
        let ticket = device.render_frame(fb, renderer, camera, world).unwrap();
        assert!(device.is_ready(ticket));
        assert_eq!(device.progress(ticket), 1.0);

        // Argument order matters
        assert!(device.render_frame(renderer, fb, camera, world).is_err());
    }

    #[test]
    fn test_only_the_latest_frame_is_tracked() {
        let device = HeadlessDevice::new();
        let objects = [
            ObjectKind::FrameBuffer,
            ObjectKind::Renderer,
            ObjectKind::Camera,
            ObjectKind::World,
        ]
        .map(|kind| device.new_object(kind, "").unwrap());
        for h in objects {
            device.commit(h).unwrap();
        }
        let [fb, renderer, camera, world] = objects;

        let first = device.render_frame(fb, renderer, camera, world).unwrap();
        device.cancel(first);
        assert_eq!(device.progress(first), 0.0);

        let tickets: Vec<_> = (0..3)
            .map(|_| device.render_frame(fb, renderer, camera, world).unwrap())
            .collect();
        assert_eq!(device.frames_rendered(), 4);
        assert_eq!(device.state.lock().latest_frame.map(|(t, _)| t), Some(tickets[2]));

        // Superseded tickets read as finished
        assert!(device.is_ready(first));
        assert_eq!(device.progress(tickets[0]), 1.0);
        assert!(!device.is_ready(FrameTicket(99)));

        device.cancel(tickets[0]);
        assert_eq!(device.progress(tickets[2]), 1.0);
        device.cancel(tickets[2]);
        assert_eq!(device.progress(tickets[2]), 0.0);
    }

    #[test]
    fn test_map_frame_uses_framebuffer_size() {
        let device = HeadlessDevice::new();
        let fb = device.new_object(ObjectKind::FrameBuffer, "").unwrap();
        device
            .set_param(fb, "size", &Value::Vec2i(Vector2::new(4, 3)))
            .unwrap();
        device.commit(fb).unwrap();

        let mapped = device.map_frame(fb, FrameChannel::Color).unwrap();
        assert_eq!((mapped.width, mapped.height), (4, 3));
        assert_eq!(mapped.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_release_forgets_object() {
        let device = HeadlessDevice::new();
        let h = device.new_object(ObjectKind::Geometry, "triangles").unwrap();
        device.release(h);
        assert_eq!(device.live_objects(), 0);
        assert_eq!(device.released_objects(), 1);
        assert!(device.commit(h).is_err());
    }
}
