use std::sync::Arc;

use cgmath::Vector2;
use imgui::Ui;

use crate::config::StudioConfig;
use crate::device::{FrameChannel, HeadlessDevice, MappedFrame, RenderDevice};
use crate::error::Result;
use crate::jobs::JobScheduler;
use crate::sg::objects::{Frame, LightsManager, RendererType, TransferFunction};
use crate::ui::transfer_function::TransferFunctionEditor;
use crate::ui::widgets::generate_widgets;

/// The studio main loop state, without a window
///
/// Owns the frame being rendered, the lights attached to its world and the
/// queue of pending scene graph edits. A windowing front end calls
/// [`tick`](Studio::tick) once per displayed frame and
/// [`draw_ui`](Studio::draw_ui) inside its ImGui frame.
pub struct Studio {
    config: StudioConfig,
    device: Arc<dyn RenderDevice>,
    frame: Frame,
    lights: LightsManager,
    scheduler: Arc<JobScheduler>,
    tfn_editor: Option<TransferFunctionEditor>,
    color_map_path: String,
}

impl Studio {
    pub fn new(config: StudioConfig, device: Arc<dyn RenderDevice>) -> Result<Self> {
        let frame = Frame::new(device.clone())?;
        frame.set_window_size(Vector2::from(config.window_size))?;
        frame.node().set_child_value("scaleNav", config.nav_scale)?;
        frame.set_renderer_type(config.renderer)?;

        let lights = LightsManager::new()?;
        lights.add_light("default", &config.light_type)?;
        let world = frame.world()?;
        lights.update_world(&world)?;

        log::info!(
            "studio ready: {}x{} with the {} renderer",
            config.window_size[0],
            config.window_size[1],
            config.renderer
        );
        Ok(Self {
            config,
            device,
            frame,
            lights,
            scheduler: Arc::new(JobScheduler::new()),
            tfn_editor: None,
            color_map_path: String::new(),
        })
    }

    /// Studio on an in-memory [`HeadlessDevice`]
    pub fn headless(config: StudioConfig) -> Result<Self> {
        Self::new(config, Arc::new(HeadlessDevice::new()))
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn lights(&self) -> &LightsManager {
        &self.lights
    }

    pub fn scheduler(&self) -> &Arc<JobScheduler> {
        &self.scheduler
    }

    pub fn set_renderer_type(&self, renderer_type: RendererType) -> Result<bool> {
        self.frame.set_renderer_type(renderer_type)
    }

    pub fn add_light(&self, name: &str, light_type: &str) -> Result<bool> {
        self.lights.add_light(name, light_type)
    }

    pub fn remove_light(&self, name: &str) -> bool {
        self.lights.remove_light(name)
    }

    /// Opens the transfer function editor on `tfn`
    pub fn edit_transfer_function(&mut self, tfn: TransferFunction) {
        self.tfn_editor = Some(TransferFunctionEditor::new(tfn, self.scheduler.clone()));
    }

    pub fn transfer_function_editor(&mut self) -> Option<&mut TransferFunctionEditor> {
        self.tfn_editor.as_mut()
    }

    /// Applies pending edits and starts a frame if the last one is done
    ///
    /// Returns whether a new frame was started.
    pub fn tick(&mut self) -> Result<bool> {
        if let Some(editor) = self.tfn_editor.as_mut() {
            editor.update();
        }
        let ops = self.scheduler.execute_node_ops();
        if ops > 0 {
            log::debug!("applied {ops} node ops");
        }

        if !self.frame.frame_is_ready() {
            return Ok(false);
        }
        self.frame.start_new_frame()?;
        Ok(true)
    }

    pub fn wait_frame(&self) {
        self.frame.wait_on_frame();
    }

    /// Waits for the current frame and copies out its color channel
    pub fn snapshot(&self) -> Result<MappedFrame> {
        let mapped = self.frame.map_frame(FrameChannel::Color)?;
        let copy = mapped.clone();
        self.frame.unmap_frame(mapped);
        Ok(copy)
    }

    pub fn draw_ui(&mut self, ui: &Ui) {
        let frame = &self.frame;
        ui.window("Scene").build(|| {
            let names = RendererType::ALL.map(|t| t.as_str());
            let current = frame
                .renderer()
                .ok()
                .and_then(|r| RendererType::ALL.iter().position(|t| t.node_subtype() == r.subtype()));
            let mut selected = current.unwrap_or(0);
            if ui.combo_simple_string("renderer", &mut selected, &names) {
                if let Err(e) = frame.set_renderer_type(RendererType::ALL[selected]) {
                    log::error!("could not switch renderer: {e}");
                }
            }
            ui.text(format!("progress {:.0}%", frame.frame_progress() * 100.0));
            ui.separator();

            if let Err(e) = generate_widgets(ui, frame.node()) {
                log::error!("scene edit failed: {e}");
            }
        });

        if let Some(editor) = self.tfn_editor.as_mut() {
            editor.draw(ui, &mut self.color_map_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ObjectKind;
    use crate::sg::node::NodeType;

    fn studio() -> (Arc<HeadlessDevice>, Studio) {
        let headless = Arc::new(HeadlessDevice::new());
        let config = StudioConfig {
            window_size: [320, 240],
            light_type: "distant".into(),
            ..Default::default()
        };
        let studio = Studio::new(config, headless.clone()).unwrap();
        (headless, studio)
    }

    #[test]
    fn test_new_studio_has_default_light_in_world() {
        let (_, studio) = studio();
        let world = studio.frame().world().unwrap();
        let lights = world.child("lights").unwrap();
        assert_eq!(lights.node_type(), NodeType::Lights);
        assert_eq!(lights.child("default").unwrap().subtype(), "light_distant");
    }

    #[test]
    fn test_tick_renders_and_snapshot_matches_window() {
        let (headless, mut studio) = studio();
        assert!(studio.tick().unwrap());
        studio.wait_frame();
        assert_eq!(headless.frames_rendered(), 1);

        let snapshot = studio.snapshot().unwrap();
        assert_eq!((snapshot.width, snapshot.height), (320, 240));
        assert_eq!(
            headless.objects_of_kind(ObjectKind::Light).len(),
            1
        );
    }

    #[test]
    fn test_node_ops_land_before_the_next_frame() {
        let (headless, mut studio) = studio();
        let world = studio.frame().world().unwrap();
        studio.scheduler().schedule_node_op(move || {
            world.create_child("ball", "geometry_spheres")?;
            Ok(())
        });

        studio.tick().unwrap();
        assert_eq!(headless.objects_of_kind(ObjectKind::GeometricModel).len(), 1);
    }

    #[test]
    fn test_light_and_renderer_management() {
        let (headless, mut studio) = studio();
        assert!(studio.add_light("fill", "ambient").unwrap());
        assert!(!studio.add_light("fill", "sphere").unwrap());
        assert!(studio.set_renderer_type(RendererType::Debug).unwrap());
        studio.tick().unwrap();
        assert_eq!(headless.objects_of_kind(ObjectKind::Light).len(), 2);

        assert!(studio.remove_light("fill"));
        assert!(!studio.remove_light("fill"));
        studio.tick().unwrap();
        assert_eq!(headless.objects_of_kind(ObjectKind::Light).len(), 1);
    }

    #[test]
    fn test_transfer_function_edits_reach_the_volume() {
        let (_, mut studio) = studio();
        let volume = studio
            .frame()
            .world()
            .unwrap()
            .create_child("cloud", "volume_structured")
            .unwrap();
        let tfn = TransferFunction::from_node(volume.child("transferFunction").unwrap()).unwrap();
        studio.edit_transfer_function(tfn.clone());
        studio.tick().unwrap();

        let editor = studio.transfer_function_editor().unwrap();
        editor.set_selection(1);
        studio.tick().unwrap();
        assert_eq!(tfn.color_control_points().unwrap().len(), 17);
        assert!(!tfn.node().is_modified());
    }
}
