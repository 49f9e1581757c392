//! Transfer function editor
//!
//! Editing state behind the transfer function window: a list of color maps,
//! one opacity curve shared by all of them and a global opacity scale. Edits
//! only touch the editor; [`TransferFunctionEditor::update`] hands the
//! result to the scene graph as a node op so it lands between frames.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cgmath::{Vector2, Vector3, Vector4};
use imgui::Ui;

use crate::error::{Result, SgError};
use crate::jobs::JobScheduler;
use crate::sg::objects::transfer_function::{
    find_index, jet_color_points, ramp_opacity_points, sample_color, sample_opacity,
};
use crate::sg::objects::{ColorPoint, OpacityPoint, TransferFunction};
use crate::sg::visitors::MarkAllAsModified;
use crate::ui::widgets::generate_widgets;

pub const MAX_OPACITY_SCALE: f32 = 10.0;

/// A named set of color control points
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: String,
    pub points: Vec<ColorPoint>,
    /// Loaded maps are shown as they are
    pub editable: bool,
}

impl ColorMap {
    pub fn jet() -> Self {
        Self {
            name: "Jet".into(),
            points: jet_color_points(),
            editable: true,
        }
    }

    pub fn ice_fire() -> Self {
        const RGB: [[f32; 3]; 17] = [
            [0.0, 0.0, 0.0],
            [0.0, 0.120394, 0.302678],
            [0.0, 0.216587, 0.524575],
            [0.0552529, 0.345022, 0.659495],
            [0.128054, 0.492592, 0.720287],
            [0.188952, 0.641306, 0.792096],
            [0.327672, 0.784939, 0.873426],
            [0.60824, 0.892164, 0.935546],
            [0.881376, 0.912184, 0.818097],
            [0.9514, 0.835615, 0.449271],
            [0.904479, 0.690486, 0.0],
            [0.854063, 0.510857, 0.0],
            [0.777096, 0.330175, 0.000885023],
            [0.672862, 0.139086, 0.00270085],
            [0.508812, 0.0, 0.0],
            [0.299413, 0.000366217, 0.000549325],
            [0.0157473, 0.00332647, 0.0],
        ];
        Self {
            name: "Ice Fire".into(),
            points: evenly_spaced(&RGB),
            editable: true,
        }
    }
}

fn evenly_spaced(rgb: &[[f32; 3]]) -> Vec<ColorPoint> {
    let step = 1.0 / (rgb.len().max(2) - 1) as f32;
    rgb.iter()
        .enumerate()
        .map(|(i, c)| Vector4::new(i as f32 * step, c[0], c[1], c[2]))
        .collect()
}

/// Parses a color map file: one `r g b` row per line
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_color_map(text: &str) -> Result<Vec<[f32; 3]>> {
    let mut rows = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values: Vec<f32> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| SgError::TransferFunction(format!("line {}: {e}", number + 1)))?;
        match values.as_slice() {
            [r, g, b] => rows.push([*r, *g, *b]),
            _ => {
                return Err(SgError::TransferFunction(format!(
                    "line {}: expected 3 values, found {}",
                    number + 1,
                    values.len()
                )))
            }
        }
    }
    if rows.len() < 2 {
        return Err(SgError::TransferFunction(
            "transfer function contains too few color points".into(),
        ));
    }
    Ok(rows)
}

pub struct TransferFunctionEditor {
    target: TransferFunction,
    scheduler: Arc<JobScheduler>,
    maps: Vec<ColorMap>,
    opacities: Vec<OpacityPoint>,
    selection: usize,
    opacity_scale: f32,
    changed: bool,
}

impl TransferFunctionEditor {
    /// Starts on the Jet map; the first [`update`](Self::update) pushes it
    pub fn new(target: TransferFunction, scheduler: Arc<JobScheduler>) -> Self {
        Self {
            target,
            scheduler,
            maps: vec![ColorMap::jet(), ColorMap::ice_fire()],
            opacities: ramp_opacity_points(),
            selection: 0,
            opacity_scale: 1.0,
            changed: true,
        }
    }

    pub fn target(&self) -> &TransferFunction {
        &self.target
    }

    pub fn color_map_names(&self) -> Vec<&str> {
        self.maps.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn set_selection(&mut self, selection: usize) -> bool {
        if selection == self.selection || selection >= self.maps.len() {
            return false;
        }
        self.selection = selection;
        self.changed = true;
        true
    }

    fn current(&self) -> &ColorMap {
        &self.maps[self.selection]
    }

    fn current_mut(&mut self) -> &mut ColorMap {
        &mut self.maps[self.selection]
    }

    pub fn is_editable(&self) -> bool {
        self.current().editable
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn color_points(&self) -> &[ColorPoint] {
        &self.current().points
    }

    pub fn opacity_points(&self) -> &[OpacityPoint] {
        &self.opacities
    }

    pub fn opacity_scale(&self) -> f32 {
        self.opacity_scale
    }

    pub fn set_opacity_scale(&mut self, scale: f32) {
        let scale = scale.clamp(0.0, MAX_OPACITY_SCALE);
        if scale != self.opacity_scale {
            self.opacity_scale = scale;
            self.changed = true;
        }
    }

    /// Inserts a color point at `x` with the color the curve has there
    pub fn add_color_point(&mut self, x: f32) -> Option<usize> {
        if !self.is_editable() {
            return None;
        }
        let x = x.clamp(0.0, 1.0);
        let points = &self.current().points;
        let color = sample_color(points, x);
        let index = find_index(points.iter().map(|c| c.x), x).clamp(1, points.len().saturating_sub(1).max(1));
        self.current_mut()
            .points
            .insert(index, Vector4::new(x, color.x, color.y, color.z));
        self.changed = true;
        Some(index)
    }

    /// Removes an inner color point; the end points stay
    pub fn remove_color_point(&mut self, index: usize) -> bool {
        let len = self.color_points().len();
        if !self.is_editable() || index == 0 || index + 1 >= len {
            return false;
        }
        self.current_mut().points.remove(index);
        self.changed = true;
        true
    }

    /// Moves an inner color point, staying between its neighbours
    pub fn move_color_point(&mut self, index: usize, x: f32) -> bool {
        let len = self.color_points().len();
        if !self.is_editable() || index == 0 || index + 1 >= len {
            return false;
        }
        let points = &mut self.current_mut().points;
        points[index].x = x.clamp(points[index - 1].x, points[index + 1].x);
        self.changed = true;
        true
    }

    pub fn set_point_color(&mut self, index: usize, rgb: Vector3<f32>) -> bool {
        if !self.is_editable() || index >= self.color_points().len() {
            return false;
        }
        let point = &mut self.current_mut().points[index];
        point.y = rgb.x;
        point.z = rgb.y;
        point.w = rgb.z;
        self.changed = true;
        true
    }

    /// Inserts an opacity point, keeping the end points at the ends
    pub fn add_opacity_point(&mut self, x: f32, alpha: f32) -> usize {
        let x = x.clamp(0.0, 1.0);
        let len = self.opacities.len();
        let index = find_index(self.opacities.iter().map(|o| o.x), x).clamp(1, len.saturating_sub(1).max(1));
        self.opacities
            .insert(index, Vector2::new(x, alpha.clamp(0.0, 1.0)));
        self.changed = true;
        index
    }

    pub fn remove_opacity_point(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.opacities.len() {
            return false;
        }
        self.opacities.remove(index);
        self.changed = true;
        true
    }

    /// Moves an opacity point; end points only move vertically
    pub fn move_opacity_point(&mut self, index: usize, x: f32, alpha: f32) -> bool {
        let len = self.opacities.len();
        if index >= len {
            return false;
        }
        self.opacities[index].y = alpha.clamp(0.0, 1.0);
        if index > 0 && index + 1 < len {
            let (lo, hi) = (self.opacities[index - 1].x, self.opacities[index + 1].x);
            self.opacities[index].x = x.clamp(lo, hi);
        }
        self.changed = true;
        true
    }

    /// `n` RGBA8 texels of the current curves, for palette previews
    pub fn sample_palette(&self, n: usize) -> Vec<[u8; 4]> {
        let n = n.max(2);
        let step = 1.0 / (n - 1) as f32;
        (0..n)
            .map(|i| {
                let p = (i as f32 * step).clamp(0.0, 1.0);
                let c = sample_color(self.color_points(), p);
                let a = sample_opacity(&self.opacities, p);
                [
                    (c.x.clamp(0.0, 1.0) * 255.0) as u8,
                    (c.y.clamp(0.0, 1.0) * 255.0) as u8,
                    (c.z.clamp(0.0, 1.0) * 255.0) as u8,
                    (a.clamp(0.0, 1.0) * 255.0) as u8,
                ]
            })
            .collect()
    }

    /// Adds the color map stored at `path` and selects it
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let rows = parse_color_map(&fs::read_to_string(path)?)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::info!("loaded color map '{name}' with {} points", rows.len());
        self.maps.push(ColorMap {
            name,
            points: evenly_spaced(&rows),
            editable: false,
        });
        let index = self.maps.len() - 1;
        self.set_selection(index);
        Ok(index)
    }

    /// Queues the edited curves for the transfer function node
    ///
    /// Returns false if nothing changed since the last update.
    pub fn update(&mut self) -> bool {
        if !self.changed {
            return false;
        }
        self.changed = false;

        let target = self.target.clone();
        let colors = self.color_points().to_vec();
        let scale = self.opacity_scale;
        let opacities: Vec<OpacityPoint> = self
            .opacities
            .iter()
            .map(|o| Vector2::new(o.x, o.y * scale))
            .collect();

        self.scheduler.schedule_node_op(move || {
            target.set_control_points(colors, opacities)?;
            target.update_child_data_values()?;
            target.node().traverse(&mut MarkAllAsModified)
        });
        true
    }

    /// Draws the editor window and applies what the user changed
    pub fn draw(&mut self, ui: &Ui, color_map_path: &mut String) {
        ui.window("Transfer Function").build(|| {
            let names = self.color_map_names().iter().map(|s| s.to_string()).collect::<Vec<_>>();
            let mut selection = self.selection;
            if ui.combo_simple_string("Color maps", &mut selection, names.as_slice()) {
                self.set_selection(selection);
            }

            ui.input_text("##color_map_path", color_map_path).build();
            ui.same_line();
            if ui.button("Load") {
                if let Err(e) = self.load(color_map_path.as_str()) {
                    log::error!("could not load color map '{color_map_path}': {e}");
                }
            }
            ui.separator();

            if let Some(range) = self.target.node().try_child("valueRange") {
                if let Err(e) = generate_widgets(ui, &range) {
                    log::error!("value range edit failed: {e}");
                }
            }

            let mut scale = self.opacity_scale;
            if ui.slider("opacity scale", 0.0, MAX_OPACITY_SCALE, &mut scale) {
                self.set_opacity_scale(scale);
            }

            let alpha: Vec<f32> = self
                .sample_palette(128)
                .iter()
                .map(|t| t[3] as f32 / 255.0)
                .collect();
            ui.plot_lines("opacity", &alpha)
                .scale_min(0.0)
                .scale_max(1.0)
                .graph_size([0.0, 80.0])
                .build();

            for i in 0..self.color_points().len() {
                let p = self.color_points()[i];
                let mut rgb = [p.y, p.z, p.w];
                if ui.color_edit3(format!("{:.2}##color_point{i}", p.x), &mut rgb) {
                    self.set_point_color(i, rgb.into());
                }
            }
        });
        self.update();
    }
}
