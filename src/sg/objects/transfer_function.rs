//! Piecewise-linear transfer function
//!
//! Editing happens on two sets of control points, colors `(x, r, g, b)` and
//! opacities `(x, a)`, both kept sorted by `x` in `[0, 1]`. The renderer
//! only sees `numSamples` evenly spaced samples of the resulting curves
//! (`color`, `opacity`) together with the `valueRange` they map onto.

use cgmath::{Vector2, Vector3, Vector4};

use super::parameters::{add_param, add_ranged_param};
use crate::device::ObjectKind;
use crate::error::{Result, SgError};
use crate::sg::factory::{create_data_node, NodeConstructor};
use crate::sg::node::{Node, NodeBehavior, NodeBuilder, NodePtr, NodeType};
use crate::sg::value::{DataArray, Value};

/// Color control point: position then RGB
pub type ColorPoint = Vector4<f32>;

/// Opacity control point: position then alpha
pub type OpacityPoint = Vector2<f32>;

pub const DEFAULT_NUM_SAMPLES: i32 = 256;

/// Index of the first point right of `p`, the upper end of its segment
///
/// Points must be sorted by position.
pub fn find_index(positions: impl Iterator<Item = f32>, p: f32) -> usize {
    positions.take_while(|&x| x <= p).count()
}

fn lerp(l: f32, r: f32, pl: f32, pr: f32, p: f32) -> f32 {
    let d = if (pr - pl).abs() > 0.0001 {
        ((p - pl) / (pr - pl)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    l * (1.0 - d) + r * d
}

/// Segment `(left, right)` bracketing `p`, clamped to the ends
fn segment(len: usize, upper: usize) -> (usize, usize) {
    let right = upper.clamp(1, len - 1);
    (right - 1, right)
}

/// Color of the curve at `p`
pub fn sample_color(points: &[ColorPoint], p: f32) -> Vector3<f32> {
    match points {
        [] => Vector3::new(0.0, 0.0, 0.0),
        [only] => only.truncate_n(0),
        _ => {
            let (il, ir) = segment(points.len(), find_index(points.iter().map(|c| c.x), p));
            let (l, r) = (points[il], points[ir]);
            Vector3::new(
                lerp(l.y, r.y, l.x, r.x, p),
                lerp(l.z, r.z, l.x, r.x, p),
                lerp(l.w, r.w, l.x, r.x, p),
            )
        }
    }
}

/// Opacity of the curve at `p`
pub fn sample_opacity(points: &[OpacityPoint], p: f32) -> f32 {
    match points {
        [] => 0.0,
        [only] => only.y,
        _ => {
            let (il, ir) = segment(points.len(), find_index(points.iter().map(|o| o.x), p));
            let (l, r) = (points[il], points[ir]);
            lerp(l.y, r.y, l.x, r.x, p)
        }
    }
}

/// The Jet color map used for new transfer functions
pub fn jet_color_points() -> Vec<ColorPoint> {
    vec![
        Vector4::new(0.0, 0.0, 0.0, 1.0),
        Vector4::new(0.3, 0.0, 1.0, 1.0),
        Vector4::new(0.6, 1.0, 1.0, 0.0),
        Vector4::new(1.0, 1.0, 0.0, 0.0),
    ]
}

/// Linear ramp from transparent to opaque
pub fn ramp_opacity_points() -> Vec<OpacityPoint> {
    vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)]
}

/// Resamples whenever the control points changed after the last samples
struct TransferFunctionBehavior;

impl NodeBehavior for TransferFunctionBehavior {
    fn pre_commit(&self, node: &Node) -> Result<()> {
        let samples = node.child("color")?.last_value_edit();
        let stale = ["colorControlPoints", "opacityControlPoints", "numSamples"]
            .iter()
            .filter_map(|name| node.try_child(name))
            .any(|c| c.last_value_edit() > samples);
        if stale {
            update_child_data_values(node)?;
        }
        Ok(())
    }
}

fn transfer_function_node(name: &str) -> Result<NodePtr> {
    let node = NodeBuilder::new(name, "transfer_function", NodeType::TransferFunction)
        .with_object(ObjectKind::TransferFunction, "piecewiseLinear")
        .with_behavior(TransferFunctionBehavior)
        .with_description("maps scalar values to color and opacity")
        .build();

    add_param(&node, "valueRange", "vec2f", Vector2::new(0.0f32, 1.0), "scalar range mapped onto the curves")?;
    add_ranged_param(
        &node,
        "numSamples",
        "int",
        DEFAULT_NUM_SAMPLES,
        (Value::Int(2), Value::Int(4096)),
        "samples handed to the renderer",
    )?
    .set_sg_only(true);

    for (name, points) in [
        ("colorControlPoints", DataArray::Vec4f(jet_color_points())),
        ("opacityControlPoints", DataArray::Vec2f(ramp_opacity_points())),
    ] {
        let child = node.add(create_data_node(name, points))?;
        child.set_sg_only(true);
        child.set_sg_no_ui(true);
    }
    node.add(create_data_node("color", DataArray::Vec3f(Vec::new())))?
        .set_sg_no_ui(true);
    node.add(create_data_node("opacity", DataArray::Float(Vec::new())))?
        .set_sg_no_ui(true);

    update_child_data_values(&node)?;
    Ok(node)
}

/// Resamples the control points into the `color` and `opacity` children
pub fn update_child_data_values(node: &Node) -> Result<()> {
    let colors: Vec<ColorPoint> = node.child_value_as("colorControlPoints")?;
    let opacities: Vec<OpacityPoint> = node.child_value_as("opacityControlPoints")?;
    let n = node.child_value_as::<i32>("numSamples")?.max(2) as usize;

    let step = 1.0 / (n - 1) as f32;
    let (color, opacity): (Vec<Vector3<f32>>, Vec<f32>) = (0..n)
        .map(|i| {
            let p = (i as f32 * step).clamp(0.0, 1.0);
            (sample_color(&colors, p), sample_opacity(&opacities, p))
        })
        .unzip();

    node.set_child_value("color", color)?;
    node.set_child_value("opacity", opacity)?;
    Ok(())
}

pub(crate) fn register_builtins(table: &mut Vec<(&'static str, NodeConstructor)>) {
    table.push(("transfer_function", transfer_function_node));
}

/// Typed view over a `transfer_function` node
#[derive(Debug, Clone)]
pub struct TransferFunction {
    node: NodePtr,
}

impl TransferFunction {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            node: transfer_function_node(name)?,
        })
    }

    pub fn from_node(node: NodePtr) -> Result<Self> {
        if node.node_type() != NodeType::TransferFunction {
            return Err(SgError::WrongNodeType {
                node: node.name().to_string(),
                expected: NodeType::TransferFunction,
                actual: node.node_type(),
            });
        }
        Ok(Self { node })
    }

    pub fn node(&self) -> &NodePtr {
        &self.node
    }

    pub fn into_node(self) -> NodePtr {
        self.node
    }

    /// Replaces both control point sets
    ///
    /// Needs at least one point of each kind; positions must be sorted.
    pub fn set_control_points(&self, colors: Vec<ColorPoint>, opacities: Vec<OpacityPoint>) -> Result<()> {
        if colors.is_empty() || opacities.is_empty() {
            return Err(SgError::TransferFunction(format!(
                "'{}' needs color and opacity points, got {} and {}",
                self.node.name(),
                colors.len(),
                opacities.len()
            )));
        }
        let sorted = colors.windows(2).all(|w| w[0].x <= w[1].x)
            && opacities.windows(2).all(|w| w[0].x <= w[1].x);
        if !sorted {
            return Err(SgError::TransferFunction(format!(
                "control points of '{}' are not sorted by position",
                self.node.name()
            )));
        }
        self.node.set_child_value("colorControlPoints", colors)?;
        self.node.set_child_value("opacityControlPoints", opacities)?;
        Ok(())
    }

    pub fn color_control_points(&self) -> Result<Vec<ColorPoint>> {
        self.node.child_value_as("colorControlPoints")
    }

    pub fn opacity_control_points(&self) -> Result<Vec<OpacityPoint>> {
        self.node.child_value_as("opacityControlPoints")
    }

    pub fn num_samples(&self) -> Result<usize> {
        Ok(self.node.child_value_as::<i32>("numSamples")?.max(2) as usize)
    }

    pub fn value_range(&self) -> Result<Vector2<f32>> {
        self.node.child_value_as("valueRange")
    }

    pub fn set_value_range(&self, range: Vector2<f32>) -> Result<bool> {
        self.node.set_child_value("valueRange", range)
    }

    pub fn update_child_data_values(&self) -> Result<()> {
        update_child_data_values(&self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sg::factory::create_node;

    #[test]
    fn test_find_index_is_upper_bound() {
        let xs = [0.0f32, 0.3, 0.6, 1.0];
        assert_eq!(find_index(xs.iter().copied(), -0.5), 0);
        assert_eq!(find_index(xs.iter().copied(), 0.0), 1);
        assert_eq!(find_index(xs.iter().copied(), 0.45), 2);
        assert_eq!(find_index(xs.iter().copied(), 1.0), 4);
    }

    #[test]
    fn test_sampling_interpolates_and_clamps_ends() {
        let colors = jet_color_points();
        assert_eq!(sample_color(&colors, 0.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(sample_color(&colors, 1.0), Vector3::new(1.0, 0.0, 0.0));
        let mid = sample_color(&colors, 0.15);
        assert!((mid.y - 0.5).abs() < 1e-6);

        let ramp = ramp_opacity_points();
        assert!((sample_opacity(&ramp, 0.25) - 0.25).abs() < 1e-6);
        assert_eq!(sample_opacity(&ramp, 2.0), 1.0);
        assert_eq!(sample_opacity(&[], 0.5), 0.0);
    }

    #[test]
    fn test_new_function_is_sampled() {
        let tfn = create_node("tfn", "transfer_function").unwrap();
        let color: Vec<Vector3<f32>> = tfn.child_value_as("color").unwrap();
        let opacity: Vec<f32> = tfn.child_value_as("opacity").unwrap();
        assert_eq!(color.len(), DEFAULT_NUM_SAMPLES as usize);
        assert_eq!(opacity.len(), DEFAULT_NUM_SAMPLES as usize);
        assert_eq!(opacity[0], 0.0);
        assert_eq!(*opacity.last().unwrap(), 1.0);
    }

    #[test]
    fn test_control_point_edit_resamples_on_commit() {
        let tfn = TransferFunction::new("tfn").unwrap();
        tfn.node().set_child_value("numSamples", 3).unwrap();
        tfn.set_control_points(
            vec![Vector4::new(0.0, 1.0, 1.0, 1.0), Vector4::new(1.0, 1.0, 1.0, 1.0)],
            vec![Vector2::new(0.0, 0.5), Vector2::new(1.0, 0.5)],
        )
        .unwrap();

        TransferFunctionBehavior.pre_commit(tfn.node()).unwrap();
        let opacity: Vec<f32> = tfn.node().child_value_as("opacity").unwrap();
        assert_eq!(opacity, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_control_points_keep_their_element_type() {
        let tfn = TransferFunction::new("tfn").unwrap();
        assert!(matches!(
            tfn.node().set_child_value("colorControlPoints", vec![0.5f32]),
            Err(SgError::TypeMismatch { .. })
        ));
        assert_eq!(tfn.color_control_points().unwrap(), jet_color_points());
        TransferFunctionBehavior.pre_commit(tfn.node()).unwrap();
    }

    #[test]
    fn test_rejects_unsorted_points() {
        let tfn = TransferFunction::new("tfn").unwrap();
        let err = tfn.set_control_points(
            vec![Vector4::new(0.5, 0.0, 0.0, 0.0), Vector4::new(0.2, 0.0, 0.0, 0.0)],
            ramp_opacity_points(),
        );
        assert!(matches!(err, Err(SgError::TransferFunction(_))));
        assert!(TransferFunction::from_node(create_node("f", "float").unwrap()).is_err());
    }
}
