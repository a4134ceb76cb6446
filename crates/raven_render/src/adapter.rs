//! Element to drawing commands.
//!
//! Pure projection: layers are emitted bottom to top, and within a layer one
//! command per occupied quadrant and copy. Coordinates are cell pixels with
//! the origin at the cell's top-left corner.

use crate::command::{Affine, DrawCommand, Rgba, Stroke};
use crate::shapes;
use raven_core::attribute::{quadrant_mask, QUADRANT_COUNT};
use raven_core::{Attribute, Element, Primitive};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

const WHITE: Rgba = [255, 255, 255, 255];

/// Palette indexed by the `Color` attribute.
pub const DEFAULT_PALETTE: [Rgba; 6] = [
    [0, 0, 0, 255],
    [214, 39, 40, 255],
    [44, 160, 44, 255],
    [31, 119, 180, 255],
    [255, 127, 14, 255],
    [148, 103, 189, 255],
];

/// Geometry and colors used to project elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Side of a square cell in pixels.
    pub cell_size: f64,
    /// Inset from each cell edge.
    pub margin: f64,
    pub stroke_width: f64,
    /// Fraction of its slot a shape may fill.
    pub slack: f64,
    pub palette: [Rgba; 6],
    /// Width:height ratio per `Shape` value. 1.0 draws the stock outline;
    /// 2.0 halves its height, 0.5 halves its width.
    pub aspect_ratios: [f64; 6],
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            cell_size: 120.0,
            margin: 6.0,
            stroke_width: 2.0,
            slack: 0.9,
            palette: DEFAULT_PALETTE,
            aspect_ratios: [1.0; 6],
        }
    }
}

/// Project an element to drawing commands.
pub fn render(element: &Element, style: &RenderStyle) -> Vec<DrawCommand> {
    element
        .layers()
        .iter()
        .flat_map(|layer| render_layer(layer, style))
        .collect()
}

fn render_layer(layer: &Primitive, style: &RenderStyle) -> Vec<DrawCommand> {
    let color = style.palette[layer.get(Attribute::Color) as usize % style.palette.len()];
    let darkness = f64::from(layer.get(Attribute::Shading))
        / f64::from(Attribute::Shading.domain_size() - 1);
    let fill = lerp(WHITE, color, darkness);
    let stroke = Stroke {
        color,
        width: style.stroke_width,
    };

    let scale = f64::from(layer.get(Attribute::Size) + 1) / f64::from(Attribute::Size.domain_size());
    let angle = f64::from(layer.get(Attribute::Rotation)) * FRAC_PI_4;
    let count = layer.get(Attribute::Count) as usize + 1;
    let mask = quadrant_mask(layer.get(Attribute::Position));
    let shape_value = layer.get(Attribute::Shape);
    let shape = shapes::outline(shape_value);
    let aspect = style
        .aspect_ratios
        .get(shape_value as usize)
        .map_or(Affine::IDENTITY, |&ratio| shapes::aspect_transform(ratio));

    let inner = style.cell_size - 2.0 * style.margin;
    let half = inner / 2.0;
    let side = grid_side(count);
    let slot = half / side as f64;
    let extent = slot * style.slack * scale;

    let mut commands = Vec::new();
    for quadrant in 0..QUADRANT_COUNT {
        if mask & (1 << quadrant) == 0 {
            continue;
        }
        let qx = style.margin + f64::from(quadrant % 2) * half;
        let qy = style.margin + f64::from(quadrant / 2) * half;
        for copy in 0..count {
            let cx = qx + ((copy % side) as f64 + 0.5) * slot;
            let cy = qy + ((copy / side) as f64 + 0.5) * slot;
            let transform = Affine::translate((cx, cy))
                * Affine::rotate(angle)
                * Affine::scale(extent)
                * aspect;
            commands.push(DrawCommand {
                path: shape.clone(),
                fill: Some(fill),
                stroke: Some(stroke),
                transform,
            });
        }
    }
    commands
}

/// Copies sit on a `side x side` grid: 1 for one copy, 2 up to four, else 3.
fn grid_side(count: usize) -> usize {
    match count {
        0 | 1 => 1,
        2..=4 => 2,
        _ => 3,
    }
}

fn lerp(from: Rgba, to: Rgba, t: f64) -> Rgba {
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    [mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2]), 255]
}
