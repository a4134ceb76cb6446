//! Problem sheets: the 3x3 context grid above the answer options, as PNG.

use crate::adapter::{render, RenderStyle};
use crate::command::{Affine, DrawCommand, Rgba, Stroke};
use crate::raster::draw_commands_at;
use crate::shapes::{outline, SQUARE};
use image::{ImageBuffer, Rgba as Pixel, RgbaImage};
use raven_core::matrix::GRID;
use raven_core::{Element, Problem};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default page color.
pub const BACKGROUND: Rgba = [34, 34, 34, 255];

/// Page arrangement around the rendered cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub style: RenderStyle,
    /// Pixels between cells and around the page edge.
    pub gap: u32,
    /// Options per row below the context grid.
    pub option_columns: usize,
    pub background: Rgba,
    pub cell_color: Rgba,
    pub frame: Stroke,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            style: RenderStyle::default(),
            gap: 12,
            option_columns: 4,
            background: BACKGROUND,
            cell_color: [255, 255, 255, 255],
            frame: Stroke {
                color: [128, 128, 128, 255],
                width: 2.0,
            },
        }
    }
}

impl SheetLayout {
    fn cell(&self) -> u32 {
        self.style.cell_size.round().max(1.0) as u32
    }

    fn pitch(&self) -> u32 {
        self.cell() + self.gap
    }

    fn columns(&self) -> u32 {
        (self.option_columns.max(1) as u32).max(GRID as u32)
    }

    fn option_rows(&self, options: usize) -> u32 {
        options.div_ceil(self.option_columns.max(1)) as u32
    }

    /// Page size for a problem with `options` answer options.
    pub fn sheet_size(&self, options: usize) -> (u32, u32) {
        let width = self.gap + self.columns() * self.pitch();
        let height = self.gap + GRID as u32 * self.pitch() + self.gap + self.option_rows(options) * self.pitch();
        (width, height)
    }

    /// Top-left corner of context cell `(row, column)`.
    pub fn context_origin(&self, row: usize, column: usize) -> (u32, u32) {
        let indent = (self.columns() - GRID as u32) * self.pitch() / 2;
        (
            self.gap + indent + column as u32 * self.pitch(),
            self.gap + row as u32 * self.pitch(),
        )
    }

    /// Top-left corner of answer option `index`.
    pub fn option_origin(&self, index: usize) -> (u32, u32) {
        let per_row = self.option_columns.max(1);
        let top = self.gap + GRID as u32 * self.pitch() + self.gap;
        (
            self.gap + (index % per_row) as u32 * self.pitch(),
            top + (index / per_row) as u32 * self.pitch(),
        )
    }
}

/// Render a problem: context grid with the hidden cell left blank, then the options.
pub fn render_problem_sheet(problem: &Problem, layout: &SheetLayout) -> RgbaImage {
    let (width, height) = layout.sheet_size(problem.options().len());
    let mut img: RgbaImage = ImageBuffer::from_pixel(width, height, Pixel(layout.background));

    for panel in problem.context() {
        let origin = layout.context_origin(panel.row, panel.column);
        draw_cell(&mut img, layout, origin, Some(&panel.element));
    }
    let blank = layout.context_origin(GRID - 1, GRID - 1);
    draw_cell(&mut img, layout, blank, None);

    for (index, option) in problem.options().iter().enumerate() {
        draw_cell(&mut img, layout, layout.option_origin(index), Some(option));
    }

    debug!(width, height, options = problem.options().len(), "rendered problem sheet");
    img
}

fn draw_cell(img: &mut RgbaImage, layout: &SheetLayout, origin: (u32, u32), element: Option<&Element>) {
    let cell = f64::from(layout.cell());
    let offset = Affine::translate((f64::from(origin.0), f64::from(origin.1)));
    let frame = DrawCommand {
        path: outline(SQUARE),
        fill: Some(layout.cell_color),
        stroke: Some(layout.frame),
        transform: Affine::translate((cell / 2.0, cell / 2.0)) * Affine::scale(cell),
    };
    draw_commands_at(img, &[frame], offset);
    if let Some(element) = element {
        draw_commands_at(img, &render(element, &layout.style), offset);
    }
}

/// Save an image as PNG.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), image::ImageError> {
    img.save(path)
}

/// Render a problem sheet and save it to PNG.
pub fn render_problem_to_png(
    problem: &Problem,
    layout: &SheetLayout,
    path: &Path,
) -> Result<(), image::ImageError> {
    let img = render_problem_sheet(problem, layout);
    save_png(&img, path)
}
