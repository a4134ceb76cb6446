//! Render adapter for generated problems.
//!
//! [`adapter::render`] projects an element to backend-neutral
//! [`DrawCommand`]s built on kurbo paths. [`raster`] fills and strokes them
//! with tiny-skia, and [`sheet`] lays whole problems out as PNG sheets.
//!
//! ```no_run
//! use raven_core::{generate_problem, GeneratorConfig};
//! use raven_render::{render_problem_to_png, SheetLayout};
//! use std::path::Path;
//!
//! let problem = generate_problem(&GeneratorConfig::default()).unwrap();
//! render_problem_to_png(&problem, &SheetLayout::default(), Path::new("problem.png")).unwrap();
//! ```

pub mod adapter;
pub mod command;
pub mod raster;
pub mod shapes;
pub mod sheet;

pub use adapter::{render, RenderStyle, DEFAULT_PALETTE};
pub use command::{Affine, BezPath, DrawCommand, Point, Rgba, Stroke};
pub use shapes::aspect_transform;
pub use raster::{draw_commands_at, rasterize};
pub use sheet::{render_problem_sheet, render_problem_to_png, save_png, SheetLayout};
