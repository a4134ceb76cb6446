//! Rasterizing drawing commands with tiny-skia.
//!
//! Paths are placed in kurbo first, so stroke widths stay in output pixels
//! regardless of shape scale. Fills use the even-odd rule with anti-aliased
//! edges. The result is copied back into an [`RgbaImage`] for encoding.

use crate::command::{Affine, BezPath, DrawCommand, Rgba};
use image::{ImageBuffer, Rgba as Pixel, RgbaImage};
use kurbo::PathEl;
use tiny_skia::{ColorU8, FillRule, Paint, Path, PathBuilder, Pixmap, Transform};
use tracing::warn;

/// Draw `commands` onto a fresh `width x height` image.
pub fn rasterize(commands: &[DrawCommand], width: u32, height: u32, background: Rgba) -> RgbaImage {
    let mut img: RgbaImage = ImageBuffer::from_pixel(width, height, Pixel(background));
    draw_commands_at(&mut img, commands, Affine::IDENTITY);
    img
}

/// Draw `commands` onto `img`, each transform followed by `offset`.
pub fn draw_commands_at(img: &mut RgbaImage, commands: &[DrawCommand], offset: Affine) {
    let Some(mut pixmap) = Pixmap::new(img.width(), img.height()) else {
        warn!("skipping draw onto empty {}x{} image", img.width(), img.height());
        return;
    };
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    for command in commands {
        let Some(path) = to_skia_path(&command.placed_path(offset)) else {
            continue;
        };
        if let Some(fill) = command.fill {
            pixmap.fill_path(&path, &paint(fill), FillRule::EvenOdd, Transform::identity(), None);
        }
        if let Some(stroke) = command.stroke.filter(|s| s.width > 0.0) {
            let style = tiny_skia::Stroke {
                width: stroke.width as f32,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint(stroke.color), &style, Transform::identity(), None);
        }
    }

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// `None` for paths with no drawable segment.
fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(a, p) => pb.quad_to(a.x as f32, a.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(a, b, p) => pb.cubic_to(
                a.x as f32, a.y as f32, b.x as f32, b.y as f32, p.x as f32, p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Stroke;
    use crate::shapes::{outline, CIRCLE, SQUARE, TRIANGLE};

    const BG: Rgba = [255, 255, 255, 255];
    const RED: Rgba = [255, 0, 0, 255];
    const BLUE: Rgba = [0, 0, 255, 255];

    fn centered(path: BezPath, size: f64, stroke: Option<Stroke>) -> DrawCommand {
        DrawCommand {
            path,
            fill: Some(RED),
            stroke,
            transform: Affine::translate((50.0, 50.0)) * Affine::scale(size),
        }
    }

    #[test]
    fn test_fill_square() {
        let img = rasterize(&[centered(outline(SQUARE), 40.0, None)], 100, 100, BG);
        assert_eq!(img.width(), 100);
        assert_eq!(img.get_pixel(50, 50).0, RED);
        assert_eq!(img.get_pixel(31, 31).0, RED);
        assert_eq!(img.get_pixel(25, 50).0, BG);
        assert_eq!(img.get_pixel(0, 0).0, BG);
    }

    #[test]
    fn test_fill_circle_leaves_corners() {
        let img = rasterize(&[centered(outline(CIRCLE), 80.0, None)], 100, 100, BG);
        assert_eq!(img.get_pixel(50, 50).0, RED);
        assert_eq!(img.get_pixel(50, 12).0, RED);
        // bounding box corner lies outside the circle
        assert_eq!(img.get_pixel(13, 13).0, BG);
    }

    #[test]
    fn test_triangle_points_up() {
        let img = rasterize(&[centered(outline(TRIANGLE), 60.0, None)], 100, 100, BG);
        // wide at the bottom, narrow at the top
        assert_eq!(img.get_pixel(25, 78).0, RED);
        assert_eq!(img.get_pixel(25, 25).0, BG);
        assert_eq!(img.get_pixel(50, 25).0, RED);
    }

    #[test]
    fn test_stroke_drawn_over_fill() {
        let stroke = Stroke {
            color: BLUE,
            width: 4.0,
        };
        let img = rasterize(&[centered(outline(SQUARE), 40.0, Some(stroke))], 100, 100, BG);
        assert_eq!(img.get_pixel(30, 50).0, BLUE);
        assert_eq!(img.get_pixel(50, 50).0, RED);
        assert_eq!(img.get_pixel(20, 50).0, BG);
    }

    #[test]
    fn test_offset_moves_commands() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(200, 100, Pixel(BG));
        draw_commands_at(
            &mut img,
            &[centered(outline(SQUARE), 40.0, None)],
            Affine::translate((100.0, 0.0)),
        );
        assert_eq!(img.get_pixel(50, 50).0, BG);
        assert_eq!(img.get_pixel(150, 50).0, RED);
    }

    #[test]
    fn test_shapes_clipped_to_image() {
        let img = rasterize(&[centered(outline(SQUARE), 400.0, None)], 20, 20, BG);
        assert!(img.pixels().all(|p| p.0 == RED));
    }

    #[test]
    fn test_translucent_fill_blends_with_background() {
        let mut command = centered(outline(SQUARE), 40.0, None);
        command.fill = Some([0, 0, 0, 128]);
        let img = rasterize(&[command], 100, 100, BG);
        let p = img.get_pixel(50, 50).0;
        assert_eq!(p[3], 255);
        assert!(p[0] > 100 && p[0] < 155, "{:?}", p);
        assert_eq!(p[0], p[1]);
    }

    #[test]
    fn test_empty_image_is_left_alone() {
        let img = rasterize(&[centered(outline(SQUARE), 40.0, None)], 0, 0, BG);
        assert_eq!(img.dimensions(), (0, 0));
    }
}
