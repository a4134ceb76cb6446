//! Stock shape outlines.
//!
//! Each outline fits the unit box centered on the origin, y pointing down,
//! so a shape's "top" has negative y.

use kurbo::{Affine, BezPath, Circle, Point, Shape};

pub const CIRCLE: u8 = 0;
pub const SQUARE: u8 = 1;
pub const TRIANGLE: u8 = 2;
pub const DIAMOND: u8 = 3;
pub const TRAPEZOID: u8 = 4;
pub const TEE: u8 = 5;

/// Curve flattening tolerance in unit-box coordinates.
const TOLERANCE: f64 = 1e-3;

/// Outline for a `Shape` attribute value. Unknown values fall back to a square.
pub fn outline(shape: u8) -> BezPath {
    let points: Vec<(f64, f64)> = match shape {
        CIRCLE => return Circle::new(Point::ORIGIN, 0.5).to_path(TOLERANCE),
        TRIANGLE => vec![(-0.5, 0.5), (0.5, 0.5), (0.0, -0.5)],
        DIAMOND => vec![(0.0, 0.5), (0.5, -0.25), (0.0, -0.5), (-0.5, -0.25)],
        TRAPEZOID => vec![(-0.5, 0.5), (0.5, 0.5), (0.25, -0.5), (-0.25, -0.5)],
        TEE => vec![
            (-1.0 / 6.0, 0.5),
            (1.0 / 6.0, 0.5),
            (1.0 / 6.0, -0.25),
            (0.5, -0.25),
            (0.5, -0.5),
            (-0.5, -0.5),
            (-0.5, -0.25),
            (-1.0 / 6.0, -0.25),
        ],
        _ => vec![(-0.5, 0.5), (0.5, 0.5), (0.5, -0.5), (-0.5, -0.5)],
    };
    polygon(&points)
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut path = BezPath::new();
    for (i, &p) in points.iter().enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Squash an outline to a width:height ratio while keeping it in the unit box.
///
/// Ratios above 1 flatten the shape, below 1 narrow it. Non-positive or
/// non-finite ratios leave the outline unchanged.
pub fn aspect_transform(ratio: f64) -> Affine {
    if !ratio.is_finite() || ratio <= 0.0 {
        Affine::IDENTITY
    } else if ratio >= 1.0 {
        Affine::scale_non_uniform(1.0, 1.0 / ratio)
    } else {
        Affine::scale_non_uniform(ratio, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;
    use raven_core::Attribute;

    #[test]
    fn test_every_shape_fits_unit_box() {
        for shape in Attribute::Shape.values() {
            // curve approximation may bulge by up to the flattening tolerance
            let b = outline(shape).bounding_box();
            let limit = 0.5 + TOLERANCE;
            assert!(b.x0 >= -limit && b.x1 <= limit, "shape {}", shape);
            assert!(b.y0 >= -limit && b.y1 <= limit, "shape {}", shape);
        }
    }

    #[test]
    fn test_vertex_counts() {
        let lines = |shape| {
            outline(shape)
                .elements()
                .iter()
                .filter(|el| matches!(el, PathEl::MoveTo(_) | PathEl::LineTo(_)))
                .count()
        };
        assert_eq!(lines(SQUARE), 4);
        assert_eq!(lines(TRIANGLE), 3);
        assert_eq!(lines(TEE), 8);
        let curves = outline(CIRCLE)
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count();
        assert!(curves > 0);
    }

    #[test]
    fn test_aspect_transform_keeps_unit_box() {
        let wide = (aspect_transform(4.0) * outline(SQUARE)).bounding_box();
        assert!((wide.width() - 1.0).abs() < 1e-9);
        assert!((wide.height() - 0.25).abs() < 1e-9);

        let tall = (aspect_transform(0.5) * outline(SQUARE)).bounding_box();
        assert!((tall.width() - 0.5).abs() < 1e-9);
        assert!((tall.height() - 1.0).abs() < 1e-9);

        assert_eq!(aspect_transform(0.0), Affine::IDENTITY);
        assert_eq!(aspect_transform(f64::NAN), Affine::IDENTITY);
    }
}
