//! Closed 2D outlines and their beveled extrusion along +Z.

use super::{require_non_negative, require_positive, GeometryData, GeometryError};
use std::f32::consts::FRAC_PI_2;

const POINT_EPSILON: f32 = 1e-6;

/// A closed, counter-clockwise 2D contour. The closing edge is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOutline {
    points: Vec<[f32; 2]>,
}

impl ShapeOutline {
    /// Builds an outline from counter-clockwise points, dropping consecutive duplicates.
    pub fn new(points: Vec<[f32; 2]>) -> Result<Self, GeometryError> {
        let mut deduped: Vec<[f32; 2]> = Vec::with_capacity(points.len());
        for point in points {
            if deduped.last().map_or(true, |last| !same_point(*last, point)) {
                deduped.push(point);
            }
        }
        while deduped.len() > 1 && same_point(deduped[0], deduped[deduped.len() - 1]) {
            deduped.pop();
        }

        if deduped.len() < 3 {
            return Err(GeometryError::DegenerateOutline(deduped.len()));
        }
        Ok(Self { points: deduped })
    }

    /// Rectangle centered at the origin whose corners are quadratic curves of `radius`,
    /// each sampled with `curve_segments` points.
    pub fn rounded_rect(
        width: f32,
        height: f32,
        radius: f32,
        curve_segments: u32,
    ) -> Result<Self, GeometryError> {
        let width = require_positive("width", width)?;
        let height = require_positive("height", height)?;
        let r = require_non_negative("corner radius", radius)?;
        if r * 2.0 > width.min(height) {
            return Err(GeometryError::CornerRadiusTooLarge {
                radius: r,
                width,
                height,
            });
        }

        let segments = curve_segments.max(1);
        let (hw, hh) = (width * 0.5, height * 0.5);
        let mut points = Vec::with_capacity(4 * (segments as usize + 1));

        points.push([-hw + r, -hh]);
        points.push([hw - r, -hh]);
        quadratic_corner(&mut points, [hw - r, -hh], [hw, -hh], [hw, -hh + r], segments);
        points.push([hw, hh - r]);
        quadratic_corner(&mut points, [hw, hh - r], [hw, hh], [hw - r, hh], segments);
        points.push([-hw + r, hh]);
        quadratic_corner(&mut points, [-hw + r, hh], [-hw, hh], [-hw, hh - r], segments);
        points.push([-hw, -hh + r]);
        quadratic_corner(&mut points, [-hw, -hh + r], [-hw, -hh], [-hw + r, -hh], segments);

        Self::new(points)
    }

    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    fn centroid(&self) -> [f32; 2] {
        let n = self.points.len() as f32;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        [sx / n, sy / n]
    }

    /// Unit miter direction at each point, scaled so an offset of `d` moves both
    /// adjacent edges outward by `d`.
    fn miter_vectors(&self) -> Vec<[f32; 2]> {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let prev = self.points[(i + n - 1) % n];
                let current = self.points[i];
                let next = self.points[(i + 1) % n];

                let n_prev = edge_normal(prev, current);
                let n_next = edge_normal(current, next);
                let sum = [n_prev[0] + n_next[0], n_prev[1] + n_next[1]];
                let length = (sum[0] * sum[0] + sum[1] * sum[1]).sqrt();
                if length <= POINT_EPSILON {
                    return n_next;
                }
                let miter = [sum[0] / length, sum[1] / length];
                let cos = (miter[0] * n_prev[0] + miter[1] * n_prev[1]).max(0.1);
                [miter[0] / cos, miter[1] / cos]
            })
            .collect()
    }
}

fn same_point(a: [f32; 2], b: [f32; 2]) -> bool {
    (a[0] - b[0]).abs() <= POINT_EPSILON && (a[1] - b[1]).abs() <= POINT_EPSILON
}

/// Outward normal of a counter-clockwise edge.
fn edge_normal(from: [f32; 2], to: [f32; 2]) -> [f32; 2] {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    let length = (dx * dx + dy * dy).sqrt().max(POINT_EPSILON);
    [dy / length, -dx / length]
}

fn quadratic_corner(
    points: &mut Vec<[f32; 2]>,
    start: [f32; 2],
    control: [f32; 2],
    end: [f32; 2],
    segments: u32,
) {
    for step in 1..=segments {
        let t = step as f32 / segments as f32;
        let a = (1.0 - t) * (1.0 - t);
        let b = 2.0 * t * (1.0 - t);
        let c = t * t;
        points.push([
            a * start[0] + b * control[0] + c * end[0],
            a * start[1] + b * control[1] + c * end[1],
        ]);
    }
}

/// Extrusion depth and bevel parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeOptions {
    pub depth: f32,
    pub steps: u32,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_offset: f32,
    pub bevel_segments: u32,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            depth: 1.0,
            steps: 1,
            bevel_thickness: 0.2,
            bevel_size: 0.1,
            bevel_offset: 0.0,
            bevel_segments: 3,
        }
    }
}

/// Extrudes `outline` from z = 0 to z = `depth` with rounded bevels that grow the
/// shape by `bevel_size` and extend `bevel_thickness` past both caps.
///
/// The result is flat shaded: every triangle carries its face normal.
pub fn extrude(outline: &ShapeOutline, options: &ExtrudeOptions) -> Result<GeometryData, GeometryError> {
    let depth = require_positive("depth", options.depth)?;
    let thickness = require_non_negative("bevel thickness", options.bevel_thickness)?;
    let size = require_non_negative("bevel size", options.bevel_size)?;
    let offset = options.bevel_offset;
    let steps = options.steps.max(1);

    // (z, outward offset) per ring, back to front
    let mut layers: Vec<(f32, f32)> = Vec::new();
    let bevel_ring = |segment: u32| {
        let t = segment as f32 / options.bevel_segments as f32;
        (
            thickness * (t * FRAC_PI_2).cos(),
            size * (t * FRAC_PI_2).sin() + offset,
        )
    };
    for segment in 0..options.bevel_segments {
        let (z, grow) = bevel_ring(segment);
        layers.push((-z, grow));
    }
    for step in 0..=steps {
        layers.push((depth * step as f32 / steps as f32, size + offset));
    }
    for segment in (0..options.bevel_segments).rev() {
        let (z, grow) = bevel_ring(segment);
        layers.push((depth + z, grow));
    }

    let miters = outline.miter_vectors();
    let rings: Vec<Vec<[f32; 3]>> = layers
        .iter()
        .map(|&(z, grow)| {
            outline
                .points()
                .iter()
                .zip(&miters)
                .map(|(p, m)| [p[0] + m[0] * grow, p[1] + m[1] * grow, z])
                .collect()
        })
        .collect();

    let n = outline.points().len();
    let mut triangles = Vec::with_capacity(n * (rings.len() + 1) * 2);

    let [cx, cy] = outline.centroid();
    if let (Some(back), Some(front)) = (rings.first(), rings.last()) {
        let back_center = [cx, cy, back[0][2]];
        let front_center = [cx, cy, front[0][2]];
        for i in 0..n {
            let j = (i + 1) % n;
            triangles.push([back_center, back[j], back[i]]);
            triangles.push([front_center, front[i], front[j]]);
        }
    }

    for pair in rings.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        for i in 0..n {
            let j = (i + 1) % n;
            triangles.push([lower[i], lower[j], upper[j]]);
            triangles.push([lower[i], upper[j], upper[i]]);
        }
    }

    Ok(GeometryData::from_triangles(&triangles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_options() -> ExtrudeOptions {
        ExtrudeOptions {
            depth: 0.25,
            steps: 1,
            bevel_thickness: 0.2,
            bevel_size: 0.2,
            bevel_offset: 0.0,
            bevel_segments: 7,
        }
    }

    #[test]
    fn test_rounded_rect_outline() {
        let outline = ShapeOutline::rounded_rect(12.0, 12.0, 2.0, 12).unwrap();

        // Four straight-edge starts plus 12 samples per corner, closing point dropped
        assert_eq!(outline.points().len(), 52);
        for p in outline.points() {
            assert!(p[0].abs() <= 6.0 + 1e-5 && p[1].abs() <= 6.0 + 1e-5);
        }
    }

    #[test]
    fn test_sharp_rect_collapses_corners() {
        let outline = ShapeOutline::rounded_rect(2.0, 1.0, 0.0, 12).unwrap();
        assert_eq!(outline.points().len(), 4);
    }

    #[test]
    fn test_rejects_oversized_corner() {
        assert!(matches!(
            ShapeOutline::rounded_rect(2.0, 2.0, 1.5, 12),
            Err(GeometryError::CornerRadiusTooLarge { .. })
        ));
        assert!(ShapeOutline::new(vec![[0.0, 0.0], [1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_platform_extrusion_bounds() {
        let outline = ShapeOutline::rounded_rect(12.0, 12.0, 2.0, 12).unwrap();
        let data = extrude(&outline, &platform_options()).unwrap();
        let bounds = data.bounds();

        assert!((bounds.max.x - 6.2).abs() < 1e-2);
        assert!((bounds.min.x + 6.2).abs() < 1e-2);
        assert!((bounds.max.y - 6.2).abs() < 1e-2);
        assert!((bounds.min.z + 0.2).abs() < 1e-5);
        assert!((bounds.max.z - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_extrusion_caps_face_outward() {
        let outline = ShapeOutline::rounded_rect(4.0, 2.0, 0.5, 4).unwrap();
        let data = extrude(&outline, &platform_options()).unwrap();

        let front_cap_normals: Vec<_> = data
            .normals
            .iter()
            .filter(|n| (n[2] - 1.0).abs() < 1e-6)
            .collect();
        let back_cap_normals: Vec<_> = data
            .normals
            .iter()
            .filter(|n| (n[2] + 1.0).abs() < 1e-6)
            .collect();
        assert_eq!(front_cap_normals.len(), back_cap_normals.len());
        assert!(!front_cap_normals.is_empty());
    }

    #[test]
    fn test_extrusion_rejects_zero_depth() {
        let outline = ShapeOutline::rounded_rect(1.0, 1.0, 0.1, 2).unwrap();
        let options = ExtrudeOptions {
            depth: 0.0,
            ..platform_options()
        };
        assert!(extrude(&outline, &options).is_err());
    }
}
