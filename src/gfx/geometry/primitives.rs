//! # Primitive Shape Generation
//!
//! This module contains functions to generate the 3D primitive shapes used by the park
//! builders. All shapes are centered at the origin, use Y-up, wind their triangles
//! counter-clockwise when seen from outside and carry normals and texture coordinates.

use super::{require_positive, GeometryData, GeometryError};
use cgmath::{InnerSpace, Vector3};
use std::f32::consts::PI;

/// Generate an axis-aligned box centered at the origin
///
/// Each face owns its four vertices so normals stay sharp at the edges.
pub fn generate_box(width: f32, height: f32, depth: f32) -> Result<GeometryData, GeometryError> {
    let half = [
        require_positive("width", width)? * 0.5,
        require_positive("height", height)? * 0.5,
        require_positive("depth", depth)? * 0.5,
    ];
    let mut data = GeometryData::new();

    // (normal, u axis, v axis) with u x v = normal
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    for (normal, u, v) in faces {
        let base = data.vertices.len() as u32;
        for (a, b) in corners {
            let mut position = [0.0; 3];
            for axis in 0..3 {
                position[axis] = (normal[axis] + u[axis] * a + v[axis] * b) * half[axis];
            }
            data.vertices.push(position);
            data.normals.push(normal);
            data.tex_coords.push([(a + 1.0) * 0.5, (1.0 - b) * 0.5]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Ok(data)
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of vertical segments (longitude lines), at least 3
/// * `latitude_segments` - Number of horizontal segments (latitude lines), at least 2
pub fn generate_sphere(
    radius: f32,
    longitude_segments: u32,
    latitude_segments: u32,
) -> Result<GeometryData, GeometryError> {
    let radius = require_positive("radius", radius)?;
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            data.normals.push(normal);
            data.tex_coords.push([
                long as f32 / long_segs as f32,
                lat as f32 / lat_segs as f32,
            ]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices
                .extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    Ok(data)
}

/// Generate a Y-axis cylinder, optionally tapered, with closed caps
///
/// A zero `radius_top` produces a cone without a top cap.
pub fn generate_cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> Result<GeometryData, GeometryError> {
    let radius_top = super::require_non_negative("radius_top", radius_top)?;
    let radius_bottom = require_positive("radius_bottom", radius_bottom)?;
    let height = require_positive("height", height)?;
    let segments = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;

    let mut data = GeometryData::new();

    // Side wall
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * 2.0 * PI).sin_cos();
        let normal = Vector3::new(sin, slope, cos).normalize();

        for (radius, y, v) in [
            (radius_top, half_height, 0.0),
            (radius_bottom, -half_height, 1.0),
        ] {
            data.vertices.push([radius * sin, y, radius * cos]);
            data.normals.push(normal.into());
            data.tex_coords.push([u, v]);
        }
    }
    for i in 0..segments {
        let top = i * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        data.indices.extend_from_slice(&[top, bottom, next_top]);
        data.indices
            .extend_from_slice(&[bottom, next_bottom, next_top]);
    }

    if radius_top > 0.0 {
        push_cap(&mut data, radius_top, half_height, segments, true);
    }
    push_cap(&mut data, radius_bottom, -half_height, segments, false);

    Ok(data)
}

/// Generate a cone with its apex at +Y
pub fn generate_cone(
    radius: f32,
    height: f32,
    radial_segments: u32,
) -> Result<GeometryData, GeometryError> {
    generate_cylinder(0.0, radius, height, radial_segments)
}

fn push_cap(data: &mut GeometryData, radius: f32, y: f32, segments: u32, top: bool) {
    let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    let center = data.vertices.len() as u32;

    data.vertices.push([0.0, y, 0.0]);
    data.normals.push(normal);
    data.tex_coords.push([0.5, 0.5]);

    for i in 0..=segments {
        let (sin, cos) = (i as f32 / segments as f32 * 2.0 * PI).sin_cos();
        data.vertices.push([radius * sin, y, radius * cos]);
        data.normals.push(normal);
        data.tex_coords.push([sin * 0.5 + 0.5, cos * 0.5 + 0.5]);
    }

    for i in 0..segments {
        let current = center + 1 + i;
        if top {
            data.indices.extend_from_slice(&[center, current, current + 1]);
        } else {
            data.indices.extend_from_slice(&[center, current + 1, current]);
        }
    }
}

/// Generate a regular dodecahedron inscribed in a sphere of `radius`
///
/// Normals point away from the center; flat-shaded materials replace them with face
/// normals through [`GeometryData::flat_shaded`].
pub fn generate_dodecahedron(radius: f32) -> Result<GeometryData, GeometryError> {
    let radius = require_positive("radius", radius)?;
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let r = 1.0 / t;

    let corners: [[f32; 3]; 20] = [
        [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
        [0.0, -r, -t], [0.0, -r, t], [0.0, r, -t], [0.0, r, t],
        [-r, -t, 0.0], [-r, t, 0.0], [r, -t, 0.0], [r, t, 0.0],
        [-t, 0.0, -r], [t, 0.0, -r], [-t, 0.0, r], [t, 0.0, r],
    ];
    #[rustfmt::skip]
    let faces: [[u32; 3]; 36] = [
        [3, 11, 7], [3, 7, 15], [3, 15, 13], [7, 19, 17], [7, 17, 6], [7, 6, 15],
        [17, 4, 8], [17, 8, 10], [17, 10, 6], [8, 0, 16], [8, 16, 2], [8, 2, 10],
        [0, 12, 1], [0, 1, 18], [0, 18, 16], [6, 10, 2], [6, 2, 13], [6, 13, 15],
        [2, 16, 18], [2, 18, 3], [2, 3, 13], [18, 1, 9], [18, 9, 11], [18, 11, 3],
        [4, 14, 12], [4, 12, 0], [4, 0, 8], [11, 9, 5], [11, 5, 19], [11, 19, 7],
        [19, 5, 14], [19, 14, 4], [19, 4, 17], [1, 12, 14], [1, 14, 5], [1, 5, 9],
    ];

    let mut data = GeometryData::new();
    for corner in corners {
        let normal = Vector3::from(corner).normalize();
        data.vertices.push((normal * radius).into());
        data.normals.push(normal.into());
        data.tex_coords.push([
            normal.z.atan2(-normal.x) / (2.0 * PI) + 0.5,
            normal.y.clamp(-1.0, 1.0).acos() / PI,
        ]);
    }

    for [a, b, c] in faces {
        let pa = Vector3::from(data.vertices[a as usize]);
        let pb = Vector3::from(data.vertices[b as usize]);
        let pc = Vector3::from(data.vertices[c as usize]);
        let outward = (pb - pa).cross(pc - pa).dot(pa + pb + pc) > 0.0;
        if outward {
            data.indices.extend_from_slice(&[a, b, c]);
        } else {
            data.indices.extend_from_slice(&[a, c, b]);
        }
    }

    Ok(data)
}

/// Generate a single quad in the XY plane facing +Z
pub fn generate_plane(width: f32, height: f32) -> Result<GeometryData, GeometryError> {
    let hw = require_positive("width", width)? * 0.5;
    let hh = require_positive("height", height)? * 0.5;

    Ok(GeometryData {
        vertices: vec![[-hw, -hh, 0.0], [hw, -hh, 0.0], [hw, hh, 0.0], [-hw, hh, 0.0]],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 2, 3, 0],
    })
}
