//! Procedural park content
//!
//! Every builder returns an unplaced [`NodeTree`]; callers insert it into the
//! [`crate::gfx::scene::Scene`]. Random variation comes from the caller's generator,
//! so a seeded generator reproduces the same park.

use std::{f32::consts::PI, sync::Arc};

use rand::Rng;

use crate::{
    assets::LabelRequest,
    gfx::{
        geometry::{
            extrude, generate_box, generate_cone, generate_cylinder, generate_dodecahedron,
            generate_sphere, ExtrudeOptions, GeometryData, GeometryError, ShapeOutline,
        },
        resources::material::{srgb_hex, Material, Side},
        scene::{Light, Mesh, NodeTree, SceneNode, Transform},
    },
};

use super::{
    lamps::{FloatAnimation, GLOW_NAME, ORB_NAME},
    layout::{self, LAMP_HEIGHT, PASTEL_PALETTE, PLATFORM_Y},
};

/// Lamp parts are authored relative to this height
const LAMP_BASE_Y: f32 = -1.85;
const LAMP_LIGHT_COLOR: u32 = 0xFFEEAA;

fn mesh_node(name: &str, geometry: &GeometryData, material: Material) -> SceneNode {
    SceneNode::mesh(name, Arc::new(Mesh::from_geometry(name, geometry)), material)
}

/// Rounded 12 x 12 slab with beveled edges, lying flat below the origin
pub fn build_platform() -> Result<NodeTree, GeometryError> {
    let outline = ShapeOutline::rounded_rect(12.0, 12.0, 2.0, 12)?;
    let geometry = extrude(
        &outline,
        &ExtrudeOptions {
            depth: 0.25,
            steps: 1,
            bevel_thickness: 0.2,
            bevel_size: 0.2,
            bevel_offset: 0.0,
            bevel_segments: 7,
        },
    )?;

    let material = Material::new("platform", srgb_hex(0xFFC2D1), 0.1, 0.8);
    Ok(mesh_node("platform", &geometry, material)
        .with_transform(Transform::from_position(0.0, PLATFORM_Y, 0.0).with_euler(-PI / 2.0, 0.0, 0.0))
        .with_shadows(true, true)
        .into())
}

/// One flat stepping stone at `[x, y, z, yaw]`
pub fn build_stepping_stone(placement: [f32; 4]) -> Result<NodeTree, GeometryError> {
    let [x, y, z, yaw] = placement;
    let geometry = generate_box(1.2, 0.1, 0.7)?;
    let material = Material::new("stepping stone", srgb_hex(0xD4D4D4), 0.0, 0.9).with_flat_shading();

    Ok(mesh_node("stepping stone", &geometry, material)
        .with_transform(Transform::from_position(x, y, z).with_yaw(yaw))
        .with_shadows(true, true)
        .into())
}

/// The authored stone path, in path order
pub fn build_stepping_stones() -> Result<Vec<NodeTree>, GeometryError> {
    layout::STONES.iter().copied().map(build_stepping_stone).collect()
}

/// Faceted rock in a random earthy tone
pub fn build_rock<R: Rng>(
    x: f32,
    z: f32,
    scale: f32,
    rng: &mut R,
) -> Result<NodeTree, GeometryError> {
    let geometry = generate_dodecahedron(0.2 * scale)?;
    let color = [
        rng.random_range(0.6..0.8),
        rng.random_range(0.4..0.6),
        rng.random_range(0.2..0.3),
    ];
    let material = Material::new("rock", color, 0.1, 0.8).with_flat_shading();

    let transform = Transform::from_position(x, layout::ROCK_Y, z)
        .with_scale(
            rng.random_range(0.8..1.2),
            rng.random_range(0.8..1.2),
            rng.random_range(0.8..1.2),
        )
        .with_euler(
            rng.random_range(0.0..PI),
            rng.random_range(0.0..PI),
            rng.random_range(0.0..PI),
        );

    Ok(mesh_node("rock", &geometry, material)
        .with_transform(transform)
        .with_shadows(true, true)
        .into())
}

/// Trunk and faceted bush; `scale` sizes both
pub fn build_tree<R: Rng>(
    x: f32,
    z: f32,
    scale: f32,
    rng: &mut R,
) -> Result<NodeTree, GeometryError> {
    let trunk = mesh_node(
        "trunk",
        &generate_cylinder(0.1 * scale, 0.15 * scale, 0.8 * scale, 6)?,
        Material::new("trunk", srgb_hex(0xFFF1E6), 0.1, 0.9).with_flat_shading(),
    )
    .with_transform(Transform::from_position(0.0, 0.1 * scale, 0.0))
    .with_shadows(true, false);

    let bush = mesh_node(
        "bush",
        &generate_dodecahedron(0.6 * scale)?,
        Material::new("bush", srgb_hex(0xBEE1E6), 0.1, 0.8).with_flat_shading(),
    )
    .with_transform(
        Transform::from_position(0.0, 0.9 * scale, 0.0)
            .with_yaw(rng.random_range(0.0..PI))
            .with_scale(1.2, 1.0, 1.2),
    )
    .with_shadows(true, false);

    Ok(NodeTree::new(
        SceneNode::group("tree").with_transform(Transform::from_position(x, layout::TREE_Y, z)),
    )
    .with_child(trunk)
    .with_child(bush))
}

/// Translucent pastel spheres scattered over the park, some with a faint halo
pub fn build_sky_bubbles<R: Rng>(
    count: usize,
    rng: &mut R,
) -> Result<NodeTree, GeometryError> {
    let mut group = NodeTree::new(SceneNode::group("sky bubbles"));

    for _ in 0..count {
        let radius = rng.random_range(0.1..0.3);
        let color = srgb_hex(PASTEL_PALETTE[rng.random_range(0..PASTEL_PALETTE.len())]);
        let material = Material::new("bubble", color, 0.2, 0.3)
            .with_opacity(rng.random_range(0.7..1.0))
            .with_flat_shading();

        let theta = rng.random_range(0.0..PI * 3.0);
        let height = rng.random_range(1.0..10.0);
        let horizontal = 20.0 * rng.random::<f32>();
        let transform = Transform::from_position(horizontal * theta.cos(), height, horizontal * theta.sin())
            .with_euler(
                rng.random_range(0.0..PI),
                rng.random_range(0.0..PI),
                rng.random_range(0.0..PI),
            );

        let mut bubble = NodeTree::new(
            mesh_node("bubble", &generate_sphere(radius, 20, 20)?, material).with_transform(transform),
        );
        if rng.random::<f32>() > 0.7 {
            bubble.push_child(glow_shell("bubble glow", radius * 1.2, 8, color)?);
        }
        group.push_child(bubble);
    }

    Ok(group)
}

/// Unlit back-facing halo around a sphere
fn glow_shell(name: &str, radius: f32, segments: u32, color: [f32; 3]) -> Result<SceneNode, GeometryError> {
    let material = Material::unlit(name, color)
        .with_opacity(0.15)
        .with_side(Side::Back);
    Ok(mesh_node(name, &generate_sphere(radius, segments, segments)?, material))
}

/// Street lamp at `(x, z)` with a floating orb, its halo and a point light.
///
/// The orb and halo are named [`ORB_NAME`] and [`GLOW_NAME`] so the animator can
/// find them after insertion.
pub fn build_lamp(
    x: f32,
    z: f32,
    height: f32,
    phase_offset_ms: f64,
) -> Result<(NodeTree, FloatAnimation), GeometryError> {
    let light_color = srgb_hex(LAMP_LIGHT_COLOR);
    let orb_y = LAMP_BASE_Y + height - 0.2;

    let post = mesh_node(
        "post",
        &generate_cylinder(0.08, 0.12, height, 8)?,
        Material::new("post", srgb_hex(0xE6D2A8), 0.2, 0.7).with_flat_shading(),
    )
    .with_transform(Transform::from_position(0.0, LAMP_BASE_Y + height / 3.0 + 0.1, 0.0))
    .with_shadows(true, false);

    let cone = mesh_node(
        "cone",
        &generate_cone(0.3, 0.3, 8)?,
        Material::new("cone", srgb_hex(0xA6B8D4), 0.3, 0.7).with_flat_shading(),
    )
    .with_transform(
        Transform::from_position(0.0, LAMP_BASE_Y + height - 0.5, 0.0).with_euler(PI, 0.0, 0.0),
    )
    .with_shadows(true, false);

    let orb = mesh_node(
        ORB_NAME,
        &generate_sphere(0.2, 12, 12)?,
        Material::new("orb", light_color, 0.5, 0.2)
            .with_emission(light_color, 0.8)
            .with_opacity(0.9),
    )
    .with_transform(Transform::from_position(0.0, orb_y, 0.0))
    .with_shadows(true, false);

    let glow = glow_shell(GLOW_NAME, 0.3, 16, light_color)?
        .with_transform(Transform::from_position(0.0, orb_y, 0.0));

    let light = SceneNode::light("lamp light", Light::point(light_color, 1.0, 5.0))
        .with_transform(Transform::from_position(0.0, orb_y, 0.0));

    let tree = NodeTree::new(SceneNode::group("lamp").with_transform(Transform::from_position(x, 0.0, z)))
        .with_child(post)
        .with_child(cone)
        .with_child(orb)
        .with_child(glow)
        .with_child(light);

    Ok((tree, FloatAnimation::new(orb_y, phase_offset_ms)))
}

/// The four corner lamps; the first floats half a second ahead of the others
pub fn build_lamps() -> Result<Vec<(NodeTree, FloatAnimation)>, GeometryError> {
    layout::LAMPS
        .iter()
        .enumerate()
        .map(|(i, &[x, z])| build_lamp(x, z, LAMP_HEIGHT, if i == 0 { 0.0 } else { 500.0 }))
        .collect()
}

/// Moon sphere; its texture arrives later from the asset loader
pub fn build_moon() -> Result<NodeTree, GeometryError> {
    let [x, y, z] = layout::MOON_POSITION;
    Ok(mesh_node(
        "moon",
        &generate_sphere(1.0, 32, 32)?,
        Material::new("moon", [1.0, 1.0, 1.0], 0.1, 0.8),
    )
    .with_transform(Transform::from_position(x, y, z))
    .with_shadows(true, true)
    .into())
}

/// Translucent water surface laid into the pond model
pub fn build_water() -> Result<NodeTree, GeometryError> {
    let [x, y, z] = layout::WATER_POSITION;
    let material = Material::new("water", srgb_hex(0x6B99C9), 0.2, 0.1).with_opacity(0.7);

    Ok(mesh_node("water", &generate_box(1.1, 0.05, 1.7)?, material)
        .with_transform(Transform::from_position(x, y, z).with_yaw(layout::WATER_YAW))
        .with_shadows(true, true)
        .into())
}

/// Camera-facing welcome sign; its text arrives later as a texture from
/// [`welcome_label`]
pub fn build_welcome_sprite() -> NodeTree {
    let [x, y, z] = layout::SPRITE_POSITION;
    SceneNode::sprite("welcome sign", Material::unlit("welcome sign", srgb_hex(0x4287F5)))
        .with_transform(Transform::from_position(x, y, z).with_scale(2.0, 1.0, 1.0))
        .into()
}

/// Black text on white; the sprite's blue tint turns the white into the sign color
pub fn welcome_label() -> LabelRequest {
    let [width, height] = layout::SIGN_CANVAS;
    LabelRequest::new(layout::SIGN_TEXT, width, height, layout::SIGN_FONT_PX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{NodeKind, Scene};
    use cgmath::{InnerSpace, Vector3, Vector4};
    use rand::{rngs::StdRng, SeedableRng};

    fn mesh_colors(tree: &NodeTree) -> Vec<[f32; 4]> {
        let mut colors = Vec::new();
        tree.visit(&mut |node| {
            if let Some(material) = node.material() {
                colors.push(material.base_color);
            }
        });
        colors
    }

    #[test]
    fn test_nine_stones_follow_the_path_table() {
        let stones = build_stepping_stones().unwrap();
        assert_eq!(stones.len(), 9);

        for (stone, [x, y, z, yaw]) in stones.iter().zip(layout::STONES) {
            let expected = Transform::from_position(x, y, z).with_yaw(yaw);
            assert_eq!(stone.node.transform, expected);
            assert!(stone.node.cast_shadow && stone.node.receive_shadow);

            let material = stone.node.material().unwrap();
            assert!(material.flat_shading);
            assert_eq!(material.roughness, 0.9);
            assert_eq!(material.color(), srgb_hex(0xD4D4D4));

            let NodeKind::Mesh(mesh) = &stone.node.kind else {
                panic!("stone is not a mesh");
            };
            let size = mesh.mesh.bounds().max - mesh.mesh.bounds().min;
            assert!((size - Vector3::new(1.2, 0.1, 0.7)).magnitude() < 1e-5);
        }
    }

    #[test]
    fn test_platform_spans_the_park_after_placement() {
        let mut scene = Scene::new();
        let id = scene.insert(build_platform().unwrap());
        let world = scene.world_matrix(id);
        let NodeKind::Mesh(mesh) = &scene.get(id).unwrap().kind else {
            panic!("platform is not a mesh");
        };

        let bounds = mesh.mesh.bounds();
        let corners = [bounds.min, bounds.max].map(|c| (world * Vector4::new(c.x, c.y, c.z, 1.0)).truncate());
        let (lo_x, hi_x) = (corners[0].x.min(corners[1].x), corners[0].x.max(corners[1].x));
        let (lo_z, hi_z) = (corners[0].z.min(corners[1].z), corners[0].z.max(corners[1].z));

        assert!((lo_x + 6.2).abs() < 1e-3 && (hi_x - 6.2).abs() < 1e-3);
        assert!((lo_z + 6.2).abs() < 1e-3 && (hi_z - 6.2).abs() < 1e-3);
        // slab top sits above the floor height
        assert!(corners.iter().any(|c| c.y > PLATFORM_Y));
    }

    #[test]
    fn test_seeded_builders_are_deterministic() {
        let build = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let rock = build_rock(2.0, -3.0, 1.5, &mut rng).unwrap();
            let tree = build_tree(-3.0, 3.0, 1.2, &mut rng).unwrap();
            let bubbles = build_sky_bubbles(30, &mut rng).unwrap();
            (rock.node.transform, mesh_colors(&rock), tree.children[1].node.transform, bubbles.len(), mesh_colors(&bubbles))
        };

        assert_eq!(build(42), build(42));
        assert_ne!(build(42).0, build(43).0);
    }

    #[test]
    fn test_rock_ranges() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let rock = build_rock(0.0, 0.0, 1.0, &mut rng).unwrap();
            let [r, g, b, _] = rock.node.material().unwrap().base_color;
            assert!((0.6..0.8).contains(&r));
            assert!((0.4..0.6).contains(&g));
            assert!((0.2..0.3).contains(&b));

            let scale = rock.node.transform.scale;
            for s in [scale.x, scale.y, scale.z] {
                assert!((0.8..1.2).contains(&s));
            }
            assert_eq!(rock.node.transform.position.y, layout::ROCK_Y);
        }
    }

    #[test]
    fn test_bubbles_stay_in_the_sky_dome() {
        let mut rng = StdRng::seed_from_u64(9);
        let bubbles = build_sky_bubbles(200, &mut rng).unwrap();
        assert_eq!(bubbles.children.len(), 200);

        for bubble in &bubbles.children {
            let position = bubble.node.transform.position;
            assert!((1.0..10.0).contains(&position.y));
            assert!(Vector3::new(position.x, 0.0, position.z).magnitude() < 20.0 + 1e-4);

            let material = bubble.node.material().unwrap();
            assert!(material.transparent);
            assert!((0.7..1.0).contains(&material.base_color[3]));
            assert!(bubble.children.len() <= 1);
            for glow in &bubble.children {
                let glow_material = glow.node.material().unwrap();
                assert_eq!(glow_material.side, Side::Back);
                assert_eq!(glow_material.base_color[3], 0.15);
            }
        }
        // about 30% carry a glow
        let glows = bubbles.children.iter().filter(|b| !b.children.is_empty()).count();
        assert!((20..=100).contains(&glows));
    }

    #[test]
    fn test_zero_bubbles_is_an_empty_group() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(build_sky_bubbles(0, &mut rng).unwrap().len(), 1);
    }

    #[test]
    fn test_lamp_parts_and_animation() {
        let lamps = build_lamps().unwrap();
        assert_eq!(lamps.len(), 4);
        assert_eq!(lamps[0].1.phase_offset_ms, 0.0);
        assert!(lamps[1..].iter().all(|(_, animation)| animation.phase_offset_ms == 500.0));

        let (tree, animation) = &lamps[0];
        assert_eq!(tree.node.transform.position, Vector3::new(-5.0, 0.0, 5.0));
        assert!((animation.base_y - 1.95).abs() < 1e-6);

        let names: Vec<&str> = tree.children.iter().map(|c| c.node.name.as_str()).collect();
        assert_eq!(names, ["post", "cone", ORB_NAME, GLOW_NAME, "lamp light"]);

        let orb = &tree.children[2].node;
        assert!(orb.cast_shadow && !orb.receive_shadow);
        assert_eq!(orb.material().unwrap().emissive_intensity, 0.8);
        let light = &tree.children[4].node;
        assert_eq!(light.transform.position.y, animation.base_y);
    }

    #[test]
    fn test_invalid_dimensions_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            build_rock(0.0, 0.0, 0.0, &mut rng),
            Err(GeometryError::NonPositive { .. })
        ));
        assert!(build_tree(0.0, 0.0, -1.0, &mut rng).is_err());
        assert!(build_lamp(0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_sprite_and_water() {
        let sprite = build_welcome_sprite();
        assert!(matches!(sprite.node.kind, NodeKind::Sprite(_)));
        assert_eq!(sprite.node.transform.scale, Vector3::new(2.0, 1.0, 1.0));
        let label = welcome_label();
        assert_eq!(label.text, "Welcome to Pastel Park!");
        assert_eq!((label.width, label.height), (512, 256));

        let water = build_water().unwrap();
        let material = water.node.material().unwrap();
        assert!(material.transparent);
        assert_eq!(material.base_color[3], 0.7);
    }
}
