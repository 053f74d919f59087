//! Stepping stone hover and selection highlights

use cgmath::Vector2;

use crate::gfx::{
    camera::OrbitCamera,
    picking::Raycaster,
    resources::material::srgb_hex,
    scene::{NodeId, Scene},
};

pub const HOVER_EMISSIVE: u32 = 0xCDB4DB;
pub const SELECTED_EMISSIVE: u32 = 0xFFEEAA;

const NO_EMISSION: [f32; 3] = [0.0, 0.0, 0.0];

/// A pickable stone and the color it returns to when unhighlighted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stone {
    pub node: NodeId,
    pub base_color: [f32; 3],
}

impl Stone {
    /// Records the current color of `node` as its base color
    pub fn from_scene(scene: &Scene, node: NodeId) -> Option<Self> {
        let base_color = scene.get(node)?.material()?.color();
        Some(Self { node, base_color })
    }
}

/// Pointer position plus the selected stone.
///
/// The pointer is stored in normalized device coordinates and only hit-tested when a
/// frame or a click asks for it.
#[derive(Debug)]
pub struct PointerInteraction {
    stones: Vec<Stone>,
    pointer: Vector2<f32>,
    selected: Option<usize>,
    hovered: Option<usize>,
}

impl Default for PointerInteraction {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PointerInteraction {
    pub fn new(stones: Vec<Stone>) -> Self {
        Self {
            stones,
            pointer: Vector2::new(0.0, 0.0),
            selected: None,
            hovered: None,
        }
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    pub fn pointer(&self) -> Vector2<f32> {
        self.pointer
    }

    pub fn selected(&self) -> Option<&Stone> {
        self.selected.and_then(|i| self.stones.get(i))
    }

    pub fn hovered(&self) -> Option<&Stone> {
        self.hovered.and_then(|i| self.stones.get(i))
    }

    /// Stores the pointer from window pixel coordinates; ignored for an empty viewport.
    pub fn pointer_moved(&mut self, x: f64, y: f64, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.pointer = Vector2::new(
            (x / width as f64 * 2.0 - 1.0) as f32,
            (-(y / height as f64) * 2.0 + 1.0) as f32,
        );
    }

    fn nearest_stone(&self, scene: &Scene, camera: &OrbitCamera) -> Option<usize> {
        let ray = Raycaster::ray_from_ndc(self.pointer, camera);
        let candidates: Vec<NodeId> = self.stones.iter().map(|stone| stone.node).collect();
        let hit = Raycaster::intersect_nearest(&ray, scene, &candidates)?;
        self.stones.iter().position(|stone| stone.node == hit.node)
    }

    /// Selects the stone under the pointer, or clears the selection on a miss.
    pub fn click(&mut self, scene: &mut Scene, camera: &OrbitCamera) {
        let hit = self.nearest_stone(scene, camera);

        if let Some(previous) = self.selected.take() {
            self.restore(scene, previous);
        }
        if let Some(index) = hit {
            self.selected = Some(index);
            self.highlight(scene, index, srgb_hex(SELECTED_EMISSIVE));
            log::debug!("Selected stepping stone {index}");
        }
    }

    /// Per-frame hover pass: resets every unselected stone, then highlights the one
    /// under the pointer unless it is the selected one.
    pub fn update_hover(&mut self, scene: &mut Scene, camera: &OrbitCamera) {
        for index in 0..self.stones.len() {
            if Some(index) != self.selected {
                self.restore(scene, index);
            }
        }

        self.hovered = self
            .nearest_stone(scene, camera)
            .filter(|&index| Some(index) != self.selected);
        if let Some(index) = self.hovered {
            self.highlight(scene, index, srgb_hex(HOVER_EMISSIVE));
        }
    }

    fn restore(&self, scene: &mut Scene, index: usize) {
        let Some(stone) = self.stones.get(index) else {
            return;
        };
        if let Some(material) = scene.get_mut(stone.node).and_then(|node| node.material_mut()) {
            material.set_color(stone.base_color);
            material.set_emissive(NO_EMISSION);
        }
    }

    fn highlight(&self, scene: &mut Scene, index: usize, emissive: [f32; 3]) {
        let Some(stone) = self.stones.get(index) else {
            return;
        };
        if let Some(material) = scene.get_mut(stone.node).and_then(|node| node.material_mut()) {
            material.set_emissive(emissive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::park::builders::build_stepping_stones;
    use cgmath::{InnerSpace, Vector3, Vector4};

    struct Fixture {
        scene: Scene,
        interaction: PointerInteraction,
        camera: OrbitCamera,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let stones = build_stepping_stones()
            .unwrap()
            .into_iter()
            .map(|tree| {
                let id = scene.insert(tree);
                Stone::from_scene(&scene, id).unwrap()
            })
            .collect();
        let camera = OrbitCamera::looking_at(
            Vector3::new(-9.0, 3.0, 2.0),
            Vector3::new(0.0, 0.0, 0.0),
            800.0 / 600.0,
        );
        Fixture {
            scene,
            interaction: PointerInteraction::new(stones),
            camera,
        }
    }

    impl Fixture {
        /// Points at the center of stone `index`
        fn aim_at(&mut self, index: usize) {
            let center = self.scene.world_matrix(self.interaction.stones()[index].node).w;
            let clip = self.camera.build_projection_matrix()
                * self.camera.build_view_matrix()
                * Vector4::new(center.x, center.y, center.z, 1.0);
            self.interaction.pointer = Vector2::new(clip.x / clip.w, clip.y / clip.w);
        }

        fn aim_at_sky(&mut self) {
            self.interaction.pointer = Vector2::new(0.0, 0.95);
        }

        fn emissive(&self, index: usize) -> [f32; 3] {
            let node = self.interaction.stones()[index].node;
            self.scene.get(node).unwrap().material().unwrap().emissive
        }

        fn color(&self, index: usize) -> [f32; 3] {
            let node = self.interaction.stones()[index].node;
            self.scene.get(node).unwrap().material().unwrap().color()
        }
    }

    fn lit(emissive: [f32; 3]) -> bool {
        Vector3::from(emissive).magnitude() > 0.0
    }

    #[test]
    fn test_pointer_ndc_mapping() {
        let mut interaction = PointerInteraction::default();
        interaction.pointer_moved(0.0, 0.0, 800, 600);
        assert_eq!(interaction.pointer(), Vector2::new(-1.0, 1.0));
        interaction.pointer_moved(400.0, 300.0, 800, 600);
        assert_eq!(interaction.pointer(), Vector2::new(0.0, 0.0));
        interaction.pointer_moved(800.0, 600.0, 800, 600);
        assert_eq!(interaction.pointer(), Vector2::new(1.0, -1.0));

        interaction.pointer_moved(10.0, 10.0, 0, 600);
        assert_eq!(interaction.pointer(), Vector2::new(1.0, -1.0));
    }

    #[test]
    fn test_second_click_moves_the_selection() {
        let mut f = fixture();

        f.aim_at(2);
        f.interaction.click(&mut f.scene, &f.camera);
        assert_eq!(f.interaction.selected().map(|s| s.node), Some(f.interaction.stones()[2].node));

        f.aim_at(6);
        f.interaction.click(&mut f.scene, &f.camera);
        assert_eq!(f.interaction.selected().map(|s| s.node), Some(f.interaction.stones()[6].node));

        let selected: Vec<usize> = (0..9)
            .filter(|&i| f.emissive(i) == srgb_hex(SELECTED_EMISSIVE))
            .collect();
        assert_eq!(selected, [6]);
        assert_eq!(f.emissive(2), NO_EMISSION);
        assert_eq!(f.color(2), f.interaction.stones()[2].base_color);
    }

    #[test]
    fn test_click_on_empty_space_clears_selection() {
        let mut f = fixture();
        f.aim_at(4);
        f.interaction.click(&mut f.scene, &f.camera);
        assert!(f.interaction.selected().is_some());

        f.aim_at_sky();
        f.interaction.click(&mut f.scene, &f.camera);
        assert!(f.interaction.selected().is_none());
        assert!((0..9).all(|i| !lit(f.emissive(i))));
    }

    #[test]
    fn test_click_on_empty_space_without_selection_is_a_no_op() {
        let mut f = fixture();
        f.aim_at_sky();
        f.interaction.click(&mut f.scene, &f.camera);
        assert!(f.interaction.selected().is_none());
    }

    #[test]
    fn test_hover_highlights_one_stone_and_resets() {
        let mut f = fixture();

        f.aim_at(3);
        f.interaction.update_hover(&mut f.scene, &f.camera);
        assert_eq!(f.emissive(3), srgb_hex(HOVER_EMISSIVE));
        assert_eq!((0..9).filter(|&i| lit(f.emissive(i))).count(), 1);

        f.aim_at_sky();
        f.interaction.update_hover(&mut f.scene, &f.camera);
        assert!(f.interaction.hovered().is_none());
        assert!((0..9).all(|i| !lit(f.emissive(i))));
    }

    #[test]
    fn test_hover_never_touches_the_selected_stone() {
        let mut f = fixture();
        f.aim_at(5);
        f.interaction.click(&mut f.scene, &f.camera);

        for _ in 0..3 {
            f.interaction.update_hover(&mut f.scene, &f.camera);
            assert!(f.interaction.hovered().is_none());
            assert_eq!(f.emissive(5), srgb_hex(SELECTED_EMISSIVE));
        }
    }

    #[test]
    fn test_no_stones_means_no_hits() {
        let mut scene = Scene::new();
        let camera = OrbitCamera::looking_at(
            Vector3::new(-9.0, 3.0, 2.0),
            Vector3::new(0.0, 0.0, 0.0),
            1.0,
        );
        let mut interaction = PointerInteraction::new(Vec::new());
        interaction.click(&mut scene, &camera);
        interaction.update_hover(&mut scene, &camera);
        assert!(interaction.selected().is_none());
        assert!(interaction.hovered().is_none());
    }
}
