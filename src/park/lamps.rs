//! Floating lamp orbs

use crate::gfx::scene::{NodeId, NodeTree, Scene};

pub const ORB_NAME: &str = "orb";
pub const GLOW_NAME: &str = "glow";

/// Vertical oscillation of a lamp orb, fixed when the lamp is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatAnimation {
    /// Rest height of the orb in the lamp's local space
    pub base_y: f32,
    pub phase_offset_ms: f64,
    /// Radians per millisecond
    pub speed: f64,
    pub amplitude: f32,
}

impl FloatAnimation {
    pub const SPEED: f64 = 0.0015;
    pub const AMPLITUDE: f32 = 0.08;

    pub fn new(base_y: f32, phase_offset_ms: f64) -> Self {
        Self {
            base_y,
            phase_offset_ms,
            speed: Self::SPEED,
            amplitude: Self::AMPLITUDE,
        }
    }

    /// Orb height at wall-clock time `now_ms`
    pub fn orb_y(&self, now_ms: f64) -> f32 {
        let wave = ((now_ms + self.phase_offset_ms) * self.speed).sin() as f32;
        self.base_y + wave * self.amplitude
    }

    pub fn period_ms(&self) -> f64 {
        std::f64::consts::TAU / self.speed
    }
}

/// A placed lamp: the orb and glow shell float, the post and light stay put
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lamp {
    pub group: NodeId,
    pub orb: NodeId,
    pub glow: NodeId,
    pub animation: FloatAnimation,
}

impl Lamp {
    /// Inserts a lamp tree and locates its animated parts by name.
    pub fn insert(scene: &mut Scene, tree: NodeTree, animation: FloatAnimation) -> Option<Self> {
        let group = scene.insert(tree);
        Some(Self {
            group,
            orb: scene.find_child(group, ORB_NAME)?,
            glow: scene.find_child(group, GLOW_NAME)?,
            animation,
        })
    }

    pub fn animate(&self, scene: &mut Scene, now_ms: f64) {
        let y = self.animation.orb_y(now_ms);
        for id in [self.orb, self.glow] {
            if let Some(node) = scene.get_mut(id) {
                node.transform.position.y = y;
            }
        }
    }
}

/// Moves every orb and glow shell to its height at `now_ms`.
pub fn animate_lamps(lamps: &[Lamp], scene: &mut Scene, now_ms: f64) {
    for lamp in lamps {
        lamp.animate(scene, now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::SceneNode;

    #[test]
    fn test_orb_y_rests_at_base_when_phase_cancels() {
        let animation = FloatAnimation::new(1.95, 500.0);
        assert!((animation.orb_y(-500.0) - 1.95).abs() < 1e-6);
    }

    #[test]
    fn test_orb_y_is_periodic_and_bounded() {
        let animation = FloatAnimation::new(1.95, 0.0);
        let period = animation.period_ms();

        for t in [0.0, 123.0, 987.5, 4321.0] {
            let y = animation.orb_y(t);
            assert!((y - animation.orb_y(t + period)).abs() < 1e-4);
            assert!((y - 1.95).abs() <= FloatAnimation::AMPLITUDE + 1e-6);
        }
        // quarter period is the crest
        let crest = animation.orb_y(period / 4.0);
        assert!((crest - (1.95 + FloatAnimation::AMPLITUDE)).abs() < 1e-5);
    }

    #[test]
    fn test_animate_moves_orb_and_glow_together() {
        let mut scene = Scene::new();
        let tree = NodeTree::new(SceneNode::group("lamp"))
            .with_child(SceneNode::group("post"))
            .with_child(SceneNode::group(ORB_NAME))
            .with_child(SceneNode::group(GLOW_NAME));
        let lamp = Lamp::insert(&mut scene, tree, FloatAnimation::new(1.95, 0.0)).unwrap();

        let t = lamp.animation.period_ms() / 4.0;
        animate_lamps(&[lamp], &mut scene, t);

        let orb_y = scene.get(lamp.orb).unwrap().transform.position.y;
        let glow_y = scene.get(lamp.glow).unwrap().transform.position.y;
        assert!((orb_y - 2.03).abs() < 1e-5);
        assert_eq!(orb_y, glow_y);
        let post = scene.find_child(lamp.group, "post").unwrap();
        assert_eq!(scene.get(post).unwrap().transform.position.y, 0.0);
    }

    #[test]
    fn test_lamp_without_orb_is_rejected() {
        let mut scene = Scene::new();
        let tree = NodeTree::new(SceneNode::group("lamp"));
        assert!(Lamp::insert(&mut scene, tree, FloatAnimation::new(0.0, 0.0)).is_none());
    }
}
