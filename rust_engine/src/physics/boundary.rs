//! 舞台边界几何
//!
//! 边界由若干无归属的固定刚体组成，切换预设时整体销毁再重建，不做局部修改。

use std::str::FromStr;

use rapier2d::prelude::*;

use super::world::PhysicsWorld;
use crate::{BridgeError, Result};

/// 舞台边界预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagePreset {
    /// 四面墙：地板、天花板、左右墙
    #[default]
    Boxed,
    /// 只有地板，向两侧延伸
    Floor,
    /// 没有边界
    Open,
}

impl StagePreset {
    /// 该预设生成的边界刚体个数
    pub fn body_count(self) -> usize {
        match self {
            StagePreset::Boxed => 4,
            StagePreset::Floor => 5,
            StagePreset::Open => 0,
        }
    }

    /// (半宽, 半高, 中心 x, 中心 y)，舞台像素
    fn segments(self) -> Vec<(f64, f64, f64, f64)> {
        match self {
            StagePreset::Boxed => vec![
                // 地板
                (250.0, 10.0, 0.0, -190.0),
                // 天花板（留出上方空间）
                (250.0, 10.0, 0.0, 1000.0),
                // 左右墙
                (10.0, 800.0, -250.0, 540.0),
                (10.0, 800.0, 250.0, 540.0),
            ],
            StagePreset::Floor => [0.0, -10000.0, 10000.0, -20000.0, 20000.0]
                .into_iter()
                .map(|x| (5000.0, 100.0, x, -280.0))
                .collect(),
            StagePreset::Open => Vec::new(),
        }
    }
}

impl FromStr for StagePreset {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "boxed" => Ok(StagePreset::Boxed),
            "floor" => Ok(StagePreset::Floor),
            "open" => Ok(StagePreset::Open),
            other => Err(BridgeError::UnknownStage(other.to_string())),
        }
    }
}

/// 当前边界刚体
#[derive(Debug, Default)]
pub struct StageBoundary {
    preset: Option<StagePreset>,
    bodies: Vec<RigidBodyHandle>,
}

impl StageBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(&self) -> Option<StagePreset> {
        self.preset
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// 切换预设：先销毁全部旧边界，再创建新边界，最后唤醒所有动态刚体
    pub fn rebuild(&mut self, world: &mut PhysicsWorld, preset: StagePreset, zoom: f64) {
        self.clear(world);

        for (half_w, half_h, x, y) in preset.segments() {
            let body = RigidBodyBuilder::fixed()
                .translation(vector![(x / zoom) as Real, (y / zoom) as Real])
                .build();
            let handle = world.bodies.insert(body);
            let collider =
                ColliderBuilder::cuboid((half_w / zoom) as Real, (half_h / zoom) as Real).build();
            world
                .colliders
                .insert_with_parent(collider, handle, &mut world.bodies);
            self.bodies.push(handle);
        }
        self.preset = Some(preset);

        world.wake_all();
        log::debug!("[舞台] 边界预设 {:?}，{} 个边界刚体", preset, self.bodies.len());
    }

    /// 销毁全部边界刚体
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for handle in self.bodies.drain(..) {
            world.remove_body(handle);
        }
        self.preset = None;
    }

    /// 世界被整体重建后，旧句柄全部失效
    pub fn forget(&mut self) {
        self.bodies.clear();
        self.preset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!("boxed".parse::<StagePreset>().unwrap(), StagePreset::Boxed);
        assert_eq!("floor".parse::<StagePreset>().unwrap(), StagePreset::Floor);
        assert_eq!("open".parse::<StagePreset>().unwrap(), StagePreset::Open);
        assert!("sky".parse::<StagePreset>().is_err());
    }

    #[test]
    fn test_rebuild_replaces_previous_bodies() {
        let mut world = PhysicsWorld::new(vector![0.0, -10.0], 1.0 / 30.0, 10, 10);
        let base = world.bodies.len();
        let mut boundary = StageBoundary::new();

        boundary.rebuild(&mut world, StagePreset::Boxed, 50.0);
        assert_eq!(boundary.body_count(), 4);
        assert_eq!(world.bodies.len(), base + 4);

        boundary.rebuild(&mut world, StagePreset::Floor, 50.0);
        assert_eq!(boundary.body_count(), 5);
        assert_eq!(world.bodies.len(), base + 5);

        boundary.rebuild(&mut world, StagePreset::Open, 50.0);
        assert_eq!(boundary.body_count(), 0);
        assert_eq!(world.bodies.len(), base);
        assert_eq!(world.colliders.len(), 0);
    }

    #[test]
    fn test_floor_tiles_are_contiguous() {
        let zoom = 50.0;
        let mut tiles: Vec<(f64, f64)> = StagePreset::Floor
            .segments()
            .into_iter()
            .map(|(half_w, _, x, _)| ((x - half_w) / zoom, (x + half_w) / zoom))
            .collect();
        tiles.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in tiles.windows(2) {
            assert!((pair[0].1 - pair[1].0).abs() < 1e-9);
        }
    }
}
