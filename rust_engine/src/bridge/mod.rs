//! 舞台 ↔ 物理世界 桥接
//!
//! [`PhysicsBridge`] 持有全部物理状态（世界、刚体登记、关节、边界、坐标映射），
//! 不使用全局变量。角色由调用方通过 [`Scene`](crate::scene::Scene) 提供。
//!
//! - `ops`: 单个角色上的操作（启用、模式、速度、位置、关节……）
//! - `stepper`: 步进、同步与卷动
//! - `blocks`: 积木操作码分发

mod blocks;
mod ops;
mod stepper;

pub use blocks::BlockArgs;

use glam::DVec2;
use rapier2d::prelude::*;

use crate::physics::{
    BodyRegistry, CoordinateMapper, DragSettings, JointManager, PhysicsConfig, PhysicsWorld,
    SpringSettings, StageBoundary,
};
use crate::physics::coords::rapier_to_vec;
use crate::scene::TargetId;

/// 物理桥
pub struct PhysicsBridge {
    config: PhysicsConfig,
    world: PhysicsWorld,
    mapper: CoordinateMapper,
    registry: BodyRegistry,
    joints: JointManager,
    boundary: StageBoundary,
}

impl PhysicsBridge {
    /// 使用默认配置创建
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// 使用指定配置创建，并按配置建立舞台边界
    pub fn with_config(config: PhysicsConfig) -> Self {
        let mapper = CoordinateMapper::new(config.zoom);
        let mut bridge = Self {
            world: Self::build_world(&config),
            joints: JointManager::new(Self::drag_settings(&config)),
            registry: BodyRegistry::new(),
            boundary: StageBoundary::new(),
            mapper,
            config,
        };
        bridge.install_defaults();

        log::info!(
            "[物理配置] zoom={}, 步长={:.4}s, 迭代={}/{}, 重力=({}, {}), 舞台={:?}",
            bridge.mapper.zoom(),
            bridge.config.step_seconds,
            bridge.config.velocity_iterations,
            bridge.config.position_iterations,
            bridge.config.gravity_x,
            bridge.config.gravity_y,
            bridge.config.stage_preset,
        );
        bridge
    }

    /// 运行开始时的完全重置
    ///
    /// 销毁所有刚体、关节和边界，卷动归零，弹簧参数恢复默认，
    /// 然后按配置重新建立舞台边界。
    pub fn reset(&mut self) {
        self.world = Self::build_world(&self.config);
        self.registry.forget_all();
        self.joints.forget_all();
        self.boundary.forget();
        self.mapper = CoordinateMapper::new(self.config.zoom);
        self.install_defaults();
        log::info!("[物理] 重置完成");
    }

    fn build_world(config: &PhysicsConfig) -> PhysicsWorld {
        PhysicsWorld::new(
            vector![config.gravity_x, config.gravity_y],
            config.step_seconds,
            config.velocity_iterations,
            config.position_iterations,
        )
    }

    fn drag_settings(config: &PhysicsConfig) -> DragSettings {
        DragSettings {
            force_factor: config.drag_force_factor,
            frequency: config.drag_frequency,
            damping_ratio: config.drag_damping,
        }
    }

    fn install_defaults(&mut self) {
        self.joints.set_spring_settings(SpringSettings::define(
            self.config.spring_length,
            self.config.spring_damping,
            self.config.spring_frequency,
            self.mapper.zoom(),
        ));
        self.boundary
            .rebuild(&mut self.world, self.config.stage_preset, self.mapper.zoom());
    }

    // ========== 只读访问 ==========

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn joints(&self) -> &JointManager {
        &self.joints
    }

    pub fn boundary(&self) -> &StageBoundary {
        &self.boundary
    }

    /// 已启用物理的角色个数
    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    pub fn has_body(&self, target: TargetId) -> bool {
        self.registry.contains(target)
    }

    pub fn body_handle(&self, target: TargetId) -> Option<RigidBodyHandle> {
        self.registry.handle(target)
    }

    /// 刚体在世界空间的位置
    pub fn body_position(&self, target: TargetId) -> Option<DVec2> {
        let handle = self.registry.handle(target)?;
        self.world
            .bodies
            .get(handle)
            .map(|rb| rapier_to_vec(rb.translation()))
    }
}

impl Default for PhysicsBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::StagePreset;

    #[test]
    fn test_new_builds_configured_stage() {
        let bridge = PhysicsBridge::new();
        assert_eq!(bridge.boundary().preset(), Some(StagePreset::Boxed));
        assert_eq!(bridge.boundary().body_count(), 4);
        assert_eq!(bridge.body_count(), 0);
        assert_eq!(bridge.joints().spring_settings().length, 2.0);
    }

    #[test]
    fn test_config_overrides() {
        let bridge = PhysicsBridge::with_config(PhysicsConfig {
            zoom: 100.0,
            stage_preset: StagePreset::Open,
            gravity_y: -20.0,
            ..Default::default()
        });
        assert_eq!(bridge.mapper().zoom(), 100.0);
        assert_eq!(bridge.boundary().body_count(), 0);
        assert_eq!(bridge.world().gravity.y, -20.0);
        assert_eq!(bridge.joints().spring_settings().length, 1.0);
    }
}
