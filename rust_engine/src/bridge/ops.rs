//! 单个角色上的物理操作
//!
//! 缺失的角色或刚体一律静默跳过；标注“自动启用”的操作会先按造型凸包创建刚体。

use glam::DVec2;
use rapier2d::prelude::*;

use super::PhysicsBridge;
use crate::physics::contact::{self, ContactPartner};
use crate::physics::coords::{point_to_rapier, rapier_to_vec, vec_to_rapier};
use crate::physics::{
    BodyMode, ContactRegion, CoordinateMapper, EnableMode, JointId, JointKind, JointRequest,
    Material, PositionSpace, ShapeDescriptor, ShapeKind, SpringSettings, StagePreset,
};
use crate::scene::{Scene, TargetId};

impl PhysicsBridge {
    // ========== 启用 / 模式 ==========

    /// 为角色启用物理
    ///
    /// `ShapeKind::All` 为所有尚无刚体的角色按造型凸包启用，返回 None。
    pub fn enable<S: Scene>(
        &mut self,
        scene: &S,
        target: TargetId,
        shape: ShapeKind,
        mode: EnableMode,
    ) -> Option<RigidBodyHandle> {
        if shape == ShapeKind::All {
            self.enable_all(scene);
            return None;
        }
        let handle = self.enable_for(scene, target, shape)?;
        if let Some(rb) = self.world.bodies.get_mut(handle) {
            rb.enable_ccd(mode == EnableMode::Bullet);
        }
        Some(handle)
    }

    /// 为所有尚无刚体的非舞台角色启用物理
    pub fn enable_all<S: Scene>(&mut self, scene: &S) {
        for id in scene.target_ids() {
            let enrolled = self.registry.contains(id);
            let is_stage = scene.target(id).map_or(true, |t| t.is_stage);
            if !enrolled && !is_stage {
                self.enable_for(scene, id, ShapeKind::Costume);
            }
        }
    }

    /// 按当前造型、位置和方向创建刚体（替换旧刚体）
    fn enable_for<S: Scene>(
        &mut self,
        scene: &S,
        id: TargetId,
        kind: ShapeKind,
    ) -> Option<RigidBodyHandle> {
        let target = scene.target(id)?;
        if target.is_stage {
            return None;
        }
        let shape = match ShapeDescriptor::extract(kind, target, self.mapper.zoom()) {
            Ok(shape) => shape,
            Err(e) => {
                log::debug!("[形状] {} 未启用物理: {}", target.name, e);
                return None;
            }
        };

        let locked = target.rotation_locked();
        let position = vec_to_rapier(self.mapper.to_world(target.position()));
        let angle = CoordinateMapper::body_angle(target.direction(), locked) as Real;
        let material = self.default_material();
        let handle = self.registry.place(
            &mut self.world,
            &mut self.joints,
            id,
            &shape,
            material,
            position,
            angle,
            locked,
        );
        log::debug!(
            "[刚体] {} 启用 {:?}，{} 个碰撞体",
            target.name,
            kind,
            shape.fixture_count()
        );
        Some(handle)
    }

    /// 已有刚体直接返回，否则自动启用
    fn ensure_body<S: Scene>(&mut self, scene: &S, id: TargetId) -> Option<RigidBodyHandle> {
        match self.registry.handle(id) {
            Some(handle) => Some(handle),
            None => self.enable_for(scene, id, ShapeKind::Costume),
        }
    }

    fn default_material(&self) -> Material {
        Material {
            density: self.config.density,
            friction: self.config.friction,
            restitution: self.config.restitution,
        }
    }

    /// 删除角色的刚体（角色本身不受影响）
    pub fn disable(&mut self, target: TargetId) -> bool {
        self.registry
            .remove(&mut self.world, &mut self.joints, target)
    }

    /// 设置刚体模式（自动启用）
    ///
    /// 刚体先对齐到角色当前的位置与方向；`Pinned` 在该位置铰接，其他模式解除固定。
    pub fn set_body_mode<S: Scene>(&mut self, scene: &S, id: TargetId, mode: BodyMode) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        let Some(target) = scene.target(id) else {
            return;
        };
        let locked = target.rotation_locked();
        let position = vec_to_rapier(self.mapper.to_world(target.position()));
        let angle = CoordinateMapper::body_angle(target.direction(), locked) as Real;

        if let Some(rb) = self.world.bodies.get_mut(handle) {
            let body_type = match mode {
                BodyMode::Static => RigidBodyType::Fixed,
                BodyMode::Dynamic | BodyMode::Pinned => RigidBodyType::Dynamic,
            };
            rb.set_body_type(body_type, true);
            rb.set_position(Isometry::new(position, angle), true);
        }

        match mode {
            BodyMode::Pinned => {
                self.joints.pin(&mut self.world, &self.registry, id);
            }
            BodyMode::Dynamic | BodyMode::Static => {
                self.joints.unpin(&mut self.world, id);
            }
        }
    }

    /// 刚体是否为固定模式（没有刚体时为 false）
    pub fn is_static(&self, id: TargetId) -> bool {
        self.registry
            .handle(id)
            .and_then(|h| self.world.bodies.get(h))
            .map_or(false, |rb| rb.body_type() == RigidBodyType::Fixed)
    }

    // ========== 材质 ==========

    /// 按百分比设置密度、摩擦、弹性（自动启用），作用于所有碰撞体
    pub fn set_properties<S: Scene>(
        &mut self,
        scene: &S,
        id: TargetId,
        density: f64,
        friction: f64,
        restitution: f64,
    ) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        self.update_colliders(handle, |co| {
            co.set_density(non_negative(density / 100.0));
            co.set_friction(non_negative(friction / 100.0));
            co.set_restitution(non_negative(restitution / 100.0));
        });
    }

    /// 设置密度（原值，不按百分比；自动启用）
    pub fn set_density<S: Scene>(&mut self, scene: &S, id: TargetId, density: f64) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        self.update_colliders(handle, |co| co.set_density(non_negative(density)));
    }

    fn update_colliders(&mut self, handle: RigidBodyHandle, mut apply: impl FnMut(&mut Collider)) {
        let Some(rb) = self.world.bodies.get_mut(handle) else {
            return;
        };
        rb.wake_up(true);
        let colliders = rb.colliders().to_vec();
        for collider in colliders {
            if let Some(co) = self.world.colliders.get_mut(collider) {
                apply(co);
            }
        }
    }

    // ========== 速度与力 ==========

    /// 设置线速度（舞台单位/刻；自动启用）
    pub fn set_velocity<S: Scene>(&mut self, scene: &S, id: TargetId, velocity: DVec2) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        let velocity = self
            .mapper
            .velocity_to_world(velocity, self.config.velocity_scale);
        if let Some(rb) = self.world.bodies.get_mut(handle) {
            rb.set_linvel(vec_to_rapier(velocity), true);
        }
    }

    /// 在当前线速度上叠加（自动启用）
    pub fn change_velocity<S: Scene>(&mut self, scene: &S, id: TargetId, delta: DVec2) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        let delta = self.mapper.velocity_to_world(delta, self.config.velocity_scale);
        if let Some(rb) = self.world.bodies.get_mut(handle) {
            let velocity = *rb.linvel() + vec_to_rapier(delta);
            rb.set_linvel(velocity, true);
        }
    }

    /// 舞台单位/刻的线速度；没有刚体时为 0
    pub fn velocity(&self, id: TargetId) -> DVec2 {
        self.registry
            .handle(id)
            .and_then(|h| self.world.bodies.get(h))
            .map_or(DVec2::ZERO, |rb| {
                self.mapper
                    .velocity_to_stage(rapier_to_vec(rb.linvel()), self.config.velocity_scale)
            })
    }

    pub fn velocity_x(&self, id: TargetId) -> f64 {
        self.velocity(id).x
    }

    pub fn velocity_y(&self, id: TargetId) -> f64 {
        self.velocity(id).y
    }

    /// 沿舞台方向在质心施加冲量（不会自动启用）
    pub fn apply_impulse(&mut self, id: TargetId, force: f64, direction: f64) {
        let Some(rb) = self.body_mut(id) else {
            return;
        };
        let angle = CoordinateMapper::world_angle(direction);
        let impulse = vector![(force * angle.cos()) as Real, (force * angle.sin()) as Real];
        rb.apply_impulse(impulse, true);
    }

    /// 在世界像素坐标 `point` 处沿舞台方向施加力，只作用于下一次步进
    pub fn apply_world_force(&mut self, id: TargetId, point: DVec2, direction: f64, power: f64) {
        let point = point_to_rapier(self.mapper.unscrolled_to_world(point));
        let Some(rb) = self.body_mut(id) else {
            return;
        };
        let angle = CoordinateMapper::world_angle(direction);
        let force = vector![(power * angle.cos()) as Real, (power * angle.sin()) as Real];
        rb.add_force_at_point(force, point, true);
    }

    /// 施加力矩，正值为顺时针（自动启用）
    pub fn apply_torque<S: Scene>(&mut self, scene: &S, id: TargetId, torque: f64) {
        let Some(handle) = self.ensure_body(scene, id) else {
            return;
        };
        if let Some(rb) = self.world.bodies.get_mut(handle) {
            rb.add_torque(-(torque as Real), true);
        }
    }

    fn body_mut(&mut self, id: TargetId) -> Option<&mut RigidBody> {
        let handle = self.registry.handle(id)?;
        self.world.bodies.get_mut(handle)
    }

    // ========== 位置 ==========

    /// 同时移动角色和刚体
    ///
    /// - `Stage`: 舞台坐标，刚体按当前卷动映射
    /// - `Relative`: 相对当前位置的偏移
    /// - `World`: 世界像素坐标，角色显示在减去卷动后的位置
    pub fn set_position<S: Scene>(
        &mut self,
        scene: &mut S,
        id: TargetId,
        position: DVec2,
        space: PositionSpace,
    ) {
        let Some(target) = scene.target_mut(id) else {
            return;
        };
        let scroll = self.mapper.scroll();
        let stage = match space {
            PositionSpace::Stage => position,
            PositionSpace::Relative => target.position() + position,
            PositionSpace::World => position - scroll,
        };
        target.set_xy(stage.x, stage.y, false);

        let Some(handle) = self.registry.handle(id) else {
            return;
        };
        let body_position = match space {
            PositionSpace::Stage => self.mapper.to_world(position),
            PositionSpace::Relative => match self.world.bodies.get(handle) {
                Some(rb) => {
                    rapier_to_vec(rb.translation()) + self.mapper.unscrolled_to_world(position)
                }
                None => return,
            },
            PositionSpace::World => self.mapper.unscrolled_to_world(position),
        };
        self.move_body(id, handle, body_position);
    }

    /// 桥接层移动刚体的唯一入口：固定的刚体会在新位置重新固定
    pub(super) fn move_body(&mut self, id: TargetId, handle: RigidBodyHandle, position: DVec2) {
        let position = vec_to_rapier(position);
        self.joints
            .rebind_pin(&mut self.world, &self.registry, id, Point::from(position));
        if let Some(rb) = self.world.bodies.get_mut(handle) {
            rb.set_translation(position, true);
        }
    }

    // ========== 世界 ==========

    /// 设置重力（世界单位/秒²）并唤醒所有刚体
    pub fn set_gravity(&mut self, gravity: DVec2) {
        self.world.gravity = vec_to_rapier(gravity);
        self.world.wake_all();
    }

    pub fn gravity(&self) -> DVec2 {
        rapier_to_vec(&self.world.gravity)
    }

    /// 切换舞台边界
    pub fn set_stage(&mut self, preset: StagePreset) {
        self.boundary
            .rebuild(&mut self.world, preset, self.mapper.zoom());
        self.joints.prune(&self.world);
    }

    // ========== 碰撞查询 ==========

    /// 当前接触的角色名（边界为舞台名），按首次出现去重，逗号分隔
    ///
    /// 对应角色已不存在的刚体会被顺便删除。
    pub fn touching<S: Scene>(&mut self, scene: &S, id: TargetId, region: ContactRegion) -> String {
        let Some(handle) = self.registry.handle(id) else {
            return String::new();
        };

        let mut names: Vec<String> = Vec::new();
        let mut stale: Vec<TargetId> = Vec::new();
        for partner in contact::touching(&self.world, handle, region) {
            let owner = match partner {
                ContactPartner::Body(other) => self.world.owner_of(other),
                ContactPartner::Free => None,
            };
            let name = match owner {
                None => scene.stage_name().to_string(),
                Some(owner) => match scene.target(owner) {
                    Some(target) => target.name.clone(),
                    None => {
                        stale.push(owner);
                        continue;
                    }
                },
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }

        for owner in stale {
            if self.registry.remove(&mut self.world, &mut self.joints, owner) {
                log::debug!("[碰撞] 清理已删除角色 {:?} 的刚体", owner);
            }
        }
        names.join(",")
    }

    // ========== 关节 ==========

    /// 设置之后创建的弹簧参数
    pub fn define_spring(&mut self, length: f64, damping: f64, frequency: f64) {
        self.joints.set_spring_settings(SpringSettings::define(
            length,
            damping,
            frequency,
            self.mapper.zoom(),
        ));
    }

    /// 创建关节，请求无效时返回 None
    pub fn create_joint(&mut self, request: &JointRequest) -> Option<JointId> {
        let id = self
            .joints
            .create(&mut self.world, &self.registry, request, self.mapper.zoom());
        if id.is_none() {
            log::debug!("[关节] 无效请求: {:?}", request);
        }
        id
    }

    pub fn destroy_joint(&mut self, id: JointId) -> bool {
        self.joints.destroy(&mut self.world, id)
    }

    /// 移动拖拽关节的目标点（世界像素坐标）
    pub fn set_drag_target(&mut self, id: JointId, target: DVec2) -> bool {
        self.joints.set_drag_target(id, target, self.mapper.zoom())
    }

    /// 在角色局部偏移 `offset` 处把它铰接到世界（自动启用）
    pub fn pin_to_world<S: Scene>(
        &mut self,
        scene: &S,
        id: TargetId,
        offset: DVec2,
    ) -> Option<JointId> {
        self.ensure_body(scene, id)?;
        self.create_joint(&JointRequest {
            kind: JointKind::Rotating,
            body_a: Some(id),
            anchor_a: offset,
            body_b: None,
            anchor_b: None,
        })
    }
}

fn non_negative(value: f64) -> Real {
    value.max(0.0) as Real
}
