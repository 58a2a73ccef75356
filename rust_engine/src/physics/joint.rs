//! 关节管理
//!
//! ## Box2D → Rapier 映射
//! | Box2D | Rapier |
//! |-------|--------|
//! | b2DistanceJoint (frequency/damping) | SpringJoint（加速度模型） |
//! | b2RevoluteJoint | RevoluteJoint |
//! | b2MouseJoint | 每步施加的软约束冲量（见 [`JointManager::apply_drag`]） |
//!
//! 固定（pin）关节与角色一一对应，由 `pins` 单独跟踪。

use std::collections::HashMap;
use std::f32::consts::PI;
use std::str::FromStr;

use glam::DVec2;
use rapier2d::prelude::*;

use super::body::BodyRegistry;
use super::coords::point_to_rapier;
use super::world::PhysicsWorld;
use crate::scene::TargetId;
use crate::{BridgeError, Result};

/// 关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// 带频率与阻尼的距离弹簧
    Spring,
    /// 铰链
    Rotating,
    /// 拖拽：把刚体上的一点拉向目标点
    Mouse,
}

impl FromStr for JointKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spring" => Ok(JointKind::Spring),
            "rotating" => Ok(JointKind::Rotating),
            "mouse" => Ok(JointKind::Mouse),
            _ => Err(BridgeError::UnknownJoint(s.to_string())),
        }
    }
}

/// 之后创建的弹簧关节使用的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSettings {
    /// 静止长度（世界单位）
    pub length: Real,
    /// 阻尼比
    pub damping_ratio: Real,
    /// 频率（Hz）
    pub frequency: Real,
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self::define(100.0, 0.7, 5.0, 50.0)
    }
}

impl SpringSettings {
    /// 按积木参数规则生成弹簧参数
    ///
    /// - 长度 < 0.1 时取 0.1（不再除以 zoom），否则为 `length / zoom`
    /// - 阻尼 < 0 时取 0.7
    /// - 频率 ≤ 0 时取 5
    pub fn define(length: f64, damping: f64, frequency: f64, zoom: f64) -> Self {
        let length = if length < 0.1 { 0.1 } else { length / zoom };
        let damping_ratio = if damping < 0.0 { 0.7 } else { damping };
        let frequency = if frequency > 0.0 { frequency } else { 5.0 };
        Self {
            length: length as Real,
            damping_ratio: damping_ratio as Real,
            frequency: frequency as Real,
        }
    }
}

/// 拖拽关节参数（最大力 = factor × 质量）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSettings {
    pub force_factor: Real,
    pub frequency: Real,
    pub damping_ratio: Real,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            force_factor: 300.0,
            frequency: 5.0,
            damping_ratio: 0.7,
        }
    }
}

/// 创建关节的请求
///
/// 锚点都是舞台像素（除以 zoom 得到世界单位）。`None` 的一侧为世界参考系。
/// - Spring/Rotating: `anchor_a`/`anchor_b` 为各自刚体的局部坐标
/// - Rotating 缺省 `anchor_b` 时取 A 锚点当前的世界位置
/// - Mouse: 被拖刚体取 A（缺省时取 B），目标点是对应锚点的世界坐标
#[derive(Debug, Clone, PartialEq)]
pub struct JointRequest {
    pub kind: JointKind,
    pub body_a: Option<TargetId>,
    pub anchor_a: DVec2,
    pub body_b: Option<TargetId>,
    pub anchor_b: Option<DVec2>,
}

/// 关节 id，不随世界重建复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u64);

#[derive(Debug, Clone, Copy)]
enum JointBackend {
    Impulse(ImpulseJointHandle),
    Drag {
        body: RigidBodyHandle,
        local_anchor: Point<Real>,
        target: Point<Real>,
        max_force: Real,
    },
}

/// 已创建的关节
#[derive(Debug, Clone)]
pub struct JointEntry {
    pub kind: JointKind,
    pub body_a: Option<TargetId>,
    pub body_b: Option<TargetId>,
    backend: JointBackend,
}

impl JointEntry {
    fn references(&self, target: TargetId) -> bool {
        self.body_a == Some(target) || self.body_b == Some(target)
    }
}

/// 关节管理器
#[derive(Debug, Default)]
pub struct JointManager {
    joints: HashMap<JointId, JointEntry>,
    /// 角色 → 它的固定关节
    pins: HashMap<TargetId, JointId>,
    spring: SpringSettings,
    drag: DragSettings,
    next_id: u64,
}

/// 一侧解析后的刚体
struct Side {
    handle: RigidBodyHandle,
    owner: Option<TargetId>,
}

impl JointManager {
    pub fn new(drag: DragSettings) -> Self {
        Self {
            drag,
            ..Default::default()
        }
    }

    pub fn spring_settings(&self) -> SpringSettings {
        self.spring
    }

    pub fn set_spring_settings(&mut self, spring: SpringSettings) {
        self.spring = spring;
    }

    /// 创建关节；两侧都为空或指定的刚体不存在时返回 None
    pub fn create(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry,
        request: &JointRequest,
        zoom: f64,
    ) -> Option<JointId> {
        if request.body_a.is_none() && request.body_b.is_none() {
            return None;
        }
        let a = resolve(world, registry, request.body_a)?;
        let b = resolve(world, registry, request.body_b)?;
        let anchor_a = point_to_rapier(request.anchor_a / zoom);
        let anchor_b = request.anchor_b.map(|p| point_to_rapier(p / zoom));

        match request.kind {
            JointKind::Spring => {
                let anchor_b = anchor_b.unwrap_or_else(Point::origin);
                Some(self.insert_spring(world, a, anchor_a, b, anchor_b))
            }
            JointKind::Rotating => self.insert_rotating(world, a, anchor_a, b, anchor_b),
            JointKind::Mouse => {
                let (dragged, target) = if request.body_a.is_some() {
                    (a, anchor_a)
                } else {
                    (b, anchor_b.unwrap_or_else(Point::origin))
                };
                self.insert_drag(world, dragged, target)
            }
        }
    }

    /// 删除关节
    pub fn destroy(&mut self, world: &mut PhysicsWorld, id: JointId) -> bool {
        let Some(entry) = self.joints.remove(&id) else {
            return false;
        };
        if let JointBackend::Impulse(handle) = entry.backend {
            world.impulse_joints.remove(handle, true);
        }
        self.pins.retain(|_, pin| *pin != id);
        true
    }

    /// 把角色的刚体钉在当前位置
    ///
    /// 在刚体原点查找其他刚体（不含自身），找到则铰接到它，否则铰接到世界。
    /// 已有的固定关节会先被删除。
    pub fn pin(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry,
        target: TargetId,
    ) -> Option<JointId> {
        self.unpin(world, target);
        let handle = registry.handle(target)?;
        let origin = Point::from(*world.bodies.get(handle)?.translation());

        let partner = match world.body_at_point(&origin, Some(handle)) {
            Some(other) => Side {
                handle: other,
                owner: world.owner_of(other),
            },
            None => Side {
                handle: world.ground,
                owner: None,
            },
        };
        let a = Side {
            handle,
            owner: Some(target),
        };
        let id = self.insert_rotating(world, a, Point::origin(), partner, None)?;
        self.pins.insert(target, id);
        log::debug!("[关节] 固定 {:?} -> {:?}", target, id);
        Some(id)
    }

    /// 删除角色的固定关节
    pub fn unpin(&mut self, world: &mut PhysicsWorld, target: TargetId) -> bool {
        match self.pins.remove(&target) {
            Some(id) => self.destroy(world, id),
            None => false,
        }
    }

    /// 固定的刚体被桥接层移动时调用（移动之前）：
    /// 删除旧的固定关节，在新位置重新钉到世界
    pub fn rebind_pin(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry,
        target: TargetId,
        position: Point<Real>,
    ) -> Option<JointId> {
        if !self.pins.contains_key(&target) {
            return None;
        }
        self.unpin(world, target);
        let a = Side {
            handle: registry.handle(target)?,
            owner: Some(target),
        };
        let ground = Side {
            handle: world.ground,
            owner: None,
        };
        let id = self.insert_rotating(world, a, Point::origin(), ground, Some(position))?;
        self.pins.insert(target, id);
        Some(id)
    }

    pub fn pin_of(&self, target: TargetId) -> Option<JointId> {
        self.pins.get(&target).copied()
    }

    /// 删除所有引用该角色的关节（刚体被删除前调用）
    pub fn release_target(&mut self, world: &mut PhysicsWorld, target: TargetId) {
        let ids: Vec<JointId> = self
            .joints
            .iter()
            .filter(|(_, entry)| entry.references(target))
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.destroy(world, id);
        }
        self.pins.remove(&target);
    }

    /// 丢弃 Rapier 侧已随刚体一起消失的关节（例如连到被重建的边界上）
    pub fn prune(&mut self, world: &PhysicsWorld) {
        self.joints.retain(|_, entry| match entry.backend {
            JointBackend::Impulse(handle) => world.impulse_joints.get(handle).is_some(),
            JointBackend::Drag { body, .. } => world.bodies.get(body).is_some(),
        });
        let joints = &self.joints;
        self.pins.retain(|_, id| joints.contains_key(id));
    }

    /// 引用该角色的关节个数
    pub fn joints_referencing(&self, target: TargetId) -> usize {
        self.joints.values().filter(|e| e.references(target)).count()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn get(&self, id: JointId) -> Option<&JointEntry> {
        self.joints.get(&id)
    }

    /// 移动拖拽关节的目标点（舞台像素，不含卷动）
    pub fn set_drag_target(&mut self, id: JointId, target: DVec2, zoom: f64) -> bool {
        match self.joints.get_mut(&id).map(|e| &mut e.backend) {
            Some(JointBackend::Drag { target: t, .. }) => {
                *t = point_to_rapier(target / zoom);
                true
            }
            _ => false,
        }
    }

    /// 在积分之前为每个拖拽关节施加软约束冲量
    ///
    /// 按 Box2D 鼠标关节的软约束公式计算（只考虑线性有效质量），
    /// 每步冲量上限为 `max_force · dt`。
    pub fn apply_drag(&self, world: &mut PhysicsWorld) {
        let dt = world.integration_parameters.dt;
        let omega = 2.0 * PI * self.drag.frequency;

        for entry in self.joints.values() {
            let JointBackend::Drag {
                body,
                local_anchor,
                target,
                max_force,
            } = entry.backend
            else {
                continue;
            };
            let Some(rb) = world.bodies.get_mut(body) else {
                continue;
            };
            let mass = rb.mass();
            if !rb.is_dynamic() || mass <= 0.0 {
                continue;
            }

            let stiffness = mass * omega * omega;
            let damping = 2.0 * mass * self.drag.damping_ratio * omega;
            let softness = dt * (damping + dt * stiffness);
            if softness <= 0.0 {
                continue;
            }
            let gamma = 1.0 / softness;
            let beta = dt * stiffness * gamma;
            let effective_mass = 1.0 / (1.0 / mass + gamma);

            let anchor = rb.position() * local_anchor;
            let error = anchor - target;
            let velocity = rb.velocity_at_point(&anchor);
            let mut impulse = -(velocity + error * beta) * effective_mass;

            let max_impulse = max_force * dt;
            let len = impulse.norm();
            if len > max_impulse {
                impulse *= max_impulse / len;
            }
            rb.apply_impulse_at_point(impulse, anchor, true);
        }
    }

    /// 世界被整体重建后，丢弃所有关节（弹簧参数也恢复默认）
    pub fn forget_all(&mut self) {
        self.joints.clear();
        self.pins.clear();
        self.spring = SpringSettings::default();
    }

    fn next_id(&mut self) -> JointId {
        self.next_id += 1;
        JointId(self.next_id)
    }

    fn insert_spring(
        &mut self,
        world: &mut PhysicsWorld,
        a: Side,
        anchor_a: Point<Real>,
        b: Side,
        anchor_b: Point<Real>,
    ) -> JointId {
        // 加速度模型下 k = ω²、c = 2ζω，与质量无关，对应 Box2D 的频率/阻尼比
        let omega = 2.0 * PI * self.spring.frequency;
        let joint = SpringJointBuilder::new(
            self.spring.length,
            omega * omega,
            2.0 * self.spring.damping_ratio * omega,
        )
        .local_anchor1(anchor_a)
        .local_anchor2(anchor_b)
        .spring_model(MotorModel::AccelerationBased)
        .contacts_enabled(false)
        .build();

        let handle = world.impulse_joints.insert(a.handle, b.handle, joint, true);
        self.register(JointKind::Spring, a.owner, b.owner, JointBackend::Impulse(handle))
    }

    fn insert_rotating(
        &mut self,
        world: &mut PhysicsWorld,
        a: Side,
        anchor_a: Point<Real>,
        b: Side,
        anchor_b: Option<Point<Real>>,
    ) -> Option<JointId> {
        let anchor_b = match anchor_b {
            Some(anchor) => anchor,
            None => {
                let world_point = world.bodies.get(a.handle)?.position() * anchor_a;
                world
                    .bodies
                    .get(b.handle)?
                    .position()
                    .inverse_transform_point(&world_point)
            }
        };
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(anchor_a)
            .local_anchor2(anchor_b)
            .contacts_enabled(false)
            .build();

        let handle = world.impulse_joints.insert(a.handle, b.handle, joint, true);
        Some(self.register(JointKind::Rotating, a.owner, b.owner, JointBackend::Impulse(handle)))
    }

    fn insert_drag(
        &mut self,
        world: &mut PhysicsWorld,
        dragged: Side,
        target: Point<Real>,
    ) -> Option<JointId> {
        let rb = world.bodies.get_mut(dragged.handle)?;
        let local_anchor = rb.position().inverse_transform_point(&target);
        let max_force = self.drag.force_factor * rb.mass();
        rb.wake_up(true);

        let backend = JointBackend::Drag {
            body: dragged.handle,
            local_anchor,
            target,
            max_force,
        };
        Some(self.register(JointKind::Mouse, dragged.owner, None, backend))
    }

    fn register(
        &mut self,
        kind: JointKind,
        body_a: Option<TargetId>,
        body_b: Option<TargetId>,
        backend: JointBackend,
    ) -> JointId {
        let id = self.next_id();
        self.joints.insert(
            id,
            JointEntry {
                kind,
                body_a,
                body_b,
                backend,
            },
        );
        id
    }
}

/// 解析一侧：None 为世界参考系，Some 必须是已登记的刚体
fn resolve(world: &PhysicsWorld, registry: &BodyRegistry, target: Option<TargetId>) -> Option<Side> {
    match target {
        None => Some(Side {
            handle: world.ground,
            owner: None,
        }),
        Some(id) => registry.handle(id).map(|handle| Side {
            handle,
            owner: Some(id),
        }),
    }
}
