//! Rapier 物理世界
//!
//! ## Box2D → Rapier 映射
//! | Box2D | Rapier |
//! |-------|--------|
//! | b2World | PhysicsPipeline + RigidBodySet + ColliderSet + ImpulseJointSet |
//! | GetGroundBody() | 没有碰撞体的固定刚体 `ground` |
//! | b2Fixture | Collider |
//! | SetBullet | CCD |
//! | ClearForces | reset_forces / reset_torques |

use std::num::NonZeroUsize;

use rapier2d::parry::query::PointQuery;
use rapier2d::prelude::*;

use crate::scene::TargetId;

/// 把角色 id 写入刚体 user_data（0 表示无归属）
pub fn encode_owner(id: TargetId) -> u128 {
    id.0 as u128 + 1
}

/// 从刚体 user_data 读回角色 id
pub fn decode_owner(user_data: u128) -> Option<TargetId> {
    if user_data == 0 {
        None
    } else {
        Some(TargetId((user_data - 1) as u64))
    }
}

/// 物理世界
///
/// 管理 Rapier 的流水线、刚体/碰撞体/关节集合，以及充当“世界参考系”的地面刚体。
pub struct PhysicsWorld {
    /// 物理流水线
    pub physics_pipeline: PhysicsPipeline,
    /// 积分参数
    pub integration_parameters: IntegrationParameters,
    /// 岛管理器
    pub island_manager: IslandManager,
    /// 宽相检测
    pub broad_phase: DefaultBroadPhase,
    /// 窄相检测
    pub narrow_phase: NarrowPhase,
    /// 刚体集合
    pub bodies: RigidBodySet,
    /// 碰撞体集合
    pub colliders: ColliderSet,
    /// 关节集合
    pub impulse_joints: ImpulseJointSet,
    /// 多体关节集合（不使用，流水线需要）
    pub multibody_joints: MultibodyJointSet,
    /// CCD 求解器
    pub ccd_solver: CCDSolver,
    /// 重力向量
    pub gravity: Vector<Real>,
    /// 世界参考系（原点处的固定刚体，没有碰撞体）
    pub ground: RigidBodyHandle,
}

impl PhysicsWorld {
    /// 创建新的物理世界
    ///
    /// # 参数
    /// - `gravity`: 重力
    /// - `dt`: 固定步长（秒）
    /// - `velocity_iterations`: 速度求解迭代次数
    /// - `position_iterations`: 位置修正迭代次数
    pub fn new(
        gravity: Vector<Real>,
        dt: Real,
        velocity_iterations: usize,
        position_iterations: usize,
    ) -> Self {
        let mut bodies = RigidBodySet::new();
        let ground = bodies.insert(RigidBodyBuilder::fixed().build());

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        integration_parameters.num_internal_stabilization_iterations = position_iterations;

        Self {
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity,
            ground,
        }
    }

    /// 执行一次固定步长的物理步进
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// 清除累积的力和力矩
    pub fn clear_forces(&mut self) {
        for (_, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    /// 删除刚体及其碰撞体、关节
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// 唤醒所有动态刚体
    pub fn wake_all(&mut self) {
        for (_, rb) in self.bodies.iter_mut() {
            if rb.is_dynamic() {
                rb.wake_up(true);
            }
        }
    }

    /// 刚体的归属角色
    pub fn owner_of(&self, handle: RigidBodyHandle) -> Option<TargetId> {
        self.bodies.get(handle).and_then(|rb| decode_owner(rb.user_data))
    }

    /// 查找覆盖世界点 `point` 的刚体（排除 `exclude`）
    ///
    /// 碰撞体的世界位姿只在步进时同步，这里按父刚体的当前位姿重新计算，
    /// 步进之间被传送的刚体也能命中。
    pub fn body_at_point(
        &self,
        point: &Point<Real>,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<RigidBodyHandle> {
        self.colliders.iter().find_map(|(_, co)| {
            let parent = co.parent()?;
            if Some(parent) == exclude || parent == self.ground {
                return None;
            }
            let pose = match (self.bodies.get(parent), co.position_wrt_parent()) {
                (Some(rb), Some(local)) => rb.position() * local,
                _ => *co.position(),
            };
            if co.shape().contains_point(&pose, point) {
                Some(parent)
            } else {
                None
            }
        })
    }
}
