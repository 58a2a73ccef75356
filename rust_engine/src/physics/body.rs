//! 角色 → 刚体 登记表
//!
//! 每个角色最多一个刚体。重新放置会先销毁旧刚体，删除时连同缓存位姿和关节一并清理。

use std::collections::HashMap;
use std::str::FromStr;

use rapier2d::prelude::*;

use super::joint::JointManager;
use super::shape::{Material, ShapeDescriptor};
use super::world::{encode_owner, PhysicsWorld};
use crate::scene::TargetId;
use crate::{BridgeError, Result};

/// 刚体模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// 自由运动
    Dynamic,
    /// 固定不动
    Static,
    /// 固定在当前位置，但可以旋转
    Pinned,
}

impl FromStr for BodyMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dynamic" => Ok(BodyMode::Dynamic),
            "static" => Ok(BodyMode::Static),
            "pinned" => Ok(BodyMode::Pinned),
            other => Err(BridgeError::UnknownBodyMode(other.to_string())),
        }
    }
}

/// 启用物理时的精度模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnableMode {
    #[default]
    Normal,
    /// 高速物体，开启 CCD 防止穿透
    Bullet,
}

impl FromStr for EnableMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(EnableMode::Normal),
            "bullet" => Ok(EnableMode::Bullet),
            other => Err(BridgeError::UnknownBodyMode(other.to_string())),
        }
    }
}

/// 上一次发布到角色的位姿（舞台空间），用于检测物理之外的移动
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPose {
    pub x: f64,
    pub y: f64,
    pub direction: f64,
}

/// 一个已启用物理的角色
#[derive(Debug, Clone)]
pub struct BodyRecord {
    pub target: TargetId,
    pub handle: RigidBodyHandle,
    pub colliders: Vec<ColliderHandle>,
    /// 首次发布之前为 None
    pub prev_pose: Option<CachedPose>,
}

/// 刚体登记表
#[derive(Debug, Default)]
pub struct BodyRegistry {
    records: HashMap<TargetId, BodyRecord>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为角色放置刚体；已有刚体时先销毁
    ///
    /// # 参数
    /// - `position`/`angle`: 世界空间位姿
    /// - `fixed_rotation`: 旋转锁定的角色不允许物理改变角度
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        &mut self,
        world: &mut PhysicsWorld,
        joints: &mut JointManager,
        target: TargetId,
        shape: &ShapeDescriptor,
        material: Material,
        position: Vector<Real>,
        angle: Real,
        fixed_rotation: bool,
    ) -> RigidBodyHandle {
        if self.records.contains_key(&target) {
            self.remove(world, joints, target);
        }

        let mut builder = RigidBodyBuilder::dynamic()
            .translation(position)
            .rotation(angle)
            .user_data(encode_owner(target));
        if fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = world.bodies.insert(builder.build());

        let colliders = shape
            .build_colliders(material)
            .into_iter()
            .map(|collider| {
                world
                    .colliders
                    .insert_with_parent(collider, handle, &mut world.bodies)
            })
            .collect();

        self.records.insert(
            target,
            BodyRecord {
                target,
                handle,
                colliders,
                prev_pose: None,
            },
        );
        handle
    }

    /// 删除角色的刚体及所有相关状态（缓存位姿、固定关节、其他关节）
    pub fn remove(
        &mut self,
        world: &mut PhysicsWorld,
        joints: &mut JointManager,
        target: TargetId,
    ) -> bool {
        let Some(record) = self.records.remove(&target) else {
            return false;
        };
        joints.release_target(world, target);
        world.remove_body(record.handle);
        true
    }

    pub fn handle(&self, target: TargetId) -> Option<RigidBodyHandle> {
        self.records.get(&target).map(|r| r.handle)
    }

    pub fn get(&self, target: TargetId) -> Option<&BodyRecord> {
        self.records.get(&target)
    }

    pub fn get_mut(&mut self, target: TargetId) -> Option<&mut BodyRecord> {
        self.records.get_mut(&target)
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.records.contains_key(&target)
    }

    /// 当前登记的角色 id（快照，迭代期间可以安全删除）
    pub fn ids(&self) -> Vec<TargetId> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 世界被整体重建后，丢弃所有记录
    pub fn forget_all(&mut self) {
        self.records.clear();
    }
}
