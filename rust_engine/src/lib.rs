//! Stage Physics - 2D 舞台角色与刚体物理世界的双向桥接
//!
//! 提供：
//! - 舞台坐标 ↔ 世界坐标映射（含卷动）
//! - 从造型提取物理形状（凸包、圆、SVG 路径）
//! - 刚体与关节的生命周期管理
//! - 固定步长模拟，以及脚本移动与物理移动的双向同步
//! - 基于接触的碰撞查询
//! - 积木风格的操作分发（宽松类型参数）

pub mod bridge;
pub mod cast;
pub mod physics;
pub mod scene;

pub use bridge::{BlockArgs, PhysicsBridge};
pub use cast::Value;
pub use physics::{
    BodyMode, ContactRegion, EnableMode, JointId, JointKind, JointRequest, PhysicsConfig,
    PositionSpace, ShapeKind, StagePreset,
};
pub use scene::{Costume, RotationStyle, Scene, SceneGraph, Target, TargetEvent, TargetId};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unknown shape: {0}")]
    UnknownShape(String),

    #[error("Unknown stage type: {0}")]
    UnknownStage(String),

    #[error("Unknown position space: {0}")]
    UnknownSpace(String),

    #[error("Unknown touch region: {0}")]
    UnknownRegion(String),

    #[error("Unknown body mode: {0}")]
    UnknownBodyMode(String),

    #[error("Unknown joint type: {0}")]
    UnknownJoint(String),

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(String),

    #[error("Target {0:?} has no vector costume")]
    MissingVectorSource(TargetId),

    #[error("Shape has no usable area")]
    DegenerateShape,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
