//! 物理层
//!
//! 使用 Rapier2D 物理引擎实现，对应原 Box2D 世界的功能。
//!
//! ## 功能对应关系
//! | Box2D | Rapier (Rust) |
//! |-------|---------------|
//! | b2World | [`PhysicsWorld`] |
//! | b2Body + b2Fixture | RigidBody + Collider（[`BodyRegistry`]） |
//! | b2PolygonShape | ColliderBuilder::convex_hull() |
//! | b2CircleShape | ColliderBuilder::ball() |
//! | b2Joint | ImpulseJoint / 拖拽冲量（[`JointManager`]） |

pub mod body;
pub mod boundary;
pub mod config;
pub mod contact;
pub mod coords;
pub mod joint;
pub mod path;
pub mod shape;
pub mod world;

pub use body::{BodyMode, BodyRecord, BodyRegistry, CachedPose, EnableMode};
pub use boundary::{StageBoundary, StagePreset};
pub use config::PhysicsConfig;
pub use contact::{ContactPartner, ContactRegion};
pub use coords::{CoordinateMapper, PositionSpace};
pub use joint::{DragSettings, JointId, JointKind, JointManager, JointRequest, SpringSettings};
pub use path::{parse_path, Contour, PathError};
pub use shape::{Material, ShapeDescriptor, ShapeKind};
pub use world::PhysicsWorld;
