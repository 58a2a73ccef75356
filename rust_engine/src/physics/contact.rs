//! 接触查询
//!
//! 只读取上一次步进后窄相中的接触对，结果在下一次步进之前有效。
//! Rapier 没有 Box2D 的“岛合并”接触标记，这里只按传感器、启用状态和是否有活动接触过滤。

use std::str::FromStr;

use rapier2d::prelude::*;

use super::world::PhysicsWorld;
use crate::{BridgeError, Result};

/// 接触区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactRegion {
    /// 任何接触
    #[default]
    Any,
    /// 只算发生在刚体底部四分之一的接触
    Feet,
}

impl FromStr for ContactRegion {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(ContactRegion::Any),
            "feet" => Ok(ContactRegion::Feet),
            other => Err(BridgeError::UnknownRegion(other.to_string())),
        }
    }
}

/// 接触到的另一方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPartner {
    /// 另一个刚体（可能无归属，例如舞台边界）
    Body(RigidBodyHandle),
    /// 没有父刚体的碰撞体
    Free,
}

/// 与 `body` 接触的对象，按遇到的顺序（可能重复）
pub fn touching(
    world: &PhysicsWorld,
    body: RigidBodyHandle,
    region: ContactRegion,
) -> Vec<ContactPartner> {
    let Some(rb) = world.bodies.get(body) else {
        return Vec::new();
    };
    if !rb.is_enabled() {
        return Vec::new();
    }
    let own_colliders = rb.colliders();

    let feet_limit = match region {
        ContactRegion::Any => None,
        ContactRegion::Feet => {
            let Some(first) = own_colliders.first().and_then(|h| world.colliders.get(*h)) else {
                return Vec::new();
            };
            let aabb = first.compute_aabb();
            Some(aabb.mins.y * 0.75 + aabb.maxs.y * 0.25)
        }
    };

    let mut partners = Vec::new();
    for &own in own_colliders {
        for pair in world.narrow_phase.contact_pairs_with(own) {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(co1), Some(co2)) = (
                world.colliders.get(pair.collider1),
                world.colliders.get(pair.collider2),
            ) else {
                continue;
            };
            if co1.is_sensor() || co2.is_sensor() || !co1.is_enabled() || !co2.is_enabled() {
                continue;
            }

            let other = if pair.collider1 == own { co2 } else { co1 };
            if other.parent() == Some(body) {
                continue;
            }

            if let Some(limit) = feet_limit {
                let points = pair
                    .manifolds
                    .iter()
                    .flat_map(|m| m.points.iter())
                    .map(|p| (p.dist, co1.position() * p.local_p1));
                let Some(point) = first_touching_point(points) else {
                    continue;
                };
                if point.y > limit {
                    continue;
                }
            }

            partners.push(match other.parent() {
                Some(handle) => ContactPartner::Body(handle),
                None => ContactPartner::Free,
            });
        }
    }
    partners
}

/// 第一个真正接触（距离不为正）的点；预测出来的分离点不算
fn first_touching_point(
    mut points: impl Iterator<Item = (Real, Point<Real>)>,
) -> Option<Point<Real>> {
    points
        .find(|(dist, _)| *dist <= 0.0)
        .map(|(_, point)| point)
}
