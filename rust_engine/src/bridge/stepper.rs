//! 固定步长模拟与双向同步
//!
//! 每一步：
//! 1. 同步：角色在物理之外被移动/转向时，把刚体对齐过去
//! 2. 施加拖拽冲量，积分，清除累积的力
//! 3. 发布：刚体位姿写回角色，并缓存写回后的位姿

use glam::DVec2;
use rapier2d::prelude::*;

use super::PhysicsBridge;
use crate::physics::coords::rapier_to_vec;
use crate::physics::{CachedPose, CoordinateMapper};
use crate::scene::Scene;

impl PhysicsBridge {
    /// 推进一个固定步长（与调用间隔无关）
    pub fn step<S: Scene>(&mut self, scene: &mut S) {
        self.reconcile(scene);
        self.joints.apply_drag(&mut self.world);
        self.world.step();
        self.world.clear_forces();
        self.publish(scene);

        if self.config.debug_log {
            log::debug!(
                "[物理] 步进完成: {} 个刚体, {} 个关节",
                self.registry.len(),
                self.joints.joint_count()
            );
        }
    }

    /// 设置卷动偏移；已启用物理的角色按刚体位置重新显示
    pub fn set_scroll<S: Scene>(&mut self, scene: &mut S, scroll: DVec2) {
        self.reconcile(scene);
        self.mapper.set_scroll(scroll);
        self.publish(scene);
    }

    /// 改变卷动偏移
    pub fn change_scroll<S: Scene>(&mut self, scene: &mut S, delta: DVec2) {
        self.reconcile(scene);
        self.mapper.change_scroll(delta);
        self.publish(scene);
    }

    pub fn scroll_x(&self) -> f64 {
        self.mapper.scroll().x
    }

    pub fn scroll_y(&self) -> f64 {
        self.mapper.scroll().y
    }

    /// 检测角色相对缓存位姿的变化，并把刚体对齐到角色
    ///
    /// 还没有发布过的刚体不参与；角色已不存在时删除刚体。
    fn reconcile<S: Scene>(&mut self, scene: &S) {
        for id in self.registry.ids() {
            let Some(target) = scene.target(id) else {
                self.registry.remove(&mut self.world, &mut self.joints, id);
                log::debug!("[同步] 角色 {:?} 已删除，移除刚体", id);
                continue;
            };
            let Some((handle, prev)) = self
                .registry
                .get(id)
                .and_then(|r| r.prev_pose.map(|p| (r.handle, p)))
            else {
                continue;
            };

            let locked = target.rotation_locked();
            let angle = CoordinateMapper::world_angle(target.direction()) as Real;
            let moved = prev.x != target.x() || prev.y != target.y();
            let turned = !locked && prev.direction != target.direction();

            if moved {
                let position = self.mapper.to_world(target.position());
                self.move_body(id, handle, position);
            }
            if moved || turned {
                if let Some(rb) = self.world.bodies.get_mut(handle) {
                    if !locked {
                        set_angle(rb, angle);
                    }
                    rb.wake_up(true);
                }
            }
        }
    }

    /// 把刚体位姿写回角色并刷新缓存
    fn publish<S: Scene>(&mut self, scene: &mut S) {
        for id in self.registry.ids() {
            let Some(handle) = self.registry.handle(id) else {
                continue;
            };
            let Some(target) = scene.target_mut(id) else {
                self.registry.remove(&mut self.world, &mut self.joints, id);
                continue;
            };
            let Some(rb) = self.world.bodies.get(handle) else {
                continue;
            };

            let stage = self.mapper.to_stage(rapier_to_vec(rb.translation()));
            target.set_xy(stage.x, stage.y, false);
            if !target.rotation_locked() {
                let direction = CoordinateMapper::stage_direction(rb.rotation().angle() as f64);
                target.set_direction(direction);
            }

            let pose = CachedPose {
                x: target.x(),
                y: target.y(),
                direction: target.direction(),
            };
            if let Some(record) = self.registry.get_mut(id) {
                record.prev_pose = Some(pose);
            }
        }
    }
}

/// 只改角度，保留平移
fn set_angle(rb: &mut RigidBody, angle: Real) {
    let translation = *rb.translation();
    rb.set_position(Isometry::new(translation, angle), true);
}
