//! 积木操作码分发
//!
//! 参数按名称传入，类型宽松（数字/文本/布尔），统一经过 [`Value`] 转换。
//! 下拉菜单收到未知选项时按原积木的行为回退，不报错。

use std::collections::HashMap;

use glam::DVec2;

use super::PhysicsBridge;
use crate::cast::Value;
use crate::physics::{
    BodyMode, ContactRegion, EnableMode, PositionSpace, ShapeKind, StagePreset,
};
use crate::scene::{Scene, TargetId};
use crate::{BridgeError, Result};

/// 积木参数
#[derive(Debug, Clone, Default)]
pub struct BlockArgs {
    values: HashMap<String, Value>,
}

impl BlockArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// 缺失的参数视为空文本
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_else(Value::empty)
    }

    pub fn number(&self, name: &str) -> f64 {
        self.get(name).to_number()
    }

    pub fn text(&self, name: &str) -> String {
        self.get(name).to_text()
    }

    fn point(&self, x: &str, y: &str) -> DVec2 {
        DVec2::new(self.number(x), self.number(y))
    }
}

impl PhysicsBridge {
    /// 以 `target` 为当前角色执行一个积木
    ///
    /// 命令积木返回空文本，报告积木返回数字、文本或布尔值。
    pub fn run_block<S: Scene>(
        &mut self,
        scene: &mut S,
        opcode: &str,
        args: &BlockArgs,
        target: TargetId,
    ) -> Result<Value> {
        match opcode {
            // ===== 世界 =====
            "setStage" => {
                // 未知类型等同于没有边界
                let preset = args.text("stageType").parse().unwrap_or(StagePreset::Open);
                self.set_stage(preset);
            }
            "setGravity" => self.set_gravity(args.point("gx", "gy")),
            "doTick" => self.step(scene),
            "defineSpring" => {
                self.define_spring(args.number("len"), args.number("damp"), args.number("freq"))
            }

            // ===== 启用 / 模式 =====
            "setPhysics" => {
                let shape = args.text("shape").parse().unwrap_or(ShapeKind::Costume);
                let mode = args.text("mode").parse().unwrap_or(EnableMode::Normal);
                self.enable(scene, target, shape, mode);
            }
            "setStatic" => {
                let mode = args.text("static").parse().unwrap_or(BodyMode::Dynamic);
                self.set_body_mode(scene, target, mode);
            }
            "getStatic" => return Ok(Value::Bool(self.is_static(target))),
            "setDensity" => self.set_density(scene, target, args.number("density")),
            "setProperties" => self.set_properties(
                scene,
                target,
                args.number("density"),
                args.number("friction"),
                args.number("restitution"),
            ),
            "pinSprite" => {
                self.pin_to_world(scene, target, args.point("x", "y"));
            }

            // ===== 运动 =====
            "setPosition" => {
                let space = args.text("space").parse().unwrap_or(PositionSpace::World);
                self.set_position(scene, target, args.point("x", "y"), space);
            }
            "setVelocity" => self.set_velocity(scene, target, args.point("sx", "sy")),
            "changeVelocity" => self.change_velocity(scene, target, args.point("sx", "sy")),
            "getVelocityX" => return Ok(Value::Number(self.velocity_x(target))),
            "getVelocityY" => return Ok(Value::Number(self.velocity_y(target))),
            "applyForce" => self.apply_impulse(target, args.number("force"), args.number("dir")),
            "applyAngForce" => self.apply_torque(scene, target, args.number("force")),

            // ===== 查询 =====
            "getTouching" => {
                // 非 feet 的选项都按 any 处理
                let region = args.text("where").parse().unwrap_or(ContactRegion::Any);
                return Ok(Value::Text(self.touching(scene, target, region)));
            }

            // ===== 卷动 =====
            "setScroll" => self.set_scroll(scene, args.point("ox", "oy")),
            "changeScroll" => self.change_scroll(scene, args.point("ox", "oy")),
            "getScrollX" => return Ok(Value::Number(self.scroll_x())),
            "getScrollY" => return Ok(Value::Number(self.scroll_y())),

            other => return Err(BridgeError::UnknownOpcode(other.to_string())),
        }
        Ok(Value::empty())
    }
}
