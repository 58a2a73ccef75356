//! 舞台场景协作方
//!
//! 桥接层不拥有角色（target），只通过 [`Scene`] 读取和写回位置、方向等属性。

mod graph;
mod target;

pub use graph::SceneGraph;
pub use target::{Costume, RotationStyle, Target, TargetEvent, TargetId};

/// 角色集合的访问接口
pub trait Scene {
    /// 按 id 查找角色
    fn target(&self, id: TargetId) -> Option<&Target>;

    /// 按 id 查找角色（可写）
    fn target_mut(&mut self, id: TargetId) -> Option<&mut Target>;

    /// 当前所有角色 id（含舞台）
    fn target_ids(&self) -> Vec<TargetId>;

    /// 舞台的显示名，碰撞查询碰到边界几何时返回它
    fn stage_name(&self) -> &str {
        "Stage"
    }
}
