//! 角色（target）

use glam::DVec2;

/// 角色 id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// 旋转方式
///
/// 只有 `AllAround` 允许物理驱动方向，其余都视为锁定旋转。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStyle {
    #[default]
    AllAround,
    LeftRight,
    DontRotate,
}

/// 当前造型的渲染数据（由渲染协作方提供）
#[derive(Debug, Clone, Default)]
pub struct Costume {
    /// 凸包点，皮肤像素空间（Y 向下）
    pub hull_points: Vec<DVec2>,
    /// 皮肤像素尺寸
    pub skin_size: DVec2,
    /// 旋转中心
    pub rotation_center: DVec2,
    /// 矢量造型的 SVG 源码，位图造型为 None
    pub vector_source: Option<String>,
}

/// 位置变更通知
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetEvent {
    /// 可见角色的外观需要重绘
    VisualChange,
    /// 位置发生了变化
    Moved { old_x: f64, old_y: f64, forced: bool },
}

/// 舞台上的角色
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    /// 角色名（碰撞查询的返回值）
    pub name: String,
    pub is_stage: bool,
    pub rotation_style: RotationStyle,
    pub visible: bool,
    /// 正在被鼠标拖动
    pub dragging: bool,
    /// 缩放百分比，(100, 100) 为原始大小
    pub scale: DVec2,
    pub costume: Costume,
    x: f64,
    y: f64,
    direction: f64,
    events: Vec<TargetEvent>,
}

impl Target {
    pub fn new(id: TargetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_stage: false,
            rotation_style: RotationStyle::AllAround,
            visible: true,
            dragging: false,
            scale: DVec2::new(100.0, 100.0),
            costume: Costume::default(),
            x: 0.0,
            y: 0.0,
            direction: 90.0,
            events: Vec::new(),
        }
    }

    /// 舞台本身
    pub fn stage(id: TargetId, name: impl Into<String>) -> Self {
        let mut target = Self::new(id, name);
        target.is_stage = true;
        target
    }

    pub fn with_costume(mut self, costume: Costume) -> Self {
        self.costume = costume;
        self
    }

    pub fn with_rotation_style(mut self, style: RotationStyle) -> Self {
        self.rotation_style = style;
        self
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// 旋转是否被锁定
    pub fn rotation_locked(&self) -> bool {
        self.rotation_style != RotationStyle::AllAround
    }

    /// 设置位置（不做舞台围栏）
    ///
    /// 舞台不可移动；被拖动中的角色只有 `force` 时才移动。
    /// 可见时发出 `VisualChange`，总是发出 `Moved`。
    /// 两种通知在被取走之前各自合并，不会无限累积。
    pub fn set_xy(&mut self, x: f64, y: f64, force: bool) {
        if self.is_stage {
            return;
        }
        if self.dragging && !force {
            return;
        }
        let old_x = self.x;
        let old_y = self.y;
        self.x = x;
        self.y = y;
        if self.visible {
            self.queue_visual_change();
        }
        // 未取走的 Moved 合并为一条：保留最早的旧位置
        let pending = self.events.iter_mut().find_map(|event| match event {
            TargetEvent::Moved { forced, .. } => Some(forced),
            TargetEvent::VisualChange => None,
        });
        match pending {
            Some(forced) => *forced |= force,
            None => self.events.push(TargetEvent::Moved {
                old_x,
                old_y,
                forced: force,
            }),
        }
    }

    /// 设置方向，折算到 (-180, 180]
    pub fn set_direction(&mut self, direction: f64) {
        if !direction.is_finite() {
            return;
        }
        self.direction = wrap_direction(direction);
        if self.visible {
            self.queue_visual_change();
        }
    }

    fn queue_visual_change(&mut self) {
        if !self.events.contains(&TargetEvent::VisualChange) {
            self.events.push(TargetEvent::VisualChange);
        }
    }

    /// 尚未取走的通知，每种最多一条
    pub fn pending_events(&self) -> &[TargetEvent] {
        &self.events
    }

    /// 取出并清空待处理的通知
    pub fn drain_events(&mut self) -> Vec<TargetEvent> {
        std::mem::take(&mut self.events)
    }
}

fn wrap_direction(direction: f64) -> f64 {
    direction - ((direction + 179.0) / 360.0).floor() * 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_direction() {
        assert_eq!(wrap_direction(90.0), 90.0);
        assert_eq!(wrap_direction(180.0), 180.0);
        assert_eq!(wrap_direction(-180.0), 180.0);
        assert_eq!(wrap_direction(270.0), -90.0);
        assert_eq!(wrap_direction(-450.0), -90.0);
    }

    #[test]
    fn test_set_xy_emits_events() {
        let mut target = Target::new(TargetId(1), "cat");
        target.set_xy(10.0, 20.0, false);
        assert_eq!(target.x(), 10.0);
        assert_eq!(target.y(), 20.0);
        let events = target.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TargetEvent::VisualChange);
        assert_eq!(
            events[1],
            TargetEvent::Moved {
                old_x: 0.0,
                old_y: 0.0,
                forced: false
            }
        );
        assert!(target.drain_events().is_empty());
    }

    #[test]
    fn test_set_xy_respects_dragging_and_stage() {
        let mut target = Target::new(TargetId(1), "cat");
        target.dragging = true;
        target.set_xy(5.0, 5.0, false);
        assert_eq!(target.position(), DVec2::ZERO);
        target.set_xy(5.0, 5.0, true);
        assert_eq!(target.position(), DVec2::new(5.0, 5.0));

        let mut stage = Target::stage(TargetId(0), "Stage");
        stage.set_xy(1.0, 1.0, true);
        assert_eq!(stage.position(), DVec2::ZERO);
    }

    #[test]
    fn test_pending_events_coalesce() {
        let mut target = Target::new(TargetId(1), "cat");
        target.set_xy(1.0, 1.0, false);
        for i in 0..100 {
            target.set_xy(i as f64, 2.0, false);
            target.set_direction(i as f64);
        }
        target.set_xy(3.0, 3.0, true);
        assert_eq!(target.pending_events().len(), 2);

        let events = target.drain_events();
        assert_eq!(
            events,
            vec![
                TargetEvent::VisualChange,
                TargetEvent::Moved {
                    old_x: 0.0,
                    old_y: 0.0,
                    forced: true
                },
            ]
        );
        assert!(target.pending_events().is_empty());

        target.set_direction(10.0);
        assert_eq!(target.drain_events(), vec![TargetEvent::VisualChange]);
    }

    #[test]
    fn test_hidden_target_skips_visual_change() {
        let mut target = Target::new(TargetId(1), "cat");
        target.visible = false;
        target.set_xy(1.0, 2.0, false);
        let events = target.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TargetEvent::Moved { .. }));
    }
}
