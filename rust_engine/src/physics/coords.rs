//! 舞台坐标 ↔ 世界坐标
//!
//! 舞台空间以像素为单位，方向为“0 朝上、90 朝右”的角度制；
//! 世界空间以 zoom 缩放，角度为逆时针弧度。卷动偏移只在这里生效，
//! 不会写进任何刚体的内部坐标。

use std::str::FromStr;

use glam::DVec2;
use rapier2d::prelude::*;

use crate::{BridgeError, Result};

/// 设置位置时坐标的含义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSpace {
    /// 世界像素坐标（不受卷动影响）
    #[default]
    World,
    /// 舞台坐标（当前卷动下看到的位置）
    Stage,
    /// 相对角色当前位置的偏移
    Relative,
}

impl FromStr for PositionSpace {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "world" => Ok(PositionSpace::World),
            "stage" => Ok(PositionSpace::Stage),
            "relative" => Ok(PositionSpace::Relative),
            other => Err(BridgeError::UnknownSpace(other.to_string())),
        }
    }
}

/// 坐标映射器
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    zoom: f64,
    scroll: DVec2,
}

impl CoordinateMapper {
    pub fn new(zoom: f64) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 50.0 };
        Self {
            zoom,
            scroll: DVec2::ZERO,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll(&self) -> DVec2 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: DVec2) {
        self.scroll = scroll;
    }

    pub fn change_scroll(&mut self, delta: DVec2) {
        self.scroll += delta;
    }

    /// 舞台坐标 → 世界坐标（含卷动）
    pub fn to_world(&self, stage: DVec2) -> DVec2 {
        (stage + self.scroll) / self.zoom
    }

    /// 世界坐标 → 舞台坐标（含卷动）
    pub fn to_stage(&self, world: DVec2) -> DVec2 {
        world * self.zoom - self.scroll
    }

    /// 世界像素坐标 → 世界坐标（不含卷动）
    pub fn unscrolled_to_world(&self, point: DVec2) -> DVec2 {
        point / self.zoom
    }

    /// 舞台方向（度）→ 世界角度（弧度）
    pub fn world_angle(direction: f64) -> f64 {
        (90.0 - direction).to_radians()
    }

    /// 世界角度（弧度）→ 舞台方向（度）
    pub fn stage_direction(angle: f64) -> f64 {
        90.0 - angle.to_degrees()
    }

    /// 刚体应使用的世界角度；锁定旋转的角色恒为 0（即方向 90）
    pub fn body_angle(direction: f64, rotation_locked: bool) -> f64 {
        if rotation_locked {
            0.0
        } else {
            Self::world_angle(direction)
        }
    }

    /// 舞台速度 → 世界速度
    ///
    /// `scale` 为舞台速度的时间基准（每秒多少个舞台刻）。
    pub fn velocity_to_world(&self, velocity: DVec2, scale: f64) -> DVec2 {
        velocity * (scale / self.zoom)
    }

    /// 世界速度 → 舞台速度
    pub fn velocity_to_stage(&self, velocity: DVec2, scale: f64) -> DVec2 {
        velocity * (self.zoom / scale)
    }
}

/// 将 glam DVec2 转换为 Rapier Vector
pub fn vec_to_rapier(v: DVec2) -> Vector<Real> {
    vector![v.x as Real, v.y as Real]
}

/// 将 glam DVec2 转换为 Rapier Point
pub fn point_to_rapier(v: DVec2) -> Point<Real> {
    point![v.x as Real, v.y as Real]
}

/// 将 Rapier Vector 转换为 glam DVec2
pub fn rapier_to_vec(v: &Vector<Real>) -> DVec2 {
    DVec2::new(v.x as f64, v.y as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < EPSILON * (1.0 + b.length())
    }

    #[test]
    fn test_round_trip() {
        let scrolls = [
            DVec2::ZERO,
            DVec2::new(120.0, -35.5),
            DVec2::new(-9999.0, 12345.25),
        ];
        let zooms = [1.0, 50.0, 0.37, 480.0];
        let points = [
            DVec2::ZERO,
            DVec2::new(240.0, -180.0),
            DVec2::new(-17.3, 99.9),
            DVec2::new(1.0e5, -3.0e4),
        ];
        for zoom in zooms {
            for scroll in scrolls {
                let mut mapper = CoordinateMapper::new(zoom);
                mapper.set_scroll(scroll);
                for p in points {
                    let back = mapper.to_stage(mapper.to_world(p));
                    assert!(approx(back, p), "zoom={zoom} scroll={scroll} p={p} back={back}");
                }
            }
        }
    }

    #[test]
    fn test_to_world_applies_scroll_then_zoom() {
        let mut mapper = CoordinateMapper::new(50.0);
        mapper.set_scroll(DVec2::new(50.0, -100.0));
        let world = mapper.to_world(DVec2::new(50.0, 0.0));
        assert!(approx(world, DVec2::new(2.0, -2.0)));
    }

    #[test]
    fn test_angle_convention() {
        assert!(CoordinateMapper::world_angle(90.0).abs() < EPSILON);
        assert!((CoordinateMapper::world_angle(0.0) - std::f64::consts::FRAC_PI_2).abs() < EPSILON);
        for dir in [-179.0, -90.0, 0.0, 45.0, 90.0, 180.0] {
            let back = CoordinateMapper::stage_direction(CoordinateMapper::world_angle(dir));
            assert!((back - dir).abs() < 1e-9);
        }
        assert_eq!(CoordinateMapper::body_angle(12.0, true), 0.0);
    }

    #[test]
    fn test_velocity_scale() {
        let mapper = CoordinateMapper::new(50.0);
        let world = mapper.velocity_to_world(DVec2::new(10.0, -5.0), 30.0);
        assert!(approx(world, DVec2::new(6.0, -3.0)));
        let stage = mapper.velocity_to_stage(world, 30.0);
        assert!(approx(stage, DVec2::new(10.0, -5.0)));
    }

    #[test]
    fn test_unscrolled_ignores_scroll() {
        let mut mapper = CoordinateMapper::new(50.0);
        mapper.set_scroll(DVec2::new(500.0, 500.0));
        assert!(approx(
            mapper.unscrolled_to_world(DVec2::new(100.0, -50.0)),
            DVec2::new(2.0, -1.0)
        ));
        assert_eq!("relative".parse::<PositionSpace>().unwrap(), PositionSpace::Relative);
        assert!("screen".parse::<PositionSpace>().is_err());
    }

    #[test]
    fn test_invalid_zoom_falls_back() {
        assert_eq!(CoordinateMapper::new(0.0).zoom(), 50.0);
        assert_eq!(CoordinateMapper::new(f64::NAN).zoom(), 50.0);
    }
}
