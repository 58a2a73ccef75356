//! 从角色造型提取物理形状
//!
//! 形状只在赋予时按角色当前的缩放和旋转中心计算一次，
//! 之后造型变化不会自动同步，需要调用方重新赋予。

use std::str::FromStr;

use glam::DVec2;
use rapier2d::prelude::*;

use super::coords::point_to_rapier;
use super::path::{parse_path, svg_path_data};
use crate::scene::Target;
use crate::{BridgeError, Result};

/// 形状来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// 当前造型的凸包
    Costume,
    /// 近似圆
    Circle,
    /// 矢量造型的路径轮廓（可组合成凹形）
    SvgPolygon,
    /// 所有尚未启用物理的角色，使用造型凸包
    All,
}

impl FromStr for ShapeKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "costume" => Ok(ShapeKind::Costume),
            "circle" => Ok(ShapeKind::Circle),
            "svg" => Ok(ShapeKind::SvgPolygon),
            "all" => Ok(ShapeKind::All),
            other => Err(BridgeError::UnknownShape(other.to_string())),
        }
    }
}

/// 材质
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub density: Real,
    pub friction: Real,
    pub restitution: Real,
}

/// 世界单位下的形状描述
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    /// 单个凸多边形
    Polygon(Vec<Point<Real>>),
    /// 圆（半径）
    Circle(Real),
    /// 多个凸多边形，每个对应同一刚体上的一个碰撞体
    Compound(Vec<Vec<Point<Real>>>),
}

impl ShapeDescriptor {
    /// 按来源提取形状；`All` 由调用方展开成逐个角色的 `Costume`
    pub fn extract(kind: ShapeKind, target: &Target, zoom: f64) -> Result<Self> {
        match kind {
            ShapeKind::Costume | ShapeKind::All => Self::from_costume_hull(target, zoom),
            ShapeKind::Circle => Self::circle(target, zoom),
            ShapeKind::SvgPolygon => Self::from_vector_source(target, zoom),
        }
    }

    /// 造型凸包
    ///
    /// 凸包点减去旋转中心，乘以缩放，Y 轴翻转（皮肤空间 Y 向下），再除以 zoom。
    pub fn from_costume_hull(target: &Target, zoom: f64) -> Result<Self> {
        let scale = hull_scale(target);
        let offset = target.costume.rotation_center;
        let raw: Vec<DVec2> = target
            .costume
            .hull_points
            .iter()
            .map(|p| (*p - offset) * scale)
            .collect();

        let vertices = dedup_vertices(raw.iter().rev().copied(), zoom);
        if !is_valid_polygon(&vertices) {
            return Err(BridgeError::DegenerateShape);
        }
        Ok(ShapeDescriptor::Polygon(vertices))
    }

    /// 近似圆：半径 = (宽·|sx| + 高·|sy|) / 4
    pub fn circle(target: &Target, zoom: f64) -> Result<Self> {
        let scale = hull_scale(target);
        let size = target.costume.skin_size;
        let radius = (size.x * scale.x.abs() + size.y * scale.y.abs()) / 4.0 / zoom;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(BridgeError::DegenerateShape);
        }
        Ok(ShapeDescriptor::Circle(radius as Real))
    }

    /// 矢量造型：每条路径轮廓成为一个碰撞体
    pub fn from_vector_source(target: &Target, zoom: f64) -> Result<Self> {
        let svg = target
            .costume
            .vector_source
            .as_deref()
            .ok_or(BridgeError::MissingVectorSource(target.id))?;

        let scale = hull_scale(target);
        let offset = target.costume.rotation_center;
        let mut parts = Vec::new();

        for data in svg_path_data(svg) {
            let contours = match parse_path(data) {
                Ok(contours) => contours,
                Err(e) => {
                    log::debug!("[形状] 跳过无法解析的路径: {}", e);
                    continue;
                }
            };
            for contour in contours {
                let points = contour.points.iter().map(|p| (*p - offset) * scale);
                let vertices = dedup_vertices(points, zoom);
                if is_valid_polygon(&vertices) {
                    parts.push(vertices);
                }
            }
        }

        match parts.len() {
            0 => Err(BridgeError::DegenerateShape),
            1 => Ok(ShapeDescriptor::Polygon(parts.remove(0))),
            _ => Ok(ShapeDescriptor::Compound(parts)),
        }
    }

    /// 碰撞体个数
    pub fn fixture_count(&self) -> usize {
        match self {
            ShapeDescriptor::Polygon(_) | ShapeDescriptor::Circle(_) => 1,
            ShapeDescriptor::Compound(parts) => parts.len(),
        }
    }

    /// 创建 Rapier 碰撞体（顺序即碰撞体顺序，第一个是主碰撞体）
    pub fn build_colliders(&self, material: Material) -> Vec<Collider> {
        let shapes: Vec<SharedShape> = match self {
            ShapeDescriptor::Circle(radius) => vec![SharedShape::ball(*radius)],
            ShapeDescriptor::Polygon(vertices) => {
                SharedShape::convex_hull(vertices).into_iter().collect()
            }
            ShapeDescriptor::Compound(parts) => parts
                .iter()
                .filter_map(|vertices| SharedShape::convex_hull(vertices))
                .collect(),
        };

        shapes
            .into_iter()
            .map(|shape| {
                ColliderBuilder::new(shape)
                    .density(material.density)
                    .friction(material.friction)
                    .restitution(material.restitution)
                    .build()
            })
            .collect()
    }
}

/// 凸包空间的缩放（Y 翻转）
fn hull_scale(target: &Target) -> DVec2 {
    DVec2::new(target.scale.x / 100.0, target.scale.y / -100.0)
}

/// 转到世界单位并丢弃与前一点重合的点
fn dedup_vertices(points: impl Iterator<Item = DVec2>, zoom: f64) -> Vec<Point<Real>> {
    let mut vertices: Vec<Point<Real>> = Vec::new();
    let mut prev: Option<DVec2> = None;
    for p in points {
        let world = p / zoom;
        let distinct = match prev {
            Some(q) => (world - q).length_squared() > f64::MIN_POSITIVE,
            None => true,
        };
        if distinct && world.is_finite() {
            vertices.push(point_to_rapier(world));
        }
        prev = Some(world);
    }
    // 首尾重合（闭合轮廓）
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

fn is_valid_polygon(vertices: &[Point<Real>]) -> bool {
    vertices.len() >= 3 && SharedShape::convex_hull(vertices).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Costume, TargetId};

    fn square_target() -> Target {
        Target::new(TargetId(1), "box").with_costume(Costume {
            hull_points: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(100.0, 100.0),
                DVec2::new(0.0, 100.0),
            ],
            skin_size: DVec2::new(100.0, 100.0),
            rotation_center: DVec2::new(50.0, 50.0),
            vector_source: None,
        })
    }

    #[test]
    fn test_shape_kind_from_str() {
        assert_eq!("costume".parse::<ShapeKind>().unwrap(), ShapeKind::Costume);
        assert_eq!("svg".parse::<ShapeKind>().unwrap(), ShapeKind::SvgPolygon);
        assert!("triangle".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_costume_hull_centered_and_flipped() {
        let target = square_target();
        let shape = ShapeDescriptor::from_costume_hull(&target, 50.0).unwrap();
        let ShapeDescriptor::Polygon(vertices) = shape else {
            panic!("expected polygon");
        };
        // 重复点被丢弃
        assert_eq!(vertices.len(), 4);
        // 最后一个凸包点 (0,100) 在 Y 翻转后成为第一个顶点 (-1, -1)
        assert!((vertices[0].x + 1.0).abs() < 1e-6);
        assert!((vertices[0].y + 1.0).abs() < 1e-6);
        for v in &vertices {
            assert!((v.x.abs() - 1.0).abs() < 1e-6);
            assert!((v.y.abs() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_costume_hull_degenerate() {
        let mut target = square_target();
        target.costume.hull_points = vec![DVec2::new(1.0, 1.0), DVec2::new(1.0, 1.0)];
        assert!(matches!(
            ShapeDescriptor::from_costume_hull(&target, 50.0),
            Err(BridgeError::DegenerateShape)
        ));
    }

    #[test]
    fn test_circle_radius() {
        let mut target = square_target();
        target.scale = DVec2::new(200.0, -100.0);
        let shape = ShapeDescriptor::circle(&target, 50.0).unwrap();
        // (100*2 + 100*1) / 4 / 50 = 1.5
        assert_eq!(shape, ShapeDescriptor::Circle(1.5));
    }

    #[test]
    fn test_vector_source_missing_is_error() {
        let target = square_target();
        assert!(matches!(
            ShapeDescriptor::from_vector_source(&target, 50.0),
            Err(BridgeError::MissingVectorSource(_))
        ));
    }

    #[test]
    fn test_vector_source_compound() {
        let mut target = square_target();
        target.costume.rotation_center = DVec2::ZERO;
        target.costume.vector_source = Some(
            r#"<svg><path d="M 0 0 L 50 0 L 50 50 Z"/><path d="M 100 0 L 150 0 L 150 50 Z M 1 1 L 2 2"/></svg>"#
                .to_string(),
        );
        let shape = ShapeDescriptor::from_vector_source(&target, 50.0).unwrap();
        // 第二条路径里只有两点的轮廓被丢弃
        assert_eq!(shape.fixture_count(), 2);
        let colliders = shape.build_colliders(Material {
            density: 1.0,
            friction: 0.5,
            restitution: 0.2,
        });
        assert_eq!(colliders.len(), 2);
        assert_eq!(colliders[0].friction(), 0.5);
    }

    #[test]
    fn test_vector_source_without_usable_paths() {
        let mut target = square_target();
        target.costume.vector_source = Some("<svg><rect/></svg>".to_string());
        assert!(ShapeDescriptor::from_vector_source(&target, 50.0).is_err());
    }
}
