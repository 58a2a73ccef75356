//! 物理桥配置
//!
//! 所有参数扁平化，构造桥接实例时传入；缩放（zoom）在实例生命周期内固定。

use super::boundary::StagePreset;

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    // ========== 坐标 ==========
    /// 每个世界单位对应的舞台像素，默认 50
    pub zoom: f64,

    // ========== 模拟参数 ==========
    /// 每次步进推进的秒数，默认 1/30
    pub step_seconds: f32,
    /// 速度求解迭代次数，默认 10
    pub velocity_iterations: usize,
    /// 位置修正迭代次数，默认 10
    pub position_iterations: usize,

    // ========== 重力 ==========
    /// 默认重力 X 分量（世界单位/秒²）
    pub gravity_x: f32,
    /// 默认重力 Y 分量（负数向下），默认 -10
    pub gravity_y: f32,

    // ========== 新建刚体的材质 ==========
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,

    // ========== 速度换算 ==========
    /// 舞台速度的时间基准：舞台速度按“每 1/30 秒的像素”计，默认 30
    pub velocity_scale: f64,

    // ========== 弹簧默认值 ==========
    /// 弹簧静止长度（舞台像素），默认 100
    pub spring_length: f64,
    /// 弹簧阻尼比，默认 0.7
    pub spring_damping: f64,
    /// 弹簧频率（Hz），默认 5
    pub spring_frequency: f64,

    // ========== 拖拽关节 ==========
    /// 最大拖拽力 = 此值 × 被拖刚体质量，默认 300
    pub drag_force_factor: f32,
    /// 拖拽弹簧频率（Hz），默认 5
    pub drag_frequency: f32,
    /// 拖拽阻尼比，默认 0.7
    pub drag_damping: f32,

    // ========== 舞台 ==========
    /// 构造与重置后使用的舞台边界
    pub stage_preset: StagePreset,

    // ========== 调试 ==========
    /// 是否输出物理调试日志，默认 false
    pub debug_log: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            zoom: 50.0,

            // 固定步长，与调用频率无关
            step_seconds: 1.0 / 30.0,
            velocity_iterations: 10,
            position_iterations: 10,

            gravity_x: 0.0,
            gravity_y: -10.0,

            density: 1.0,
            friction: 0.5,
            restitution: 0.2,

            velocity_scale: 30.0,

            spring_length: 100.0,
            spring_damping: 0.7,
            spring_frequency: 5.0,

            drag_force_factor: 300.0,
            drag_frequency: 5.0,
            drag_damping: 0.7,

            stage_preset: StagePreset::Boxed,

            debug_log: false,
        }
    }
}
