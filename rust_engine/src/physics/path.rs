//! SVG 路径数据的极简解析
//!
//! 只支持绝对坐标的 `M`（移动）、`L`（直线）、`Z`（闭合）三种命令，
//! 曲线等其他命令直接跳过。每个 `M` 开启一条新轮廓。

use glam::DVec2;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::cast::Value;

/// 路径解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("command '{command}' at token {index} is missing a coordinate")]
    MissingCoordinate { command: char, index: usize },

    #[error("command '{command}' at token {index} has no current contour")]
    NoCurrentContour { command: char, index: usize },
}

/// 一条轮廓（艺术空间坐标）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

/// 解析一段 `d` 属性
///
/// 坐标按积木参数的规则宽松转换（非数字 → 0），
/// 但坐标个数不足或在 `M` 之前出现 `L`/`Z` 时报错。
pub fn parse_path(d: &str) -> Result<Vec<Contour>, PathError> {
    let tokens: Vec<&str> = d
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    let mut contours: Vec<Contour> = Vec::new();
    let mut current: Option<Contour> = None;
    // 最近一次 M 的起点，Z 之后的 L 从这里继续
    let mut start: Option<DVec2> = None;

    let mut i = 0;
    while i < tokens.len() {
        let index = i;
        let token = tokens[i];
        i += 1;

        match token {
            "M" | "L" => {
                let command = if token == "M" { 'M' } else { 'L' };
                if i + 2 > tokens.len() {
                    return Err(PathError::MissingCoordinate { command, index });
                }
                let x = Value::from(tokens[i]).to_number();
                let y = Value::from(tokens[i + 1]).to_number();
                i += 2;
                let point = DVec2::new(x, y);

                if command == 'M' {
                    if let Some(done) = current.take() {
                        contours.push(done);
                    }
                    start = Some(point);
                    current = Some(Contour {
                        points: vec![point],
                        closed: false,
                    });
                } else {
                    match current.as_mut() {
                        Some(contour) => contour.points.push(point),
                        None => {
                            let origin = start.ok_or(PathError::NoCurrentContour {
                                command: 'L',
                                index,
                            })?;
                            current = Some(Contour {
                                points: vec![origin, point],
                                closed: false,
                            });
                        }
                    }
                }
            }
            "Z" => {
                let mut contour = current.take().ok_or(PathError::NoCurrentContour {
                    command: 'Z',
                    index,
                })?;
                contour.closed = true;
                contours.push(contour);
            }
            _ => {}
        }
    }

    if let Some(done) = current.take() {
        contours.push(done);
    }

    Ok(contours)
}

static PATH_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<path\b[^>]*?\sd\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("path regex is valid")
});

/// 从 SVG 源码中取出所有 `<path>` 元素的 `d` 属性
pub fn svg_path_data(svg: &str) -> Vec<&str> {
    PATH_DATA
        .captures_iter(svg)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}
