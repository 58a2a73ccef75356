//! 积木参数的宽松类型值
//!
//! 积木调度方传进来的参数可能是数字、字符串或布尔值，
//! 桥接层在使用前统一转换，转换失败时回退到确定的默认值而不是报错。

use std::fmt;

/// 积木参数 / 返回值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// 转为数字
    ///
    /// - 非数字字符串、空串、NaN → 0
    /// - 布尔值 → 0 / 1
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => {
                if n.is_nan() {
                    0.0
                } else {
                    *n
                }
            }
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return 0.0;
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|n| !n.is_nan())
                    .unwrap_or(0.0)
            }
        }
    }

    /// 转为字符串（菜单类参数用）
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// 空字符串，查询类操作的中性返回值
    pub fn empty() -> Self {
        Value::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
