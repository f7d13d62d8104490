// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/decode/calibration.rs - 定点得分到置信度的映射
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{fmt, str::FromStr};

use crate::config::ConfigError;

/// 把模型输出的原始 int8 得分映射为置信度
///
/// 不同模型的量化标定不同，映射应来自模型元数据。
pub trait Calibration {
  fn confidence(&self, raw: i8) -> f32;
}

impl<F: Fn(i8) -> f32> Calibration for F {
  fn confidence(&self, raw: i8) -> f32 {
    self(raw)
  }
}

/// 命令行可选的内置映射
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScoreMap {
  /// `(raw + 128) / 255`
  #[default]
  Offset,
  /// `(raw - zero_point) * scale`
  Dequantize { scale: f32, zero_point: i32 },
  /// `sigmoid((raw - zero_point) * scale)`
  Sigmoid { scale: f32, zero_point: i32 },
}

impl ScoreMap {
  pub fn validate(&self) -> Result<(), ConfigError> {
    match self {
      ScoreMap::Offset => Ok(()),
      ScoreMap::Dequantize { scale, .. } | ScoreMap::Sigmoid { scale, .. } => {
        if scale.is_finite() && *scale > 0.0 {
          Ok(())
        } else {
          Err(ConfigError::Calibration(format!("scale 必须为正数: {}", scale)))
        }
      }
    }
  }
}

impl Calibration for ScoreMap {
  fn confidence(&self, raw: i8) -> f32 {
    match *self {
      ScoreMap::Offset => (raw as f32 + 128.0) / 255.0,
      ScoreMap::Dequantize { scale, zero_point } => (raw as i32 - zero_point) as f32 * scale,
      ScoreMap::Sigmoid { scale, zero_point } => {
        let logit = (raw as i32 - zero_point) as f32 * scale;
        1.0 / (1.0 + (-logit).exp())
      }
    }
  }
}

impl fmt::Display for ScoreMap {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ScoreMap::Offset => write!(f, "offset"),
      ScoreMap::Dequantize { scale, zero_point } => write!(f, "dequant:{},{}", scale, zero_point),
      ScoreMap::Sigmoid { scale, zero_point } => write!(f, "sigmoid:{},{}", scale, zero_point),
    }
  }
}

impl FromStr for ScoreMap {
  type Err = ConfigError;

  /// 格式: `offset` | `dequant:<scale>,<zero_point>` | `sigmoid:<scale>,<zero_point>`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ConfigError::Calibration(s.to_string());

    let (kind, params) = match s.split_once(':') {
      Some((kind, params)) => (kind.trim(), Some(params)),
      None => (s.trim(), None),
    };

    let parse_params = |params: Option<&str>| -> Result<(f32, i32), ConfigError> {
      let (scale, zero_point) = params.and_then(|p| p.split_once(',')).ok_or_else(invalid)?;
      let scale = scale.trim().parse::<f32>().map_err(|_| invalid())?;
      let zero_point = zero_point.trim().parse::<i32>().map_err(|_| invalid())?;
      Ok((scale, zero_point))
    };

    let map = match kind {
      "offset" if params.is_none() => ScoreMap::Offset,
      "dequant" => {
        let (scale, zero_point) = parse_params(params)?;
        ScoreMap::Dequantize { scale, zero_point }
      }
      "sigmoid" => {
        let (scale, zero_point) = parse_params(params)?;
        ScoreMap::Sigmoid { scale, zero_point }
      }
      _ => return Err(invalid()),
    };

    map.validate()?;
    Ok(map)
  }
}
