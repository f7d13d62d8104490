// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/preprocess/quantize.rs - 仿射量化到 int8
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

use std::str::FromStr;

use crate::{config::ConfigError, image::Image};

/// 输入区间到输出区间的仿射映射
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationRange {
  input_min: f32,
  input_max: f32,
  output_min: f32,
  output_max: f32,
}

impl QuantizationRange {
  pub fn new(
    input_min: f32,
    input_max: f32,
    output_min: f32,
    output_max: f32,
  ) -> Result<Self, ConfigError> {
    let all_finite = [input_min, input_max, output_min, output_max]
      .iter()
      .all(|v| v.is_finite());
    if !all_finite || input_max <= input_min || output_max <= output_min {
      return Err(ConfigError::QuantizationRange(format!(
        "({}, {}) -> ({}, {})",
        input_min, input_max, output_min, output_max
      )));
    }

    Ok(Self {
      input_min,
      input_max,
      output_min,
      output_max,
    })
  }

  pub fn input(&self) -> (f32, f32) {
    (self.input_min, self.input_max)
  }

  pub fn output(&self) -> (f32, f32) {
    (self.output_min, self.output_max)
  }

  /// 量化单个样本: 仿射映射，四舍五入（远离零），再饱和
  pub fn apply(&self, sample: f32) -> i8 {
    let (in_min, in_max) = (self.input_min as f64, self.input_max as f64);
    let (out_min, out_max) = (self.output_min as f64, self.output_max as f64);

    let mapped = out_min + (sample as f64 - in_min) * (out_max - out_min) / (in_max - in_min);
    mapped
      .round()
      .clamp(out_min.round(), out_max.round())
      .clamp(i8::MIN as f64, i8::MAX as f64) as i8
  }

  /// 字节输入只有 256 种取值，预先算好查找表
  fn table(&self) -> [i8; 256] {
    let mut table = [0i8; 256];
    for (value, slot) in table.iter_mut().enumerate() {
      *slot = self.apply(value as f32);
    }
    table
  }
}

impl Default for QuantizationRange {
  fn default() -> Self {
    Self {
      input_min: 0.0,
      input_max: 255.0,
      output_min: -128.0,
      output_max: 127.0,
    }
  }
}

impl FromStr for QuantizationRange {
  type Err = ConfigError;

  /// 格式: `input_min,input_max,output_min,output_max`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let values = s
      .split(',')
      .map(|v| v.trim().parse::<f32>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| ConfigError::QuantizationRange(format!("{}: {}", s, e)))?;

    match values.as_slice() {
      &[input_min, input_max, output_min, output_max] => {
        Self::new(input_min, input_max, output_min, output_max)
      }
      _ => Err(ConfigError::QuantizationRange(format!(
        "需要 4 个数值, 实际为 {}",
        values.len()
      ))),
    }
  }
}

pub fn quantize(src: &Image<u8>, range: &QuantizationRange) -> Image<i8> {
  let table = range.table();
  src.map(|&sample| table[sample as usize])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_range_endpoints() {
    let range = QuantizationRange::default();
    assert_eq!(range.apply(0.0), -128);
    assert_eq!(range.apply(255.0), 127);
    assert_eq!(range.apply(128.0), 0);
  }

  #[test]
  fn test_endpoints_and_monotonic_for_several_ranges() {
    let ranges = [
      (0.0, 255.0, -128.0, 127.0),
      (16.0, 235.0, -100.0, 100.0),
      (0.0, 255.0, -1.0, 1.0),
      (50.0, 60.0, -128.0, 127.0),
      (0.0, 255.0, 0.4, 126.6),
    ];

    for (in_min, in_max, out_min, out_max) in ranges {
      let range = QuantizationRange::new(in_min, in_max, out_min, out_max).unwrap();
      let lo = (out_min as f64).round() as i8;
      let hi = (out_max as f64).round() as i8;
      assert_eq!(range.apply(in_min), lo);
      assert_eq!(range.apply(in_max), hi);

      let table = range.table();
      for pair in table.windows(2) {
        assert!(pair[0] <= pair[1]);
      }
      assert!(table.iter().all(|v| (lo..=hi).contains(v)));
    }
  }

  #[test]
  fn test_rounds_half_away_from_zero() {
    // 0..255 -> 0..127.5: 样本 1 映射到 0.5
    let range = QuantizationRange::new(0.0, 255.0, 0.0, 127.5).unwrap();
    assert_eq!(range.apply(1.0), 1);
    // 0..255 -> -127.5..0: 样本 254 映射到 -0.5
    let range = QuantizationRange::new(0.0, 255.0, -127.5, 0.0).unwrap();
    assert_eq!(range.apply(254.0), -1);
  }

  #[test]
  fn test_saturates_instead_of_wrapping() {
    let range = QuantizationRange::new(0.0, 255.0, -1000.0, 1000.0).unwrap();
    assert_eq!(range.apply(0.0), -128);
    assert_eq!(range.apply(255.0), 127);
    assert_eq!(range.apply(127.0), -4);
  }

  #[test]
  fn test_quantize_image() {
    let src = Image::from_vec(1, 1, 3, vec![0, 128, 255]).unwrap();
    let dst = quantize(&src, &QuantizationRange::default());
    assert_eq!(dst.as_slice(), &[-128, 0, 127]);
  }

  #[test]
  fn test_parse_and_reject_invalid_ranges() {
    let range: QuantizationRange = "0, 255, -128, 127".parse().unwrap();
    assert_eq!(range, QuantizationRange::default());

    assert!("0,255,-128".parse::<QuantizationRange>().is_err());
    assert!("255,0,-128,127".parse::<QuantizationRange>().is_err());
    assert!("0,255,127,127".parse::<QuantizationRange>().is_err());
    assert!("0,abc,-128,127".parse::<QuantizationRange>().is_err());
  }
}
