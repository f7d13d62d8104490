// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/input/pattern.rs - 合成测试图案输入
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

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use super::{SourceOptions, StillFrames, query_param};
use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Frame, FrameSource, RGB565_BYTES_PER_PIXEL},
  image::sample_count,
  preprocess::pack_rgb565,
};

const PATTERN_DEFAULT_WIDTH: usize = 240;
const PATTERN_DEFAULT_HEIGHT: usize = 240;
const PATTERN_DEFAULT_VALUE: u16 = 0x8410;

#[derive(Error, Debug)]
pub enum PatternInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("未知图案: {0}")]
  UnknownPattern(String),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
  #[error("帧缓冲区已全部占用")]
  BuffersExhausted,
}

/// `pattern://solid?width=W&height=H&value=0x8410` 或 `pattern://gradient?width=W&height=H`
pub struct PatternInput {
  frames: StillFrames,
}

impl FromUrlWithScheme for PatternInput {
  const SCHEME: &'static str = "pattern";
}

impl FromUrl for PatternInput {
  type Error = PatternInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(PatternInputError::SchemeMismatch);
    }

    let options = SourceOptions::from_url(url).map_err(PatternInputError::InvalidParameter)?;
    let width = query_param::<usize>(url, "width")
      .map_err(PatternInputError::InvalidParameter)?
      .unwrap_or(PATTERN_DEFAULT_WIDTH);
    let height = query_param::<usize>(url, "height")
      .map_err(PatternInputError::InvalidParameter)?
      .unwrap_or(PATTERN_DEFAULT_HEIGHT);
    if width == 0 || height == 0 || sample_count(width, height, RGB565_BYTES_PER_PIXEL).is_none() {
      return Err(PatternInputError::InvalidParameter(format!(
        "图案尺寸无效: {}x{}",
        width, height
      )));
    }

    let kind = url.host_str().unwrap_or("solid");
    let pixels = match kind {
      "solid" => {
        let value = match url.query_pairs().find(|(k, _)| k == "value") {
          Some((_, v)) => parse_pixel(&v)?,
          None => PATTERN_DEFAULT_VALUE,
        };
        vec![value; width * height]
      }
      "gradient" => gradient(width, height),
      other => return Err(PatternInputError::UnknownPattern(other.to_string())),
    };

    info!("测试图案 {} 已生成: {}x{}", kind, width, height);
    Ok(Self {
      frames: StillFrames::new(width, height, options.format, &pixels, options.fb_count),
    })
  }
}

impl FrameSource for PatternInput {
  type Error = PatternInputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    self.frames.capture().ok_or(PatternInputError::BuffersExhausted)
  }

  fn release(&mut self, frame: Frame) {
    self.frames.release(frame);
  }
}

/// 支持十进制或 `0x` 前缀的十六进制
fn parse_pixel(value: &str) -> Result<u16, PatternInputError> {
  let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
    Some(hex) => u16::from_str_radix(hex, 16),
    None => value.parse::<u16>(),
  };
  parsed.map_err(|_| PatternInputError::InvalidParameter(format!("像素值无效: {}", value)))
}

/// 红色沿水平方向、蓝色沿垂直方向递增，绿色固定为中值
fn gradient(width: usize, height: usize) -> Vec<u16> {
  let ramp = |i: usize, len: usize| {
    if len > 1 {
      (i * 255 / (len - 1)) as u8
    } else {
      0
    }
  };

  (0..height)
    .flat_map(|y| (0..width).map(move |x| pack_rgb565(ramp(x, width), 128, ramp(y, height))))
    .collect()
}
