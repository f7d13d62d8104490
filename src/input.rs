// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/input.rs - 帧来源
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

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Frame, FramePool, FrameSource, PixelFormat},
};

#[cfg(feature = "read_image_file")]
mod image_file;
#[cfg(feature = "read_image_file")]
pub use self::image_file::{ImageFileInput, ImageFileInputError};

mod pattern;
pub use self::pattern::{PatternInput, PatternInputError};

/// 默认帧缓冲区数量，与摄像头驱动的双缓冲一致
pub const DEFAULT_FB_COUNT: usize = 2;

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("图像文件输入错误: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("测试图案输入错误: {0}")]
  PatternInputError(#[from] PatternInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ImageFile(ImageFileInput),
  Pattern(PatternInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "read_image_file")]
      ImageFileInput::SCHEME => Ok(InputWrapper::ImageFile(ImageFileInput::from_url(url)?)),
      PatternInput::SCHEME => Ok(InputWrapper::Pattern(PatternInput::from_url(url)?)),
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl FrameSource for InputWrapper {
  type Error = InputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ImageFile(input) => input.capture().map_err(InputError::from),
      InputWrapper::Pattern(input) => input.capture().map_err(InputError::from),
    }
  }

  fn release(&mut self, frame: Frame) {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ImageFile(input) => input.release(frame),
      InputWrapper::Pattern(input) => input.release(frame),
    }
  }
}

/// 同一幅静态画面的重复采集，每次从缓冲池取出一块拷贝
#[derive(Debug)]
struct StillFrames {
  width: usize,
  height: usize,
  format: PixelFormat,
  template: Box<[u8]>,
  pool: FramePool,
}

impl StillFrames {
  fn new(width: usize, height: usize, format: PixelFormat, pixels: &[u16], fb_count: usize) -> Self {
    let template: Box<[u8]> = pixels.iter().flat_map(|p| format.encode(*p)).collect();
    let pool = FramePool::new(template.len(), fb_count);
    Self {
      width,
      height,
      format,
      template,
      pool,
    }
  }

  /// 缓冲区全部在外时返回 None
  fn capture(&mut self) -> Option<Frame> {
    let mut buffer = self.pool.acquire()?;
    buffer.copy_from_slice(&self.template);
    Some(Frame::new(self.width, self.height, self.format, buffer))
  }

  fn release(&mut self, frame: Frame) {
    self.pool.give_back(frame.into_buffer());
  }
}

/// 公共的查询参数: `order=be|le` 与 `fb_count=N`
#[derive(Debug, Clone, Copy)]
struct SourceOptions {
  format: PixelFormat,
  fb_count: usize,
}

impl SourceOptions {
  fn from_url(url: &Url) -> Result<Self, String> {
    let format = match query_param::<String>(url, "order")?.as_deref() {
      None | Some("be") => PixelFormat::Rgb565Be,
      Some("le") => PixelFormat::Rgb565Le,
      Some(other) => return Err(format!("未知字节序: {}", other)),
    };
    let fb_count = query_param::<usize>(url, "fb_count")?.unwrap_or(DEFAULT_FB_COUNT);
    if fb_count == 0 {
      return Err("fb_count 不能为 0".to_string());
    }

    Ok(Self { format, fb_count })
  }
}

fn query_param<T: FromStr>(url: &Url, key: &str) -> Result<Option<T>, String> {
  match url.query_pairs().find(|(k, _)| k == key) {
    Some((_, value)) => value
      .parse::<T>()
      .map(Some)
      .map_err(|_| format!("参数 {} 的值无效: {}", key, value)),
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_still_frames_share_a_bounded_pool() {
    let mut frames = StillFrames::new(2, 1, PixelFormat::Rgb565Be, &[0xF800, 0x001F], 2);
    let a = frames.capture().unwrap();
    let b = frames.capture().unwrap();
    assert_eq!(a.data(), &[0xF8, 0x00, 0x00, 0x1F]);
    assert!(frames.capture().is_none());

    frames.release(a);
    frames.release(b);
    assert!(frames.capture().is_some());
  }

  #[test]
  fn test_source_options() {
    let url = Url::parse("pattern://solid?order=le&fb_count=3").unwrap();
    let options = SourceOptions::from_url(&url).unwrap();
    assert_eq!(options.format, PixelFormat::Rgb565Le);
    assert_eq!(options.fb_count, 3);

    let url = Url::parse("pattern://solid").unwrap();
    let options = SourceOptions::from_url(&url).unwrap();
    assert_eq!(options.format, PixelFormat::Rgb565Be);
    assert_eq!(options.fb_count, DEFAULT_FB_COUNT);

    let url = Url::parse("pattern://solid?order=middle").unwrap();
    assert!(SourceOptions::from_url(&url).is_err());
    let url = Url::parse("pattern://solid?fb_count=0").unwrap();
    assert!(SourceOptions::from_url(&url).is_err());
  }

  #[test]
  fn test_unknown_scheme() {
    let url = Url::parse("v4l2:///dev/video0").unwrap();
    assert!(matches!(
      InputWrapper::from_url(&url),
      Err(InputError::SchemeMismatch)
    ));
  }
}
