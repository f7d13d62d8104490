// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/input/image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use super::{SourceOptions, StillFrames};
use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Frame, FrameSource},
  preprocess::pack_rgb565,
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
  #[error("帧缓冲区已全部占用")]
  BuffersExhausted,
}

/// 把一张图片当作传感器画面，每次采集都得到它的 RGB565 编码
pub struct ImageFileInput {
  frames: StillFrames,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let options = SourceOptions::from_url(url).map_err(ImageFileInputError::InvalidParameter)?;
    let path = url.path();
    let image: RgbImage = ImageReader::open(path)?.decode()?.into();
    let (width, height) = (image.width() as usize, image.height() as usize);
    info!("图像文件已加载: {} ({}x{})", path, width, height);

    let pixels: Vec<u16> = image
      .pixels()
      .map(|p| pack_rgb565(p[0], p[1], p[2]))
      .collect();

    Ok(Self {
      frames: StillFrames::new(width, height, options.format, &pixels, options.fb_count),
    })
  }
}

impl FrameSource for ImageFileInput {
  type Error = ImageFileInputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    self
      .frames
      .capture()
      .ok_or(ImageFileInputError::BuffersExhausted)
  }

  fn release(&mut self, frame: Frame) {
    self.frames.release(frame);
  }
}
