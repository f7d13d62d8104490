// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/frame.rs - 传感器原始帧定义
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

use std::ops::Deref;

use tracing::debug;

pub const RGB565_BYTES_PER_PIXEL: usize = 2;

/// RGB565 像素在缓冲区中的字节序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
  /// 高字节在前，摄像头 DMA 的常见输出
  #[default]
  Rgb565Be,
  Rgb565Le,
}

impl PixelFormat {
  pub fn decode(&self, bytes: [u8; 2]) -> u16 {
    match self {
      PixelFormat::Rgb565Be => u16::from_be_bytes(bytes),
      PixelFormat::Rgb565Le => u16::from_le_bytes(bytes),
    }
  }

  pub fn encode(&self, pixel: u16) -> [u8; 2] {
    match self {
      PixelFormat::Rgb565Be => pixel.to_be_bytes(),
      PixelFormat::Rgb565Le => pixel.to_le_bytes(),
    }
  }
}

/// 一帧传感器数据，缓冲区在 capture/release 之间由调用方持有
#[derive(Debug)]
pub struct Frame {
  pub width: usize,
  pub height: usize,
  pub format: PixelFormat,
  data: Box<[u8]>,
}

impl Frame {
  pub fn new(width: usize, height: usize, format: PixelFormat, data: Box<[u8]>) -> Self {
    Self {
      width,
      height,
      format,
      data,
    }
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn into_buffer(self) -> Box<[u8]> {
    self.data
  }
}

/// 帧来源
///
/// 每次成功的 `capture` 必须恰好对应一次 `release`。
pub trait FrameSource {
  type Error: std::error::Error + Send + Sync + 'static;

  fn capture(&mut self) -> Result<Frame, Self::Error>;
  fn release(&mut self, frame: Frame);
}

/// 持有一帧并在离开作用域时归还给来源
pub struct FrameGuard<'a, S: FrameSource> {
  source: &'a mut S,
  frame: Frame,
}

impl<'a, S: FrameSource> FrameGuard<'a, S> {
  pub fn capture(source: &'a mut S) -> Result<Self, S::Error> {
    let frame = source.capture()?;
    Ok(Self { source, frame })
  }
}

impl<S: FrameSource> Deref for FrameGuard<'_, S> {
  type Target = Frame;

  fn deref(&self) -> &Self::Target {
    &self.frame
  }
}

impl<S: FrameSource> Drop for FrameGuard<'_, S> {
  fn drop(&mut self) {
    // 空帧不占用堆内存
    let empty = Frame::new(0, 0, self.frame.format, Box::default());
    let frame = std::mem::replace(&mut self.frame, empty);
    debug!("归还帧缓冲区 {}x{}", frame.width, frame.height);
    self.source.release(frame);
  }
}

/// 固定数量的帧缓冲区，模拟摄像头驱动的 fb_count
#[derive(Debug)]
pub struct FramePool {
  buffer_len: usize,
  capacity: usize,
  free: Vec<Box<[u8]>>,
  outstanding: usize,
}

impl FramePool {
  pub fn new(buffer_len: usize, capacity: usize) -> Self {
    Self {
      buffer_len,
      capacity,
      free: Vec::with_capacity(capacity),
      outstanding: 0,
    }
  }

  /// 取出一个缓冲区，全部在外时返回 None
  pub fn acquire(&mut self) -> Option<Box<[u8]>> {
    if self.outstanding >= self.capacity {
      return None;
    }
    self.outstanding += 1;
    Some(
      self
        .free
        .pop()
        .unwrap_or_else(|| vec![0u8; self.buffer_len].into_boxed_slice()),
    )
  }

  pub fn give_back(&mut self, buffer: Box<[u8]>) {
    self.outstanding = self.outstanding.saturating_sub(1);
    if buffer.len() == self.buffer_len && self.free.len() < self.capacity {
      self.free.push(buffer);
    }
  }

  pub fn outstanding(&self) -> usize {
    self.outstanding
  }
}
