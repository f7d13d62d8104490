// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/preprocess.rs - 图像到张量的预处理
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

//! 每个阶段都只读取上一阶段的图像并分配新的输出图像。

mod color;
mod quantize;
mod resize;

pub use self::color::{expand_rgb565, pack_rgb565, rgb565_to_rgb888};
pub use self::quantize::{QuantizationRange, quantize};
pub use self::resize::resize_bilinear;
