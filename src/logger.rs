// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/logger.rs - 日志初始化
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

use tracing_subscriber::{
  EnvFilter,
  fmt::{self, format::FmtSpan},
  prelude::*,
};

/// 未设置 `RUST_LOG` 时的日志级别
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 只能调用一次，通常在 `main` 开头
pub fn init() {
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

  let is_debug = env_filter.to_string().contains("debug");

  let fmt_layer = fmt::layer()
    .with_target(false)
    .with_timer(fmt::time::uptime())
    .with_span_events(if is_debug {
      FmtSpan::CLOSE
    } else {
      FmtSpan::NONE
    });

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt_layer)
    .init();
}
