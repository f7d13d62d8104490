// 该文件是 Shanan Tiny （山南西风·微） 项目的一部分。
// src/pipeline/ledger.rs - 中间图像的分配记录
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

use std::{cell::Cell, ops::Deref, rc::Rc};

/// 统计流水线分配和释放的中间图像数量
#[derive(Debug, Default)]
pub struct AllocationLedger {
  allocated: Cell<u64>,
  released: Cell<u64>,
}

impl AllocationLedger {
  pub fn track<T>(self: &Rc<Self>, value: T) -> Tracked<T> {
    self.allocated.set(self.allocated.get() + 1);
    Tracked {
      value,
      ledger: Rc::clone(self),
    }
  }

  pub fn allocated(&self) -> u64 {
    self.allocated.get()
  }

  pub fn released(&self) -> u64 {
    self.released.get()
  }

  /// 尚未释放的数量，周期结束时应为 0
  pub fn live(&self) -> u64 {
    self.allocated() - self.released()
  }
}

/// 被记录的值，drop 时计入释放
#[derive(Debug)]
pub struct Tracked<T> {
  value: T,
  ledger: Rc<AllocationLedger>,
}

impl<T> Deref for Tracked<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}

impl<T> Drop for Tracked<T> {
  fn drop(&mut self) {
    self.ledger.released.set(self.ledger.released.get() + 1);
  }
}
