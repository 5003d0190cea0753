// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/geometry.rs - 像素空间边界框
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

use serde::{Deserialize, Serialize};

/// 像素坐标下的轴对齐边界框
///
/// 序列化为 `[x_min, y_min, x_max, y_max]` 数组，与检测模型的原始输出一致。
/// 坐标顺序不做校验，倒置的框会得到负面积，需要时调用 [`BBox::is_valid`]。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
  pub x_min: f32,
  pub y_min: f32,
  pub x_max: f32,
  pub y_max: f32,
}

impl BBox {
  pub const fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
    Self {
      x_min,
      y_min,
      x_max,
      y_max,
    }
  }

  pub fn width(&self) -> f32 {
    self.x_max - self.x_min
  }

  pub fn height(&self) -> f32 {
    self.y_max - self.y_min
  }

  /// 像素面积，不做截断
  pub fn area(&self) -> f32 {
    self.width() * self.height()
  }

  /// 坐标有限且 x_min <= x_max、y_min <= y_max
  pub fn is_valid(&self) -> bool {
    self.to_array().iter().all(|v| v.is_finite())
      && self.x_min <= self.x_max
      && self.y_min <= self.y_max
  }

  /// 四个方向各扩展 `tolerance` 像素
  pub fn expand(&self, tolerance: f32) -> Self {
    Self {
      x_min: self.x_min - tolerance,
      y_min: self.y_min - tolerance,
      x_max: self.x_max + tolerance,
      y_max: self.y_max + tolerance,
    }
  }

  pub fn to_array(&self) -> [f32; 4] {
    [self.x_min, self.y_min, self.x_max, self.y_max]
  }
}

impl From<[f32; 4]> for BBox {
  fn from(bbox: [f32; 4]) -> Self {
    let [x_min, y_min, x_max, y_max] = bbox;
    Self::new(x_min, y_min, x_max, y_max)
  }
}

impl From<BBox> for [f32; 4] {
  fn from(bbox: BBox) -> Self {
    bbox.to_array()
  }
}
