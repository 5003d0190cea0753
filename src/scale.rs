// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/scale.rs - 图纸比例与像素/米换算
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
use thiserror::Error;

use crate::geometry::BBox;

const MM_PER_INCH: f32 = 25.4;
const MM_PER_METER: f32 = 1000.0;

pub const DEFAULT_FORMAT_WIDTH_MM: f32 = 210.0;
pub const DEFAULT_FORMAT_HEIGHT_MM: f32 = 297.0;
pub const DEFAULT_DPI: f32 = 300.0;
pub const DEFAULT_PLAN_SCALE: f32 = 100.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanGeometryError {
  #[error("DPI 必须为正数, 实际为 {0}")]
  InvalidDpi(f32),
  #[error("图纸比例必须为正数, 实际为 {0}")]
  InvalidPlanScale(f32),
  #[error("图纸尺寸必须为正数, 实际为 {0}x{1} mm")]
  InvalidFormatSize(f32, f32),
}

/// 图纸幅面（毫米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatSize {
  pub width_mm: f32,
  pub height_mm: f32,
}

impl Default for FormatSize {
  fn default() -> Self {
    Self {
      width_mm: DEFAULT_FORMAT_WIDTH_MM,
      height_mm: DEFAULT_FORMAT_HEIGHT_MM,
    }
  }
}

/// 描述像素如何映射到真实尺寸的图纸参数
///
/// `plan_scale` 为比例尺分母，100 表示 1:100。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanGeometry {
  pub format_size: FormatSize,
  pub dpi: f32,
  pub plan_scale: f32,
}

impl Default for PlanGeometry {
  fn default() -> Self {
    Self {
      format_size: FormatSize::default(),
      dpi: DEFAULT_DPI,
      plan_scale: DEFAULT_PLAN_SCALE,
    }
  }
}

impl PlanGeometry {
  /// 拒绝非有限或非正的参数。[`calculate_scale_factor`] 本身不做检查。
  pub fn validate(&self) -> Result<(), PlanGeometryError> {
    if !(self.dpi.is_finite() && self.dpi > 0.0) {
      return Err(PlanGeometryError::InvalidDpi(self.dpi));
    }
    if !(self.plan_scale.is_finite() && self.plan_scale > 0.0) {
      return Err(PlanGeometryError::InvalidPlanScale(self.plan_scale));
    }
    let FormatSize {
      width_mm,
      height_mm,
    } = self.format_size;
    if !(width_mm.is_finite() && width_mm > 0.0 && height_mm.is_finite() && height_mm > 0.0) {
      return Err(PlanGeometryError::InvalidFormatSize(width_mm, height_mm));
    }
    Ok(())
  }

  /// 每真实米对应的像素数
  pub fn scale_factor(&self) -> f32 {
    calculate_scale_factor(self.format_size, self.dpi, self.plan_scale)
  }
}

/// 计算每真实米对应的像素数
///
/// 在给定 DPI 下，图纸上 1 mm 占 `dpi / 25.4` 像素；比例 1:S 下，真实 1 m 对应图纸上
/// `1000 / S` mm。`format_size` 仅为兼容上游接口而保留，不参与计算。
pub fn calculate_scale_factor(_format_size: FormatSize, dpi: f32, plan_scale: f32) -> f32 {
  let pixels_per_mm = dpi / MM_PER_INCH;
  pixels_per_mm * (MM_PER_METER / plan_scale)
}

/// 边界框的真实面积（平方米）
pub fn area_m2(bbox: &BBox, pixels_per_meter: f32) -> f32 {
  let width_m = bbox.width() / pixels_per_meter;
  let height_m = bbox.height() / pixels_per_meter;
  width_m * height_m
}
