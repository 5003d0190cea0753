// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/overlap.rs - 边界框重叠与包含关系
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

use crate::geometry::BBox;

/// 两个边界框之间的重叠指标
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlapMetrics {
  pub iou: f32,
  pub overlap_area: f32,
  pub box1_area: f32,
  pub box2_area: f32,
  /// 重叠面积占 box1 面积的比例
  pub overlap_box1_ratio: f32,
  /// 重叠面积占 box2 面积的比例
  pub overlap_box2_ratio: f32,
}

fn ratio(numerator: f32, denominator: f32) -> f32 {
  if denominator > 0.0 {
    numerator / denominator
  } else {
    0.0
  }
}

/// 计算两个边界框的交并比及各自的覆盖比例
///
/// 无交集时 IoU 与比例均为 0，但两个框的面积仍然照常返回。
pub fn compute_overlap(box1: &BBox, box2: &BBox) -> OverlapMetrics {
  let box1_area = box1.area();
  let box2_area = box2.area();

  let x_left = box1.x_min.max(box2.x_min);
  let y_top = box1.y_min.max(box2.y_min);
  let x_right = box1.x_max.min(box2.x_max);
  let y_bottom = box1.y_max.min(box2.y_max);

  if x_right < x_left || y_bottom < y_top {
    return OverlapMetrics {
      box1_area,
      box2_area,
      ..Default::default()
    };
  }

  let overlap_area = (x_right - x_left) * (y_bottom - y_top);
  let union_area = box1_area + box2_area - overlap_area;

  OverlapMetrics {
    iou: ratio(overlap_area, union_area),
    overlap_area,
    box1_area,
    box2_area,
    overlap_box1_ratio: ratio(overlap_area, box1_area),
    overlap_box2_ratio: ratio(overlap_area, box2_area),
  }
}

/// `inner` 是否（在容差范围内）完全位于 `outer` 之内
///
/// 容差把 `outer` 向四个方向各扩展 `tolerance` 像素后再判断。
pub fn is_contained(inner: &BBox, outer: &BBox, tolerance: f32) -> bool {
  let outer = outer.expand(tolerance);
  inner.x_min >= outer.x_min
    && inner.y_min >= outer.y_min
    && inner.x_max <= outer.x_max
    && inner.y_max <= outer.y_max
}
