// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/nms.rs - 多准则非极大值抑制
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

//! 按类别进行的贪心去重。
//!
//! 候选框按置信度降序处理，每轮保留最高分的框，并用三条准则抑制同类别的剩余候选：
//!
//! 1. 与保留框的 IoU 超过 `iou_threshold`；
//! 2. 候选框（在 `tolerance` 像素容差内）完全落在保留框内；
//! 3. 候选框被保留框覆盖的比例超过 `overlap_ratio_threshold`，且候选框面积更小。
//!
//! 不同类别的框互不抑制，例如窗户可以位于墙体轮廓之内。

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
  geometry::BBox,
  overlap::{compute_overlap, is_contained},
};

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_OVERLAP_RATIO_THRESHOLD: f32 = 0.7;
pub const DEFAULT_TOLERANCE: f32 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NmsError {
  #[error("输入序列长度不一致: boxes={boxes}, labels={labels}, scores={scores}, areas={areas}")]
  LengthMismatch {
    boxes: usize,
    labels: usize,
    scores: usize,
    areas: usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NmsConfig {
  pub iou_threshold: f32,
  pub overlap_ratio_threshold: f32,
  /// 包含判断的容差（像素）
  pub tolerance: f32,
}

impl Default for NmsConfig {
  fn default() -> Self {
    Self {
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      overlap_ratio_threshold: DEFAULT_OVERLAP_RATIO_THRESHOLD,
      tolerance: DEFAULT_TOLERANCE,
    }
  }
}

/// 触发抑制的准则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
  Iou,
  Contained,
  DominantOverlap,
}

/// 依次检查三条准则，返回第一条命中的准则
///
/// `current` 是已保留的高分框，`candidate` 是同类别的待比较框。
pub fn check_suppression(
  current: &BBox,
  candidate: &BBox,
  config: &NmsConfig,
) -> Option<Suppression> {
  let metrics = compute_overlap(current, candidate);

  if metrics.iou > config.iou_threshold {
    return Some(Suppression::Iou);
  }

  if is_contained(candidate, current, config.tolerance) {
    return Some(Suppression::Contained);
  }

  // 面积相等时不抑制
  if metrics.overlap_box2_ratio > config.overlap_ratio_threshold
    && metrics.box2_area < metrics.box1_area
  {
    return Some(Suppression::DominantOverlap);
  }

  None
}

/// 返回保留下来的下标，按保留顺序（置信度降序）排列
///
/// 排序是稳定的，置信度相同的框保持输入中的相对顺序。
/// 置信度为 NaN 的框排在最后，不会抑制任何有效分数的框。
/// 调用方需保证三个切片长度一致。
pub fn nms_indices<L: PartialEq>(
  boxes: &[BBox],
  labels: &[L],
  scores: &[f32],
  config: &NmsConfig,
) -> Vec<usize> {
  let mut order: Vec<usize> = (0..scores.len()).collect();
  order.sort_by(|&a, &b| {
    scores[a]
      .is_nan()
      .cmp(&scores[b].is_nan())
      .then_with(|| scores[b].total_cmp(&scores[a]))
  });

  let mut removed = vec![false; order.len()];
  let mut keep = Vec::new();

  for (rank, &current) in order.iter().enumerate() {
    if removed[rank] {
      continue;
    }
    keep.push(current);

    for (offset, &candidate) in order[rank + 1..].iter().enumerate() {
      let slot = rank + 1 + offset;
      if removed[slot] || labels[candidate] != labels[current] {
        continue;
      }

      if let Some(reason) = check_suppression(&boxes[current], &boxes[candidate], config) {
        trace!(
          "候选框 {} 被框 {} 抑制 ({:?}): score {:.3} <= {:.3}",
          candidate, current, reason, scores[candidate], scores[current]
        );
        removed[slot] = true;
      }
    }
  }

  debug!("NMS: 输入 {} 个框, 保留 {} 个", scores.len(), keep.len());
  keep
}

/// NMS 输出，四个序列按保留顺序一一对应
#[derive(Debug, Clone, PartialEq)]
pub struct NmsOutput<L> {
  pub boxes: Vec<BBox>,
  pub labels: Vec<L>,
  pub scores: Vec<f32>,
  pub areas: Vec<f32>,
}

impl<L> NmsOutput<L> {
  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }
}

/// 对四个平行序列执行 NMS，输出保留原始取值，顺序为置信度降序
pub fn apply_nms<L: PartialEq + Clone>(
  boxes: &[BBox],
  labels: &[L],
  scores: &[f32],
  areas: &[f32],
  config: &NmsConfig,
) -> Result<NmsOutput<L>, NmsError> {
  let n = boxes.len();
  if labels.len() != n || scores.len() != n || areas.len() != n {
    return Err(NmsError::LengthMismatch {
      boxes: n,
      labels: labels.len(),
      scores: scores.len(),
      areas: areas.len(),
    });
  }

  let keep = nms_indices(boxes, labels, scores, config);

  Ok(NmsOutput {
    boxes: keep.iter().map(|&i| boxes[i]).collect(),
    labels: keep.iter().map(|&i| labels[i].clone()).collect(),
    scores: keep.iter().map(|&i| scores[i]).collect(),
    areas: keep.iter().map(|&i| areas[i]).collect(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(boxes: &[[f32; 4]], labels: &[u32], scores: &[f32]) -> NmsOutput<u32> {
    let boxes: Vec<BBox> = boxes.iter().copied().map(BBox::from).collect();
    let areas: Vec<f32> = boxes.iter().map(|b| b.area()).collect();
    apply_nms(&boxes, labels, scores, &areas, &NmsConfig::default()).unwrap()
  }

  #[test]
  fn empty_input() {
    let output = run(&[], &[], &[]);
    assert!(output.is_empty());
  }

  #[test]
  fn single_detection_unchanged() {
    let output = run(&[[1.0, 2.0, 3.0, 4.0]], &[2], &[0.7]);
    assert_eq!(output.boxes, vec![BBox::new(1.0, 2.0, 3.0, 4.0)]);
    assert_eq!(output.labels, vec![2]);
    assert_eq!(output.scores, vec![0.7]);
    assert_eq!(output.areas, vec![4.0]);
  }

  #[test]
  fn contained_box_is_removed() {
    let output = run(
      &[[0.0, 0.0, 100.0, 100.0], [10.0, 10.0, 90.0, 90.0]],
      &[1, 1],
      &[0.9, 0.8],
    );
    assert_eq!(output.boxes, vec![BBox::new(0.0, 0.0, 100.0, 100.0)]);
    assert_eq!(
      check_suppression(
        &BBox::new(0.0, 0.0, 100.0, 100.0),
        &BBox::new(10.0, 10.0, 90.0, 90.0),
        &NmsConfig::default()
      ),
      Some(Suppression::Iou)
    );
  }

  #[test]
  fn containment_fires_when_iou_is_low() {
    let current = BBox::new(0.0, 0.0, 100.0, 100.0);
    let candidate = BBox::new(10.0, 10.0, 40.0, 40.0);
    assert_eq!(
      check_suppression(&current, &candidate, &NmsConfig::default()),
      Some(Suppression::Contained)
    );
  }

  #[test]
  fn high_iou_keeps_higher_score() {
    // 交集 75x100, 并集 125x100, IoU = 0.6
    let output = run(
      &[[0.0, 0.0, 100.0, 100.0], [25.0, 0.0, 125.0, 100.0]],
      &[1, 1],
      &[0.7, 0.95],
    );
    assert_eq!(output.boxes, vec![BBox::new(25.0, 0.0, 125.0, 100.0)]);
    assert_eq!(output.scores, vec![0.95]);
  }

  #[test]
  fn different_classes_both_survive() {
    let output = run(
      &[[0.0, 0.0, 50.0, 50.0], [0.0, 0.0, 50.0, 50.0]],
      &[1, 2],
      &[0.9, 0.85],
    );
    assert_eq!(output.len(), 2);
    assert_eq!(output.labels, vec![1, 2]);
  }

  #[test]
  fn coincident_boxes_keep_the_best() {
    let output = run(
      &[
        [5.0, 5.0, 25.0, 45.0],
        [5.0, 5.0, 25.0, 45.0],
        [5.0, 5.0, 25.0, 45.0],
      ],
      &[3, 3, 3],
      &[0.6, 0.9, 0.75],
    );
    assert_eq!(output.scores, vec![0.9]);
  }

  #[test]
  fn dominant_partial_overlap_removes_smaller_box() {
    // 候选框 80% 被覆盖，IoU 约 0.19，且未被包含
    let current = BBox::new(0.0, 0.0, 100.0, 100.0);
    let candidate = BBox::new(80.0, 0.0, 105.0, 100.0);
    let metrics = compute_overlap(&current, &candidate);
    assert!(metrics.iou < 0.5);
    assert!(!is_contained(&candidate, &current, 0.0));
    let config = NmsConfig {
      tolerance: 0.0,
      ..Default::default()
    };
    assert_eq!(
      check_suppression(&current, &candidate, &config),
      Some(Suppression::DominantOverlap)
    );
  }

  #[test]
  fn equal_area_partial_overlap_is_kept() {
    // 覆盖 80%，但面积相等
    let current = BBox::new(0.0, 0.0, 100.0, 100.0);
    let candidate = BBox::new(20.0, 0.0, 120.0, 100.0);
    let config = NmsConfig {
      iou_threshold: 0.9,
      tolerance: 0.0,
      ..Default::default()
    };
    assert_eq!(check_suppression(&current, &candidate, &config), None);
  }

  #[test]
  fn larger_candidate_is_never_dominated() {
    let current = BBox::new(10.0, 10.0, 20.0, 20.0);
    let candidate = BBox::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(
      check_suppression(&current, &candidate, &NmsConfig::default()),
      None
    );
  }

  #[test]
  fn tolerance_catches_near_containment() {
    let current = BBox::new(0.0, 0.0, 100.0, 100.0);
    let candidate = BBox::new(-4.0, 50.0, 30.0, 104.0);
    let strict = NmsConfig {
      tolerance: 0.0,
      overlap_ratio_threshold: 1.0,
      ..Default::default()
    };
    assert_eq!(check_suppression(&current, &candidate, &strict), None);
    let tolerant = NmsConfig {
      overlap_ratio_threshold: 1.0,
      ..Default::default()
    };
    assert_eq!(
      check_suppression(&current, &candidate, &tolerant),
      Some(Suppression::Contained)
    );
  }

  #[test]
  fn ties_keep_input_order() {
    let output = run(
      &[
        [0.0, 0.0, 10.0, 10.0],
        [100.0, 100.0, 110.0, 110.0],
        [200.0, 200.0, 210.0, 210.0],
      ],
      &[1, 1, 1],
      &[0.5, 0.8, 0.5],
    );
    assert_eq!(
      output.boxes,
      vec![
        BBox::new(100.0, 100.0, 110.0, 110.0),
        BBox::new(0.0, 0.0, 10.0, 10.0),
        BBox::new(200.0, 200.0, 210.0, 210.0),
      ]
    );
  }

  #[test]
  fn tie_break_decides_which_duplicate_survives() {
    let output = run(
      &[[0.0, 0.0, 10.0, 10.0], [0.0, 0.0, 10.0, 10.0]],
      &[1, 1],
      &[0.5, 0.5],
    );
    assert_eq!(output.len(), 1);
    let boxes = [BBox::new(0.0, 0.0, 10.0, 10.0); 2];
    assert_eq!(
      nms_indices(&boxes, &[1, 1], &[0.5, 0.5], &NmsConfig::default()),
      vec![0]
    );
  }

  #[test]
  fn suppressed_box_does_not_suppress_others() {
    // B 被 A 抑制；C 只与 B 重叠，应当保留
    let output = run(
      &[
        [0.0, 0.0, 100.0, 100.0],
        [30.0, 0.0, 130.0, 100.0],
        [60.0, 0.0, 160.0, 100.0],
      ],
      &[1, 1, 1],
      &[0.9, 0.8, 0.7],
    );
    assert_eq!(output.scores, vec![0.9, 0.7]);
  }

  #[test]
  fn output_preserves_areas() {
    let boxes = vec![BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(50.0, 50.0, 60.0, 60.0)];
    let areas = vec![1.25, 3.5];
    let output = apply_nms(
      &boxes,
      &[1u32, 1],
      &[0.4, 0.6],
      &areas,
      &NmsConfig::default(),
    )
    .unwrap();
    assert_eq!(output.areas, vec![3.5, 1.25]);
  }

  #[test]
  fn length_mismatch_is_an_error() {
    let boxes = vec![BBox::default(); 2];
    let err = apply_nms(&boxes, &[1u32], &[0.5, 0.6], &[0.0, 0.0], &NmsConfig::default())
      .unwrap_err();
    assert_eq!(
      err,
      NmsError::LengthMismatch {
        boxes: 2,
        labels: 1,
        scores: 2,
        areas: 2,
      }
    );
  }

  #[test]
  fn nan_scores_sort_last() {
    let boxes = vec![BBox::new(0.0, 0.0, 100.0, 100.0); 3];
    let keep = nms_indices(&boxes, &[1u32, 1, 1], &[f32::NAN, 0.6, 0.4], &NmsConfig::default());
    assert_eq!(keep, vec![1]);

    let keep = nms_indices(
      &[BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(50.0, 50.0, 60.0, 60.0)],
      &[1u32, 1],
      &[f32::NAN, 0.3],
      &NmsConfig::default(),
    );
    assert_eq!(keep, vec![1, 0]);
  }
}
