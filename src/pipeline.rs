// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/pipeline.rs - 检测结果后处理流程
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

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  geometry::BBox,
  input::PlanPage,
  model::{Analyze, DetectItem, DetectResult, PlanLabel, RawDetections, WithLabel},
  nms::{NmsConfig, NmsError, apply_nms},
  scale::{PlanGeometry, PlanGeometryError, area_m2},
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzeError {
  #[error("图纸参数无效: {0}")]
  InvalidGeometry(#[from] PlanGeometryError),
  #[error("检测结果长度不一致: boxes={boxes}, labels={labels}, scores={scores}")]
  LengthMismatch {
    boxes: usize,
    labels: usize,
    scores: usize,
  },
  #[error("NMS 错误: {0}")]
  Nms(#[from] NmsError),
}

/// 把原始检测结果换算为真实面积并去重
#[derive(Debug, Clone)]
pub struct PlanAnalyzer {
  geometry: PlanGeometry,
  confidence_threshold: f32,
  nms: NmsConfig,
  reject_invalid_boxes: bool,
}

impl Default for PlanAnalyzer {
  fn default() -> Self {
    Self {
      geometry: PlanGeometry::default(),
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      nms: NmsConfig::default(),
      reject_invalid_boxes: false,
    }
  }
}

impl PlanAnalyzer {
  /// 页面未提供图纸参数时使用的默认值
  pub fn with_geometry(mut self, geometry: PlanGeometry) -> Self {
    self.geometry = geometry;
    self
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_nms(mut self, nms: NmsConfig) -> Self {
    self.nms = nms;
    self
  }

  /// 丢弃坐标倒置或非有限的框，默认关闭
  pub fn with_reject_invalid_boxes(mut self, reject: bool) -> Self {
    self.reject_invalid_boxes = reject;
    self
  }

  pub fn reconcile(
    &self,
    raw: &RawDetections,
    geometry: &PlanGeometry,
  ) -> Result<DetectResult<PlanLabel>, AnalyzeError> {
    geometry.validate()?;

    if raw.labels.len() != raw.boxes.len() || raw.scores.len() != raw.boxes.len() {
      return Err(AnalyzeError::LengthMismatch {
        boxes: raw.boxes.len(),
        labels: raw.labels.len(),
        scores: raw.scores.len(),
      });
    }

    let pixels_per_meter = geometry.scale_factor();
    debug!("像素/米换算系数: {:.4}", pixels_per_meter);

    let mut boxes: Vec<BBox> = Vec::with_capacity(raw.len());
    let mut labels: Vec<PlanLabel> = Vec::with_capacity(raw.len());
    let mut scores: Vec<f32> = Vec::with_capacity(raw.len());

    for ((bbox, &label), &score) in raw.boxes.iter().zip(&raw.labels).zip(&raw.scores) {
      if score.is_nan() || score < self.confidence_threshold {
        continue;
      }
      if self.reject_invalid_boxes && !bbox.is_valid() {
        warn!("丢弃无效边界框: {:?}", bbox);
        continue;
      }
      boxes.push(*bbox);
      labels.push(PlanLabel::from_label_id(label));
      scores.push(score);
    }
    debug!(
      "置信度阈值 {:.2}: {} -> {} 个候选框",
      self.confidence_threshold,
      raw.len(),
      boxes.len()
    );

    let areas: Vec<f32> = boxes
      .iter()
      .map(|bbox| area_m2(bbox, pixels_per_meter))
      .collect();

    let kept = apply_nms(&boxes, &labels, &scores, &areas, &self.nms)?;

    let items: Vec<DetectItem<PlanLabel>> = kept
      .boxes
      .into_iter()
      .zip(kept.labels)
      .zip(kept.scores)
      .zip(kept.areas)
      .map(|(((bbox, kind), score), area)| DetectItem {
        kind,
        score,
        bbox,
        area,
      })
      .collect();

    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }
}

impl Analyze<PlanPage> for PlanAnalyzer {
  type Output = DetectResult<PlanLabel>;
  type Error = AnalyzeError;

  fn analyze(&self, page: &PlanPage) -> Result<Self::Output, Self::Error> {
    let geometry = page.geometry.unwrap_or(self.geometry);
    let result = self.reconcile(&page.detections, &geometry)?;
    info!(
      "第 {} 页: {} 个原始检测, 保留 {} 个, 总面积 {:.2} m²",
      page.index,
      page.detections.len(),
      result.len(),
      result.total_area()
    );
    Ok(result)
  }
}
