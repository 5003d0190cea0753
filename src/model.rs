// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/model.rs - 检测结果与类别定义
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

use serde::Deserialize;

use crate::geometry::BBox;

/// 把输入转换为检测结果的处理环节
pub trait Analyze<Input> {
  type Output;
  type Error;

  fn analyze(&self, input: &Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  fn from_label_id(id: u32) -> Self;
}

/// 建筑图纸中的构件类别，编号与检测模型的类别编号一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlanLabel {
  Other = 0,
  Window = 1,
  Door = 2,
  Wall = 3,
  Dormer = 4,
  Roof = 5,
}

impl PlanLabel {
  /// 参与汇总统计的类别（不含 `Other`）
  pub const SUMMARY: [PlanLabel; 5] = [
    PlanLabel::Window,
    PlanLabel::Door,
    PlanLabel::Wall,
    PlanLabel::Dormer,
    PlanLabel::Roof,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      PlanLabel::Other => "other",
      PlanLabel::Window => "window",
      PlanLabel::Door => "door",
      PlanLabel::Wall => "wall",
      PlanLabel::Dormer => "dormer",
      PlanLabel::Roof => "roof",
    }
  }
}

impl WithLabel for PlanLabel {
  fn to_label_str(&self) -> String {
    self.name().to_string()
  }

  fn to_label_id(&self) -> u32 {
    *self as u32
  }

  fn from_label_id(id: u32) -> Self {
    match id {
      1 => PlanLabel::Window,
      2 => PlanLabel::Door,
      3 => PlanLabel::Wall,
      4 => PlanLabel::Dormer,
      5 => PlanLabel::Roof,
      _ => PlanLabel::Other,
    }
  }
}

/// 检测模型输出的原始结果，三个序列按下标一一对应
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDetections {
  pub boxes: Vec<BBox>,
  pub labels: Vec<u32>,
  pub scores: Vec<f32>,
}

impl RawDetections {
  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: BBox,
  /// 真实面积，平方米
  pub area: f32,
}

#[derive(Debug, Clone)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

impl<T> Default for DetectResult<T> {
  fn default() -> Self {
    Self {
      items: Box::new([]),
    }
  }
}

impl<T: WithLabel> DetectResult<T> {
  pub fn summary(&self) -> DetectSummary {
    let mut summary = DetectSummary::default();
    for item in self.items.iter() {
      summary.add(&item.kind.to_label_str(), item.area);
    }
    summary
  }
}

impl<T> DetectResult<T> {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn total_area(&self) -> f32 {
    self.items.iter().map(|item| item.area).sum()
  }
}

/// 单个类别的数量与面积合计
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSummary {
  pub label: String,
  pub count: usize,
  pub total_area: f32,
}

/// 按类别汇总的检测结果
///
/// `classes` 不含 `other` 类别，`count` 与 `total_area` 覆盖所有保留的检测。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectSummary {
  pub classes: Vec<ClassSummary>,
  pub count: usize,
  pub total_area: f32,
}

impl Default for DetectSummary {
  fn default() -> Self {
    Self {
      classes: PlanLabel::SUMMARY
        .iter()
        .map(|label| ClassSummary {
          label: label.to_label_str(),
          count: 0,
          total_area: 0.0,
        })
        .collect(),
      count: 0,
      total_area: 0.0,
    }
  }
}

impl DetectSummary {
  fn add(&mut self, label: &str, area: f32) {
    self.count += 1;
    self.total_area += area;
    if label == PlanLabel::Other.name() {
      return;
    }
    match self.classes.iter_mut().find(|c| c.label == label) {
      Some(class) => {
        class.count += 1;
        class.total_area += area;
      }
      None => self.classes.push(ClassSummary {
        label: label.to_string(),
        count: 1,
        total_area: area,
      }),
    }
  }

  /// 合并另一页的汇总
  pub fn merge(&mut self, other: &DetectSummary) {
    self.count += other.count;
    self.total_area += other.total_area;
    for theirs in other.classes.iter() {
      match self.classes.iter_mut().find(|c| c.label == theirs.label) {
        Some(ours) => {
          ours.count += theirs.count;
          ours.total_area += theirs.total_area;
        }
        None => self.classes.push(theirs.clone()),
      }
    }
  }

  pub fn class(&self, label: PlanLabel) -> Option<&ClassSummary> {
    self.classes.iter().find(|c| c.label == label.name())
  }
}
