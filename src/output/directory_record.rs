// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  input::PlanPage,
  model::{DetectResult, WithLabel},
  output::{Render, label_text, round2},
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[cfg(feature = "save_image_file")]
  #[error("绘制错误: {0}")]
  DrawError(#[from] crate::output::SaveImageFileError),
  #[error("计数器状态被污染")]
  Poisoned,
}

/// 每行一条检测: `名称, 置信度, x1, y1, x2, y2, 面积`
pub struct Record {
  pub label_with_name: bool,
}

impl Record {
  pub fn format<T: WithLabel>(&self, result: &DetectResult<T>) -> String {
    result
      .items
      .iter()
      .map(|item| {
        format!(
          "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}, {:.2}",
          label_text(&item.kind, self.label_with_name),
          item.score,
          item.bbox.x_min,
          item.bbox.y_min,
          item.bbox.x_max,
          item.bbox.y_max,
          round2(item.area)
        )
      })
      .collect::<Vec<_>>()
      .join("\n")
  }

  pub fn record<T: WithLabel>(
    &self,
    result: &DetectResult<T>,
    path: &Path,
  ) -> Result<(), std::io::Error> {
    std::fs::write(path.with_extension("txt"), self.format(result))
  }
}

/// 按日期分目录保存每页的检测记录
///
/// URL 形如 `folder:///dir?record=id&always&draw`：
/// `record=id` 以类别编号代替名称，`always` 连空结果也写入，
/// `draw` 同时保存标注后的页面图像（需要 `save_image_file` 特性）。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  record: Record,
  counter: Mutex<u16>,
  always: bool,
  #[cfg_attr(not(feature = "save_image_file"), allow(dead_code))]
  draw: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let label_with_name = !uri.query_pairs().any(|(k, v)| k == "record" && v == "id");
    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let draw = uri.query_pairs().any(|(k, _)| k == "draw");

    Ok(DirectoryRecordOutput {
      directory: url_path(uri),
      record: Record { label_with_name },
      counter: Mutex::new(0),
      always,
      draw,
    })
  }
}

impl DirectoryRecordOutput {
  fn record_id(&self) -> Result<u16, DirectoryRecordOutputError> {
    let mut counter = self
      .counter
      .lock()
      .map_err(|_| DirectoryRecordOutputError::Poisoned)?;
    *counter = counter.wrapping_add(1);
    Ok(*counter)
  }

  fn record_path(&self, page: &PlanPage) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}-page-{:03}",
      now.format("%H-%M-%S"),
      self.record_id()?,
      page.index
    )))
  }
}

impl<T: WithLabel> Render<PlanPage, DetectResult<T>> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, page: &PlanPage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("第 {} 页没有检测结果, 跳过记录", page.index);
      return Ok(());
    }

    let path = self.record_path(page)?;
    self.record.record(result, &path)?;
    info!("记录第 {} 页结果到: {}", page.index, path.with_extension("txt").display());

    #[cfg(feature = "save_image_file")]
    if self.draw
      && let Some(image) = page.image.as_ref()
    {
      let annotated = crate::output::draw::Draw::default().draw_page(image, result)?;
      let image_path = path.with_extension("png");
      annotated
        .save(&image_path)
        .map_err(crate::output::SaveImageFileError::ImageError)?;
      info!("保存标注图像到: {}", image_path.display());
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::BBox;
  use crate::model::{DetectItem, PlanLabel, RawDetections};

  fn result() -> DetectResult<PlanLabel> {
    DetectResult {
      items: vec![
        DetectItem {
          kind: PlanLabel::Door,
          score: 0.91,
          bbox: BBox::new(10.0, 20.0, 30.5, 40.0),
          area: 1.234,
        },
        DetectItem {
          kind: PlanLabel::Roof,
          score: 0.6,
          bbox: BBox::new(0.0, 0.0, 100.0, 50.0),
          area: 12.0,
        },
      ]
      .into_boxed_slice(),
    }
  }

  fn page() -> PlanPage {
    PlanPage {
      index: 3,
      geometry: None,
      image: None,
      detections: RawDetections::default(),
    }
  }

  fn written_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
      for entry in std::fs::read_dir(current).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else {
          files.push(path);
        }
      }
    }
    files
  }

  #[test]
  fn record_lines() {
    let by_name = Record {
      label_with_name: true,
    }
    .format(&result());
    assert_eq!(
      by_name,
      "door, 0.9100, 10.0, 20.0, 30.5, 40.0, 1.23\nroof, 0.6000, 0.0, 0.0, 100.0, 50.0, 12.00"
    );

    let by_id = Record {
      label_with_name: false,
    }
    .format(&result());
    assert!(by_id.starts_with("2, 0.9100"));
  }

  #[test]
  fn writes_record_into_dated_directory() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}?record=id", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.render_result(&page(), &result()).unwrap();

    let files = written_files(dir.path());
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.extension().unwrap(), "txt");
    assert!(file.to_string_lossy().contains("page-003"));
    let content = std::fs::read_to_string(file).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.starts_with("2, "));
  }

  #[test]
  fn empty_results_are_skipped_unless_always() {
    let dir = tempfile::tempdir().unwrap();
    let empty = DetectResult::<PlanLabel>::default();

    let url = url::Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.render_result(&page(), &empty).unwrap();
    assert!(written_files(dir.path()).is_empty());

    let url = url::Url::parse(&format!("folder://{}?always", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    output.render_result(&page(), &empty).unwrap();
    assert_eq!(written_files(dir.path()).len(), 1);
  }
}
