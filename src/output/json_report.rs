// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/output/json_report.rs - JSON 结果报告
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  geometry::BBox,
  input::PlanPage,
  model::{DetectResult, DetectSummary, WithLabel},
  output::{Render, round2},
  url_path,
};

#[derive(Error, Debug)]
pub enum JsonReportOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("报告状态被污染")]
  Poisoned,
}

#[derive(Debug, Clone, Serialize)]
struct PredictionRecord {
  #[serde(rename = "box")]
  bbox: BBox,
  label: u32,
  label_name: String,
  score: f64,
  area: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ClassRecord {
  label: String,
  count: usize,
  total_area: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SummaryRecord {
  classes: Vec<ClassRecord>,
  count: usize,
  total_area: f64,
}

impl From<&DetectSummary> for SummaryRecord {
  fn from(summary: &DetectSummary) -> Self {
    Self {
      classes: summary
        .classes
        .iter()
        .map(|class| ClassRecord {
          label: class.label.clone(),
          count: class.count,
          total_area: round2(class.total_area),
        })
        .collect(),
      count: summary.count,
      total_area: round2(summary.total_area),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
struct PageReport {
  page: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  image: Option<PathBuf>,
  predictions: Vec<PredictionRecord>,
  count: usize,
  total_area: f64,
  summary: SummaryRecord,
}

#[derive(Serialize)]
struct Report<'a> {
  generated_at: String,
  pages: &'a [PageReport],
  summary: SummaryRecord,
}

#[derive(Default)]
struct ReportState {
  pages: Vec<PageReport>,
  summary: DetectSummary,
}

/// 把每页结果写入同一个 JSON 报告
///
/// 每渲染一页就重写一次文件，中途退出时已处理的页面仍然保留。
pub struct JsonReportOutput {
  path: PathBuf,
  state: Mutex<ReportState>,
}

impl FromUrlWithScheme for JsonReportOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonReportOutput {
  type Error = JsonReportOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonReportOutputError::SchemeMismatch);
    }

    Ok(Self::new(url_path(uri)))
  }
}

impl JsonReportOutput {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      state: Mutex::new(ReportState::default()),
    }
  }

  fn write_report(&self, state: &ReportState) -> Result<(), JsonReportOutputError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let report = Report {
      generated_at: Utc::now().to_rfc3339(),
      pages: &state.pages,
      summary: SummaryRecord::from(&state.summary),
    };
    let mut writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(())
  }
}

impl<T: WithLabel> Render<PlanPage, DetectResult<T>> for JsonReportOutput {
  type Error = JsonReportOutputError;

  fn render_result(&self, page: &PlanPage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    let predictions = result
      .items
      .iter()
      .map(|item| PredictionRecord {
        bbox: item.bbox,
        label: item.kind.to_label_id(),
        label_name: item.kind.to_label_str(),
        score: round2(item.score),
        area: round2(item.area),
      })
      .collect();

    let summary = result.summary();
    let report = PageReport {
      page: page.index,
      image: page.image.clone(),
      predictions,
      count: result.len(),
      total_area: round2(result.total_area()),
      summary: SummaryRecord::from(&summary),
    };

    let mut state = self
      .state
      .lock()
      .map_err(|_| JsonReportOutputError::Poisoned)?;
    state.pages.push(report);
    state.summary.merge(&summary);
    self.write_report(&state)?;

    info!("写入 JSON 报告: {} (共 {} 页)", self.path.display(), state.pages.len());
    Ok(())
  }
}
