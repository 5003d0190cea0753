// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/output.rs - 输出定义
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

use crate::FromUrl;
#[cfg(any(
  feature = "json_report",
  feature = "directory_record",
  feature = "save_image_file"
))]
use crate::FromUrlWithScheme;
use crate::input::PlanPage;
use crate::model::{DetectResult, WithLabel};
use thiserror::Error;
use url::Url;

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

/// 结果中的一条检测在输出中的显示方式
pub(crate) fn label_text<T: WithLabel>(kind: &T, with_name: bool) -> String {
  if with_name {
    kind.to_label_str()
  } else {
    kind.to_label_id().to_string()
  }
}

/// 保留两位小数，与报告中的显示精度一致
pub(crate) fn round2(value: f32) -> f64 {
  (value as f64 * 100.0).round() / 100.0
}

#[cfg(feature = "save_image_file")]
pub mod draw;

#[cfg(feature = "json_report")]
mod json_report;
#[cfg(feature = "json_report")]
pub use self::json_report::{JsonReportOutput, JsonReportOutputError};

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "json_report")]
  #[error("JSON 报告输出错误: {0}")]
  JsonReportOutputError(#[from] JsonReportOutputError),
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "json_report")]
  JsonReportOutput(JsonReportOutput),
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "json_report")]
      JsonReportOutput::SCHEME => {
        let output = JsonReportOutput::from_url(url)?;
        Ok(OutputWrapper::JsonReportOutput(output))
      }
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl<T: WithLabel> Render<PlanPage, DetectResult<T>> for OutputWrapper {
  type Error = OutputError;

  #[allow(unused_variables)]
  fn render_result(&self, page: &PlanPage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "json_report")]
      OutputWrapper::JsonReportOutput(output) => output
        .render_result(page, result)
        .map_err(OutputError::from),
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(page, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(page, result)
        .map_err(OutputError::from),
    }
  }
}

/// 依次写入多个输出
pub struct Outputs(pub Vec<OutputWrapper>);

impl<T: WithLabel> Render<PlanPage, DetectResult<T>> for Outputs {
  type Error = OutputError;

  fn render_result(&self, page: &PlanPage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    for output in self.0.iter() {
      output.render_result(page, result)?;
    }
    Ok(())
  }
}
