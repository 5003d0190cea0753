// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/input.rs - 检测结果文件输入
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

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::RawDetections, scale::PlanGeometry, url_path};

#[derive(Error, Debug)]
pub enum PageFileInputError {
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON error: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 一页图纸的原始检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPage {
  /// 页码，从 1 开始
  pub index: usize,
  /// 为 `None` 时使用命令行给出的图纸参数
  pub geometry: Option<PlanGeometry>,
  /// 该页的图像，用于绘制结果
  pub image: Option<PathBuf>,
  pub detections: RawDetections,
}

#[derive(Deserialize)]
struct PageRecord {
  #[serde(default)]
  geometry: Option<PlanGeometry>,
  #[serde(default)]
  image: Option<PathBuf>,
  #[serde(flatten)]
  detections: RawDetections,
}

/// 从 JSON 文件读取的检测结果，文件内容为单页对象或页数组
#[derive(Debug)]
pub struct PageFileInput {
  pages: Vec<PlanPage>,
}

impl FromUrlWithScheme for PageFileInput {
  const SCHEME: &'static str = "detections";
}

impl FromUrl for PageFileInput {
  type Error = PageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(PageFileInputError::SchemeMismatch);
    }

    Self::open(url_path(url))
  }
}

impl PageFileInput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PageFileInputError> {
    let path = path.as_ref();
    info!("读取检测结果文件: {}", path.display());
    let data = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let input = Self::from_json(&data, base)?;
    debug!("共 {} 页", input.pages.len());
    Ok(input)
  }

  /// 解析 JSON 内容，相对图像路径基于 `base` 解析
  pub fn from_json(data: &str, base: &Path) -> Result<Self, PageFileInputError> {
    // 按首个非空白字符区分页数组与单页，解析错误保留行列号
    let records = if data.trim_start().starts_with('[') {
      serde_json::from_str::<Vec<PageRecord>>(data)?
    } else {
      vec![serde_json::from_str::<PageRecord>(data)?]
    };

    let pages = records
      .into_iter()
      .enumerate()
      .map(|(i, record)| PlanPage {
        index: i + 1,
        geometry: record.geometry,
        image: record.image.map(|image| {
          if image.is_relative() {
            base.join(image)
          } else {
            image
          }
        }),
        detections: record.detections,
      })
      .collect();

    Ok(Self { pages })
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  pub fn into_pages(self) -> std::vec::IntoIter<PlanPage> {
    self.pages.into_iter()
  }
}
