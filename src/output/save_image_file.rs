// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/output/save_image_file.rs - 保存标注后的页面图像
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

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::PlanPage,
  model::{DetectResult, WithLabel},
  output::{Render, draw::Draw},
  url_path,
};

pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
  /// 为 false 时只处理第一页，文件名不加页码
  multi_page: bool,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_path(uri),
      draw: Draw::default(),
      multi_page: !uri.query_pairs().any(|(k, _)| k == "single"),
    })
  }
}

impl SaveImageFileOutput {
  /// 多页时在文件名后追加页码: `plan.png` -> `plan-002.png`
  fn page_path(&self, page: &PlanPage) -> PathBuf {
    if !self.multi_page {
      return self.path.clone();
    }
    let stem = self
      .path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let name = match self.path.extension() {
      Some(ext) => format!("{}-{:03}.{}", stem, page.index, ext.to_string_lossy()),
      None => format!("{}-{:03}", stem, page.index),
    };
    self.path.with_file_name(name)
  }

  fn save_image(&self, image: image::RgbImage, path: &Path) -> Result<(), SaveImageFileError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image.save(path).map_err(SaveImageFileError::ImageError)?;

    info!("保存图像到文件: {}", path.display());

    Ok(())
  }
}

impl<T: WithLabel> Render<PlanPage, DetectResult<T>> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, page: &PlanPage, result: &DetectResult<T>) -> Result<(), Self::Error> {
    if !self.multi_page && page.index > 1 {
      return Ok(());
    }

    let Some(image_path) = page.image.as_ref() else {
      warn!("第 {} 页没有关联图像, 跳过绘制", page.index);
      return Ok(());
    };

    let image = self.draw.draw_page(image_path, result)?;
    self.save_image(image, &self.page_path(page))
  }
}
