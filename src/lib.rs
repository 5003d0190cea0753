// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod geometry;
pub mod input;
pub mod model;
pub mod nms;
pub mod output;
pub mod overlap;
pub mod pipeline;
pub mod scale;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 把 URL 的路径部分解码为本地路径，`%20` 等转义还原为原字符
pub fn url_path(url: &url::Url) -> std::path::PathBuf {
  match urlencoding::decode(url.path()) {
    Ok(path) => std::path::PathBuf::from(path.into_owned()),
    Err(_) => std::path::PathBuf::from(url.path()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn url_path_is_decoded() {
    let url = url::Url::parse("json:///data/Grundriss EG/Übersicht.json?pretty").unwrap();
    assert_eq!(url.path(), "/data/Grundriss%20EG/%C3%9Cbersicht.json");
    assert_eq!(url_path(&url), PathBuf::from("/data/Grundriss EG/Übersicht.json"));
  }

  #[test]
  fn plain_path_is_unchanged() {
    let url = url::Url::parse("folder:///out/records").unwrap();
    assert_eq!(url_path(&url), PathBuf::from("/out/records"));
  }
}
