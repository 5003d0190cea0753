// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use planscan::{
  FromUrl,
  input::PageFileInput,
  output::{OutputWrapper, Outputs},
  pipeline::PlanAnalyzer,
  task::{BatchTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = args::Args::parse();

  let geometry = args.geometry();
  geometry.validate()?;

  info!("输入来源: {}", args.input);
  for output in args.output.iter() {
    info!("输出路径: {}", output);
  }
  info!(
    "图纸: {}x{} mm, {} DPI, 1:{}, 换算系数 {:.4} 像素/米",
    geometry.format_size.width_mm,
    geometry.format_size.height_mm,
    geometry.dpi,
    geometry.plan_scale,
    geometry.scale_factor()
  );

  let input = PageFileInput::from_url(&args.input)?;
  info!("读取到 {} 页检测结果", input.len());

  let analyzer = PlanAnalyzer::default()
    .with_geometry(geometry)
    .with_confidence_threshold(args.confidence)
    .with_nms(args.nms())
    .with_reject_invalid_boxes(args.reject_invalid_boxes);

  let output = Outputs(
    args
      .output
      .iter()
      .map(OutputWrapper::from_url)
      .collect::<Result<Vec<_>, _>>()?,
  );

  if args.oneshot {
    OneShotTask.run_task(input.into_pages(), analyzer, output)?;
  } else {
    BatchTask::default()
      .with_max_pages(args.max_pages)
      .run_task(input.into_pages(), analyzer, output)?;
  }

  Ok(())
}
