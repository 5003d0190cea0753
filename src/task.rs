// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/task.rs - 任务执行
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

use tracing::info;

use crate::{
  model::{Analyze, DetectResult, DetectSummary, WithLabel},
  output::Render,
};

pub trait Task<I, A, O>: Sized {
  type Error;
  /// 运行任务，返回所有已处理页面的汇总
  fn run_task(self, input: I, analyzer: A, output: O) -> Result<DetectSummary, Self::Error>;
}

fn log_summary(summary: &DetectSummary) {
  for class in summary.classes.iter().filter(|c| c.count > 0) {
    info!(
      "  - {}: {} 个, {:.2} m²",
      class.label, class.count, class.total_area
    );
  }
  info!("总计: {} 个, {:.2} m²", summary.count, summary.total_area);
}

/// 只处理第一页
pub struct OneShotTask;

impl<
  F,
  T: WithLabel,
  AE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  A: Analyze<F, Output = DetectResult<T>, Error = AE>,
  O: Render<F, DetectResult<T>, Error = RE>,
> Task<I, A, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, analyzer: A, output: O) -> Result<DetectSummary, Self::Error> {
    info!("开始任务...");
    let page = input.next().ok_or_else(|| anyhow::anyhow!("没有输入页面"))?;
    let now = std::time::Instant::now();
    let result = analyzer.analyze(&page)?;
    info!("处理完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&page, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    let summary = result.summary();
    log_summary(&summary);
    Ok(summary)
  }
}

/// 依次处理所有页面
#[derive(Default, Debug)]
pub struct BatchTask {
  max_pages: Option<usize>,
}

impl BatchTask {
  pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
    self.max_pages = max_pages;
    self
  }
}

impl<
  F,
  T: WithLabel,
  AE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  A: Analyze<F, Output = DetectResult<T>, Error = AE>,
  O: Render<F, DetectResult<T>, Error = RE>,
> Task<I, A, O> for BatchTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, analyzer: A, output: O) -> Result<DetectSummary, Self::Error> {
    info!("开始任务...");
    let mut summary = DetectSummary::default();
    let mut page_count = 0usize;
    let started = std::time::Instant::now();

    for page in input {
      if self.max_pages.is_some_and(|n| page_count >= n) {
        info!("达到指定页数 {}, 退出任务循环", page_count);
        break;
      }
      page_count += 1;

      let now = std::time::Instant::now();
      let result = analyzer.analyze(&page)?;
      let elapsed_a = now.elapsed();
      output.render_result(&page, &result)?;
      let elapsed_b = now.elapsed();
      info!("第 {} 页处理完成，耗时: {:.2?} / {:.2?}", page_count, elapsed_a, elapsed_b);

      summary.merge(&result.summary());
    }

    if page_count == 0 {
      return Err(anyhow::anyhow!("没有输入页面"));
    }

    info!("任务完成, 共 {} 页, 耗时: {:.2?}", page_count, started.elapsed());
    log_summary(&summary);
    Ok(summary)
  }
}
