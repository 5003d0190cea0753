// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use planscan::{
  nms::{DEFAULT_IOU_THRESHOLD, DEFAULT_OVERLAP_RATIO_THRESHOLD, DEFAULT_TOLERANCE, NmsConfig},
  pipeline::DEFAULT_CONFIDENCE_THRESHOLD,
  scale::{
    DEFAULT_DPI, DEFAULT_FORMAT_HEIGHT_MM, DEFAULT_FORMAT_WIDTH_MM, DEFAULT_PLAN_SCALE,
    FormatSize, PlanGeometry,
  },
};

/// Planscan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果来源，例如 detections:///data/pages.json
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径，可重复指定
  /// 支持格式:
  /// - JSON 报告: json:///out/report.json
  /// - 目录记录: folder:///out/records?record=id&always&draw
  /// - 标注图像: image:///out/plan.png?single
  #[arg(long, value_name = "OUTPUT", required = true)]
  pub output: Vec<Url>,

  /// 图纸宽度（毫米）
  #[arg(long, default_value_t = DEFAULT_FORMAT_WIDTH_MM, value_name = "MM")]
  pub format_width: f32,

  /// 图纸高度（毫米）
  #[arg(long, default_value_t = DEFAULT_FORMAT_HEIGHT_MM, value_name = "MM")]
  pub format_height: f32,

  /// 扫描分辨率
  #[arg(long, default_value_t = DEFAULT_DPI, value_name = "DPI")]
  pub dpi: f32,

  /// 图纸比例尺分母，1:100 即为 100
  #[arg(long, default_value_t = DEFAULT_PLAN_SCALE, value_name = "SCALE")]
  pub plan_scale: f32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IoU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou_threshold: f32,

  /// 重叠部分占较小框面积的比例阈值
  #[arg(long, default_value_t = DEFAULT_OVERLAP_RATIO_THRESHOLD, value_name = "RATIO")]
  pub overlap_ratio: f32,

  /// 包含判断的容差（像素）
  #[arg(long, default_value_t = DEFAULT_TOLERANCE, value_name = "PIXELS")]
  pub tolerance: f32,

  /// 丢弃坐标倒置或非有限的检测框
  #[arg(long)]
  pub reject_invalid_boxes: bool,

  /// 最多处理的页数
  #[arg(long, value_name = "COUNT")]
  pub max_pages: Option<usize>,

  /// 只处理第一页
  #[arg(long)]
  pub oneshot: bool,
}

impl Args {
  pub fn geometry(&self) -> PlanGeometry {
    PlanGeometry {
      format_size: FormatSize {
        width_mm: self.format_width,
        height_mm: self.format_height,
      },
      dpi: self.dpi,
      plan_scale: self.plan_scale,
    }
  }

  pub fn nms(&self) -> NmsConfig {
    NmsConfig {
      iou_threshold: self.iou_threshold,
      overlap_ratio_threshold: self.overlap_ratio,
      tolerance: self.tolerance,
    }
  }
}
