// 该文件是 Planscan （图纸量算） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::{
  geometry::BBox,
  model::{DetectResult, WithLabel},
  output::SaveImageFileError,
};

const BOX_THICKNESS: i32 = 2;

/// 各类别的边框颜色，下标为类别编号
const LABEL_COLORS: [[u8; 3]; 6] = [
  [0, 0, 0],       // 其他 - 黑
  [0, 0, 255],     // 窗户 - 蓝
  [255, 0, 0],     // 门 - 红
  [212, 214, 56],  // 墙 - 黄
  [255, 165, 0],   // 老虎窗 - 橙
  [128, 0, 128],   // 屋顶 - 紫
];

pub struct Draw {
  thickness: i32,
  colors: Vec<Rgb<u8>>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      thickness: BOX_THICKNESS,
      colors: LABEL_COLORS.iter().map(|&c| Rgb(c)).collect(),
    }
  }
}

impl Draw {
  pub fn color_of<T: WithLabel>(&self, kind: &T) -> Rgb<u8> {
    self
      .colors
      .get(kind.to_label_id() as usize)
      .copied()
      .unwrap_or(self.colors[0])
  }

  /// 在图像上绘制一个像素坐标的矩形边框，超出图像的部分被裁掉
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &BBox, color: Rgb<u8>) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let x_min = (bbox.x_min.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.y_min.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.x_max.ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.y_max.ceil() as i32).clamp(0, h - 1);

    for t in 0..self.thickness {
      let width = x_max - x_min - 2 * t + 1;
      let height = y_max - y_min - 2 * t + 1;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, color);
    }
  }

  pub fn draw_detections_on_image<T: WithLabel>(
    &self,
    image: &mut RgbImage,
    result: &DetectResult<T>,
  ) {
    for item in result.items.iter() {
      if !item.bbox.is_valid() {
        continue;
      }
      self.draw_bbox(image, &item.bbox, self.color_of(&item.kind));
    }
  }

  /// 读取页面图像并绘制检测结果
  pub fn draw_page<T: WithLabel>(
    &self,
    path: &Path,
    result: &DetectResult<T>,
  ) -> Result<RgbImage, SaveImageFileError> {
    let mut image = image::open(path)
      .map_err(SaveImageFileError::ImageError)?
      .to_rgb8();
    self.draw_detections_on_image(&mut image, result);
    Ok(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{DetectItem, PlanLabel};

  #[test]
  fn draws_class_colored_border() {
    let mut image = RgbImage::new(20, 20);
    let result = DetectResult {
      items: vec![DetectItem {
        kind: PlanLabel::Door,
        score: 0.9,
        bbox: BBox::new(2.0, 2.0, 12.0, 12.0),
        area: 1.0,
      }]
      .into_boxed_slice(),
    };
    Draw::default().draw_detections_on_image(&mut image, &result);

    assert_eq!(*image.get_pixel(2, 2), Rgb([255, 0, 0]));
    assert_eq!(*image.get_pixel(12, 7), Rgb([255, 0, 0]));
    assert_eq!(*image.get_pixel(3, 3), Rgb([255, 0, 0]));
    assert_eq!(*image.get_pixel(7, 7), Rgb([0, 0, 0]));
    assert_eq!(*image.get_pixel(15, 15), Rgb([0, 0, 0]));
  }

  #[test]
  fn boxes_outside_image_are_clipped() {
    let mut image = RgbImage::new(10, 10);
    let result = DetectResult {
      items: vec![DetectItem {
        kind: PlanLabel::Window,
        score: 0.9,
        bbox: BBox::new(-5.0, -5.0, 50.0, 50.0),
        area: 1.0,
      }]
      .into_boxed_slice(),
    };
    Draw::default().draw_detections_on_image(&mut image, &result);
    assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 255]));
    assert_eq!(*image.get_pixel(9, 9), Rgb([0, 0, 255]));
  }

  #[test]
  fn unknown_label_uses_default_color() {
    let draw = Draw::default();
    assert_eq!(draw.color_of(&PlanLabel::Other), Rgb([0, 0, 0]));
    assert_eq!(draw.color_of(&PlanLabel::Roof), Rgb([128, 0, 128]));
  }
}
