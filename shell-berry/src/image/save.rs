//! 图像的持久化存储.

use super::ImageStack;
use crate::consts::color;
use crate::error::ImageImportError;
use crate::Idx2dI;
use image::{ImageResult, Rgb, RgbImage};
use ndarray::ArrayView2;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 单通道图像叠加壳层边界.
///
/// 底图为灰度显示的指定通道; 最外层 (即细胞核轮廓) 以青色绘制,
/// 内层壳层边界以黄色绘制. 超出图像范围的边界像素被忽略.
#[derive(Debug, Clone)]
pub struct ShellOverlay<'a> {
    base: ArrayView2<'a, u8>,
    boundaries: Vec<Vec<Vec<Idx2dI>>>,
}

impl<'a> ShellOverlay<'a> {
    /// 以 `stack` 的第 `channel` 个通道为底图. `boundaries[i]` 为第 `i` 层的所有轮廓.
    pub fn new(
        stack: &'a ImageStack,
        channel: usize,
        boundaries: Vec<Vec<Vec<Idx2dI>>>,
    ) -> Result<Self, ImageImportError> {
        Ok(Self {
            base: stack.channel(channel)?,
            boundaries,
        })
    }

    /// 渲染为 RGB 图像.
    pub fn render(&self) -> RgbImage {
        let (height, width) = self.base.dim();
        let mut buf = RgbImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.base.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, Rgb([pix, pix, pix]));
        }

        // 先画内层, 使最外层轮廓不被覆盖.
        for (index, shell) in self.boundaries.iter().enumerate().rev() {
            let c = if index == 0 {
                color::NUCLEUS_OUTLINE
            } else {
                color::SHELL_BOUNDARY
            };
            for &(h, w) in shell.iter().flatten() {
                if (0..height as i64).contains(&h) && (0..width as i64).contains(&w) {
                    buf.put_pixel(w as u32, h as u32, Rgb(c));
                }
            }
        }
        buf
    }
}

impl ImgWriteVis for ShellOverlay<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.render().save(path)
    }
}
