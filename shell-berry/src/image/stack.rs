//! 多通道 8-bit 图像.

use crate::error::ImageImportError;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};
use std::path::{Path, PathBuf};

/// 多通道 8-bit 图像, 每个通道以 `(h, w)` 行优先的 `Array2<u8>` 存储.
///
/// 灰度图像只有一个通道, 其余图像统一转换为 RGB 三通道.
#[derive(Debug, Clone)]
pub struct ImageStack {
    path: PathBuf,
    channels: Vec<Array2<u8>>,
}

impl ImageStack {
    /// 从文件读取图像.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageImportError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| ImageImportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let (w, h) = (img.width() as usize, img.height() as usize);

        let channels = if img.color().channel_count() <= 2 {
            let luma = img.to_luma8();
            vec![Array2::from_shape_fn((h, w), |(y, x)| {
                luma.get_pixel(x as u32, y as u32)[0]
            })]
        } else {
            let rgb = img.to_rgb8();
            (0..3)
                .map(|c| {
                    Array2::from_shape_fn((h, w), |(y, x)| rgb.get_pixel(x as u32, y as u32)[c])
                })
                .collect()
        };
        log::debug!("Loaded `{}`: {h}x{w}, {} channel(s)", path.display(), channels.len());
        Ok(Self {
            path: path.to_path_buf(),
            channels,
        })
    }

    /// 由内存中的通道数据创建图像. `path` 仅用作标识.
    ///
    /// 如果 `channels` 为空, 或各通道形状不一致, 则程序 panic.
    pub fn from_channels<P: AsRef<Path>>(path: P, channels: Vec<Array2<u8>>) -> Self {
        assert!(!channels.is_empty(), "图像至少需要一个通道");
        let shape = channels[0].dim();
        assert!(
            channels.iter().all(|c| c.dim() == shape),
            "所有通道形状必须一致"
        );
        Self {
            path: path.as_ref().to_path_buf(),
            channels,
        }
    }

    /// 图像路径 (或内存图像的标识).
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 图像形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.channels[0].dim()
    }

    /// 通道个数.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 获取第 `channel` 个通道.
    pub fn channel(&self, channel: usize) -> Result<ArrayView2<u8>, ImageImportError> {
        self.channels
            .get(channel)
            .map(|c| c.view())
            .ok_or_else(|| ImageImportError::MissingChannel {
                path: self.path.clone(),
                channel,
                channels: self.channels.len(),
            })
    }
}
