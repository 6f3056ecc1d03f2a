//! 原图坐标系中的矩形像素窗口.

use super::{Bounds, Polygon};
use crate::{Idx2d, Idx2dI};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 原图坐标系中的一个矩形像素窗口. 局部索引 `(0, 0)` 对应原图 `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    origin: Idx2dI,
    shape: Idx2d,
}

impl Frame {
    /// 以 `origin` 为原点, `shape` 为形状创建窗口.
    #[inline]
    pub fn new(origin: Idx2dI, shape: Idx2d) -> Self {
        Self { origin, shape }
    }

    /// 创建恰好覆盖 `bounds` 所有像素, 且四周额外留出 `margin` 个像素的窗口.
    pub fn around(bounds: &Bounds, margin: usize) -> Self {
        let m = margin as i64;
        let h0 = bounds.min.0.floor() as i64 - m;
        let w0 = bounds.min.1.floor() as i64 - m;
        let h1 = bounds.max.0.ceil() as i64 + m;
        let w1 = bounds.max.1.ceil() as i64 + m;
        Self {
            origin: (h0, w0),
            shape: ((h1 - h0).max(0) as usize, (w1 - w0).max(0) as usize),
        }
    }

    /// 原点.
    #[inline]
    pub fn origin(&self) -> Idx2dI {
        self.origin
    }

    /// 形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.shape
    }

    /// 原图坐标转换为局部坐标. 位于窗口之外时返回 `None`.
    #[inline]
    pub fn to_local(&self, (h, w): Idx2dI) -> Option<Idx2d> {
        let lh = h - self.origin.0;
        let lw = w - self.origin.1;
        if lh < 0 || lw < 0 || lh >= self.shape.0 as i64 || lw >= self.shape.1 as i64 {
            None
        } else {
            Some((lh as usize, lw as usize))
        }
    }

    /// 局部坐标转换为原图坐标.
    #[inline]
    pub fn to_global(&self, (h, w): Idx2d) -> Idx2dI {
        (self.origin.0 + h as i64, self.origin.1 + w as i64)
    }

    /// 扫描线栅格化. 像素中心位于 `polygon` 内部时为 `true`.
    ///
    /// `polygon` 以原图坐标给出.
    pub fn rasterize(&self, polygon: &Polygon) -> Array2<bool> {
        let mut mask = Array2::from_elem(self.shape, false);
        let width = self.shape.1 as i64;
        for (lh, mut row) in mask.outer_iter_mut().enumerate() {
            let y = (self.origin.0 + lh as i64) as f64 + 0.5;
            for (a, b) in polygon.crossings(y).chunks_exact(2).map(|c| (c[0], c[1])) {
                // 像素中心 w + 0.5 落在 [a, b) 内.
                let lo = ((a - 0.5).ceil() as i64 - self.origin.1).clamp(0, width);
                let hi = ((b - 0.5).ceil() as i64 - self.origin.1).clamp(0, width);
                for lw in lo..hi {
                    row[lw as usize] = true;
                }
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around_and_convert() {
        let b = Bounds {
            min: (2.3, 4.0),
            max: (7.9, 9.5),
        };
        let f = Frame::around(&b, 1);
        assert_eq!(f.origin(), (1, 3));
        assert_eq!(f.shape(), (8, 8));
        assert_eq!(f.to_local((1, 3)), Some((0, 0)));
        assert_eq!(f.to_local((0, 3)), None);
        assert_eq!(f.to_local((9, 10)), None);
        assert_eq!(f.to_global((2, 2)), (3, 5));
    }

    #[test]
    fn test_rasterize_rectangle() {
        let r = Polygon::rectangle((2.0, 3.0), (5.0, 7.0));
        let f = Frame::around(&r.bounds().unwrap(), 1);
        let mask = f.rasterize(&r);
        assert_eq!(mask.iter().filter(|&&b| b).count(), 12);
        assert!(mask[f.to_local((2, 3)).unwrap()]);
        assert!(mask[f.to_local((4, 6)).unwrap()]);
        assert!(!mask[f.to_local((5, 6)).unwrap()]);
        assert!(!mask[f.to_local((4, 7)).unwrap()]);
    }

    #[test]
    fn test_rasterize_agrees_with_contains() {
        let c = Polygon::ellipse((30.2, 40.7), (12.3, 20.1), 97);
        let f = Frame::around(&c.bounds().unwrap(), 2);
        let mask = f.rasterize(&c);
        for ((lh, lw), &inside) in mask.indexed_iter() {
            let (h, w) = f.to_global((lh, lw));
            assert_eq!(inside, c.contains((h as f64 + 0.5, w as f64 + 0.5)));
        }
    }
}
