//! 壳层收缩策略.

use super::builder::{build_shells, ShellMap};
use super::ShrinkType;
use crate::consts::{FINE_SAMPLES, FINE_SHELL_WIDTH, WHOLE_PIXEL_SHELL_WIDTH};
use crate::error::ShellError;
use crate::geom::{DistanceMap, Frame, Polygon};
use ndarray::{Array2, ArrayView2, Zip};

/// 策略给出的划分方案.
///
/// 前景像素按深度降序排成全序 (深度相同时离重心近者在前), 第 `k` 层 (`k >= 1`)
/// 所围区域为该序列的前 `regions[k - 1]` 个像素; 第 0 层所围区域为整个细胞核.
#[derive(Debug, Clone)]
pub struct ShellPlan {
    /// 每个像素的深度. 背景像素的值无意义.
    pub depth: Array2<f64>,
    /// 第 `1..n` 层所围区域的像素数, 单调不增.
    pub regions: Vec<usize>,
}

/// 壳层收缩策略.
///
/// 策略决定 "腐蚀深度" 如何度量, 以及每层所围区域包含多少像素.
pub trait ShrinkPolicy: Sync {
    /// 为 `frame` 内的前景 `mask` (由 `outline` 栅格化得到) 制定 `n` 层划分方案.
    ///
    /// `mask` 至少包含一个前景像素.
    fn plan(
        &self,
        outline: &Polygon,
        frame: &Frame,
        mask: ArrayView2<bool>,
        n: usize,
    ) -> ShellPlan;

    /// 将 `outline` 划分为 `n` 层.
    fn build_shells(&self, outline: &Polygon, n: usize) -> Result<ShellMap, ShellError> {
        build_shells(self, outline, n)
    }
}

/// 等半径收缩: 每层的径向宽度相同.
///
/// 层宽不小于 [`WHOLE_PIXEL_SHELL_WIDTH`] 时按整像素剥离: 深度为 `round(edm) - 1`,
/// 第 `k` 层阈值为 `floor(k * peel / n)`, 其中 `peel = round(max edm) - 1`.
/// 更窄时深度取像素中心到轮廓的精确距离 `d`, 阈值为 `k * max d / n`;
/// 层宽小于 [`FINE_SHELL_WIDTH`] 时以亚像素采样估计每个区域所占比例.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadiusShrink;

impl ShrinkPolicy for RadiusShrink {
    fn plan(
        &self,
        outline: &Polygon,
        frame: &Frame,
        mask: ArrayView2<bool>,
        n: usize,
    ) -> ShellPlan {
        let edm = DistanceMap::new(mask);
        let peel = edm.max().round() - 1.0;
        if peel / n as f64 >= WHOLE_PIXEL_SHELL_WIDTH {
            let depth = edm.view().mapv(|d| d.round() - 1.0);
            let peel = peel as usize;
            let regions = (1..n)
                .map(|k| count_at_least(&depth, mask, (k * peel / n) as f64))
                .collect();
            return ShellPlan { depth, regions };
        }

        let (oh, ow) = frame.origin();
        let depth = Array2::from_shape_fn(frame.shape(), |(h, w)| {
            if mask[(h, w)] {
                let center = (oh as f64 + h as f64 + 0.5, ow as f64 + w as f64 + 0.5);
                outline.boundary_distance(center)
            } else {
                0.0
            }
        });
        let max = Zip::from(&depth)
            .and(mask)
            .fold(0.0f64, |m, &d, &fg| if fg { m.max(d) } else { m });
        let thresholds: Vec<f64> = (1..n).map(|k| k as f64 * max / n as f64).collect();

        let regions = if max / n as f64 >= FINE_SHELL_WIDTH {
            thresholds
                .iter()
                .map(|&t| count_at_least(&depth, mask, t))
                .collect()
        } else {
            let total = mask.iter().filter(|&&fg| fg).count();
            let samples = fine_depths(outline, frame);
            if samples.is_empty() {
                thresholds
                    .iter()
                    .map(|&t| count_at_least(&depth, mask, t))
                    .collect()
            } else {
                thresholds
                    .iter()
                    .map(|&t| {
                        let inner = samples.iter().filter(|&&d| d >= t).count();
                        (total as f64 * inner as f64 / samples.len() as f64).round() as usize
                    })
                    .collect()
            }
        };
        ShellPlan { depth, regions }
    }
}

/// 等面积收缩: 深度为原始距离, 第 `k` 层所围区域恰含 `round((n - k) / n * total)` 个像素.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaShrink;

impl ShrinkPolicy for AreaShrink {
    fn plan(&self, _: &Polygon, _: &Frame, mask: ArrayView2<bool>, n: usize) -> ShellPlan {
        let depth = DistanceMap::new(mask).view().to_owned();
        let total = mask.iter().filter(|&&fg| fg).count() as f64;
        let regions = (1..n)
            .map(|k| ((n - k) as f64 / n as f64 * total).round() as usize)
            .collect();
        ShellPlan { depth, regions }
    }
}

/// 深度不小于 `t` 的前景像素数.
fn count_at_least(depth: &Array2<f64>, mask: ArrayView2<bool>, t: f64) -> usize {
    Zip::from(depth)
        .and(mask)
        .fold(0, |c, &d, &fg| if fg && d >= t { c + 1 } else { c })
}

/// 窗口内每个像素取 `FINE_SAMPLES × FINE_SAMPLES` 个采样点, 返回落在轮廓内的采样点到轮廓的距离.
fn fine_depths(outline: &Polygon, frame: &Frame) -> Vec<f64> {
    let (oh, ow) = frame.origin();
    let (height, width) = frame.shape();
    let step = 1.0 / FINE_SAMPLES as f64;
    let mut out = Vec::new();
    for h in 0..height {
        for w in 0..width {
            for i in 0..FINE_SAMPLES {
                for j in 0..FINE_SAMPLES {
                    let p = (
                        (oh + h as i64) as f64 + (i as f64 + 0.5) * step,
                        (ow + w as i64) as f64 + (j as f64 + 0.5) * step,
                    );
                    if outline.contains(p) {
                        out.push(outline.boundary_distance(p));
                    }
                }
            }
        }
    }
    out
}

impl ShrinkType {
    /// 对应的收缩策略.
    pub fn policy(&self) -> &'static dyn ShrinkPolicy {
        match self {
            ShrinkType::Area => &AreaShrink,
            ShrinkType::Radius => &RadiusShrink,
        }
    }
}
