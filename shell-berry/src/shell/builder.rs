//! 由细胞核轮廓构建同心壳层.

use super::ShrinkPolicy;
use crate::consts::MAX_SHELL_COUNT;
use crate::error::ShellError;
use crate::geom::{trace_contours, Frame, Polygon};
use crate::{Idx2d, Idx2dI};
use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// 标签图中不属于任何壳层的像素.
pub const NO_SHELL: u16 = u16::MAX;

/// 一个壳层.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    index: usize,
    pixel_count: u64,
    boundaries: Vec<Vec<Idx2dI>>,
}

impl Shell {
    /// 序号. 0 为最外层.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 该层 (不含内层) 的像素个数.
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        self.pixel_count
    }

    /// 该层所围区域 (该层及所有内层) 的外轮廓像素, 以源图像坐标给出.
    ///
    /// 区域可能不连通, 因此可能有多条轮廓; 区域为空时没有轮廓.
    #[inline]
    pub fn boundaries(&self) -> &[Vec<Idx2dI>] {
        &self.boundaries
    }
}

/// 壳层划分结果: 每个像素的壳层标签, 以及各壳层的描述.
#[derive(Debug, Clone)]
pub struct ShellMap {
    frame: Frame,
    labels: Array2<u16>,
    shells: Vec<Shell>,
}

impl ShellMap {
    /// 标签图所在窗口.
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// 标签图. 不属于细胞核的像素为 [`NO_SHELL`].
    #[inline]
    pub fn labels(&self) -> ArrayView2<u16> {
        self.labels.view()
    }

    /// 所有壳层, 由外到内.
    #[inline]
    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// 源图像坐标下像素 `pos` 所在壳层.
    #[inline]
    pub fn label_at(&self, pos: Idx2dI) -> Option<usize> {
        let local = self.frame.to_local(pos)?;
        match self.labels[local] {
            NO_SHELL => None,
            l => Some(l as usize),
        }
    }

    /// 细胞核像素总数.
    pub fn pixel_count(&self) -> u64 {
        self.shells.iter().map(Shell::pixel_count).sum()
    }
}

/// 按照 `policy` 将 `outline` (源图像坐标) 划分为 `n` 层.
///
/// 像素中心位于轮廓内的像素构成细胞核. 策略给出每个像素的深度和每层所围区域的像素数;
/// 像素按深度降序, 再按到轮廓重心的距离升序排成全序, 第 `k` 层所围区域取该序列的前若干个像素.
/// 因此各层所围区域互相嵌套, 各层互不重叠且恰好覆盖整个细胞核.
///
/// # 注意
///
/// 如果 `n` 不在 `1..=MAX_SHELL_COUNT` 内, 则程序 panic.
pub fn build_shells<P: ShrinkPolicy + ?Sized>(
    policy: &P,
    outline: &Polygon,
    n: usize,
) -> Result<ShellMap, ShellError> {
    assert!(
        (1..=MAX_SHELL_COUNT).contains(&n),
        "壳层个数必须位于 1..={MAX_SHELL_COUNT}, 但得到了 {n}"
    );
    if outline.len() < 3 {
        return Err(ShellError::DegenerateOutline);
    }
    let bounds = outline.bounds().ok_or(ShellError::DegenerateOutline)?;
    let centroid = outline.centroid().unwrap_or((
        (bounds.min.0 + bounds.max.0) / 2.0,
        (bounds.min.1 + bounds.max.1) / 2.0,
    ));
    let frame = Frame::around(&bounds, 1);
    let mask = frame.rasterize(outline);
    let (oh, ow) = frame.origin();

    let mut order: Vec<Idx2d> = mask
        .indexed_iter()
        .filter_map(|(p, &fg)| fg.then_some(p))
        .collect();
    if order.is_empty() {
        return Err(ShellError::DegenerateOutline);
    }

    let plan = policy.plan(outline, &frame, mask.view(), n);
    debug_assert_eq!(plan.regions.len(), n - 1);
    debug_assert!(plan.regions.windows(2).all(|w| w[0] >= w[1]));

    let to_centroid = |(h, w): Idx2d| {
        (oh as f64 + h as f64 + 0.5 - centroid.0).hypot(ow as f64 + w as f64 + 0.5 - centroid.1)
    };
    order.sort_unstable_by_key(|&p| {
        (
            Reverse(OrderedFloat(plan.depth[p])),
            OrderedFloat(to_centroid(p)),
            p,
        )
    });

    let total = order.len();
    let mut counts = vec![0u64; n];
    let mut labels = Array2::from_elem(frame.shape(), NO_SHELL);
    for (rank, &p) in order.iter().enumerate() {
        let k = plan.regions.partition_point(|&c| rank < c);
        counts[k] += 1;
        labels[p] = k as u16;
    }
    debug_assert_eq!(counts.iter().sum::<u64>(), total as u64);

    let shells = (0..n)
        .map(|k| {
            let boundaries = if counts[k..].iter().all(|&c| c == 0) {
                Vec::new()
            } else {
                let region = labels.map(|&l| l != NO_SHELL && l as usize >= k);
                trace_contours(region.view())
                    .into_iter()
                    .map(|c| c.into_iter().map(|p| frame.to_global(p)).collect())
                    .collect()
            };
            Shell {
                index: k,
                pixel_count: counts[k],
                boundaries,
            }
        })
        .collect();
    log::trace!("Built {n} shells with pixel counts {counts:?}");

    Ok(ShellMap {
        frame,
        labels,
        shells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MINIMUM_AREA_PER_SHELL;
    use crate::shell::{AreaShrink, RadiusShrink};

    /// 半径 200 的 720 边形, 圆心 (201, 201).
    fn disc() -> Polygon {
        Polygon::circle((201.0, 201.0), 200.0, 720)
    }

    #[test]
    fn test_radius_regression_disc() {
        let map = RadiusShrink.build_shells(&disc(), 5).unwrap();
        let counts: Vec<u64> = map.shells().iter().map(Shell::pixel_count).collect();
        assert_eq!(counts, vec![44572, 35388, 24796, 15492, 5428]);
        assert_eq!(map.pixel_count(), 125676);
    }

    #[test]
    fn test_radius_boundaries_at_known_radii() {
        let map = RadiusShrink.build_shells(&disc(), 4).unwrap();
        // 第 k 层所围区域的外轮廓应接近半径 R * (n - k) / n 的圆.
        for shell in map.shells() {
            let expected = 200.0 * (4 - shell.index()) as f64 / 4.0;
            assert_eq!(shell.boundaries().len(), 1);
            for &(h, w) in &shell.boundaries()[0] {
                let r = (h as f64 + 0.5 - 201.0).hypot(w as f64 + 0.5 - 201.0);
                assert!((r - expected).abs() < 2.5, "shell {} r = {r}", shell.index());
            }
        }
    }

    #[test]
    fn test_partition_property() {
        let outlines = [
            disc(),
            Polygon::ellipse((60.3, 80.7), (40.0, 70.0), 200),
            Polygon::rectangle((3.0, 4.0), (53.0, 94.0)),
        ];
        for outline in &outlines {
            let f = Frame::around(&outline.bounds().unwrap(), 1);
            let total = f.rasterize(outline).iter().filter(|&&b| b).count() as u64;
            for n in 1..=7 {
                for map in [
                    RadiusShrink.build_shells(outline, n).unwrap(),
                    AreaShrink.build_shells(outline, n).unwrap(),
                ] {
                    assert_eq!(map.shells().len(), n);
                    assert_eq!(map.pixel_count(), total);
                    let labelled = map.labels().iter().filter(|&&l| l != NO_SHELL).count();
                    assert_eq!(labelled as u64, total);
                }
            }
        }
    }

    #[test]
    fn test_radius_monotone_decreasing() {
        let map = RadiusShrink.build_shells(&disc(), 8).unwrap();
        let counts: Vec<u64> = map.shells().iter().map(Shell::pixel_count).collect();
        assert!(counts.windows(2).all(|w| w[0] > w[1]), "{counts:?}");
    }

    #[test]
    fn test_radius_monotone_small_discs() {
        for center in [(60.0, 60.0), (60.3, 59.8), (61.5, 60.25)] {
            for r in [12.0, 15.0, 20.0, 30.0, 50.0] {
                let outline = Polygon::circle(center, r, 360);
                for n in [3, 5, 10] {
                    if outline.area() < MINIMUM_AREA_PER_SHELL * n as f64 {
                        continue;
                    }
                    let map = RadiusShrink.build_shells(&outline, n).unwrap();
                    let counts: Vec<u64> = map.shells().iter().map(Shell::pixel_count).collect();
                    assert!(
                        counts.windows(2).all(|w| w[0] > w[1]),
                        "center {center:?}, r = {r}, n = {n}: {counts:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_area_equal_within_tolerance() {
        let outlines = [
            disc(),
            Polygon::ellipse((60.3, 80.7), (40.0, 70.0), 200),
            Polygon::rectangle((0.0, 0.0), (40.0, 40.0)),
            Polygon::rectangle((3.0, 4.0), (53.0, 94.0)),
            Polygon::rectangle((10.2, 10.7), (30.9, 95.4)),
            Polygon::circle((60.0, 60.0), 15.0, 360),
        ];
        for outline in &outlines {
            for n in [2, 3, 5, 7, 10] {
                let map = AreaShrink.build_shells(outline, n).unwrap();
                let expected = map.pixel_count() as f64 / n as f64;
                for s in map.shells() {
                    let diff = (s.pixel_count() as f64 - expected).abs();
                    assert!(diff <= 1.0, "n = {n}, shell {}: {diff}", s.index());
                    assert!(diff / expected <= 0.05);
                }
            }
        }
    }

    #[test]
    fn test_area_rectangle_counts() {
        let map = AreaShrink
            .build_shells(&Polygon::rectangle((0.0, 0.0), (40.0, 40.0)), 5)
            .unwrap();
        let counts: Vec<u64> = map.shells().iter().map(Shell::pixel_count).collect();
        assert_eq!(counts, vec![320; 5]);
        // 最内层包含中心像素.
        assert_eq!(map.label_at((20, 20)), Some(4));
        assert_eq!(map.label_at((0, 0)), Some(0));
    }

    #[test]
    fn test_single_shell_is_whole_region() {
        let map = AreaShrink.build_shells(&disc(), 1).unwrap();
        assert_eq!(map.shells().len(), 1);
        assert_eq!(map.shells()[0].pixel_count(), 125676);
        assert_eq!(map.shells()[0].boundaries().len(), 1);
    }

    #[test]
    fn test_degenerate_outline() {
        let line = Polygon::new(vec![(0.0, 0.0), (5.0, 5.0)]);
        assert!(matches!(
            RadiusShrink.build_shells(&line, 3),
            Err(ShellError::DegenerateOutline)
        ));
        // 不覆盖任何像素中心的细长三角形.
        let thin = Polygon::new(vec![(0.0, 0.0), (0.2, 10.0), (0.1, 0.0)]);
        assert!(matches!(
            AreaShrink.build_shells(&thin, 2),
            Err(ShellError::DegenerateOutline)
        ));
    }

    #[test]
    fn test_label_lookup() {
        let map = RadiusShrink.build_shells(&disc(), 5).unwrap();
        assert_eq!(map.label_at((201, 201)), Some(4));
        assert_eq!(map.label_at((201, 2)), Some(0));
        assert_eq!(map.label_at((0, 0)), None);
        assert_eq!(map.label_at((-100, 5)), None);
    }

    #[test]
    #[should_panic]
    fn test_zero_shells_panics() {
        let _ = RadiusShrink.build_shells(&disc(), 0);
    }
}
