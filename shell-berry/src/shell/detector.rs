//! 单个细胞核的壳层检测器.

use super::{ShellMap, ShrinkType, NO_SHELL};
use crate::component::Component;
use crate::consts::{MINIMUM_AREA_PER_SHELL, MINIMUM_CIRCULARITY};
use crate::error::{ImageImportError, ShellError};
use crate::geom::{Frame, Polygon};
use crate::image::{ImageCache, ImageStack, ShellOverlay};
use crate::{Idx2dF, Idx2dI};
use ndarray::ArrayView2;

/// 持有一个细胞核的壳层划分, 回答 "点位于哪一层" 与 "区域在各层的像素强度和".
///
/// 构造时即完成全部壳层计算, 之后只读.
#[derive(Debug, Clone)]
pub struct ShellDetector {
    outline: Polygon,
    shrink_type: ShrinkType,
    map: ShellMap,
}

impl ShellDetector {
    /// 为 `nucleus` 构建 `shell_count` 层壳层.
    ///
    /// # 返回值
    ///
    /// 1. 面积小于 `MINIMUM_AREA_PER_SHELL * shell_count` 时返回 `ShellError::TooSmall`;
    /// 2. 圆度小于 `MINIMUM_CIRCULARITY` 时返回 `ShellError::TooIrregular`;
    /// 3. 轮廓不覆盖任何像素时返回 `ShellError::DegenerateOutline`.
    ///
    /// # 注意
    ///
    /// 如果 `shell_count` 不在 `1..=MAX_SHELL_COUNT` 内, 则程序 panic.
    pub fn new(
        nucleus: &Component,
        shell_count: usize,
        shrink_type: ShrinkType,
    ) -> Result<Self, ShellError> {
        Self::from_outline(nucleus.original_outline(), shell_count, shrink_type)
    }

    /// 以源图像坐标下的轮廓构建. 参见 [`Self::new`].
    pub fn from_outline(
        outline: Polygon,
        shell_count: usize,
        shrink_type: ShrinkType,
    ) -> Result<Self, ShellError> {
        let area = outline.area();
        let minimum = MINIMUM_AREA_PER_SHELL * shell_count as f64;
        if area < minimum {
            return Err(ShellError::TooSmall { area, minimum });
        }
        let circularity = outline.circularity();
        if circularity < MINIMUM_CIRCULARITY {
            return Err(ShellError::TooIrregular {
                circularity,
                minimum: MINIMUM_CIRCULARITY,
            });
        }
        if log::log_enabled!(log::Level::Debug) && !outline.is_simple() {
            log::debug!("Nucleus outline is self-intersecting, using the even-odd interior");
        }

        let map = shrink_type.policy().build_shells(&outline, shell_count)?;
        Ok(Self {
            outline,
            shrink_type,
            map,
        })
    }

    /// 壳层个数.
    #[inline]
    pub fn shell_count(&self) -> usize {
        self.map.shells().len()
    }

    /// 收缩策略.
    #[inline]
    pub fn shrink_type(&self) -> ShrinkType {
        self.shrink_type
    }

    /// 源图像坐标下的细胞核轮廓.
    #[inline]
    pub fn outline(&self) -> &Polygon {
        &self.outline
    }

    /// 壳层划分.
    #[inline]
    pub fn map(&self) -> &ShellMap {
        &self.map
    }

    /// 源图像坐标下点 `(h, w)` 所在的壳层.
    ///
    /// # 返回值
    ///
    /// 1. 点不在细胞核轮廓内时返回 `None`;
    /// 2. 点恰好落在像素边上时, 取相邻像素中最外的一层;
    /// 3. 点在轮廓内但所在像素的中心在轮廓外时, 归为第 0 层.
    pub fn find_shell(&self, (h, w): Idx2dF) -> Option<usize> {
        if !self.outline.contains((h, w)) {
            return None;
        }
        #[inline]
        fn cover(x: f64) -> [i64; 2] {
            let f = x.floor() as i64;
            if x == x.floor() {
                [f - 1, f]
            } else {
                [f, f]
            }
        }
        let [h0, h1] = cover(h);
        let [w0, w1] = cover(w);
        [(h0, w0), (h0, w1), (h1, w0), (h1, w1)]
            .into_iter()
            .filter_map(|p| self.map.label_at(p))
            .min()
            .or(Some(0))
    }

    /// 各层像素个数.
    pub fn find_pixel_counts(&self) -> Vec<u64> {
        self.map.shells().iter().map(|s| s.pixel_count()).collect()
    }

    /// `component` 的像素在各层中的个数. 位于细胞核之外的像素被忽略.
    pub fn find_component_pixel_counts(&self, component: &Component) -> Vec<u64> {
        self.accumulate(component_pixels(component), |_| 1)
    }

    /// 以 `stack` 的第 `channel` 个通道, 求 `component` 的像素在各层中的强度和.
    pub fn find_pixel_intensities_in(
        &self,
        component: &Component,
        stack: &ImageStack,
        channel: usize,
    ) -> Result<Vec<u64>, ImageImportError> {
        let img = stack.channel(channel)?;
        Ok(self.accumulate(component_pixels(component), |p| intensity(&img, p)))
    }

    /// 以 `component` 自身的源图像与通道, 求其像素在各层中的强度和.
    pub fn find_pixel_intensities(
        &self,
        component: &Component,
        cache: &ImageCache,
    ) -> Result<Vec<u64>, ImageImportError> {
        let stack = cache.get(component.source())?;
        self.find_pixel_intensities_in(component, &stack, component.channel())
    }

    /// 以 `stack` 的第 `channel` 个通道, 求整个细胞核在各层中的强度和.
    ///
    /// 用于信号位于单独导入的图像文件中的情形.
    pub fn find_shell_intensities(
        &self,
        stack: &ImageStack,
        channel: usize,
    ) -> Result<Vec<u64>, ImageImportError> {
        let img = stack.channel(channel)?;
        let frame = self.map.frame();
        let mut ans = vec![0u64; self.shell_count()];
        for (p, &l) in self.map.labels().indexed_iter() {
            if l != NO_SHELL {
                ans[l as usize] += intensity(&img, frame.to_global(p));
            }
        }
        Ok(ans)
    }

    /// 以 `stack` 的第 `channel` 个通道为底图, 叠加壳层边界.
    pub fn overlay<'a>(
        &self,
        stack: &'a ImageStack,
        channel: usize,
    ) -> Result<ShellOverlay<'a>, ImageImportError> {
        let boundaries = self
            .map
            .shells()
            .iter()
            .map(|s| s.boundaries().to_vec())
            .collect();
        ShellOverlay::new(stack, channel, boundaries)
    }

    fn accumulate<I, F>(&self, pixels: I, mut value: F) -> Vec<u64>
    where
        I: IntoIterator<Item = Idx2dI>,
        F: FnMut(Idx2dI) -> u64,
    {
        let mut ans = vec![0u64; self.shell_count()];
        for p in pixels {
            if let Some(k) = self.map.label_at(p) {
                ans[k] += value(p);
            }
        }
        ans
    }
}

/// 源图像坐标下 `component` 覆盖的所有像素.
fn component_pixels(component: &Component) -> Vec<Idx2dI> {
    let outline = component.original_outline();
    let Some(bounds) = outline.bounds() else {
        return Vec::new();
    };
    let frame = Frame::around(&bounds, 0);
    frame
        .rasterize(&outline)
        .indexed_iter()
        .filter(|(_, &inside)| inside)
        .map(|(p, _)| frame.to_global(p))
        .collect()
}

/// 图像之外的像素强度视为 0.
#[inline]
fn intensity(img: &ArrayView2<u8>, (h, w): Idx2dI) -> u64 {
    if h < 0 || w < 0 {
        return 0;
    }
    img.get((h as usize, w as usize)).map_or(0, |&v| u64::from(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::PosIter;
    use ndarray::Array2;

    fn disc_nucleus() -> Component {
        Component::new(Polygon::circle((201.0, 201.0), 200.0, 720), "disc.png", 0)
    }

    fn constant_stack(value: u8) -> ImageStack {
        ImageStack::from_channels("disc.png", vec![Array2::from_elem((404, 404), value)])
    }

    #[test]
    fn test_uniform_disc_intensities() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 5, ShrinkType::Radius).unwrap();
        let counts = [44572u64, 35388, 24796, 15492, 5428];
        assert_eq!(d.find_pixel_counts(), counts);

        let stack = constant_stack(255);
        let expected: Vec<u64> = counts.iter().map(|c| c * 255).collect();
        assert_eq!(d.find_pixel_intensities_in(&n, &stack, 0).unwrap(), expected);
        assert_eq!(d.find_shell_intensities(&stack, 0).unwrap(), expected);
        assert!(expected.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_intensities_idempotent() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 4, ShrinkType::Area).unwrap();
        let stack = ImageStack::from_channels(
            "g.png",
            vec![Array2::from_shape_fn((404, 404), |(h, w)| ((h * 7 + w * 3) % 256) as u8)],
        );
        let a = d.find_pixel_intensities_in(&n, &stack, 0).unwrap();
        let b = d.find_pixel_intensities_in(&n, &stack, 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_find_shell_inside_and_outside() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 5, ShrinkType::Radius).unwrap();
        let outline = n.original_outline();
        for (h, w) in PosIter::new((404, 404)) {
            let p = (h as f64 + 0.5, w as f64 + 0.5);
            match d.find_shell(p) {
                Some(k) => {
                    assert!(k < 5);
                    assert!(outline.contains(p));
                }
                None => assert!(!outline.contains(p)),
            }
        }
        assert_eq!(d.find_shell((201.0, 201.0)), Some(4));
        assert_eq!(d.find_shell((201.3, 2.2)), Some(0));
        assert_eq!(d.find_shell((0.5, 0.5)), None);
        assert_eq!(d.find_shell((-5.0, 900.0)), None);
    }

    #[test]
    fn test_find_shell_edge_goes_outward() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 5, ShrinkType::Radius).unwrap();
        let map = d.map();
        // 寻找水平相邻且标签不同的两个像素, 其公共边上的点应归于外层.
        let (h, w) = PosIter::new((402, 401))
            .map(|(h, w)| (h as i64, w as i64))
            .find(|&(h, w)| {
                matches!(
                    (map.label_at((h, w)), map.label_at((h, w + 1))),
                    (Some(a), Some(b)) if a == 1 && b == 2
                )
            })
            .unwrap();
        assert_eq!(d.find_shell((h as f64 + 0.5, (w + 1) as f64)), Some(1));
    }

    #[test]
    fn test_signal_component() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 5, ShrinkType::Radius).unwrap();
        // 圆心附近的小方块只落在最内层.
        let sig = Component::new(Polygon::rectangle((196.0, 196.0), (206.0, 206.0)), "s.png", 0);
        let counts = d.find_component_pixel_counts(&sig);
        assert_eq!(counts, vec![0, 0, 0, 0, 100]);

        let stack = ImageStack::from_channels("s.png", vec![Array2::from_elem((404, 404), 3u8)]);
        assert_eq!(
            d.find_pixel_intensities_in(&sig, &stack, 0).unwrap(),
            vec![0, 0, 0, 0, 300]
        );
        assert!(d.find_pixel_intensities_in(&sig, &stack, 1).is_err());
    }

    #[test]
    fn test_partially_outside_component() {
        let n = Component::new(Polygon::rectangle((0.0, 0.0), (40.0, 40.0)), "r.png", 0);
        let d = ShellDetector::new(&n, 2, ShrinkType::Area).unwrap();
        let sig = Component::new(Polygon::rectangle((30.0, 30.0), (50.0, 50.0)), "r.png", 0);
        let counts = d.find_component_pixel_counts(&sig);
        assert_eq!(counts.iter().sum::<u64>(), 100);
    }

    #[test]
    fn test_rejects_small_and_irregular() {
        let tiny = Component::new(Polygon::circle((10.0, 10.0), 5.0, 60), "t.png", 0);
        assert!(matches!(
            ShellDetector::new(&tiny, 5, ShrinkType::Area),
            Err(ShellError::TooSmall { .. })
        ));
        let sliver = Component::new(Polygon::rectangle((0.0, 0.0), (2.0, 2000.0)), "t.png", 0);
        assert!(matches!(
            ShellDetector::new(&sliver, 5, ShrinkType::Area),
            Err(ShellError::TooIrregular { .. })
        ));
    }

    #[test]
    fn test_cache_backed_intensities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.png");
        image::GrayImage::from_pixel(60, 60, image::Luma([2])).save(&path).unwrap();

        let n = Component::new(Polygon::rectangle((10.0, 10.0), (50.0, 50.0)), &path, 0);
        let d = ShellDetector::new(&n, 3, ShrinkType::Area).unwrap();
        let cache = ImageCache::new();
        let v = d.find_pixel_intensities(&n, &cache).unwrap();
        assert_eq!(v.iter().sum::<u64>(), 2 * 1600);

        let missing = Component::new(n.original_outline(), dir.path().join("x.png"), 0);
        assert!(d.find_pixel_intensities(&missing, &cache).is_err());
    }

    #[test]
    fn test_overlay_has_all_shells() {
        let n = disc_nucleus();
        let d = ShellDetector::new(&n, 3, ShrinkType::Radius).unwrap();
        let stack = constant_stack(0);
        let img = d.overlay(&stack, 0).unwrap().render();
        let colored = img.pixels().filter(|p| p.0 != [0, 0, 0]).count();
        let boundary: usize = d
            .map()
            .shells()
            .iter()
            .flat_map(|s| s.boundaries())
            .map(Vec::len)
            .sum();
        assert!(colored > 0 && colored <= boundary);
    }
}
