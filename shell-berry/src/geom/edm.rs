//! 欧氏距离变换.

use crate::Idx2d;
use ndarray::{Array2, ArrayView2, Axis};

/// 足够大的有限值. 不能用 `f64::INFINITY`, 否则抛物线交点计算中会出现 `inf - inf`.
const FAR: f64 = 1e20;

/// 精确欧氏距离图.
///
/// 前景像素的值为其中心到最近背景像素中心的距离, 背景像素为 0.
///
/// # 注意
///
/// 窗口之外不被视为背景. 调用者需保证前景四周至少留有一圈背景像素
/// (参见 `Frame::around` 的 `margin` 参数).
#[derive(Debug, Clone)]
pub struct DistanceMap {
    dist: Array2<f64>,
}

impl DistanceMap {
    /// 对二值掩膜 `mask` 计算距离图. `true` 为前景.
    ///
    /// 使用 Felzenszwalb-Huttenlocher 的可分离下包络算法, 先逐列后逐行, 复杂度 `O(hw)`.
    pub fn new(mask: ArrayView2<bool>) -> Self {
        let mut sq = mask.map(|&fg| if fg { FAR } else { 0.0 });
        let longest = sq.nrows().max(sq.ncols());
        let mut buf = Envelope::with_capacity(longest);

        // 先逐列, 后逐行.
        for axis in [Axis(0), Axis(1)] {
            for mut lane in sq.lanes_mut(axis) {
                buf.f.clear();
                buf.f.extend(lane.iter().copied());
                buf.transform();
                lane.iter_mut().zip(buf.d.iter()).for_each(|(x, &d)| *x = d);
            }
        }
        sq.mapv_inplace(f64::sqrt);
        Self { dist: sq }
    }

    /// 形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.dist.dim()
    }

    /// 获取 `pos` 处的距离. 越界时 panic.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> f64 {
        self.dist[pos]
    }

    /// 最大距离. 没有前景时为 0.
    pub fn max(&self) -> f64 {
        self.dist.iter().copied().fold(0.0, f64::max)
    }

    /// 底层数组.
    #[inline]
    pub fn view(&self) -> ArrayView2<f64> {
        self.dist.view()
    }
}

/// 一维平方距离变换的工作区.
struct Envelope {
    f: Vec<f64>,
    d: Vec<f64>,
    v: Vec<usize>,
    z: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            f: Vec::with_capacity(n),
            d: Vec::with_capacity(n),
            v: Vec::with_capacity(n),
            z: Vec::with_capacity(n + 1),
        }
    }

    /// `d[q] = min_p (q - p)^2 + f[p]`.
    fn transform(&mut self) {
        let n = self.f.len();
        let f = &self.f;
        self.d.clear();
        self.v.clear();
        self.z.clear();
        if n == 0 {
            return;
        }
        self.d.resize(n, 0.0);
        self.v.resize(n, 0);
        self.z.resize(n + 1, 0.0);

        let (v, z) = (&mut self.v, &mut self.z);
        let meet = |q: usize, p: usize| {
            let (qf, pf) = (q as f64, p as f64);
            ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
        };

        let mut k = 0;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;
        for q in 1..n {
            let mut s = meet(q, v[k]);
            // z[0] 为负无穷, 循环不会使 k 越过 0.
            while s <= z[k] {
                k -= 1;
                s = meet(q, v[k]);
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for q in 0..n {
            while z[k + 1] < q as f64 {
                k += 1;
            }
            let p = v[k];
            let diff = q as f64 - p as f64;
            self.d[q] = diff * diff + f[p];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::PosIter;

    fn brute_force(mask: &Array2<bool>) -> Array2<f64> {
        let bg: Vec<Idx2d> = PosIter::new(mask.dim()).filter(|&p| !mask[p]).collect();
        Array2::from_shape_fn(mask.dim(), |(h, w)| {
            if !mask[(h, w)] {
                return 0.0;
            }
            bg.iter()
                .map(|&(bh, bw)| (h as f64 - bh as f64).hypot(w as f64 - bw as f64))
                .fold(f64::INFINITY, f64::min)
        })
    }

    #[test]
    fn test_single_pixel() {
        let mut mask = Array2::from_elem((3, 3), false);
        mask[(1, 1)] = true;
        let edm = DistanceMap::new(mask.view());
        assert_eq!(edm.get((1, 1)), 1.0);
        assert_eq!(edm.get((0, 0)), 0.0);
        assert_eq!(edm.max(), 1.0);
    }

    #[test]
    fn test_matches_brute_force() {
        // 不规则形状, 四周留一圈背景.
        let mask = Array2::from_shape_fn((17, 23), |(h, w)| {
            let (y, x) = (h as f64 - 8.0, w as f64 - 11.0);
            h > 0 && w > 0 && h < 16 && w < 22 && (y * y / 49.0 + x * x / 100.0 < 1.0 || h == 3)
        });
        let edm = DistanceMap::new(mask.view());
        let expected = brute_force(&mask);
        for pos in PosIter::new(mask.dim()) {
            assert!((edm.get(pos) - expected[pos]).abs() < 1e-9, "at {pos:?}");
        }
    }

    #[test]
    fn test_empty_mask() {
        let mask = Array2::from_elem((4, 5), false);
        let edm = DistanceMap::new(mask.view());
        assert_eq!(edm.max(), 0.0);
        assert_eq!(edm.shape(), (4, 5));
    }
}
