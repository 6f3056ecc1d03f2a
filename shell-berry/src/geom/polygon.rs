//! 闭合多边形.

use crate::Idx2dF;
use itertools::Itertools;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 轴对齐包围盒, 闭区间.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// 左上角 `(h, w)`.
    pub min: Idx2dF,
    /// 右下角 `(h, w)`.
    pub max: Idx2dF,
}

impl Bounds {
    /// 高度.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.0 - self.min.0
    }

    /// 宽度.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.1 - self.min.1
    }
}

/// 由有序顶点 `(h, w)` 构成的闭合多边形. 最后一个顶点隐式连接第一个顶点.
///
/// 内部判定使用奇偶规则.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    points: Vec<Idx2dF>,
}

impl Polygon {
    /// 以给定顶点创建多边形. 不做任何合法性检查.
    #[inline]
    pub fn new(points: Vec<Idx2dF>) -> Self {
        Self { points }
    }

    /// 以 `center` 为圆心, `radius` 为半径, 用 `vertices` 个顶点近似一个圆.
    pub fn circle(center: Idx2dF, radius: f64, vertices: usize) -> Self {
        Self::ellipse(center, (radius, radius), vertices)
    }

    /// 以 `center` 为中心, 半轴长分别为 `(rh, rw)`, 用 `vertices` 个顶点近似一个椭圆.
    pub fn ellipse((ch, cw): Idx2dF, (rh, rw): Idx2dF, vertices: usize) -> Self {
        let points = (0..vertices)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / vertices as f64;
                (ch + rh * theta.sin(), cw + rw * theta.cos())
            })
            .collect();
        Self { points }
    }

    /// 以 `min` 为左上角, `max` 为右下角的矩形.
    pub fn rectangle(min: Idx2dF, max: Idx2dF) -> Self {
        Self {
            points: vec![min, (min.0, max.1), max, (max.0, min.1)],
        }
    }

    /// 获取顶点.
    #[inline]
    pub fn points(&self) -> &[Idx2dF] {
        &self.points
    }

    /// 顶点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有顶点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 遍历所有边 `(起点, 终点)`.
    #[inline]
    fn edges(&self) -> impl Iterator<Item = (Idx2dF, Idx2dF)> + '_ {
        self.points.iter().copied().circular_tuple_windows()
    }

    /// 有向面积 (shoelace). 顶点顺序不同时符号不同.
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        self.edges()
            .map(|((h0, w0), (h1, w1))| w0 * h1 - w1 * h0)
            .sum::<f64>()
            / 2.0
    }

    /// 面积.
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// 周长.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges()
            .map(|((h0, w0), (h1, w1))| (h1 - h0).hypot(w1 - w0))
            .sum()
    }

    /// 圆度 `4πA / P²`. 圆为 1, 越不规则越接近 0. 周长为 0 时返回 0.
    pub fn circularity(&self) -> f64 {
        let p = self.perimeter();
        if p == 0.0 {
            0.0
        } else {
            4.0 * PI * self.area() / (p * p)
        }
    }

    /// 包围盒. 没有顶点时返回 `None`.
    pub fn bounds(&self) -> Option<Bounds> {
        let (&first, rest) = self.points.split_first()?;
        let (mut min, mut max) = (first, first);
        for &(h, w) in rest {
            min = (min.0.min(h), min.1.min(w));
            max = (max.0.max(h), max.1.max(w));
        }
        Some(Bounds { min, max })
    }

    /// 水平线 `h = y` 与多边形各边的交点 `w` 坐标, 升序排列.
    ///
    /// 边 `(p0, p1)` 与该水平线相交, 当且仅当 `(p0.h <= y) != (p1.h <= y)`.
    /// 因此交点个数总为偶数, 水平边不产生交点.
    pub fn crossings(&self, y: f64) -> Vec<f64> {
        let mut xs: Vec<f64> = self
            .edges()
            .filter(|((h0, _), (h1, _))| (*h0 <= y) != (*h1 <= y))
            .map(|((h0, w0), (h1, w1))| w0 + (y - h0) * (w1 - w0) / (h1 - h0))
            .collect();
        xs.sort_by(f64::total_cmp);
        xs
    }

    /// 点 `(h, w)` 是否位于多边形内部 (奇偶规则).
    ///
    /// 与栅格化结果一致: 像素属于多边形当且仅当其中心满足该判定.
    pub fn contains(&self, (h, w): Idx2dF) -> bool {
        self.crossings(h).into_iter().filter(|&x| x > w).count() % 2 == 1
    }

    /// 点 `(h, w)` 到多边形边界的最短距离. 不区分内外.
    ///
    /// 复杂度 `O(n)`. 没有顶点时返回正无穷.
    pub fn boundary_distance(&self, p: Idx2dF) -> f64 {
        match self.points.len() {
            0 => f64::INFINITY,
            1 => distance(p, self.points[0]),
            _ => self
                .edges()
                .map(|(a, b)| segment_distance(p, a, b))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// 面积重心. 面积为 0 时返回 `None`.
    pub fn centroid(&self) -> Option<Idx2dF> {
        let a = self.signed_area();
        if a == 0.0 {
            return None;
        }
        let (ch, cw) = self.edges().fold((0.0, 0.0), |(ch, cw), ((h0, w0), (h1, w1))| {
            let c = w0 * h1 - w1 * h0;
            (ch + (h0 + h1) * c, cw + (w0 + w1) * c)
        });
        Some((ch / (6.0 * a), cw / (6.0 * a)))
    }

    /// 平移 `(dh, dw)`.
    pub fn translate(&self, (dh, dw): Idx2dF) -> Self {
        Self {
            points: self.points.iter().map(|&(h, w)| (h + dh, w + dw)).collect(),
        }
    }

    /// 多边形是否是简单多边形 (任意两条不相邻的边不相交).
    ///
    /// 复杂度 `O(n^2)`.
    pub fn is_simple(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let edges: Vec<_> = self.edges().collect();
        for i in 0..n {
            // 与 i 相邻的边是 i - 1 和 i + 1, 只检查 j > i + 1.
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if segments_intersect(edges[i], edges[j]) {
                    return false;
                }
            }
        }
        true
    }
}

#[inline]
fn distance(a: Idx2dF, b: Idx2dF) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// 点 `p` 到线段 `ab` 的距离.
fn segment_distance(p: Idx2dF, a: Idx2dF, b: Idx2dF) -> f64 {
    let (dh, dw) = (b.0 - a.0, b.1 - a.1);
    let len2 = dh * dh + dw * dw;
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dh + (p.1 - a.1) * dw) / len2).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dh, a.1 + t * dw))
}

/// 叉积 `(b - a) × (c - a)`.
#[inline]
fn cross(a: Idx2dF, b: Idx2dF, c: Idx2dF) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// `c` 是否位于以 `a`, `b` 为对角的包围盒内.
#[inline]
fn on_segment(a: Idx2dF, b: Idx2dF, c: Idx2dF) -> bool {
    c.0 >= a.0.min(b.0) && c.0 <= a.0.max(b.0) && c.1 >= a.1.min(b.1) && c.1 <= a.1.max(b.1)
}

/// 两条闭线段是否相交 (包括端点接触与共线重叠).
fn segments_intersect((p1, p2): (Idx2dF, Idx2dF), (q1, q2): (Idx2dF, Idx2dF)) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
