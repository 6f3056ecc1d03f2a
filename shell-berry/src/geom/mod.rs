//! 二维几何: 多边形, 像素窗口, 扫描线栅格化, 距离变换与轮廓追踪.

mod edm;
mod frame;
mod iter;
mod polygon;
mod trace;

pub use edm::DistanceMap;
pub use frame::Frame;
pub use iter::PosIter;
pub use polygon::{Bounds, Polygon};
pub use trace::{components8, trace_contour, trace_contours};

use crate::Idx2d;

/// 获得 `(h, w)` 的 8-邻居索引, 按顺时针从正西方向开始. 不检查越界.
///
/// 顺序为 W, NW, N, NE, E, SE, S, SW.
#[inline]
pub(crate) fn neighbour8_cw((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h, w.wrapping_sub(1)),
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.saturating_add(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.wrapping_sub(1)),
    ]
}
